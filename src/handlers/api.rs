use axum::response::Json;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const SERVICE_NAME: &str = "podcast-gateway";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub path: &'static str,
    pub method: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub generate_script: EndpointInfo,
    pub health: EndpointInfo,
}

#[derive(Debug, Serialize)]
pub struct ServiceDescriptor {
    pub service: &'static str,
    pub status: &'static str,
    pub endpoints: Endpoints,
}

/// Liveness probe
pub async fn health_check() -> Json<HealthResponse> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        timestamp,
    })
}

/// Lists the routes this service answers.
pub async fn service_info() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        service: SERVICE_NAME,
        status: "running",
        endpoints: Endpoints {
            generate_script: EndpointInfo {
                path: "/generate-script",
                method: "POST",
            },
            health: EndpointInfo {
                path: "/health",
                method: "GET",
            },
        },
    })
}
