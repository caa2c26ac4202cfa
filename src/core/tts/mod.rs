mod base;
pub mod unreal_speech;

pub use base::{AudioSegment, SpeechSynthesizer, SynthesisError, SynthesisResult};
pub use unreal_speech::{UNREAL_SPEECH_TTS_URL, UnrealSpeechConfig, UnrealSpeechTTS};
