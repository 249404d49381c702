mod client;
mod config;
mod error;
mod prompt;
mod response;
mod safety;
pub mod wire;

pub use client::{GenerationClient, ImageGenerator};
pub use config::{
    DEFAULT_ENDPOINT, DEFAULT_IMAGE_MODEL, DEFAULT_REQUEST_TIMEOUT, GenerationConfig,
    SharedConfig, shared_config,
};
pub use error::{FailureKind, GenerationError, GenerationResult};
pub use prompt::{garment_prompt, garment_request, try_on_request};
pub use response::{
    ClassifiedCandidate, FinishReason, GenerationOutcome, InlineImage, ResponsePart,
    TEXT_EXCERPT_CHARS,
};
pub use safety::{HarmCategory, PERMISSIVE_THRESHOLD, permissive_safety_settings};
