pub mod generation_client;
pub mod normalizer;
pub mod request_builder;

pub use generation_client::{ChatCompletionRequest, GenerationClient, TextGenerator};
pub use normalizer::{strip_fences, ResponseNormalizer};
pub use request_builder::{build_request, GenerationRequest, SYSTEM_INSTRUCTION};
