pub mod config;
pub mod error;
pub mod estimation_service;
pub mod gemini_service;
pub mod models;
pub mod prompt_template;
pub mod transient_document;

pub use config::{EstimatorConfig, GeminiConfig};
pub use error::EstimateError;
pub use estimation_service::{EstimationResult, EstimationService, VALIDATION_WARNING};
pub use gemini_service::{GeminiService, GenerationClient};
pub use models::*;
pub use prompt_template::{PromptTemplate, ESTIMATION_PROMPT};
pub use transient_document::TransientDocument;
