//! Text recognition (OCR) engine infrastructure.
//!
//! The solve pipeline owns a single engine instance that it creates lazily
//! through an [`EngineFactory`]. Concrete OCR backends live outside this
//! crate; integrators plug them in by implementing the two traits below.

use async_trait::async_trait;
use thiserror::Error;

/// Options forwarded to [`RecognitionEngine::recognize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizeOptions {
    pub language: String,
    pub char_whitelist: Option<String>,
}

impl Default for RecognizeOptions {
    fn default() -> Self {
        Self {
            language: "eng".into(),
            char_whitelist: None,
        }
    }
}

impl RecognizeOptions {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_whitelist(mut self, chars: impl Into<String>) -> Self {
        self.char_whitelist = Some(chars.into());
        self
    }
}

/// Text extracted from an image together with the engine's confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    pub confidence: f32,
}

impl Recognition {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// An initialised recognition backend.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    async fn recognize(
        &self,
        image: &[u8],
        options: &RecognizeOptions,
    ) -> EngineResult<Recognition>;

    /// Release backend resources. Called once by the pipeline's cleanup.
    async fn terminate(&self) -> EngineResult<()> {
        Ok(())
    }
}

/// Creates engine instances on demand.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn initialize(&self) -> EngineResult<Box<dyn RecognitionEngine>>;
}

/// Failures produced by recognition engines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("recognition engine failed to initialise: {0}")]
    Initialization(String),
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
