mod aws;
mod phrasebook;

use crate::config::Language;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use aws::AwsTranslator;
pub use phrasebook::PhrasebookTranslator;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub target: Language,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("request throttled: {0}")]
    Throttled(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("request timed out")]
    Timeout,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("translation service error: {0}")]
    Service(String),
}

impl TranslateError {
    /// Whether a later attempt of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TranslateError::Throttled(_) | TranslateError::Unavailable(_) | TranslateError::Timeout
        )
    }
}

pub trait Translator: Send + Sync {
    fn translate(
        &self,
        text: String,
        source: Language,
        target: Language,
    ) -> BoxFuture<'_, Result<Translation, TranslateError>>;
}
