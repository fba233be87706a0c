use async_trait::async_trait;

use crate::errors::PerceiverError;

/// Text completion backend used for semantic element matching.
#[async_trait]
pub trait TextModelPort: Send + Sync {
    /// Cheap availability probe; an unavailable model is skipped without a call.
    fn is_available(&self) -> bool {
        true
    }

    async fn complete(&self, prompt: &str) -> Result<String, PerceiverError>;
}
