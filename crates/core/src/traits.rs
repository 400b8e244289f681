use crate::error::InferenceError;
use crate::inference::InferenceRequest;
use async_trait::async_trait;
use std::sync::Arc;

/// The structured-generation capability: submit content plus a response schema,
/// receive JSON text or a failure.
#[async_trait]
pub trait InferenceBackend {
    /// Whether the backend has what it needs (credentials, endpoint) to accept calls.
    fn is_configured(&self) -> bool {
        true
    }

    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError>;
}

#[async_trait]
impl<T> InferenceBackend for Arc<T>
where
    T: InferenceBackend + Send + Sync + ?Sized,
{
    fn is_configured(&self) -> bool {
        (**self).is_configured()
    }

    async fn generate(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        (**self).generate(request).await
    }
}
