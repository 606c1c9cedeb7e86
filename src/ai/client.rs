use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use log::debug;

use crate::ai::{ModelError, ModelRequest};

/// Ordered, finite text fragments of one response. Not restartable.
pub type FragmentStream = BoxStream<'static, Result<String, ModelError>>;

/// A hosted model that turns a prompt into text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends the prompt and waits for the whole answer.
    async fn complete(&self, request: &ModelRequest) -> Result<String, ModelError>;

    /// Sends the prompt and yields the answer as it is generated.
    ///
    /// Providers without streaming support answer with a single fragment.
    async fn stream(&self, request: &ModelRequest) -> Result<FragmentStream, ModelError> {
        let text = self.complete(request).await?;
        Ok(stream::once(async move { Ok(text) }).boxed())
    }
}

/// Gets the answer to `request` as a fragment stream either way.
///
/// Without `streaming` the provider is asked for the complete answer, which is
/// then handed out as exactly one fragment.
pub async fn response_fragments(
    client: &dyn ModelClient,
    request: &ModelRequest,
    streaming: bool,
) -> Result<FragmentStream, ModelError> {
    if streaming {
        debug!("Requesting streamed response from {}", request.model);
        client.stream(request).await
    } else {
        debug!("Requesting complete response from {}", request.model);
        let text = client.complete(request).await?;
        Ok(stream::once(async move { Ok(text) }).boxed())
    }
}
