pub mod mesh;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

pub use mesh::MeshClient;
use mesh::types::{ChatCompletionRequest, ChatCompletionResponse};

/// Ordered reply chunks of one backend call; ends cleanly or with an error item.
pub type ReplyStream = BoxStream<'static, Result<ChatCompletionResponse, BackendError>>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("rpc status: {0}")]
    Status(#[from] tonic::Status),
}

/// A server-streaming chat-completion backend.
///
/// Implementations are shared by every in-flight request and must tolerate
/// concurrent calls; the gateway adds no locking around them.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ReplyStream, BackendError>;
}
