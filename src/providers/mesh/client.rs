use async_trait::async_trait;
use futures_util::StreamExt;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};

use crate::providers::{BackendError, ChatBackend, ReplyStream};

use super::types::{ChatCompletionRequest, ChatCompletionResponse};

pub const CHAT_COMPLETION_PATH: &str = "/llm_mesh.ChatCompletionService/ChatCompletion";

/// gRPC client for the llm_mesh chat-completion service.
///
/// Wraps a single `tonic` channel; each call clones it, which is cheap and
/// safe across concurrent requests.
#[derive(Debug, Clone)]
pub struct MeshClient {
    inner: Grpc<Channel>,
}

impl MeshClient {
    /// Builds the client without dialing. Connection errors surface on the
    /// first call as an initiation failure.
    pub fn connect_lazy(address: &str) -> Result<Self, BackendError> {
        let channel = Endpoint::from_shared(address.to_string())?.connect_lazy();
        Ok(Self::new(channel))
    }

    pub fn new(channel: Channel) -> Self {
        Self {
            inner: Grpc::new(channel),
        }
    }
}

#[async_trait]
impl ChatBackend for MeshClient {
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ReplyStream, BackendError> {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|e| tonic::Status::unavailable(format!("mesh service not ready: {}", e)))?;

        let codec: ProstCodec<ChatCompletionRequest, ChatCompletionResponse> =
            ProstCodec::default();
        let path = PathAndQuery::from_static(CHAT_COMPLETION_PATH);
        let response = grpc
            .server_streaming(tonic::Request::new(request), path, codec)
            .await?;

        Ok(response
            .into_inner()
            .map(|item| item.map_err(BackendError::from))
            .boxed())
    }
}
