use std::convert::Infallible;

use axum::http::header;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::providers::BackendError;
use crate::providers::mesh::types::ChatCompletionResponse;

pub mod common;

pub use common::{DONE_MARKER, data_event, encode_chunk};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("backend stream failed: {0}")]
    Backend(#[from] BackendError),

    #[error("failed to serialize reply chunk: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Streaming,
    /// Backend stream ended cleanly and the terminal marker was emitted.
    Done,
    /// Stopped without the terminal marker; the client sees a truncated stream.
    Aborted,
}

/// Forwards backend reply chunks as event-stream frames.
///
/// The relay is pulled by the HTTP transport one event at a time, so the next
/// chunk is only requested once the previous event has been handed off. Headers
/// are already committed when it runs: failures end the body without `[DONE]`
/// instead of producing an error status.
pub struct Relay<T = ChatCompletionResponse> {
    request_id: Uuid,
    upstream: BoxStream<'static, Result<T, BackendError>>,
    state: RelayState,
    frames: u64,
    started_at: DateTime<Utc>,
}

impl<T> Relay<T>
where
    T: Serialize + Send + 'static,
{
    pub fn new(request_id: Uuid, upstream: BoxStream<'static, Result<T, BackendError>>) -> Self {
        Self {
            request_id,
            upstream,
            state: RelayState::Streaming,
            frames: 0,
            started_at: Utc::now(),
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Number of data frames emitted so far, not counting the terminal marker.
    pub fn frames_sent(&self) -> u64 {
        self.frames
    }

    /// Waits for the next backend chunk and returns the payload of its `data:`
    /// line, or `[DONE]` after a clean end. `None` once the relay is finished,
    /// whichever way it finished.
    pub async fn next_payload(&mut self) -> Option<String> {
        if self.state != RelayState::Streaming {
            return None;
        }

        match self.upstream.next().await {
            Some(Ok(chunk)) => match encode_chunk(&chunk) {
                Ok(payload) => {
                    self.frames += 1;
                    tracing::debug!(
                        request_id = %self.request_id,
                        frame = self.frames,
                        "relayed chunk"
                    );
                    Some(payload)
                }
                Err(e) => {
                    self.abort(e.into());
                    None
                }
            },
            Some(Err(e)) => {
                self.abort(e.into());
                None
            }
            None => {
                self.state = RelayState::Done;
                tracing::info!(
                    request_id = %self.request_id,
                    frames = self.frames,
                    elapsed_ms = self.elapsed_ms(),
                    "ChatCompletion stream finished"
                );
                Some(DONE_MARKER.to_string())
            }
        }
    }

    pub fn into_events(self) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
        futures_util::stream::unfold(self, |mut relay| async move {
            let payload = relay.next_payload().await?;
            Some((Ok::<_, Infallible>(data_event(payload)), relay))
        })
    }

    /// Commits the response as an event stream with this relay as its body.
    /// `Sse` sets `Content-Type` and `Cache-Control`; the rest are added here.
    pub fn into_response(self) -> Response {
        (
            [
                (header::CONNECTION, "keep-alive"),
                (header::TRANSFER_ENCODING, "chunked"),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                (header::ACCESS_CONTROL_ALLOW_HEADERS, "Cache-Control"),
                (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
            ],
            Sse::new(self.into_events()),
        )
            .into_response()
    }

    fn abort(&mut self, err: RelayError) {
        self.state = RelayState::Aborted;
        tracing::error!(
            request_id = %self.request_id,
            frames = self.frames,
            elapsed_ms = self.elapsed_ms(),
            "ChatCompletion stream aborted: {}",
            err
        );
    }
}

impl<T> Relay<T> {
    fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

impl<T> Drop for Relay<T> {
    fn drop(&mut self) {
        // Dropped mid-stream: the transport gave up on the body (client gone or write failed).
        if self.state == RelayState::Streaming {
            self.state = RelayState::Aborted;
            tracing::warn!(
                request_id = %self.request_id,
                frames = self.frames,
                elapsed_ms = self.elapsed_ms(),
                "client connection closed before stream completion"
            );
        }
    }
}
