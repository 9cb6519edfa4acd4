use axum::response::sse::Event;
use serde::Serialize;

/// Payload of the terminal event sent after a clean end of stream.
pub const DONE_MARKER: &str = "[DONE]";

/// Serializes one reply chunk into the compact JSON carried by its `data:` line.
pub fn encode_chunk<T: Serialize>(chunk: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(chunk)
}

// 统一的事件格式：`data: <payload>\n\n`
pub fn data_event(payload: impl AsRef<str>) -> Event {
    Event::default().data(payload)
}
