//! Server-sent event decoding for streamed assistant runs.
//!
//! `SseDecoder` is fed raw body chunks as they arrive; chunk boundaries may
//! fall anywhere, including inside a UTF-8 sequence or a CRLF pair.
//! `assistant_event` maps a decoded frame onto a `StreamEvent`.

use serde::Deserialize;
use serde_json::Value;
use chat_types::event::StreamEvent;

/// Event name of a message text delta
pub const MESSAGE_DELTA: &str = "thread.message.delta";
/// Event name that closes a run's stream
pub const DONE: &str = "done";
/// Event name of a run that ended in failure
pub const RUN_FAILED: &str = "thread.run.failed";

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental line-oriented SSE decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        // '\n' never occurs inside a multi-byte UTF-8 sequence
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            let line = line.trim_end_matches('\r');
            if let Some(frame) = self.process_line(line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        let frame = SseFrame {
            event: self.event.take(),
            data: self.data.join("\n"),
        };
        self.data.clear();
        Some(frame)
    }
}

/// Map a frame onto a stream event. `None` means the run's stream is over.
///
/// Only a message delta whose first content block is text becomes a
/// `TextDelta`. An `error` or failed-run frame becomes `Failed`; every other
/// frame is `Other`, named after its event.
pub fn assistant_event(frame: &SseFrame) -> Option<StreamEvent> {
    let name = frame.event.as_deref().unwrap_or("message");
    if name == DONE || frame.data.trim() == "[DONE]" {
        return None;
    }

    match name {
        MESSAGE_DELTA => Some(message_delta(&frame.data).unwrap_or_else(|| StreamEvent::other(name))),
        "error" | RUN_FAILED => {
            log::error!("Run stream reported {}: {}", name, frame.data);
            Some(StreamEvent::failed(failure_message(name, &frame.data)))
        }
        _ => Some(StreamEvent::other(name)),
    }
}

/// Map a batch of frames onto events, stopping at the end of the run.
/// The flag is `true` once the run is over, either at `done` or after a
/// `Failed` event; frames after that point are dropped.
pub fn run_events(frames: &[SseFrame]) -> (Vec<StreamEvent>, bool) {
    let mut events = Vec::new();
    for frame in frames {
        match assistant_event(frame) {
            Some(event @ StreamEvent::Failed { .. }) => {
                events.push(event);
                return (events, true);
            }
            Some(event) => events.push(event),
            None => return (events, true),
        }
    }
    (events, false)
}

/// Pull a readable message out of an error object (`{"message"}`,
/// `{"error": {"message"}}`) or a failed run (`{"last_error": {"message"}}`).
fn failure_message(name: &str, data: &str) -> String {
    let detail = serde_json::from_str::<Value>(data).ok().and_then(|value| {
        [
            value.get("message"),
            value.pointer("/error/message"),
            value.pointer("/last_error/message"),
        ]
        .into_iter()
        .flatten()
        .find_map(|m| m.as_str().map(str::to_string))
    });
    match detail {
        Some(detail) => format!("{}: {}", name, detail),
        None => name.to_string(),
    }
}

fn message_delta(data: &str) -> Option<StreamEvent> {
    let delta: ApiMessageDelta = match serde_json::from_str(data) {
        Ok(d) => d,
        Err(e) => {
            log::warn!("Malformed message delta: {}", e);
            return None;
        }
    };

    let block = delta.delta.content.into_iter().next()?;
    if block.kind != "text" {
        return None;
    }
    let text = block.text?.value?;
    Some(StreamEvent::TextDelta { text })
}

// ─── API event types ─────────────────────────────────────────

#[derive(Deserialize)]
struct ApiMessageDelta {
    delta: ApiDeltaBody,
}

#[derive(Deserialize)]
struct ApiDeltaBody {
    #[serde(default)]
    content: Vec<ApiDeltaBlock>,
}

#[derive(Deserialize)]
struct ApiDeltaBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<ApiDeltaText>,
}

#[derive(Deserialize)]
struct ApiDeltaText {
    #[serde(default)]
    value: Option<String>,
}
