//! OpenAI Assistants adapter.
//!
//! Threads, messages, and streamed runs over the Assistants v2 HTTP API.
//! Uses browser `fetch()` via gloo-net for WASM compatibility; the run body
//! is read chunk by chunk from its `ReadableStream`.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use gloo_net::http::{Request, RequestBuilder, Response};
use js_sys::{Reflect, Uint8Array};
use serde::Deserialize;
use serde_json::{json, Value};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{ReadableStream, ReadableStreamDefaultReader};

use chat_core::ports::{AssistantPort, EventStream};
use chat_types::{
    Result, ChatError,
    config::AssistantConfig,
    event::StreamEvent,
    message::Role,
};
use super::sse::{SseDecoder, SseFrame, run_events};

/// Provider that speaks the OpenAI Assistants protocol.
pub struct OpenAiAssistantsProvider {
    config: AssistantConfig,
    base_url: String,
}

impl OpenAiAssistantsProvider {
    pub fn new(config: AssistantConfig) -> Self {
        let base_url = config.base_url().to_string();
        Self { config, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str) -> RequestBuilder {
        Request::post(&format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.config.api_key))
            .header("OpenAI-Beta", "assistants=v2")
    }

    /// POST a JSON body and fail on any non-2xx status
    async fn send_json(&self, path: &str, body: &Value) -> Result<Response> {
        let response = self
            .post(path)
            .json(body)
            .map_err(|e| ChatError::ServiceUnavailable(e.to_string()))?
            .send()
            .await
            .map_err(|e| ChatError::ServiceUnavailable(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ChatError::ServiceUnavailable(format!(
                "HTTP {}: {}",
                status, text
            )));
        }

        Ok(response)
    }
}

#[async_trait(?Send)]
impl AssistantPort for OpenAiAssistantsProvider {
    async fn create_thread(&self) -> Result<String> {
        let response = self.send_json("/v1/threads", &json!({})).await?;
        let thread: ApiThread = response
            .json()
            .await
            .map_err(|e| ChatError::ServiceUnavailable(e.to_string()))?;
        Ok(thread.id)
    }

    async fn post_message(&self, thread_id: &str, role: Role, content: &str) -> Result<()> {
        let path = format!("/v1/threads/{}/messages", thread_id);
        self.send_json(&path, &message_body(role, content)).await?;
        Ok(())
    }

    async fn run_streaming(&self, thread_id: &str, assistant_id: &str) -> Result<EventStream> {
        let path = format!("/v1/threads/{}/runs", thread_id);
        let response = self.send_json(&path, &run_body(assistant_id)).await?;
        let body = response.body().ok_or_else(|| {
            ChatError::ServiceUnavailable("Run response has no body".to_string())
        })?;
        log::debug!("Streaming run of {} on thread {}", assistant_id, thread_id);
        Ok(body_events(body))
    }
}

pub(crate) fn message_body(role: Role, content: &str) -> Value {
    json!({
        "role": role.as_str(),
        "content": content,
    })
}

pub(crate) fn run_body(assistant_id: &str) -> Value {
    json!({
        "assistant_id": assistant_id,
        "stream": true,
    })
}

// ─── Body streaming ──────────────────────────────────────────

struct BodyReader {
    reader: ReadableStreamDefaultReader,
    decoder: SseDecoder,
    finished: bool,
}

impl BodyReader {
    /// Decode a chunk, stopping at the end-of-run frame
    fn decode(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let frames = self.decoder.push(chunk);
        self.collect(frames)
    }

    fn flush(&mut self) -> Vec<StreamEvent> {
        let frames: Vec<_> = self.decoder.finish().into_iter().collect();
        self.finished = true;
        self.collect(frames)
    }

    fn collect(&mut self, frames: Vec<SseFrame>) -> Vec<StreamEvent> {
        let (events, over) = run_events(&frames);
        if over {
            self.finished = true;
        }
        if self.finished {
            self.release();
        }
        events
    }

    /// Stop reading: cancel whatever the server still sends and unlock the body.
    fn release(&self) {
        let _ = self.reader.cancel();
        let _ = self.reader.release_lock();
    }
}

fn body_events(body: ReadableStream) -> EventStream {
    let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();
    let state = BodyReader {
        reader,
        decoder: SseDecoder::new(),
        finished: false,
    };

    let batches = stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        match read_chunk(&state.reader).await {
            Ok(Some(chunk)) => {
                let events = state.decode(&chunk);
                Some((events, state))
            }
            Ok(None) => {
                let events = state.flush();
                Some((events, state))
            }
            Err(e) => {
                log::warn!("Run stream aborted: {:?}", e);
                state.finished = true;
                state.release();
                Some((vec![StreamEvent::failed("Run stream was interrupted")], state))
            }
        }
    });

    Box::pin(batches.flat_map(stream::iter))
}

/// Read one chunk; `None` once the body is exhausted.
async fn read_chunk(reader: &ReadableStreamDefaultReader) -> std::result::Result<Option<Vec<u8>>, JsValue> {
    let result = JsFuture::from(reader.read()).await?;
    let done = Reflect::get(&result, &JsValue::from_str("done"))?
        .as_bool()
        .unwrap_or(true);
    if done {
        return Ok(None);
    }
    let value = Reflect::get(&result, &JsValue::from_str("value"))?;
    Ok(Some(Uint8Array::new(&value).to_vec()))
}

// ─── API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct ApiThread {
    id: String,
}
