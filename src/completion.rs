//! Streaming completion client.
//!
//! Submits the assembled instruction plus the user question as a two-message
//! chat completion with incremental delivery, and yields each generated
//! fragment in arrival order. The SSE frame parsing lives in [`SseParser`]
//! so it can be exercised without a network.

use anyhow::{Context, Result};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use std::time::Duration;

use crate::config::{CompletionConfig, Config};

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl CompletionClient {
    /// Create a client against an explicit base URL.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        config: &CompletionConfig,
    ) -> Result<Self> {
        // Connect timeout only: a total-request timeout would cut off
        // long-running answer streams.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build completion HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Create a client from config plus the environment (`OPENAI_API_KEY`).
    pub fn from_env(config: &Config) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::new(config.completion.base_url.clone(), api_key, &config.completion)
    }

    /// Open a streaming completion for the given system instruction and
    /// user question.
    ///
    /// Returns an error before any token on connect failure or a non-success
    /// status. After that, fragments arrive as `Ok` items in upstream order;
    /// a mid-stream transport failure surfaces as a single `Err` item.
    pub async fn stream_chat(
        &self,
        system: &str,
        question: &str,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": question },
            ],
            "stream": true,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = serde_json::json!(t);
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("Completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion service error {}: {}", status, body_text);
        }

        let mut parser = SseParser::new();
        let fragments = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => {
                    let out: Vec<Result<String>> =
                        parser.feed(&bytes).into_iter().map(Ok).collect();
                    stream::iter(out)
                }
                Err(e) => stream::iter(vec![Err(
                    anyhow::Error::new(e).context("Completion stream interrupted")
                )]),
            })
            .flatten();

        Ok(fragments.boxed())
    }
}

/// One parsed server-sent event payload from the completions stream.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Incremental parser for the `data:`-framed completion stream.
///
/// Network chunks split lines (and multi-byte characters) at arbitrary
/// points, so bytes are buffered and only complete lines are decoded.
/// Everything after the `[DONE]` sentinel is ignored.
pub struct SseParser {
    buf: Vec<u8>,
    done: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            done: false,
        }
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed raw bytes, returning any completed content fragments in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            // Drop the trailing \n (and \r for CRLF framing)
            let line = String::from_utf8_lossy(&line[..pos]);
            let line = line.trim_end_matches('\r');

            if self.done {
                continue;
            }

            if let Some(fragment) = self.parse_line(line) {
                fragments.push(fragment);
            }
        }

        fragments
    }

    fn parse_line(&mut self, line: &str) -> Option<String> {
        let data = line.strip_prefix("data:")?.trim_start();

        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        let chunk: StreamChunk = serde_json::from_str(data).ok()?;
        chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|s| !s.is_empty())
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_frame(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({ "choices": [ { "delta": { "content": content } } ] })
        )
    }

    #[test]
    fn parses_fragments_in_order() {
        let mut parser = SseParser::new();
        let input = format!(
            "{}{}{}data: [DONE]\n\n",
            delta_frame("Halo"),
            delta_frame(", "),
            delta_frame("dunia")
        );

        let fragments = parser.feed(input.as_bytes());
        assert_eq!(fragments, vec!["Halo", ", ", "dunia"]);
        assert!(parser.is_done());
    }

    #[test]
    fn reassembles_lines_split_across_chunks() {
        let mut parser = SseParser::new();
        let frame = delta_frame("jawaban");
        let (a, b) = frame.split_at(10);

        assert!(parser.feed(a.as_bytes()).is_empty());
        assert_eq!(parser.feed(b.as_bytes()), vec!["jawaban"]);
    }

    #[test]
    fn reassembles_multibyte_chars_split_across_chunks() {
        let mut parser = SseParser::new();
        let frame = delta_frame("di kafé itu");
        let bytes = frame.as_bytes();
        // Split inside the two-byte encoding of 'é'
        let split_at = frame.find('é').unwrap() + 1;
        let (a, b) = bytes.split_at(split_at);

        let mut fragments = parser.feed(a);
        fragments.extend(parser.feed(b));
        assert_eq!(fragments, vec!["di kafé itu"]);
    }

    #[test]
    fn ignores_frames_after_done() {
        let mut parser = SseParser::new();
        let input = format!("{}data: [DONE]\n{}", delta_frame("first"), delta_frame("late"));

        let fragments = parser.feed(input.as_bytes());
        assert_eq!(fragments, vec!["first"]);
    }

    #[test]
    fn skips_empty_deltas_and_non_data_lines() {
        let mut parser = SseParser::new();
        let input = "\
: keepalive\n\
event: message\n\
data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n";

        let fragments = parser.feed(input.as_bytes());
        assert_eq!(fragments, vec!["ok"]);
    }

    #[test]
    fn tolerates_malformed_json_lines() {
        let mut parser = SseParser::new();
        let input = format!("data: {{not json\n{}", delta_frame("fine"));
        assert_eq!(parser.feed(input.as_bytes()), vec!["fine"]);
    }

    #[test]
    fn crlf_framing_is_handled() {
        let mut parser = SseParser::new();
        let input = delta_frame("baik").replace('\n', "\r\n");
        assert_eq!(parser.feed(input.as_bytes()), vec!["baik"]);
    }
}
