//! Incremental accumulation of streamed completion bodies.
//!
//! Handles the three shapes a chat endpoint may answer with:
//! `data: {json}` server-sent-event frames ending in `data: [DONE]`,
//! newline-delimited JSON objects, or one plain JSON object. Bytes can be
//! pushed in arbitrary chunks; lines are only decoded once complete, so a
//! chunk boundary inside a line or a UTF-8 sequence is harmless.

use serde_json::Value;
use tracing::debug;

const DONE_SENTINEL: &str = "[DONE]";

/// Byte-oriented accumulator for a single response body.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    pending: Vec<u8>,
    text: String,
    passthrough: String,
    frames: usize,
    malformed: usize,
    upstream_error: Option<String>,
    done: bool,
}

impl SseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of the body.
    pub fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.handle_line(&String::from_utf8_lossy(&line));
        }
    }

    /// True once the `[DONE]` sentinel was seen. Later input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of `data:` frames that were not valid JSON.
    pub fn malformed_frames(&self) -> usize {
        self.malformed
    }

    /// Flush the trailing partial line and produce the accumulated text.
    ///
    /// Bodies without any `data:` frame are parsed as one JSON object, then as
    /// newline-delimited JSON. Returns an error message when none of the
    /// shapes matched, when the upstream reported an `error` object, or when
    /// the accumulated text is blank.
    pub fn finish(mut self) -> Result<String, String> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.handle_line(&String::from_utf8_lossy(&rest));
        }

        if self.malformed > 0 {
            debug!(malformed = self.malformed, "skipped unparseable stream frames");
        }

        if let Some(message) = self.upstream_error {
            return Err(format!("stream reported an error: {message}"));
        }
        if self.frames > 0 {
            return non_blank(self.text, "stream ended without any completion content");
        }

        let body = self.passthrough.trim();
        if body.is_empty() {
            return Err("response body was empty".to_string());
        }

        if let Ok(value) = serde_json::from_str::<Value>(body) {
            if let Some(message) = error_message(&value) {
                return Err(format!("response reported an error: {message}"));
            }
            let content = message_content(&value)
                .ok_or_else(|| "response JSON has no message content".to_string())?;
            return non_blank(content.to_string(), "response message content was empty");
        }

        let mut text = String::new();
        let mut matched = false;
        let objects = body
            .lines()
            .filter_map(|line| serde_json::from_str::<Value>(line.trim()).ok());
        for value in objects {
            if let Some(message) = error_message(&value) {
                return Err(format!("response reported an error: {message}"));
            }
            if let Some(delta) = delta_content(&value).or_else(|| message_content(&value)) {
                text.push_str(delta);
                matched = true;
            }
        }

        if matched {
            non_blank(text, "response message content was empty")
        } else {
            Err("response contained no recognizable completion content".to_string())
        }
    }

    fn handle_line(&mut self, raw: &str) {
        if self.done {
            return;
        }
        let line = raw.trim_end_matches(['\r', '\n']);
        let Some(data) = line.strip_prefix("data:") else {
            if !line.trim().is_empty() {
                self.passthrough.push_str(line);
                self.passthrough.push('\n');
            }
            return;
        };

        let data = data.trim();
        self.frames += 1;
        if data == DONE_SENTINEL {
            self.done = true;
            return;
        }

        match serde_json::from_str::<Value>(data) {
            Ok(value) => {
                if let Some(message) = error_message(&value) {
                    debug!(error = %message, "stream frame carried an error");
                    self.upstream_error.get_or_insert(message);
                } else if let Some(delta) = delta_content(&value) {
                    self.text.push_str(delta);
                }
            }
            Err(e) => {
                self.malformed += 1;
                debug!(error = %e, "skipping malformed stream frame");
            }
        }
    }
}

fn non_blank(text: String, detail: &str) -> Result<String, String> {
    if text.trim().is_empty() {
        Err(detail.to_string())
    } else {
        Ok(text)
    }
}

/// Upstream failure report: `{"error": {"message": ...}}` or `{"error": "..."}`.
pub fn error_message(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(
            other
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| other.to_string(), str::to_string),
        ),
    }
}

/// Incremental delta: `message.content` or `choices[0].delta.content`.
pub fn delta_content(value: &Value) -> Option<&str> {
    value
        .pointer("/message/content")
        .or_else(|| value.pointer("/choices/0/delta/content"))
        .and_then(Value::as_str)
}

/// Whole-message content: `message.content` or `choices[0].message.content`.
pub fn message_content(value: &Value) -> Option<&str> {
    value
        .pointer("/message/content")
        .or_else(|| value.pointer("/choices/0/message/content"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(chunks: &[&[u8]]) -> Result<String, String> {
        let mut acc = SseAccumulator::new();
        for chunk in chunks {
            acc.push(chunk);
        }
        acc.finish()
    }

    #[test]
    fn test_concatenates_frames_until_sentinel() {
        let body = b"data: {\"message\":{\"content\":\"Try \"}}\n\
                     data: {\"message\":{\"content\":\"oatmeal.\"}}\n\
                     data: [DONE]\n\
                     data: {\"message\":{\"content\":\" ignored\"}}\n";
        assert_eq!(accumulate(&[body]).unwrap(), "Try oatmeal.");
    }

    #[test]
    fn test_malformed_middle_frame_is_skipped() {
        let mut acc = SseAccumulator::new();
        acc.push(b"data: {\"message\":{\"content\":\"Try \"}}\n");
        acc.push(b"data: {not json\n");
        acc.push(b"data: {\"message\":{\"content\":\"oatmeal.\"}}\ndata: [DONE]\n");
        assert!(acc.is_done());
        assert_eq!(acc.malformed_frames(), 1);
        assert_eq!(acc.finish().unwrap(), "Try oatmeal.");
    }

    #[test]
    fn test_split_lines_and_utf8_sequences() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"crème brûlée\"}}]}\n";
        let bytes = body.as_bytes();
        // Split inside the two-byte 'è'
        let split = body.find('è').unwrap() + 1;
        let result = accumulate(&[&bytes[..7], &bytes[7..split], &bytes[split..]]).unwrap();
        assert_eq!(result, "crème brûlée");
    }

    #[test]
    fn test_missing_trailing_newline_and_sentinel() {
        let result = accumulate(&[b"data: {\"message\":{\"content\":\"soup\"}}"]).unwrap();
        assert_eq!(result, "soup");
    }

    #[test]
    fn test_single_json_object() {
        let body = br#"{"model":"llama3.1","message":{"role":"assistant","content":"Bake it."},"done":true}"#;
        assert_eq!(accumulate(&[body]).unwrap(), "Bake it.");
    }

    #[test]
    fn test_openai_shaped_single_object() {
        let body = br#"{"choices":[{"message":{"role":"assistant","content":"Fry it."}}]}"#;
        assert_eq!(accumulate(&[body]).unwrap(), "Fry it.");
    }

    #[test]
    fn test_newline_delimited_json() {
        let body = b"{\"message\":{\"content\":\"Pan\"},\"done\":false}\n\
                     {\"message\":{\"content\":\"cakes\"},\"done\":false}\n\
                     {\"message\":{\"content\":\"\"},\"done\":true}\n";
        assert_eq!(accumulate(&[body]).unwrap(), "Pancakes");
    }

    #[test]
    fn test_error_frame_fails_with_upstream_message() {
        let body = b"data: {\"error\":{\"message\":\"model overloaded\",\"type\":\"server_error\"}}\n\
                     data: [DONE]\n";
        let err = accumulate(&[body]).unwrap_err();
        assert!(err.contains("model overloaded"));
    }

    #[test]
    fn test_error_after_partial_content_fails() {
        let body = b"data: {\"choices\":[{\"delta\":{\"content\":\"Boil \"}}]}\n\
                     data: {\"error\":\"connection reset upstream\"}\n";
        let err = accumulate(&[body]).unwrap_err();
        assert!(err.contains("connection reset upstream"));
    }

    #[test]
    fn test_stream_without_content_is_an_error() {
        let body = b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\
                     data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\
                     data: [DONE]\n";
        let err = accumulate(&[body]).unwrap_err();
        assert!(err.contains("without any completion content"));
    }

    #[test]
    fn test_null_error_key_is_ignored() {
        let body = b"data: {\"error\":null,\"message\":{\"content\":\"Stew.\"}}\ndata: [DONE]\n";
        assert_eq!(accumulate(&[body]).unwrap(), "Stew.");
    }

    #[test]
    fn test_single_object_error_and_blank_content() {
        let err = accumulate(&[br#"{"error":{"message":"model not found"}}"#]).unwrap_err();
        assert!(err.contains("model not found"));
        assert!(accumulate(&[br#"{"message":{"role":"assistant","content":"  "}}"#]).is_err());
    }

    #[test]
    fn test_unrecognized_body_is_an_error() {
        assert!(accumulate(&[b"<html>bad gateway</html>"]).is_err());
        assert!(accumulate(&[b""]).is_err());
        assert!(accumulate(&[br#"{"error":"overloaded"}"#]).is_err());
    }
}
