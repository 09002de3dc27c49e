//! Server-sent events decoding for provider streams.
//!
//! Network chunks do not line up with SSE event boundaries, nor with UTF-8
//! character boundaries, so bytes are buffered until a blank line closes an
//! event and only then decoded.

/// SSE event parsed from stream.
///
/// Only the data lines matter here; Gemini sends unnamed events, so `event:`
/// and `id:` fields are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseEvent {
    pub data: String,
}

/// SSE parser state.
#[derive(Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    /// Create a new SSE parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed incoming bytes and return every event they complete.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        // CR only ever appears as part of a line ending; JSON payloads escape it.
        self.buffer
            .extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = find_blank_line(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = parse_block(&block[..pos]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is left once the byte stream has ended.
    ///
    /// Some servers close the connection right after the last `data:` line
    /// without the terminating blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let block = std::mem::take(&mut self.buffer);
        parse_block(&block)
    }
}

fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &[u8]) -> Option<SseEvent> {
    let text = String::from_utf8_lossy(block);
    let mut data: Option<String> = None;

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        if field == "data" {
            match data {
                Some(ref mut data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => data = Some(value.to_string()),
            }
        }
    }

    data.map(|data| SseEvent { data })
}
