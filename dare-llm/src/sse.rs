/*!
 * Server-sent events line reassembly
 *
 * The HTTP body arrives as byte chunks with no regard for line or UTF-8
 * boundaries. Lines are cut on `\n` at the byte level (a newline byte never
 * occurs inside a multi-byte character) and only complete lines are decoded.
 */

/// Accumulates body bytes and yields the payload of each `data:` line.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a body chunk, returning the `data:` payloads it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        let mut line_start = 0;
        while let Some(offset) = self.buffer[line_start..].iter().position(|&b| b == b'\n') {
            let line_end = line_start + offset;
            if let Some(data) = data_payload(&self.buffer[line_start..line_end]) {
                payloads.push(data);
            }
            line_start = line_end + 1;
        }
        self.buffer.drain(..line_start);

        payloads
    }

    /// Flush an unterminated last line when the body ends.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&rest)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let data = line.strip_prefix(b"data:")?;
    let data = data.strip_prefix(b" ").unwrap_or(data);
    Some(String::from_utf8_lossy(data).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payloads_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert_eq!(decoder.push(b":1}\n\ndata: [DONE]\n"), vec!["{\"a\":1}", "[DONE]"]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keep-alive\r\nevent: message\r\ndata:{}\r\n\r\n");
        assert_eq!(payloads, vec!["{}"]);
    }

    #[test]
    fn test_multibyte_character_split_between_chunks() {
        let line = "data: {\"content\":\"🚀\"}\n".as_bytes();
        let (head, tail) = line.split_at(line.len() - 5);

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(head).is_empty());
        assert_eq!(decoder.push(tail), vec!["{\"content\":\"🚀\"}"]);
    }

    #[test]
    fn test_unterminated_last_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: [DONE]").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("[DONE]"));
    }
}
