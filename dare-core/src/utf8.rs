//! Incremental UTF-8 decoding for byte fragments.
//!
//! Byte chunks from a network body may end in the middle of a multi-byte
//! character. The incomplete tail (at most 3 bytes) is carried over to the
//! next chunk instead of being replaced.

const REPLACEMENT: &str = "\u{FFFD}";

#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    /// Decode as much of `bytes` (prefixed by any carried tail) as possible.
    pub(crate) fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.carry);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // valid_up_to guarantees this prefix is well formed
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match err.error_len() {
                        Some(bad) => {
                            out.push_str(REPLACEMENT);
                            rest = &after[bad..];
                        }
                        None => {
                            self.carry = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush a dangling partial sequence at end of input.
    pub(crate) fn finish(&mut self) -> String {
        if self.carry.is_empty() {
            return String::new();
        }
        let tail = std::mem::take(&mut self.carry);
        String::from_utf8_lossy(&tail).into_owned()
    }
}
