//! UTF-8 decoding of byte streams that may split characters across reads.

/// Carries an incomplete trailing UTF-8 sequence over to the next chunk.
#[derive(Debug, Default)]
pub struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    /// Decode `chunk`, prefixed by whatever was left over. Invalid bytes
    /// become U+FFFD; an incomplete sequence at the end is held back.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }

        out
    }

    /// End of input: a held-back partial character becomes U+FFFD.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending.clear();
        Some(char::REPLACEMENT_CHARACTER.to_string())
    }

    /// Bytes held back waiting for the rest of a character.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        let mut carry = Utf8Carry::default();
        assert_eq!(carry.decode(b"hello\r\n"), "hello\r\n");
        assert_eq!(carry.pending(), 0);
    }

    #[test]
    fn split_character_is_joined() {
        let bytes = "é→".as_bytes();
        let mut carry = Utf8Carry::default();
        assert_eq!(carry.decode(&bytes[..1]), "");
        assert_eq!(carry.pending(), 1);
        assert_eq!(carry.decode(&bytes[1..3]), "é");
        assert_eq!(carry.decode(&bytes[3..]), "→");
        assert_eq!(carry.pending(), 0);
    }

    #[test]
    fn truncated_tail_is_replaced_at_end_of_input() {
        let mut carry = Utf8Carry::default();
        assert_eq!(carry.decode(b"ok\xe2\x86"), "ok");
        assert_eq!(carry.finish().as_deref(), Some("\u{FFFD}"));
        assert_eq!(carry.finish(), None);
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut carry = Utf8Carry::default();
        assert_eq!(carry.decode(b"a\xffb"), "a\u{FFFD}b");
    }
}
