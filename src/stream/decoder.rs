/// Incremental UTF-8 decoder.
///
/// Bytes of a multi-byte character split across chunks are held back until
/// the rest arrives. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, appending complete characters to `out`.
    pub fn decode_into(&mut self, chunk: &[u8], out: &mut String) {
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(s) => {
                    out.push_str(s);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid = start + e.valid_up_to();
                    if let Ok(s) = std::str::from_utf8(&self.pending[start..valid]) {
                        out.push_str(s);
                    }
                    match e.error_len() {
                        Some(n) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid + n;
                        }
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            start = valid;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
    }

    /// Flush at end of stream. A dangling partial sequence becomes U+FFFD.
    pub fn finish_into(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            self.pending.clear();
            out.push(char::REPLACEMENT_CHARACTER);
        }
    }
}

/// Turns a byte stream into complete `\n`-terminated lines.
///
/// A line split across chunks is buffered until its newline arrives.
#[derive(Debug, Default)]
pub struct LineDecoder {
    utf8: Utf8Decoder,
    partial: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one chunk and return every line it completed (without the `\n`).
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let scanned = self.partial.len();
        self.utf8.decode_into(chunk, &mut self.partial);
        self.take_lines(scanned)
    }

    /// Flush whatever is left once the stream ends.
    pub fn finish(&mut self) -> Vec<String> {
        let scanned = self.partial.len();
        self.utf8.finish_into(&mut self.partial);
        let mut lines = self.take_lines(scanned);
        if !self.partial.is_empty() {
            lines.push(std::mem::take(&mut self.partial));
        }
        lines
    }

    /// Split off complete lines. `partial[..scanned]` is known to hold no `\n`.
    fn take_lines(&mut self, scanned: usize) -> Vec<String> {
        let Some(last) = self.partial[scanned..].rfind('\n').map(|i| scanned + i) else {
            return Vec::new();
        };
        let rest = self.partial.split_off(last + 1);
        let done = std::mem::replace(&mut self.partial, rest);
        done.split_terminator('\n').map(str::to_owned).collect()
    }
}
