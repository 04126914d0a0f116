use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced. Comments and the other fields are
/// skipped, and an event without any `data` line is dropped entirely.
pub struct Sse {
    buf: Vec<u8>,
    // Bytes of `buf` already known to hold no boundary.
    scanned: usize,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain complete events already buffered before reading more.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                // Abort if no more data available, a trailing partial
                // event is discarded.
                return Ok(None);
            };
            self.buf.extend_from_slice(&bytes);
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        // event         = *( comment / field ) end-of-line
        // comment       = colon *any-char end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        // end-of-line   = ( cr lf / lf )
        loop {
            // A boundary may straddle the previously scanned tail.
            let from = self.scanned.saturating_sub(3);
            let Some((end, boundary_len)) = find_boundary(&self.buf, from)
            else {
                self.scanned = self.buf.len();
                return Ok(None);
            };
            let block: Vec<u8> = self.buf.drain(0..end + boundary_len).collect();
            self.scanned = 0;
            let Ok(block) = str::from_utf8(&block[..end]) else {
                return Err(Error::InvalidPayload);
            };

            let mut data: Option<String> = None;
            for line in block.lines() {
                if line.starts_with(':') {
                    continue;
                }
                let (field, value) = match line.split_once(':') {
                    Some((field, value)) => {
                        (field, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                if field != "data" {
                    continue;
                }
                match &mut data {
                    Some(data) => {
                        data.push('\n');
                        data.push_str(value);
                    }
                    None => data = Some(value.to_owned()),
                }
            }

            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
    }
}

/// Finds the first blank line at or after `from`, returning its offset and
/// the length of the line breaks that make it up.
fn find_boundary(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut idx = from;
    while idx < buf.len() {
        if buf[idx..].starts_with(b"\n\n") {
            return Some((idx, 2));
        }
        if buf[idx..].starts_with(b"\r\n\r\n") {
            return Some((idx, 4));
        }
        idx += 1;
    }
    None
}
