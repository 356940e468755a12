//! zlib-stream transport decompression
//!
//! With `compress=zlib-stream` the server keeps one deflate stream open for
//! the whole connection. Each message ends with a sync flush (`00 00 FF FF`);
//! a message may span several binary frames.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::GatewayResult;

const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

const CHUNK_SIZE: usize = 32 * 1024;

/// Inflate context for one connection
///
/// Must be replaced whenever the socket is, since the deflate window is shared
/// across every message on a connection.
pub struct ZlibStreamInflater {
    inflate: Decompress,
    buffer: Vec<u8>,
}

impl ZlibStreamInflater {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflate: Decompress::new(true),
            buffer: Vec::new(),
        }
    }

    /// Feed one binary frame
    ///
    /// Returns the inflated message once its final frame has arrived,
    /// `None` while more frames are expected.
    pub fn push(&mut self, frame: &[u8]) -> GatewayResult<Option<Vec<u8>>> {
        self.buffer.extend_from_slice(frame);
        if !self.buffer.ends_with(&ZLIB_SUFFIX) {
            return Ok(None);
        }

        let mut output = Vec::with_capacity(self.buffer.len() * 4);
        let mut offset = 0;

        loop {
            if output.capacity() == output.len() {
                output.reserve(CHUNK_SIZE);
            }

            let in_before = self.inflate.total_in();
            let out_before = self.inflate.total_out();
            let status =
                self.inflate
                    .decompress_vec(&self.buffer[offset..], &mut output, FlushDecompress::Sync);
            let status = match status {
                Ok(status) => status,
                Err(e) => {
                    self.buffer.clear();
                    return Err(e.into());
                }
            };
            let consumed = (self.inflate.total_in() - in_before) as usize;
            let produced = self.inflate.total_out() - out_before;
            offset += consumed;

            if matches!(status, Status::StreamEnd) {
                break;
            }
            // A full output buffer may hide more data; otherwise stop once the
            // input is drained or the inflater stalls
            let output_full = output.len() == output.capacity();
            if !output_full && (offset >= self.buffer.len() || (consumed == 0 && produced == 0)) {
                break;
            }
        }

        self.buffer.clear();
        Ok(Some(output))
    }

    /// Bytes buffered for an incomplete message
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for ZlibStreamInflater {
    fn default() -> Self {
        Self::new()
    }
}
