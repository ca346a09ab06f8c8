//! Ordered chunk buffer for one child output stream.

use tokio::io::{AsyncRead, AsyncReadExt};

/// Size of a single read from a child pipe.
const READ_CHUNK: usize = 8 * 1024;

/// Chunks collected from a stream in arrival order.
///
/// `len` always equals the sum of the lengths of `chunks`.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    chunks: Vec<Vec<u8>>,
    len: usize,
}

impl Accumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty chunks are ignored.
    pub fn push(&mut self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.len += chunk.len();
        self.chunks.push(chunk);
    }

    /// Total bytes pushed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of chunks pushed so far.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Concatenate all chunks into one buffer sized from the running length.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for chunk in self.chunks {
            out.extend_from_slice(&chunk);
        }
        debug_assert_eq!(out.len(), self.len);
        out
    }

    /// Concatenate and decode as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn into_text(self) -> String {
        match String::from_utf8(self.into_bytes()) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }

    /// Read from `reader` until EOF, pushing each read as a chunk.
    ///
    /// Chunks read before an error or before the future is dropped are kept.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error reported by the reader.
    pub async fn read_from<R>(&mut self, reader: &mut R) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                return Ok(());
            }
            self.push(buf[..n].to_vec());
        }
    }

    /// Drain `reader` to EOF into a new accumulator.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error reported by the reader.
    pub async fn drain<R>(mut reader: R) -> std::io::Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut acc = Self::new();
        acc.read_from(&mut reader).await?;
        Ok(acc)
    }
}
