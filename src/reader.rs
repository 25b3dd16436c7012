//! Chunked line reader.
//!
//! Reads raw bytes from a stream in fixed-size chunks and hands out one logical
//! line per call, no matter how the chunks line up with the newlines.

use std::io::{self, ErrorKind, Read};
use std::mem;

/// Default number of bytes requested from the stream per read.
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Reconstructs newline-terminated lines from a byte stream.
///
/// The reader owns the bytes it has read past the last returned newline, so
/// exactly one `LineReader` should be bound to a stream at a time.
#[derive(Debug)]
pub struct LineReader<R> {
    stream: R,
    pending: Vec<u8>,
    chunk_size: usize,
    eof: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(stream: R) -> Self {
        Self::with_chunk_size(stream, DEFAULT_CHUNK_SIZE)
    }

    /// A zero chunk size is bumped to one byte.
    pub fn with_chunk_size(stream: R, chunk_size: usize) -> Self {
        Self {
            stream,
            pending: Vec::new(),
            chunk_size: chunk_size.max(1),
            eof: false,
        }
    }

    /// Returns the next line without its trailing newline, or `None` once the
    /// stream is exhausted. After the first `None` the stream is never read
    /// again and every later call returns `None` too.
    ///
    /// Bytes after the last newline are returned as a final line. Invalid
    /// UTF-8 is replaced rather than rejected.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut scanned = 0;
        loop {
            if let Some(offset) = self.pending[scanned..].iter().position(|&b| b == b'\n') {
                let newline = scanned + offset;
                let rest = self.pending.split_off(newline + 1);
                let mut line = mem::replace(&mut self.pending, rest);
                line.truncate(newline);
                return Ok(Some(decode(line)));
            }
            scanned = self.pending.len();

            if self.eof {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(decode(mem::take(&mut self.pending))));
            }

            self.fill()?;
        }
    }

    /// Binds the reader to another stream, dropping any buffered bytes and the
    /// end-of-stream flag. The previous stream is handed back.
    pub fn rebind(&mut self, stream: R) -> R {
        self.pending.clear();
        self.eof = false;
        mem::replace(&mut self.stream, stream)
    }

    /// Appends one chunk to the pending bytes, or marks end of stream.
    fn fill(&mut self) -> io::Result<()> {
        let start = self.pending.len();
        // Vec growth is amortised doubling; only the tail is zeroed per read.
        self.pending.resize(start + self.chunk_size, 0);
        loop {
            match self.stream.read(&mut self.pending[start..]) {
                Ok(n) => {
                    self.pending.truncate(start + n);
                    if n == 0 {
                        log::debug!("input stream reached end of file");
                        self.eof = true;
                    }
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.pending.truncate(start);
                    return Err(e);
                }
            }
        }
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
