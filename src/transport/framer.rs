// MIT License - Copyright (c) 2026 Peter Wright

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{EnvisalinkError, Result};
use crate::protocol::TERMINATOR;

/// Splits the inbound byte stream into CRLF-terminated protocol lines.
///
/// Exactly one `read_line` call may be in flight at a time; the session
/// re-arms the next read only after the previous line has been fully
/// dispatched. Bytes past the last complete terminator are buffered until
/// the next read.
pub struct LineFramer<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineFramer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(256),
        }
    }

    /// Read the next full line, with the terminator stripped.
    ///
    /// Suspends until a terminated line is available. A connection close
    /// surfaces as [`EnvisalinkError::ConnectionClosed`], never as data;
    /// bytes of an unterminated trailing fragment are discarded with it.
    pub async fn read_line(&mut self) -> Result<String> {
        loop {
            if let Some(pos) = find_terminator(&self.buffer) {
                let mut line: Vec<u8> = self.buffer.drain(..pos + TERMINATOR.len()).collect();
                line.truncate(pos);
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }

            let mut chunk = [0u8; 4096];
            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                return Err(EnvisalinkError::ConnectionClosed);
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }
}

fn find_terminator(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_reads_single_line() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut framer = LineFramer::new(rx);

        tx.write_all(b"5053C9\r\n").await.unwrap();
        assert_eq!(framer.read_line().await.unwrap(), "5053C9");
    }

    #[tokio::test]
    async fn test_splits_multiple_lines_in_one_read() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut framer = LineFramer::new(rx);

        tx.write_all(b"first\r\nsecond\r\n").await.unwrap();
        assert_eq!(framer.read_line().await.unwrap(), "first");
        assert_eq!(framer.read_line().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_buffers_partial_line_across_reads() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut framer = LineFramer::new(rx);

        tx.write_all(b"609001").await.unwrap();
        tx.write_all(b"5A\r").await.unwrap();
        tx.write_all(b"\n").await.unwrap();
        assert_eq!(framer.read_line().await.unwrap(), "6090015A");
    }

    #[tokio::test]
    async fn test_close_signals_connection_closed() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut framer = LineFramer::new(rx);

        tx.write_all(b"unterminated").await.unwrap();
        drop(tx);
        assert!(matches!(
            framer.read_line().await,
            Err(EnvisalinkError::ConnectionClosed)
        ));
    }
}
