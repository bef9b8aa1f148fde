// MIT License - Copyright (c) 2026 Peter Wright

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{EnvisalinkError, Result};
use crate::protocol::{encode_frame, Command};

/// Writes outbound command frames to the connection.
///
/// The write half sits behind an async mutex so concurrent callers
/// serialize at this boundary and frames never interleave on the wire.
/// One sender exists per connection; a send against a closed connection
/// propagates the failure to the caller without retrying.
#[derive(Clone)]
pub struct CommandSender {
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl CommandSender {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Encode and write a command, with its trailing checksum by default.
    pub async fn send(&self, command: &Command) -> Result<()> {
        self.send_frame(command.encode(true)).await
    }

    /// Write a raw code+data frame, optionally without a checksum.
    pub async fn send_raw(&self, code: &str, data: &str, with_checksum: bool) -> Result<()> {
        self.send_frame(encode_frame(code, data, with_checksum)).await
    }

    async fn send_frame(&self, frame: Vec<u8>) -> Result<()> {
        debug!("TX > {}", String::from_utf8_lossy(&frame).trim_end());
        let mut writer = self.writer.lock().await;
        writer
            .write_all(&frame)
            .await
            .map_err(EnvisalinkError::Io)?;
        writer.flush().await.map_err(EnvisalinkError::Io)?;
        Ok(())
    }
}
