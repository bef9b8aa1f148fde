// MIT License - Copyright (c) 2026 Peter Wright

use crate::error::{EnvisalinkError, Result};

/// Wire terminator for both directions.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Compute the TPI checksum over a command's code and data bytes.
///
/// The checksum is the sum of every byte of `code` then `data`, modulo 256,
/// rendered as two uppercase hex digits. The result is truncated to the
/// last two characters so a formatting overflow can never widen the frame.
pub fn checksum(code: &str, data: &str) -> String {
    let sum: u32 = code.bytes().chain(data.bytes()).map(u32::from).sum();
    let hex = format!("{:02X}", sum % 256);
    hex[hex.len() - 2..].to_string()
}

/// A single inbound protocol line, split into its fixed-width fields.
///
/// Wire format: `CCC` (3-digit code) + payload + `XX` (2-hex-digit
/// checksum), already stripped of the CRLF terminator by the framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub code: u16,
    pub parameters: String,
    pub checksum: String,
}

impl RawLine {
    /// Parse a terminator-stripped line into code, parameters and checksum.
    pub fn parse(line: &str) -> Result<Self> {
        if line.len() < 5 {
            return Err(EnvisalinkError::MalformedLine {
                details: format!("line too short ({} bytes): {:?}", line.len(), line),
            });
        }
        // .get() also rejects lines whose field boundaries fall inside a
        // multi-byte character (the protocol is ASCII-only).
        let (Some(code_str), Some(parameters), Some(checksum)) = (
            line.get(..3),
            line.get(3..line.len() - 2),
            line.get(line.len() - 2..),
        ) else {
            return Err(EnvisalinkError::MalformedLine {
                details: format!("non-ASCII field boundary: {:?}", line),
            });
        };
        let code: u16 = code_str.parse().map_err(|_| EnvisalinkError::MalformedLine {
            details: format!("non-numeric response code: {:?}", code_str),
        })?;
        let parameters = parameters.to_string();
        let checksum = checksum.to_string();
        Ok(Self {
            code,
            parameters,
            checksum,
        })
    }

    /// Whether the trailing checksum matches the code+parameters bytes.
    ///
    /// Inbound checksums are accepted without verification by default;
    /// see [`SessionConfig::verify_inbound_checksum`](crate::config::SessionConfig).
    pub fn checksum_valid(&self) -> bool {
        checksum(&format!("{:03}", self.code), &self.parameters) == self.checksum
    }
}

/// Commands that can be sent to the panel interface.
///
/// # Login sequence
///
/// After TCP connect the panel immediately sends a login challenge
/// (response code 505). The client answers based on the challenge value:
/// `3` → send `NetworkLogin` with the configured password, `1` → already
/// logged in, send `StatusReport`, `0` → password rejected (fatal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `001` — Request a full status report (also used as a refresh/poll).
    StatusReport,
    /// `005<password>` — Authenticate with the interface module password.
    NetworkLogin { password: String },
    /// `0301` — Arm partition 1 in away mode.
    ArmAway,
    /// `0311` — Arm partition 1 in stay mode.
    ArmStay,
    /// `0331<code>` — Arm partition 1, supplying a usercode.
    ArmWithCode { code: String },
    /// `0401<code>` — Disarm partition 1 with a usercode.
    Disarm { code: String },
    /// Raw code + data (for any unlisted commands).
    Raw { code: String, data: String },
}

impl Command {
    /// The 3-digit command code.
    pub fn code(&self) -> String {
        match self {
            Command::StatusReport => "001".to_string(),
            Command::NetworkLogin { .. } => "005".to_string(),
            Command::ArmAway => "030".to_string(),
            Command::ArmStay => "031".to_string(),
            Command::ArmWithCode { .. } => "033".to_string(),
            Command::Disarm { .. } => "040".to_string(),
            Command::Raw { code, .. } => code.clone(),
        }
    }

    /// The payload following the command code.
    pub fn data(&self) -> String {
        match self {
            Command::StatusReport => String::new(),
            Command::NetworkLogin { password } => password.clone(),
            Command::ArmAway => "1".to_string(),
            Command::ArmStay => "1".to_string(),
            Command::ArmWithCode { code } => format!("1{}", code),
            Command::Disarm { code } => format!("1{}", code),
            Command::Raw { data, .. } => data.clone(),
        }
    }

    /// Build the full wire frame: `code + data [+ checksum] + CRLF`.
    pub fn encode(&self, with_checksum: bool) -> Vec<u8> {
        encode_frame(&self.code(), &self.data(), with_checksum)
    }
}

/// Build a wire frame from raw code and data strings.
pub fn encode_frame(code: &str, data: &str, with_checksum: bool) -> Vec<u8> {
    let mut frame = String::with_capacity(code.len() + data.len() + 4);
    frame.push_str(code);
    frame.push_str(data);
    if with_checksum {
        frame.push_str(&checksum(code, data));
    }
    let mut bytes = frame.into_bytes();
    bytes.extend_from_slice(TERMINATOR);
    bytes
}
