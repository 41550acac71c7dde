use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::codec::LengthDelimitedCodec;

pub mod base26;
pub mod coordinate;

pub use coordinate::{Coordinate, ParseError, Target};

/// TCP port the game server listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 51832;
pub const PROTOCOL_VERSION: u32 = 1;
/// Largest frame either side will accept. Rendered maps are the biggest
/// payload: a 255x255 board renders to just under 200 KiB.
pub const MAX_FRAME_LENGTH: usize = 256 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    Login {
        client_version: u32,
        username: String,
        password: String,
    },
    Command {
        player_id: String,
        fields: Vec<String>,
    },
    Disconnect,

    Joined {
        player_id: String,
        team_name: String,
        existing: bool,
    },
    Response {
        text: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
    Disconnected {
        reason: String,
    },
}

/// Error category carried back to the client alongside the message text
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Validation,
    Precondition,
    Parse,
    /// The player id is not known to the server; the session cannot continue
    UnknownPlayer,
    Protocol,
}

impl ErrorKind {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::UnknownPlayer)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::Validation => "validation",
            ErrorKind::Precondition => "precondition",
            ErrorKind::Parse => "parse",
            ErrorKind::UnknownPlayer => "unknown player",
            ErrorKind::Protocol => "protocol",
        };
        f.write_str(name)
    }
}

/// Frame codec shared by server and client: 4-byte length prefix, bincode body
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec()
}

pub fn encode_packet(packet: &Packet) -> Result<Bytes, bincode::Error> {
    Ok(Bytes::from(bincode::serialize(packet)?))
}

pub fn decode_packet(frame: &[u8]) -> Result<Packet, bincode::Error> {
    bincode::deserialize(frame)
}

/// Splits a typed command line into whitespace-delimited fields
pub fn split_fields(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
