//! Error types for command handling and server startup

use shared::{ErrorKind, ParseError};
use std::io;
use thiserror::Error;

/// A command was refused. Returned to the originating client as text; game
/// state is left untouched whenever one of these is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Precondition(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("unknown player id '{0}', please log in again")]
    UnknownPlayer(String),
}

impl GameError {
    pub fn authentication(message: impl Into<String>) -> Self {
        GameError::Authentication(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        GameError::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        GameError::Precondition(message.into())
    }

    /// Wire category for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::Authentication(_) => ErrorKind::Authentication,
            GameError::Validation(_) => ErrorKind::Validation,
            GameError::Precondition(_) => ErrorKind::Precondition,
            GameError::Parse(_) => ErrorKind::Parse,
            GameError::UnknownPlayer(_) => ErrorKind::UnknownPlayer,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening port could not be bound; the server cannot start
    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid game configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed packet: {0}")]
    Codec(#[from] bincode::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(GameError::authentication("x").kind(), ErrorKind::Authentication);
        assert_eq!(GameError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(GameError::precondition("x").kind(), ErrorKind::Precondition);
        assert_eq!(GameError::from(ParseError::Empty).kind(), ErrorKind::Parse);
        assert_eq!(
            GameError::UnknownPlayer("abc".to_string()).kind(),
            ErrorKind::UnknownPlayer
        );
    }

    #[test]
    fn test_error_messages_are_plain_text() {
        let err = GameError::precondition("not enough deployment points");
        assert_eq!(err.to_string(), "not enough deployment points");

        let err = GameError::from(ParseError::MissingRow("G".to_string()));
        assert_eq!(err.to_string(), "coordinate 'G' is missing a row number (e.g. G7)");
    }

    #[test]
    fn test_bind_error_mentions_address() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:51832".to_string(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert!(err.to_string().contains("0.0.0.0:51832"));
    }
}
