//! Client side of the request/response protocol

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{decode_packet, encode_packet, frame_codec, ErrorKind, Packet, PROTOCOL_VERSION};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Accepts `host` or `host:port`; a bare host gets `port`
pub fn server_address(address: &str, port: u16) -> String {
    if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", address, port)
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] bincode::Error),
    /// The server refused a login or command
    #[error("{message}")]
    Rejected { kind: ErrorKind, message: String },
    #[error("disconnected: {0}")]
    Disconnected(String),
    #[error("unexpected packet from server: {0}")]
    UnexpectedPacket(String),
}

impl ClientError {
    /// Whether the session cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        match self {
            ClientError::Rejected { kind, .. } => kind.is_fatal(),
            _ => true,
        }
    }
}

/// A successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub player_id: String,
    pub team_name: String,
    pub existing: bool,
}

/// Connection to a game server. Generic over the byte stream so tests can
/// drive it with scripted IO.
pub struct Client<T = TcpStream> {
    transport: Framed<T, LengthDelimitedCodec>,
    player_id: Option<String>,
}

impl Client<TcpStream> {
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        info!("Connecting to {}...", addr);
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::from_transport(stream))
    }
}

impl<T> Client<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn from_transport(io: T) -> Self {
        Self {
            transport: Framed::new(io, frame_codec()),
            player_id: None,
        }
    }

    /// Player id handed out by the last successful login
    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    async fn send_packet(&mut self, packet: &Packet) -> Result<(), ClientError> {
        let data = encode_packet(packet)?;
        self.transport.send(data).await?;
        Ok(())
    }

    async fn receive_packet(&mut self) -> Result<Packet, ClientError> {
        match self.transport.next().await {
            Some(frame) => Ok(decode_packet(&frame?)?),
            None => Err(ClientError::Disconnected("connection closed by server".into())),
        }
    }

    /// Sends one request and waits for its reply. Server-side errors and
    /// disconnect notices become `Err`.
    async fn request(&mut self, packet: &Packet) -> Result<Packet, ClientError> {
        self.send_packet(packet).await?;
        match self.receive_packet().await? {
            Packet::Error { kind, message } => Err(ClientError::Rejected { kind, message }),
            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                Err(ClientError::Disconnected(reason))
            }
            reply => Ok(reply),
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<Login, ClientError> {
        let packet = Packet::Login {
            client_version: PROTOCOL_VERSION,
            username: username.to_string(),
            password: password.to_string(),
        };

        match self.request(&packet).await? {
            Packet::Joined {
                player_id,
                team_name,
                existing,
            } => {
                info!("Logged in as {} on team {}", username, team_name);
                self.player_id = Some(player_id.clone());
                Ok(Login {
                    player_id,
                    team_name,
                    existing,
                })
            }
            other => Err(ClientError::UnexpectedPacket(format!("{:?}", other))),
        }
    }

    /// Runs one command and returns the server's response text
    pub async fn send_command(&mut self, fields: Vec<String>) -> Result<String, ClientError> {
        let player_id = self.player_id.clone().ok_or_else(|| ClientError::Rejected {
            kind: ErrorKind::UnknownPlayer,
            message: "not logged in".to_string(),
        })?;

        debug!("Sending command {:?}", fields);
        match self.request(&Packet::Command { player_id, fields }).await? {
            Packet::Response { text } => Ok(text),
            other => Err(ClientError::UnexpectedPacket(format!("{:?}", other))),
        }
    }

    /// Tells the server this connection is done
    pub async fn disconnect(mut self) -> Result<(), ClientError> {
        self.send_packet(&Packet::Disconnect).await?;
        info!("Disconnected from server");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio_test::io::Builder;

    /// Bytes of one length-delimited frame carrying `packet`
    pub(crate) fn frame(packet: &Packet) -> Vec<u8> {
        let body = bincode::serialize(packet).unwrap();
        let mut bytes = (body.len() as u32).to_be_bytes().to_vec();
        bytes.extend(body);
        bytes
    }

    pub(crate) fn login_request(username: &str, password: &str) -> Packet {
        Packet::Login {
            client_version: PROTOCOL_VERSION,
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub(crate) fn joined(player_id: &str) -> Packet {
        Packet::Joined {
            player_id: player_id.to_string(),
            team_name: "Team-1".to_string(),
            existing: false,
        }
    }

    pub(crate) fn command(player_id: &str, line: &str) -> Packet {
        Packet::Command {
            player_id: player_id.to_string(),
            fields: shared::split_fields(line),
        }
    }

    #[tokio::test]
    async fn test_login_stores_player_id() {
        let io = Builder::new()
            .write(&frame(&login_request("ahab", "whale")))
            .read(&frame(&joined("0123456789abcdef")))
            .build();
        let mut client = Client::from_transport(io);

        let login = client.login("ahab", "whale").await.unwrap();
        assert_eq!(login.player_id, "0123456789abcdef");
        assert_eq!(login.team_name, "Team-1");
        assert!(!login.existing);
        assert_eq!(client.player_id(), Some("0123456789abcdef"));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let rejection = Packet::Error {
            kind: ErrorKind::Authentication,
            message: "incorrect game password".to_string(),
        };
        let io = Builder::new()
            .write(&frame(&login_request("ahab", "")))
            .read(&frame(&rejection))
            .build();
        let mut client = Client::from_transport(io);

        let err = client.login("ahab", "").await.unwrap_err();
        assert_eq!(err.to_string(), "incorrect game password");
        assert!(!err.is_fatal());
        assert_eq!(client.player_id(), None);
    }

    #[tokio::test]
    async fn test_send_command_round_trip() {
        let io = Builder::new()
            .write(&frame(&login_request("ahab", "")))
            .read(&frame(&joined("aa")))
            .write(&frame(&command("aa", "points")))
            .read(&frame(&Packet::Response {
                text: "Your team has 10 deployment points".to_string(),
            }))
            .build();
        let mut client = Client::from_transport(io);
        client.login("ahab", "").await.unwrap();

        let text = client
            .send_command(shared::split_fields("points"))
            .await
            .unwrap();
        assert_eq!(text, "Your team has 10 deployment points");
    }

    #[tokio::test]
    async fn test_command_before_login_fails_locally() {
        let io = Builder::new().build();
        let mut client = Client::from_transport(io);
        let err = client.send_command(vec!["map".to_string()]).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_server_full_is_reported_as_disconnect() {
        let io = Builder::new()
            .write(&frame(&login_request("ahab", "")))
            .read(&frame(&Packet::Disconnected {
                reason: "Server full".to_string(),
            }))
            .build();
        let mut client = Client::from_transport(io);

        let err = client.login("ahab", "").await.unwrap_err();
        assert!(matches!(err, ClientError::Disconnected(ref r) if r == "Server full"));
    }

    #[tokio::test]
    async fn test_closed_connection() {
        let io = Builder::new()
            .write(&frame(&login_request("ahab", "")))
            .build();
        let mut client = Client::from_transport(io);
        let err = client.login("ahab", "").await.unwrap_err();
        assert!(matches!(err, ClientError::Disconnected(_)));
    }

    #[test]
    fn test_server_address() {
        assert_eq!(server_address("10.0.0.5", 51832), "10.0.0.5:51832");
        assert_eq!(server_address("10.0.0.5:4000", 51832), "10.0.0.5:4000");
        assert_eq!(server_address("localhost", 9), "localhost:9");
    }

    #[test]
    fn test_error_fatality() {
        let unknown = ClientError::Rejected {
            kind: ErrorKind::UnknownPlayer,
            message: "unknown player".to_string(),
        };
        let validation = ClientError::Rejected {
            kind: ErrorKind::Validation,
            message: "bad".to_string(),
        };
        assert!(unknown.is_fatal());
        assert!(!validation.is_fatal());
        assert!(ClientError::Disconnected("gone".to_string()).is_fatal());
    }
}
