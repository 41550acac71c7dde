//! Server network layer: TCP accept loop, per-connection request handling and
//! shutdown coordination

use crate::commands::Dispatcher;
use crate::config::{GameConfig, SessionTimeouts, DEPLOYMENT_INTERVAL};
use crate::error::{GameError, ServerError};
use crate::game::Game;
use crate::scheduler::run_deployment_scheduler;
use crate::sessions::{SessionId, SessionManager};
use crate::team::PlayerId;
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{decode_packet, encode_packet, frame_codec, ErrorKind, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

type Transport = Framed<TcpStream, LengthDelimitedCodec>;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    ConnectionClosed { session_id: SessionId },
    /// A client shut the game down; its reply has already been sent
    Shutdown,
}

/// Accepts connections and serves the shared game
///
/// The server owns the listening socket and the shared state every
/// connection task works against. Its run loop accepts connections, frees
/// the slots of closed or silent sessions and stops on an admin shutdown.
pub struct Server {
    /// Listening TCP socket
    listener: TcpListener,
    /// The one game, guarded by a single lock
    game: Arc<Mutex<Game>>,
    /// Open connections and the connection capacity
    sessions: Arc<RwLock<SessionManager>>,
    /// Command table shared by all connection tasks
    dispatcher: Arc<Dispatcher>,
    /// Period of the deployment point grant
    deployment_interval: Duration,
    /// How long silent connections are kept open
    session_timeouts: SessionTimeouts,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    /// Validates `config` and binds the listening socket. Failing to bind is
    /// reported as [`ServerError::Bind`].
    pub async fn bind(addr: &str, config: GameConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let max_sessions = config.max_players;

        Ok(Server {
            listener,
            game: Arc::new(Mutex::new(Game::new(config))),
            sessions: Arc::new(RwLock::new(SessionManager::new(max_sessions))),
            dispatcher: Arc::new(Dispatcher::new()),
            deployment_interval: DEPLOYMENT_INTERVAL,
            session_timeouts: SessionTimeouts::default(),
            server_tx,
            server_rx,
        })
    }

    /// Overrides how often teams receive a deployment point
    pub fn with_deployment_interval(mut self, period: Duration) -> Self {
        self.deployment_interval = period;
        self
    }

    /// Overrides how long silent connections are kept open
    pub fn with_session_timeouts(mut self, timeouts: SessionTimeouts) -> Self {
        self.session_timeouts = timeouts;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared game, for inspection
    pub fn game(&self) -> Arc<Mutex<Game>> {
        Arc::clone(&self.game)
    }

    /// Serves clients until a successful `shutdown` command.
    ///
    /// Spawns the deployment scheduler, then loops over new connections,
    /// messages from connection tasks and the periodic sweep for timed out
    /// sessions.
    pub async fn run(mut self) -> Result<(), ServerError> {
        let scheduler = tokio::spawn(run_deployment_scheduler(
            Arc::clone(&self.game),
            self.deployment_interval,
        ));

        let mut session_check = interval(self.session_timeouts.check_interval());
        session_check.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.accept(stream, addr).await,
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                },

                _ = session_check.tick() => {
                    let expired = self.sessions.write().await.timed_out(&self.session_timeouts);
                    if !expired.is_empty() {
                        debug!("Evicted {} silent connections", expired.len());
                    }
                },

                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::ConnectionClosed { session_id }) => {
                            self.sessions.write().await.close(session_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },
            }
        }

        {
            let mut game = self.game.lock().await;
            game.end();
            info!(
                "Game ended after {}s with {} players",
                game.uptime().as_secs(),
                game.num_players()
            );
        }
        scheduler.abort();
        Ok(())
    }

    async fn accept(&self, stream: TcpStream, addr: SocketAddr) {
        let opened = self.sessions.write().await.open(addr);
        let mut transport = Framed::new(stream, frame_codec());

        let Some((session_id, evicted)) = opened else {
            warn!("Rejecting connection from {}: server full", addr);
            tokio::spawn(async move {
                let reply = Packet::Disconnected {
                    reason: "Server full".to_string(),
                };
                if let Err(e) = send_packet(&mut transport, &reply).await {
                    debug!("Failed to notify {} that the server is full: {}", addr, e);
                }
            });
            return;
        };

        let connection = Connection {
            session_id,
            addr,
            transport,
            evicted,
            game: Arc::clone(&self.game),
            sessions: Arc::clone(&self.sessions),
            dispatcher: Arc::clone(&self.dispatcher),
            server_tx: self.server_tx.clone(),
        };
        tokio::spawn(connection.run());
    }
}

async fn send_packet(transport: &mut Transport, packet: &Packet) -> Result<(), ServerError> {
    let data = encode_packet(packet)?;
    transport.send(data).await?;
    Ok(())
}

fn error_packet(error: &GameError) -> Packet {
    Packet::Error {
        kind: error.kind(),
        message: error.to_string(),
    }
}

/// One client connection. Requests are answered strictly in order, one reply
/// frame per request frame.
struct Connection {
    session_id: SessionId,
    addr: SocketAddr,
    transport: Transport,
    /// Signalled when the session manager evicts this connection
    evicted: Arc<Notify>,
    game: Arc<Mutex<Game>>,
    sessions: Arc<RwLock<SessionManager>>,
    dispatcher: Arc<Dispatcher>,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    /// Answers request frames until the client disconnects, the socket fails,
    /// the session is evicted for silence or the game is shut down. Always
    /// reports the closed session back to the server loop.
    async fn run(mut self) {
        loop {
            let next = tokio::select! {
                frame = self.transport.next() => Some(frame),
                _ = self.evicted.notified() => None,
            };

            let Some(frame) = next else {
                let notice = Packet::Disconnected {
                    reason: "Connection timed out".to_string(),
                };
                if let Err(e) = send_packet(&mut self.transport, &notice).await {
                    debug!("Failed to notify {} of its timeout: {}", self.addr, e);
                }
                break;
            };
            let Some(frame) = frame else {
                break;
            };

            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Connection {} from {}: {}", self.session_id, self.addr, e);
                    break;
                }
            };
            self.sessions.write().await.touch(self.session_id);

            let (reply, shutdown) = match decode_packet(&frame) {
                Ok(Packet::Disconnect) => {
                    debug!("Client {} disconnected", self.addr);
                    break;
                }
                Ok(packet) => self.handle_packet(packet).await,
                Err(e) => {
                    warn!("Failed to deserialize packet from {}: {}", self.addr, e);
                    let reply = Packet::Error {
                        kind: ErrorKind::Protocol,
                        message: "malformed packet".to_string(),
                    };
                    (reply, false)
                }
            };

            if let Err(e) = send_packet(&mut self.transport, &reply).await {
                error!("Failed to send reply to {}: {}", self.addr, e);
                break;
            }

            if shutdown {
                if let Err(e) = self.server_tx.send(ServerMessage::Shutdown) {
                    error!("Failed to signal shutdown: {}", e);
                }
                break;
            }
        }

        let closed = ServerMessage::ConnectionClosed {
            session_id: self.session_id,
        };
        if self.server_tx.send(closed).is_err() {
            debug!("Server loop gone before connection {} closed", self.session_id);
        }
    }

    /// Returns the reply and whether the server should now stop
    async fn handle_packet(&mut self, packet: Packet) -> (Packet, bool) {
        match packet {
            Packet::Login {
                client_version,
                username,
                password,
            } => {
                info!(
                    "Login from {} as {} (version: {})",
                    self.addr, username, client_version
                );
                if client_version != PROTOCOL_VERSION {
                    warn!(
                        "Client {} uses protocol version {}, server speaks {}",
                        self.addr, client_version, PROTOCOL_VERSION
                    );
                }

                let joined = {
                    let mut game = self.game.lock().await;
                    self.dispatcher.join(&mut game, &username, &password)
                };

                match joined {
                    Ok(outcome) => {
                        {
                            let mut sessions = self.sessions.write().await;
                            sessions.bind_player(self.session_id, outcome.player_id.clone());
                            let connections = sessions.connections_for(&outcome.player_id);
                            if connections > 1 {
                                info!(
                                    "Player {} now has {} open connections",
                                    username, connections
                                );
                            }
                        }
                        let reply = Packet::Joined {
                            player_id: outcome.player_id.to_string(),
                            team_name: outcome.team_name,
                            existing: outcome.existing,
                        };
                        (reply, false)
                    }
                    Err(e) => {
                        warn!("Login failed for {} from {}: {}", username, self.addr, e);
                        (error_packet(&e), false)
                    }
                }
            }

            Packet::Command { player_id, fields } => {
                let player = PlayerId::from(player_id.as_str());
                let (result, live) = {
                    let mut game = self.game.lock().await;
                    let result = self.dispatcher.dispatch(&mut game, &player, &fields);
                    (result, game.is_live())
                };

                match result {
                    Ok(text) => (Packet::Response { text }, !live),
                    Err(e) => {
                        debug!("Command {:?} from {} refused: {}", fields, player, e);
                        (error_packet(&e), false)
                    }
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", self.addr);
                let reply = Packet::Error {
                    kind: ErrorKind::Protocol,
                    message: "unexpected packet type".to_string(),
                };
                (reply, false)
            }
        }
    }
}
