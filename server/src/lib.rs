//! # Warships Game Server Library
//!
//! This library provides the authoritative server for a multiplayer, team-based
//! naval battle game played over a text command protocol. Any number of teams
//! each own a square board, deploy ships onto it with deployment points that
//! accrue over time, and fire at other teams' boards.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Game State
//! All boards, ships, shot history, teams and players live in a single
//! [`game::Game`] aggregate. Clients never hold game state of their own; every
//! map and radar they see is rendered by the server from the aggregate.
//!
//! ### Command Processing
//! Clients send whitespace-split command lines. The [`commands::Dispatcher`]
//! resolves the calling player, looks the command name up in its table and runs
//! the handler against the game. A refused command produces a typed
//! [`error::GameError`] and leaves the game unchanged.
//!
//! ### Connection Management
//! Each TCP connection is a session tracked by [`sessions::SessionManager`],
//! bounded by the configured player capacity. Connections that stay silent
//! too long are closed so they cannot hold a slot. Players outlive their
//! connections and may log back in with the same username and password.
//!
//! ## Architecture Design
//!
//! ### Single Lock
//! The aggregate sits behind one `tokio::sync::Mutex`. Connection tasks and the
//! deployment scheduler hold it for exactly one operation, so every command is
//! atomic with respect to every other command and scheduler tick.
//!
//! ### TCP Request/Response
//! Frames are length-delimited bincode [`shared::Packet`]s. Every request frame
//! receives exactly one reply frame, in order.
//!
//! ## Module Organization
//!
//! - `board`: ships, placement and per-cell damage
//! - `team`: teams, players and their identifiers
//! - `game`: the aggregate and every state transition
//! - `render`: own-map and radar grids
//! - `commands`: the command table
//! - `scheduler`: periodic deployment point grants
//! - `sessions`: open connections, capacity and idle timeouts
//! - `network`: accept loop and per-connection handling
//! - `config` and `error`
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::GameConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GameConfig::default();
//!     let server = Server::bind("127.0.0.1:51832", config).await?;
//!
//!     // Runs until a client issues `shutdown` with the admin password
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod commands;
pub mod config;
pub mod error;
pub mod game;
pub mod network;
pub mod render;
pub mod scheduler;
pub mod sessions;
pub mod team;
