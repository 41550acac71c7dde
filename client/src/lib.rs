//! # Warships Game Client Library
//!
//! A thin terminal client for the warships game server. The server holds all
//! game state and renders every map, so the client only has to log in, forward
//! typed command lines and print what comes back.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Manages the TCP connection to the server:
//! - Length-delimited framing of bincode packets
//! - Login and player id bookkeeping
//! - One request, one reply; server refusals surface as [`network::ClientError`]
//!
//! ### Input Module (`input`)
//! Handles the interactive session:
//! - Splitting typed lines into command fields
//! - Recognising blank lines and `quit`/`exit`
//! - The command loop that prints responses and `Error: <message>` lines
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:51832").await?;
//!     let login = client.login("ishmael", "").await?;
//!     println!("Playing for {}", login.team_name);
//!
//!     let map = client.send_command(vec!["map".to_string()]).await?;
//!     println!("{}", map);
//!
//!     client.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod input;
pub mod network;
