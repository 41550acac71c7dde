use clap::Parser;
use log::{error, info};
use server::config::{GameConfig, SessionTimeouts};
use server::error::ServerError;
use server::network::Server;
use shared::DEFAULT_PORT;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Team-based naval battle game server")]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Password new players must supply to join (empty for none)
    #[clap(long, default_value = "")]
    password: String,
    /// Password for the shutdown command (empty disables it)
    #[clap(long, default_value = "")]
    admin_password: String,
    /// Maximum number of players and concurrent connections
    #[clap(short, long, default_value_t = 32)]
    max_players: usize,
    /// Largest ship size that may be deployed
    #[clap(long, default_value_t = 16)]
    ship_limit: usize,
    /// Side length of every team's board
    #[clap(long, default_value_t = 16)]
    board_size: usize,
    /// Deployment points each starting team begins with
    #[clap(long, default_value_t = 10)]
    deploy_points: i64,
    /// Seconds a new connection may stay silent before logging in
    #[clap(long, default_value_t = 30)]
    login_timeout: u64,
    /// Seconds a logged-in connection may stay silent
    #[clap(long, default_value_t = 1800)]
    idle_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = GameConfig {
        port: args.port,
        password: args.password,
        admin_password: args.admin_password,
        max_players: args.max_players,
        ship_limit: args.ship_limit,
        board_size: args.board_size,
        start_deploy_points: args.deploy_points,
    };

    info!("Starting server with settings:");
    info!("  port: {}", config.port);
    info!("  max players: {}", config.max_players);
    info!("  ship limit: {}", config.ship_limit);
    info!("  board size: {}", config.board_size);
    info!("  starting deployment points: {}", config.start_deploy_points);

    let timeouts = SessionTimeouts {
        login: Duration::from_secs(args.login_timeout),
        idle: Duration::from_secs(args.idle_timeout),
    };
    info!(
        "  session timeouts: {}s before login, {}s idle",
        args.login_timeout, args.idle_timeout
    );

    let addr = format!("{}:{}", args.host, config.port);
    let server = match Server::bind(&addr, config).await {
        Ok(server) => server.with_session_timeouts(timeouts),
        Err(e @ ServerError::Bind { .. }) => {
            error!("{}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    info!("Server stopped");
    Ok(())
}
