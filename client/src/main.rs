use clap::Parser;
use client::input::accept_commands;
use client::network::{server_address, Client};
use log::{error, info};
use shared::DEFAULT_PORT;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Terminal client for the warships game server",
    long_about = None
)]
struct Args {
    /// Server address, either host or host:port
    #[arg(short = 'a', long, default_value = "127.0.0.1")]
    address: String,

    /// Server port, used when the address has none
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Username to log in as
    #[arg(short = 'u', long, default_value = "player")]
    username: String,

    /// Player password, or the game password when joining for the first time
    #[arg(long, default_value = "")]
    password: String,

    /// Send the trailing arguments as a single command, print the reply and exit
    #[arg(long)]
    cmd: bool,

    /// Command for --cmd mode, e.g. `target 2 G7`
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let addr = server_address(&args.address, args.port);

    let mut client = match Client::connect(&addr).await {
        Ok(client) => client,
        Err(e) => {
            println!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let login = match client.login(&args.username, &args.password).await {
        Ok(login) => login,
        Err(e) => {
            println!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if args.cmd {
        if args.command.is_empty() {
            println!("Error: --cmd needs a command to send");
            std::process::exit(1);
        }
        match client.send_command(args.command).await {
            Ok(text) => println!("{}", text.trim_end_matches('\n')),
            Err(e) => {
                println!("Error: {}", e);
                std::process::exit(1);
            }
        }
        client.disconnect().await?;
        return Ok(());
    }

    if login.existing {
        println!("Welcome back {}, you are on team {}", args.username, login.team_name);
    } else {
        println!("Welcome {}, you have joined team {}", args.username, login.team_name);
    }
    println!("Type 'help' for a list of commands, 'quit' to leave");

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    match accept_commands(&mut client, &mut stdin, &mut stdout).await {
        Ok(()) => {
            info!("Leaving game");
            client.disconnect().await?;
            Ok(())
        }
        Err(e) => {
            error!("Session ended: {}", e);
            std::process::exit(1);
        }
    }
}
