use std::net::SocketAddr;

use chordnet_node::config;
use chordnet_node::console;
use chordnet_node::console::ConsoleCommand;
use chordnet_node::logging::init_logging;
use chordnet_node::logging::LogLevel;
use chordnet_node::prelude::ChordNodeBuilder;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tokio::io;
use tokio::io::AsyncBufReadExt;

#[derive(Parser, Debug)]
#[command(about, version, author)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, value_enum, env, help = "If not provided, use log_level in config file")]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Command {
    #[command(about = "Writes a default configuration file.")]
    Init(InitCommand),
    #[command(about = "Starts a ring node with an interactive console.")]
    Run(RunCommand),
}

#[derive(Args, Debug)]
struct InitCommand {
    #[arg(
        long,
        default_value = config::DEFAULT_CONFIG_PATH,
        help = "The location of config file"
    )]
    pub location: String,

    #[arg(long, short = 'b', help = "Listen address written to the config file")]
    pub bind_addr: Option<SocketAddr>,
}

#[derive(Args, Debug)]
struct RunCommand {
    #[arg(
        long,
        short = 'c',
        env,
        default_value = config::DEFAULT_CONFIG_PATH,
        help = "Config file location"
    )]
    pub config: String,

    #[arg(
        long,
        short = 'b',
        help = "Node listen address. If not provided, use bind_addr in config file",
        env
    )]
    pub bind_addr: Option<SocketAddr>,

    #[arg(long, help = "Endpoint announced to other nodes", env)]
    pub external_address: Option<SocketAddr>,

    #[arg(
        long,
        help = "Any node of the ring to join. If neither this nor bootstrap in config file is set, create a new ring",
        env
    )]
    pub bootstrap: Option<SocketAddr>,

    #[arg(
        long,
        help = "Bits of the ring id space. If not provided, use protocol.ring_bits in config file",
        env
    )]
    pub ring_bits: Option<u32>,
}

async fn daemon_run(args: RunCommand, config: config::Config) -> anyhow::Result<()> {
    let mut protocol = config.protocol.clone();
    if let Some(ring_bits) = args.ring_bits {
        protocol.ring_bits = ring_bits;
    }
    let bind_addr = match args.bind_addr {
        Some(addr) => addr,
        None => config.bind_addr()?,
    };
    let external_address = match args.external_address {
        Some(addr) => Some(addr),
        None => config.external_address()?,
    };
    let bootstrap = match args.bootstrap {
        Some(addr) => Some(addr),
        None => config.bootstrap()?,
    };

    let mut builder = ChordNodeBuilder::new(bind_addr).config(protocol);
    if let Some(addr) = external_address {
        builder = builder.external_address(addr);
    }
    let node = builder.build().await?;
    println!("Node: {}", node.me());

    match bootstrap {
        Some(bootstrap) => node.join_via(bootstrap).await?,
        None => node.create_ring()?,
    }
    println!("{}", console::HELP);

    let mut stdin = io::BufReader::new(io::stdin()).lines();
    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let cmd = match line.parse::<ConsoleCommand>() {
                    Ok(cmd) => cmd,
                    Err(e) => {
                        eprintln!("Error: {e}");
                        continue;
                    }
                };
                if cmd == ConsoleCommand::Quit {
                    break;
                }
                match console::execute(&node, &cmd).await {
                    Ok(out) => println!("{out}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    node.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Init(args) => {
            init_logging(cli.log_level.unwrap_or_default());
            let mut config = config::Config::default();
            if let Some(addr) = args.bind_addr {
                config.bind_addr = addr.to_string();
            }
            let p = config.write_fs(args.location.as_str())?;
            println!("Your config file has saved to: {}", p);
            Ok(())
        }
        Command::Run(args) => {
            let config = config::Config::read_fs(args.config.as_str())?;
            init_logging(cli.log_level.unwrap_or(config.log_level));
            daemon_run(args, config).await
        }
    }
}
