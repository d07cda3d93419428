mod api;
mod blockchain;
mod config;
mod demo;
mod error;

use std::io;

use actix_web::{App, HttpServer, web};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::info;

use api::AppState;
use blockchain::{CancelToken, Chain};
use config::Config;

#[derive(Parser)]
#[command(name = "pow_chain", version, about = "Minimal proof-of-work chain")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Mine payloads into a fresh chain and print it
    Demo {
        /// Payloads, one block each (defaults to a small sample)
        payloads: Vec<String>,
        /// Leading hex zeros required (overrides DIFFICULTY)
        #[arg(short, long)]
        difficulty: Option<u32>,
        /// Mining threads (overrides MINING_WORKERS)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the chain over HTTP
    Serve,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::from_env().map_err(io::Error::other)?;

    match cli.command {
        Some(Command::Serve) => serve(config).await,
        Some(Command::Demo {
            payloads,
            difficulty,
            workers,
            json,
        }) => {
            if let Some(d) = difficulty {
                config.difficulty = d;
            }
            if let Some(w) = workers {
                config.mining_workers = w.max(1);
            }
            run_demo(&config, payloads, json)
        }
        None => run_demo(&config, Vec::new(), false),
    }
}

fn run_demo(config: &Config, payloads: Vec<String>, json: bool) -> io::Result<()> {
    let payloads = if payloads.is_empty() {
        demo::SAMPLE_PAYLOADS.iter().map(|s| s.to_string()).collect()
    } else {
        payloads
    };

    let chain = demo::build_chain(&payloads, config.difficulty, &config.mining_options())
        .map_err(io::Error::other)?;
    println!("{}", demo::render(&chain, json).map_err(io::Error::other)?);

    if !json {
        match chain.verify() {
            Ok(()) => println!("\nchain valid ({} blocks)", chain.len()),
            Err(e) => println!("\nchain invalid: {e}"),
        }
    }
    Ok(())
}

async fn serve(config: Config) -> io::Result<()> {
    let chain = Chain::new(config.difficulty).map_err(io::Error::other)?;
    // Stops any search still running on the blocking pool once the server exits.
    let cancel = CancelToken::new();
    let mining = config.mining_options().with_cancel(cancel.clone());
    let state = web::Data::new(AppState::new(chain, mining));

    println!(
        "⛓️ Starting proof-of-work chain API at http://{}:{}",
        config.host, config.port
    );
    info!(
        "difficulty={} workers={} timeout={:?}",
        config.difficulty, config.mining_workers, config.mining_timeout
    );

    let result = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    cancel.cancel();
    result
}
