use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod answer;
mod app;
mod config;
mod error;
mod handler;
mod session;
mod tui;
mod ui;

use answer::{AnswerClient, AnswerService};
use app::App;
use config::Config;
use session::ChatSession;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "nova", version)]
#[command(about = "Chat with the Nova resume assistant from your terminal")]
struct Cli {
    /// Answer service endpoint (overrides the config file)
    #[arg(long, env = "NOVA_ENDPOINT", global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
    },
    /// Check whether the answer service is reachable
    Ping,
    /// Save the answer service endpoint to the config file
    SetEndpoint {
        /// Endpoint URL, e.g. http://127.0.0.1:5000/query
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            init_file_logging()?;
            let client = AnswerClient::new(resolve_endpoint(cli.endpoint.as_deref())?);
            run_tui(client).await?
        }
        Commands::Ask { question } => {
            init_stderr_logging();
            let client = AnswerClient::new(resolve_endpoint(cli.endpoint.as_deref())?);
            ask_once(&client, &question).await?
        }
        Commands::Ping => {
            init_stderr_logging();
            let client = AnswerClient::new(resolve_endpoint(cli.endpoint.as_deref())?);
            if client.health().await {
                println!("online: {}", client.endpoint());
            } else {
                println!("offline: {}", client.endpoint());
                println!("Make sure the answer service is running and reachable.");
            }
        }
        Commands::SetEndpoint { url } => {
            init_stderr_logging();
            let path = Config::save_endpoint(&url)?;
            println!("Saved endpoint to {}", path.display());
        }
    }

    Ok(())
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env("NOVA_LOG").unwrap_or_else(|_| EnvFilter::new(default))
}

/// The chat UI owns the terminal, so logs go to a file instead.
fn init_file_logging() -> Result<()> {
    let path = config::log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create log directory {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Could not open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).with_target(true))
        .with(env_filter("info"))
        .init();

    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter("warn"))
        .init();
}

fn resolve_endpoint(cli_endpoint: Option<&str>) -> Result<reqwest::Url> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable config file");
            Config::new()
        }
    };
    config.resolve_endpoint(cli_endpoint)
}

async fn ask_once<S: AnswerService>(service: &S, question: &str) -> Result<()> {
    let mut session = ChatSession::new();

    if !session.submit(service, question).await {
        bail!("Nothing to ask: the question is blank");
    }

    if let Some(reply) = session.transcript().last() {
        println!("{}", reply.text);
    }

    Ok(())
}

async fn run_tui(client: AnswerClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run_app(&mut terminal, client).await;

    tui::restore()?;
    result
}

async fn run_app(terminal: &mut tui::Tui, client: AnswerClient) -> Result<()> {
    let mut app = App::new(client);
    let mut events = EventHandler::new();
    let tx = events.sender();

    info!(endpoint = %app.client.endpoint(), "Chat session started");

    // Check the service once so the header can show whether it is up
    handler::spawn_health_check(&app, &tx);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event, &tx),
            None => break,
        }
    }

    info!(messages = app.session.transcript().len(), "Chat session ended");
    Ok(())
}
