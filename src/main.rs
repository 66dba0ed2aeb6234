use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use companion_core::{Config, Session, Settlement, WellnessClient};
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod scroll;
mod tui;
mod ui;

use app::App;

const LOG_ENV: &str = "COMPANION_LOG";

#[derive(Parser)]
#[command(name = "companion")]
#[command(about = "Terminal client for the True Companion wellness assistant")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides COMPANION_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Send {
        /// What you'd like to say
        message: String,
    },
    /// Check that the backend is reachable
    Health,
    /// Show or update saved settings
    Config {
        /// Save this backend URL as the default
        #[arg(long)]
        set_api_url: Option<String>,
        /// Save a backend session id sent with every message
        #[arg(long)]
        session_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("warning: logging disabled: {e:#}");
    }

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to a file so they never draw over the terminal UI.
fn init_logging() -> Result<()> {
    let log_dir = Config::app_dir()?;
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("companion.log"))
        .context("could not create log file")?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });

    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let mut client = WellnessClient::new(&api_url);
    if let Some(session_id) = &config.session_id {
        client = client.with_session_id(session_id.clone());
    }
    tracing::info!(api_url = %client.base_url(), "starting");

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(client).await?,
        Commands::Send { message } => send_once(client, &message).await,
        Commands::Health => return check_health(&client).await,
        Commands::Config { set_api_url, session_id } => {
            update_config(config, set_api_url, session_id)?
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_chat(client: WellnessClient) -> Result<()> {
    let label = client.base_url().to_string();
    let mut app = App::new(Arc::new(client), label);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new(tui::TICK_RATE);

    let result = event_loop(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn event_loop(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| {
            app.fit_to(frame.area());
            ui::render(app, frame);
        })?;

        tokio::select! {
            event = events.next() => match event {
                Some(event) => handler::handle_event(app, event)?,
                None => break,
            },
            Some(settled) = app.session.settle(), if app.session.is_pending() => {
                tracing::debug!(?settled, "exchange finished");
            }
        }
    }
    Ok(())
}

/// One exchange through the same session logic the chat screen uses.
async fn send_once(client: WellnessClient, message: &str) {
    let mut session = Session::new(Arc::new(client));
    session.submit_text(message);

    let Some(settled) = session.settle().await else {
        eprintln!("Nothing to send.");
        return;
    };
    if settled == Settlement::Fallback {
        tracing::info!("backend unavailable, printed fallback reply");
    }

    if let Some(reply) = session.messages().last() {
        println!("{}", reply.content);
        if reply.is_safety_alert() {
            println!("\nSafety Alert: Professional support recommended.");
        } else if let Some(label) = reply.sentiment_label() {
            println!("\nDetected: {}", label);
        }
    }
}

async fn check_health(client: &WellnessClient) -> Result<ExitCode> {
    match client.health().await {
        Ok(status) => {
            println!("{}: {}", client.base_url(), status);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}: unreachable ({e})", client.base_url());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn update_config(
    mut config: Config,
    api_url: Option<String>,
    session_id: Option<String>,
) -> Result<()> {
    let changed = api_url.is_some() || session_id.is_some();
    if let Some(url) = api_url {
        config.api_url = Some(url);
    }
    if let Some(id) = session_id {
        config.session_id = Some(id);
    }
    if changed {
        config.save()?;
        println!("Saved {}", Config::get_config_path()?.display());
    }

    println!("api_url    = {}", config.resolve_api_url(None));
    println!(
        "session_id = {}",
        config.session_id.as_deref().unwrap_or("(none)")
    );
    Ok(())
}
