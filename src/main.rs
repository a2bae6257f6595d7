use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;

mod domain;
mod application;
mod infrastructure;

use application::errors::BotError;
use application::messaging::{Dispatcher, UpdateOutcome};
use application::services::UserRegistry;
use domain::entities::InboundEvent;
use domain::traits::{Bot, Loaded, UserStore};
use infrastructure::adapters::telegram::TelegramAdapter;
use infrastructure::config::Config;
use infrastructure::http;
use infrastructure::storage::JsonFileStore;

/// Pause before polling again after a failed getUpdates
const POLL_RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "relay-bot")]
#[command(about = "Relay HTTP-triggered messages to Telegram users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot and the HTTP server
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// List registered users
    Users,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config, cli.token),
        Commands::Version => {
            println!("relay-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
        Commands::Users => list_users(&cli.config),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, BotError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))
}

fn run_bot(config_path: &str, token_override: Option<String>) -> Result<(), BotError> {
    let mut config = Config::resolve(config_path);
    if let Some(token) = token_override {
        config.bot.token = Some(token);
    }

    let token = config.token()?.to_string();
    let addr = config.bind_addr()?;

    runtime()?.block_on(serve_relay(config, token, addr))
}

async fn serve_relay(config: Config, token: String, addr: SocketAddr) -> Result<(), BotError> {
    let mut bot = TelegramAdapter::new(token, config.bot.parse_mode.clone());
    bot.fetch_bot_info().await?;

    let info = bot.bot_info();
    tracing::info!("Bot started: @{} ({}, id {})", info.username, info.name, info.id);
    let bot = Arc::new(bot);

    let store = JsonFileStore::new(&config.storage.users_file);
    tracing::info!("Using users file {}", store.path().display());
    let registry = Arc::new(UserRegistry::new(Arc::new(store)));
    registry.load().await;

    let dispatcher = Arc::new(
        Dispatcher::new(registry, bot.clone()).with_ack_message(config.bot.ack_message.clone()),
    );

    let registry = dispatcher.registry().clone();
    let server = tokio::spawn(http::serve(addr, dispatcher.clone()));
    let poller = tokio::spawn(run_update_loop(bot, dispatcher, config.bot.poll_timeout));

    tokio::select! {
        res = server => match res {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BotError::Network(format!("HTTP server failed: {}", e))),
            Err(e) => Err(BotError::Internal(format!("HTTP server task failed: {}", e))),
        },
        res = poller => res.map_err(|e| BotError::Internal(format!("Update loop task failed: {}", e))),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            registry.persist().await.map_err(BotError::from)
        }
    }
}

async fn run_update_loop(bot: Arc<TelegramAdapter>, dispatcher: Arc<Dispatcher>, timeout_seconds: i64) {
    let mut offset: i64 = 0;

    tracing::info!("Starting update loop...");

    loop {
        match bot.get_updates(offset, timeout_seconds).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::debug!("Received {} updates", updates.len());
                }
                offset = TelegramAdapter::get_next_offset(&updates, offset);

                for update in updates {
                    let update_id = update.update_id;
                    if dispatcher.on_update(&InboundEvent::from(update)).await == UpdateOutcome::Ignored {
                        tracing::debug!("Skipped update {}", update_id);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}

fn init_config() -> Result<(), BotError> {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| BotError::Internal(format!("Failed to render config: {}", e)))?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}

fn list_users(config_path: &str) -> Result<(), BotError> {
    let config = Config::resolve(config_path);
    let store = JsonFileStore::new(&config.storage.users_file);

    let mut users: Vec<_> = match runtime()?.block_on(store.load())? {
        Loaded::Users(users) => users.into_iter().collect(),
        Loaded::Missing | Loaded::Empty => Vec::new(),
    };
    users.sort_by(|a, b| a.0.cmp(&b.0));

    println!("{} registered users in {}", users.len(), store.path().display());
    for (username, record) in users {
        println!("  {}: {}", username, record);
    }
    Ok(())
}
