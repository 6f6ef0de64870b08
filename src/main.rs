mod bot;

use std::sync::Arc;

use once_cell::sync::OnceCell;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::bot::{
    commands::{
        commands::BotResult,
        config::config_commands,
        general::{general_commands, ForestCell},
        loader::{load_declarations_file, HandlerTable},
        types::TypeResolvers,
        CommandRegistry,
    },
    db::{config::GroupStore, initialize_database},
    handler::handler::ChatClient,
    platforms::console::{console::ConsoleClient, event_loop::run_console_loop},
    run_event_loop,
    state::def::{AppState, BotError, Settings},
};

#[tokio::main]
async fn main() -> BotResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let settings = Arc::new(Settings::from_env()?);

    let pool = SqlitePoolOptions::new().max_connections(5).connect(&settings.database_url).await?;
    initialize_database(&pool).await?;
    let store = GroupStore::load(pool, settings.clone()).await?;

    let chat_client: Arc<dyn ChatClient> = Arc::new(ConsoleClient::stdout());
    let forest_cell: ForestCell = Arc::new(OnceCell::new());

    let mut registry = CommandRegistry::new(TypeResolvers::with_defaults());
    let builtins = general_commands(chat_client.clone(), forest_cell.clone());

    // Declaration files may reuse any built-in action by its command name.
    let handlers: HandlerTable = builtins
        .iter()
        .filter_map(|cmd| cmd.handler.clone().map(|h| (cmd.name.clone(), h)))
        .collect();

    for cmd in builtins {
        registry.register(cmd);
    }
    registry.register(config_commands(chat_client.clone(), store.clone()));

    if let Some(path) = &settings.commands_file {
        if let Err(e) = load_declarations_file(path, &handlers, &mut registry).await {
            warn!("Could not load {path}: {e}");
        }
    }

    if !registry.rejected().is_empty() {
        warn!("{} command declaration(s) rejected, see above", registry.rejected().len());
    }

    let forest = registry.finish();
    forest_cell
        .set(forest.clone())
        .map_err(|_| BotError::Custom("command forest already set".into()))?;
    info!("{} root command(s) ready", forest.roots().len());

    let state = Arc::new(AppState { settings: settings.clone(), forest, store, chat_client });

    let (tx, rx) = unbounded_channel();
    tokio::spawn(async move {
        if let Err(e) = run_console_loop(tx, settings).await {
            error!("Console error: {e:?}");
        }
    });

    run_event_loop(state, rx).await
}
