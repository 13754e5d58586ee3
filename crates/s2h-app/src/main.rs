mod auth;
mod cli;
mod pending;
mod render;
mod repl;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use s2h_chat::{
    FileStore, HttpBackend, HttpBackendConfig, IdentitySource, KeyValueStore, MemoryStore,
    RecordStore, SessionController, SessionStore, StaticIdentity, SupabaseAuth, SupabaseRecords,
};
use s2h_common::{ConfigError, S2hError};
use s2h_config::{AppConfig, LogLevel};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// `.env` candidates: the working directory, then beside the config file.
fn dotenv_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".env")];
    if let Some(dir) = s2h_config::toml_loader::default_config_path()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(".env"));
    }
    paths
}

/// `KEY=VALUE`, optionally `export`-prefixed, value optionally quoted.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)));
    Some((key, unquoted.unwrap_or(value)))
}

/// Load the first `.env` found. Variables already in the environment win.
fn load_dotenv() -> Option<PathBuf> {
    for path in dotenv_paths() {
        let Ok(contents) = std::fs::read_to_string(&path) else {
            continue;
        };
        for (key, value) in contents.lines().filter_map(parse_env_line) {
            if std::env::var_os(key).is_none() {
                std::env::set_var(key, value);
            }
        }
        return Some(path);
    }
    None
}

/// Startup directive, and whether the config file's level may replace it.
/// `RUST_LOG` wins over `--log-level`.
fn startup_directive(rust_log: Option<String>, cli_level: Option<&str>) -> (String, bool) {
    match (rust_log.filter(|v| !v.trim().is_empty()), cli_level) {
        (Some(directive), _) => (directive, false),
        (None, Some(directive)) => (directive.to_string(), false),
        (None, None) => (LogLevel::default().directive().to_string(), true),
    }
}

/// Install the stderr subscriber. Returns a handle when the filter should
/// follow the config file once it is loaded.
fn init_logging(cli_level: Option<&str>) -> Option<FilterHandle> {
    let (directive, adjustable) = startup_directive(std::env::var("RUST_LOG").ok(), cli_level);
    let (filter, handle) = reload::Layer::new(EnvFilter::new(directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    adjustable.then_some(handle)
}

fn slot_store(config: &AppConfig, ephemeral: bool) -> Arc<dyn KeyValueStore> {
    if ephemeral {
        return Arc::new(MemoryStore::new());
    }
    match config.storage.resolved_data_dir() {
        Some(dir) => {
            let store = FileStore::new(dir);
            debug!(dir = %store.dir().display(), "using file slot store");
            Arc::new(store)
        }
        None => {
            warn!("no data directory available, conversation will not be saved");
            Arc::new(MemoryStore::new())
        }
    }
}

fn load_config(args: &cli::Args) -> s2h_common::Result<AppConfig> {
    let mut config = match s2h_config::load_config(args.config.as_deref().map(Path::new)) {
        Ok(config) => config,
        Err(e @ ConfigError::FileNotFound(_)) if args.config.is_some() => return Err(e.into()),
        Err(e) => {
            warn!(error = %e, "config load failed, using defaults");
            s2h_config::defaults_with_env(|key| std::env::var(key).ok())
        }
    };

    if let Some(url) = &args.backend_url {
        config.backend.url = url.clone();
        s2h_config::validation::validate(&config)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> s2h_common::Result<()> {
    let dotenv = load_dotenv();
    let args = cli::parse();
    let log_handle = init_logging(args.log_level.as_deref());

    info!("s2h v{} starting", env!("CARGO_PKG_VERSION"));
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }

    let config = load_config(&args)?;
    if let Some(handle) = log_handle {
        if let Err(e) = handle.reload(EnvFilter::new(config.logging.level.directive())) {
            warn!(error = %e, "log level from config not applied");
        }
    }

    let backend = Arc::new(HttpBackend::new(
        HttpBackendConfig::new(config.backend.url.clone())
            .with_connect_timeout(Duration::from_secs(config.backend.connect_timeout.into()))
            .with_request_timeout(Duration::from_secs(config.backend.request_timeout.into())),
    ));
    if let Err(e) = backend.health().await {
        warn!(url = %backend.base_url(), error = %e, "backend health check failed");
        println!("  {e}");
    }

    let mut lines = repl::input_lines();

    // Sign-in is required exactly when a record store is configured.
    let mut identity: Arc<dyn IdentitySource> = Arc::new(StaticIdentity::anonymous());
    let mut records: Option<Arc<dyn RecordStore>> = None;
    if config.records.is_configured() {
        let auth = SupabaseAuth::new(&config.records.url, &config.records.anon_key);
        let password = std::env::var(auth::PASSWORD_ENV).ok();
        let Some(user) =
            auth::sign_in(&auth, &mut lines, args.email.clone(), password, args.sign_up).await
        else {
            return Err(S2hError::Auth("sign-in required to continue".into()));
        };
        identity = Arc::new(StaticIdentity::signed_in(user));
        records = Some(Arc::new(
            SupabaseRecords::new(&config.records.url, &config.records.anon_key)
                .with_table(&config.records.table),
        ));
    }

    let store = SessionStore::new(slot_store(&config, args.ephemeral))
        .with_slots(&config.storage.chat_slot, &config.storage.profile_slot);
    let mut controller = SessionController::restore(store, backend, identity.clone());
    if let Some(records) = records.clone() {
        controller = controller.with_records(records);
    }

    let repl = repl::Repl::new(Arc::new(controller), identity, records);
    repl.run(&mut lines).await?;

    info!("Shutdown complete");
    Ok(())
}
