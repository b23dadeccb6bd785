//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `library`: import, track lookup and random selection
//! - `cover`: cover art resolution

mod cover;
mod library;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::db::{self, SqliteMediaIndex};
use crate::session::LibrarySession;

pub use cover::cmd_cover;
pub use library::{cmd_random, cmd_scan, cmd_show};

/// songstore CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database path (overrides the config file)
    #[arg(long, global = true, env = "SONGSTORE_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Import a directory of music into the index
    Scan {
        /// Path to the directory to scan
        path: PathBuf,
    },
    /// Show a track's metadata
    Show {
        /// Track id
        id: i64,
    },
    /// Resolve a track's cover art
    Cover {
        /// Track id
        id: i64,
        /// Write the decoded cover to this file (format by extension)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Pick random tracks
    Random {
        /// Number of tracks to pick
        #[arg(short, long, default_value = "1")]
        count: usize,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config = config::load();
    let db_path = cli.db.clone().or_else(|| config.library.database.clone());

    match &cli.command {
        Commands::Scan { path } => cmd_scan(&rt, db_path.as_deref(), path),
        Commands::Show { id } => cmd_show(&rt, db_path.as_deref(), &config, *id),
        Commands::Cover { id, out } => {
            cmd_cover(&rt, db_path.as_deref(), &config, *id, out.as_deref())
        }
        Commands::Random { count } => cmd_random(&rt, db_path.as_deref(), &config, *count),
        Commands::Config { save } => cmd_config(&config, *save),
    }
}

fn cmd_config(config: &Config, save: bool) -> anyhow::Result<()> {
    if let Some(path) = config::config_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    if save {
        config::save(config)?;
    }
    Ok(())
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Open the media index at `db_path` (or the default database).
pub(crate) async fn open_index(db_path: Option<&Path>) -> anyhow::Result<SqliteMediaIndex> {
    let url = db::db_url(db_path);
    SqliteMediaIndex::open(&url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database {}: {}", url, e))
}

/// Open the index and start a session over it.
pub(crate) async fn open_session(
    db_path: Option<&Path>,
    config: &Config,
) -> anyhow::Result<LibrarySession> {
    let index = open_index(db_path).await?;
    Ok(LibrarySession::new(Arc::new(index), config)?)
}
