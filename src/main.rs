mod cli;
mod config;
mod db;
mod directory;
mod error;
mod models;
mod schedule;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::migrations::run_migrations;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;
    if !AppConfig::config_path()?.exists() {
        // First run: leave a config file for the admin to fill in
        if let Err(e) = config.save() {
            log::warn!("could not write default config: {}", e);
        }
    }

    let db_path = match cli.db {
        Some(path) => path,
        None => {
            AppConfig::ensure_data_dir()?;
            AppConfig::db_path()?
        }
    };
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;
    log::debug!("using database {:?}", db_path);

    // Enable WAL mode for better concurrent access
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    match cli.command {
        Commands::Mosque { action } => handlers::handle_mosque(&conn, &config, action)?,
        Commands::Times { action } => handlers::handle_times(&conn, &config, action)?,
        Commands::Announce { action } => handlers::handle_announce(&conn, &config, action)?,
    }

    Ok(())
}
