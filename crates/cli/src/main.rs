//! `roster` CLI entry-point.
//!
//! Available sub-commands:
//! - `ping`: open, ping and close a connection.
//! - `users`: CRUD on the `users` table.
//! - `employees`: CRUD on the `employees` table.
//!
//! Results are printed as JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use db::{
    ConnectionFactory, CrudRepository, DbConfig, Employee, Entity, MySqlRepository, UpdateSet,
    User,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "roster",
    about = "User and employee records over MySQL",
    version
)]
struct Cli {
    /// TOML file with connection settings. `DB_*` variables override it.
    #[arg(long, env = "ROSTER_CONFIG")]
    config: Option<PathBuf>,

    /// Database to connect to (defaults to the configured one).
    #[arg(long)]
    database: Option<String>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the database accepts a connection.
    Ping,
    /// Manage users.
    #[command(subcommand)]
    Users(EntityCommand),
    /// Manage employees.
    #[command(subcommand)]
    Employees(EntityCommand),
}

#[derive(Subcommand)]
enum EntityCommand {
    /// Print every row.
    List,
    /// Print one row.
    Get { id: i32 },
    /// Insert a row given as a JSON object.
    Create {
        #[arg(long)]
        json: String,
    },
    /// Change some fields of a row, e.g. `--json '{"first_name":"Alicia"}'`.
    Update {
        id: i32,
        #[arg(long)]
        json: String,
    },
    /// Remove a row.
    Delete { id: i32 },
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = DbConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let database = cli.database.unwrap_or_else(|| config.database.clone());
    let factory = ConnectionFactory::new(config);

    let mut conn = factory
        .get_connection(&database)
        .await
        .with_context(|| format!("failed to connect to database '{database}'"))?;

    match cli.command {
        Command::Ping => {
            db::connection::ping(&mut conn).await?;
            db::connection::close(conn).await?;
            info!("Database '{database}' is reachable");
            println!("ok");
        }
        Command::Users(cmd) => {
            let repo = MySqlRepository::<User>::new(conn);
            let outcome = run::<User>(&repo, cmd).await;
            repo.close().await?;
            outcome?;
        }
        Command::Employees(cmd) => {
            let repo = MySqlRepository::<Employee>::new(conn);
            let outcome = run::<Employee>(&repo, cmd).await;
            repo.close().await?;
            outcome?;
        }
    }

    Ok(())
}

async fn run<T: Entity>(repo: &dyn CrudRepository<T>, cmd: EntityCommand) -> Result<()> {
    match cmd {
        EntityCommand::List => {
            let rows = repo.find_all().await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        EntityCommand::Get { id } => {
            let row = repo
                .read(id)
                .await?
                .ok_or_else(|| anyhow!("no {} row with id {id}", T::table_name()))?;
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
        EntityCommand::Create { json } => {
            let row: T = serde_json::from_str(&json)
                .with_context(|| format!("--json is not a valid {} row", T::table_name()))?;
            repo.create(&row).await?;
            info!("Created {} row {}", T::table_name(), row.id());
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
        EntityCommand::Update { id, json } => {
            let value: serde_json::Value =
                serde_json::from_str(&json).context("--json is not valid JSON")?;
            let updates = UpdateSet::try_from(value)?;
            let current = repo
                .read(id)
                .await?
                .ok_or_else(|| anyhow!("no {} row with id {id}", T::table_name()))?;
            repo.update(&current, &updates).await?;
            let row = repo.read(id).await?;
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
        EntityCommand::Delete { id } => {
            repo.delete(id).await?;
            info!("Deleted {} row {id}", T::table_name());
        }
    }
    Ok(())
}
