//! `xone` — command-line access to the member database.
//!
//! Settings are read from `xone.toml` (or the path given with `--config`) and
//! `XONE_*` environment variables; `--db` overrides both.
//!
//! # Usage
//!
//! ```
//! xone user create alice@example.com secret
//! xone person import members.csv
//! xone --db ~/xone/members.db person list
//! ```

mod password;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use xone_core::{
  Context,
  person::{CreatePersonData, uuid_generator},
  store::{PersonRepository, UserRepository},
  user::CreateUserData,
};
use xone_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(name = "xone", version, about = "Member database tool")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "xone.toml")]
  config: PathBuf,

  /// Database file; overrides the configured `db`.
  #[arg(long, value_name = "FILE")]
  db: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Manage login users.
  #[command(subcommand)]
  User(UserCommand),
  /// Manage persons.
  #[command(subcommand)]
  Person(PersonCommand),
}

#[derive(Subcommand)]
enum UserCommand {
  /// Create a user with an argon2-hashed password.
  Create { email: String, password: String },
  /// Check a password against the stored hash.
  Verify { email: String, password: String },
}

#[derive(Subcommand)]
enum PersonCommand {
  /// Create every person in a CSV file, all or nothing.
  Import { file: PathBuf },
  /// Write all persons to a CSV file.
  Export { file: PathBuf },
  /// Print all persons as JSON.
  List,
}

#[derive(Debug, Deserialize)]
struct Settings {
  #[serde(default = "default_db")]
  db: PathBuf,
}

fn default_db() -> PathBuf { PathBuf::from("xone.db") }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings: Settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("XONE"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise settings")?;

  let db_path = expand_tilde(cli.db.as_deref().unwrap_or(&settings.db));
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;

  let ctx = Context::background();
  let result = match cli.command {
    Command::User(cmd) => run_user(&store, &ctx, cmd).await,
    Command::Person(cmd) => run_person(&store, &ctx, cmd).await,
  };

  let closed = store.close().await.context("failed to close store");
  first_error(result, closed)
}

/// The command's outcome, unless only closing the store failed. A close
/// failure after a failed command is logged rather than returned.
fn first_error(command: anyhow::Result<()>, closed: anyhow::Result<()>) -> anyhow::Result<()> {
  match (command, closed) {
    (Err(e), Err(close_err)) => {
      warn!(error = %close_err, "store did not close cleanly");
      Err(e)
    }
    (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
    (Ok(()), Ok(())) => Ok(()),
  }
}

async fn run_user(store: &SqliteStore, ctx: &Context, cmd: UserCommand) -> anyhow::Result<()> {
  let users = store.users();
  match cmd {
    UserCommand::Create { email, password } => {
      let password = password::hash(&password)?;
      let user = users
        .create(ctx, CreateUserData { email, password })
        .await
        .context("failed to create user")?;
      info!(email = %user.email, "user created");
    }
    UserCommand::Verify { email, password } => {
      let Some(user) = users.find_by_email(ctx, &email).await? else {
        bail!("no user with email {email:?}");
      };
      if !password::verify(&user.password, &password) {
        bail!("password does not match for {email:?}");
      }
      println!("ok");
    }
  }
  Ok(())
}

async fn run_person(
  store: &SqliteStore,
  ctx: &Context,
  cmd: PersonCommand,
) -> anyhow::Result<()> {
  match cmd {
    PersonCommand::Import { file } => {
      let persons = xone_csv::read_file(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
      let generate_id = uuid_generator();
      let count = store
        .write_transaction(ctx, "person.import", move |tx| {
          for person in &persons {
            tx.create_person(&generate_id(), &CreatePersonData::from(person))?;
          }
          Ok(persons.len())
        })
        .await
        .context("import failed, nothing was written")?;
      info!(count, file = %file.display(), "persons imported");
    }
    PersonCommand::Export { file } => {
      let persons = store.persons().find_all(ctx).await?;
      xone_csv::write_file(&file, &persons)
        .with_context(|| format!("failed to write {}", file.display()))?;
      info!(count = persons.len(), file = %file.display(), "persons exported");
    }
    PersonCommand::List => {
      let persons = store.persons().find_all(ctx).await?;
      println!("{}", serde_json::to_string_pretty(&persons)?);
    }
  }
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tilde_is_expanded_only_as_prefix() {
    let plain = Path::new("data/xone.db");
    assert_eq!(expand_tilde(plain), plain);
    assert_eq!(expand_tilde(Path::new("a/~/b")), Path::new("a/~/b"));

    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expand_tilde(Path::new("~/x.db")), Path::new(&home).join("x.db"));
    }
  }

  #[test]
  fn command_error_wins_over_close_error() {
    let err = first_error(Err(anyhow::anyhow!("import failed")), Err(anyhow::anyhow!("close failed")))
      .unwrap_err();
    assert_eq!(err.to_string(), "import failed");

    let err = first_error(Ok(()), Err(anyhow::anyhow!("close failed"))).unwrap_err();
    assert_eq!(err.to_string(), "close failed");

    assert!(first_error(Ok(()), Ok(())).is_ok());
  }

  #[test]
  fn cli_parses_nested_commands() {
    let cli = Cli::try_parse_from(["xone", "--db", "t.db", "person", "import", "in.csv"]).unwrap();
    assert_eq!(cli.db.as_deref(), Some(Path::new("t.db")));
    assert!(matches!(cli.command, Command::Person(PersonCommand::Import { .. })));

    assert!(Cli::try_parse_from(["xone", "user", "create", "only-email"]).is_err());
  }
}
