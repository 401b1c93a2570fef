use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gametable_core::config::Config;
use gametable_core::core_session::{
    CharacterId, InMemoryCharacterDirectory, InviteManager, SessionId, SessionManager,
    SessionService, Timestamp, UserId,
};
use gametable_core::core_session::storage::CURRENT_SESSION_SCHEMA_VERSION;
use gametable_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "gametable")]
#[command(author, version, about = "Manage game sessions, invites and members", long_about = None)]
struct Args {
    /// Configuration file (TOML); defaults plus GAMETABLE_* variables otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding the configured store path
    #[arg(long)]
    db: Option<String>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: LogLevel,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Character directory (JSON array of {id, owner, name})
    #[arg(long)]
    characters: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and apply pending migrations
    Migrate,

    /// Create a session owned by --as
    CreateSession {
        #[arg(long = "as")]
        user: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Mint an invite code (session master only)
    Invite {
        #[arg(long = "as")]
        user: String,
        #[arg(long)]
        session: String,
        #[arg(long)]
        max_uses: Option<u32>,
        /// Seconds until the code expires
        #[arg(long)]
        expires_in: Option<u64>,
    },

    /// Join a session with an invite code
    Join {
        #[arg(long = "as")]
        user: String,
        #[arg(long)]
        code: String,
    },

    /// List the sessions a user belongs to
    Sessions {
        #[arg(long = "as")]
        user: String,
    },

    /// List members of a session
    Members {
        #[arg(long = "as")]
        user: String,
        #[arg(long)]
        session: String,
    },

    /// Archive a session (master only)
    Archive {
        #[arg(long = "as")]
        user: String,
        #[arg(long)]
        session: String,
    },

    /// Remove a member, or leave when --user equals --as
    RemoveMember {
        #[arg(long = "as")]
        actor: String,
        #[arg(long)]
        session: String,
        #[arg(long)]
        user: String,
    },

    /// Select the character --as plays in a session
    SelectCharacter {
        #[arg(long = "as")]
        user: String,
        #[arg(long)]
        session: String,
        #[arg(long)]
        character: String,
    },

    /// Show an invite's usage and status without redeeming it
    InviteStatus {
        #[arg(long)]
        code: String,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env()?,
    };

    if let Some(db) = &args.db {
        config.store.path = PathBuf::from(shellexpand::tilde(db).into_owned());
    }
    config.logging.level = args.log_level;
    config.logging.json_format = args.json_logs;
    Ok(config)
}

fn open_service(config: &Config, characters: Option<&PathBuf>) -> Result<SessionService> {
    if let Some(parent) = config.store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let directory = match characters {
        Some(path) => InMemoryCharacterDirectory::from_json_file(path)?,
        None => InMemoryCharacterDirectory::new(),
    };
    debug!(characters = directory.len(), "character directory loaded");

    Ok(SessionService::from_config(config, Arc::new(directory))?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(command: Command, config: &Config, service: &SessionService) -> Result<()> {
    match command {
        Command::Migrate => {
            info!(path = %config.store.path.display(), "database ready");
            print_json(&serde_json::json!({
                "status": "ok",
                "path": config.store.path,
                "schema_version": CURRENT_SESSION_SCHEMA_VERSION,
            }))
        }
        Command::CreateSession {
            user,
            name,
            description,
        } => {
            let session = service.create_session(&UserId::new(user), &name, description)?;
            print_json(&session)
        }
        Command::Invite {
            user,
            session,
            max_uses,
            expires_in,
        } => {
            let expires_at =
                expires_in.map(|secs| Timestamp::now().after(Duration::from_secs(secs)));
            let invite = service.create_invite(
                &UserId::new(user),
                &SessionId::new(session),
                max_uses,
                expires_at,
            )?;
            print_json(&invite)
        }
        Command::Join { user, code } => {
            let session = service.join_by_code(&UserId::new(user), &code)?;
            print_json(&session)
        }
        Command::Sessions { user } => print_json(&service.list_sessions(&UserId::new(user))?),
        Command::Members { user, session } => {
            print_json(&service.list_members(&UserId::new(user), &SessionId::new(session))?)
        }
        Command::Archive { user, session } => {
            print_json(&service.archive_session(&UserId::new(user), &SessionId::new(session))?)
        }
        Command::RemoveMember {
            actor,
            session,
            user,
        } => {
            service.remove_member(
                &UserId::new(actor),
                &SessionId::new(session),
                &UserId::new(user),
            )?;
            print_json(&serde_json::json!({ "status": "removed" }))
        }
        Command::SelectCharacter {
            user,
            session,
            character,
        } => {
            let (selection, action) = service.select_character(
                &UserId::new(user),
                &SessionId::new(session),
                &CharacterId::new(character),
            )?;
            print_json(&serde_json::json!({ "selection": selection, "action": action }))
        }
        Command::InviteStatus { code } => {
            let invite = service.get_invite(&code)?;
            print_json(&serde_json::json!({
                "invite": invite,
                "status": invite.status_at(Timestamp::now()),
                "remaining_uses": invite.remaining_uses(),
            }))
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(config.logging.clone())?;

    let service = open_service(&config, args.characters.as_ref())?;
    run(args.command, &config, &service)
}
