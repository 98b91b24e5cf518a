//! Local operator CLI for the comments store.
//!
//! # Responsibility
//! - Drive the comments request boundary against a database file.
//! - Print the status code and JSON body of every response.
//!
//! Mutating commands act as `--user`: the CLI issues a one-off bearer token
//! for that user and sends it through the same auth gate as HTTP callers.

use clap::{Parser, Subcommand};
use comments_core::{
    default_log_level, ApiResponse, BearerTokenGate, CommentsApi, CoreConfig, DocumentStore,
    SqliteDocumentStore, User,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "comments", version, about = "Manage comments in a local store")]
struct Cli {
    /// SQLite database file.
    #[arg(long, default_value = comments_core::config::DEFAULT_DB_FILE_NAME)]
    db: PathBuf,
    /// Absolute directory for rolling log files.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a user and print its id.
    AddUser {
        #[arg(long)]
        name: String,
    },
    /// Show one comment.
    Get { comment_id: String },
    /// List the comments of one user.
    List { user_id: String },
    /// Create a comment as `--user`.
    Create {
        #[arg(long)]
        user: Uuid,
        #[arg(long)]
        content: String,
    },
    /// Replace the content of a comment as `--user`.
    Update {
        #[arg(long)]
        user: Uuid,
        comment_id: String,
        #[arg(long)]
        content: String,
    },
    /// Delete a comment as `--user`.
    Delete {
        #[arg(long)]
        user: Uuid,
        comment_id: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool, Box<dyn Error>> {
    let config = CoreConfig {
        db_path: cli.db,
        log_level: cli.log_level,
        log_dir: cli.log_dir,
    };
    let conn = config.bootstrap()?;
    let store = SqliteDocumentStore::try_new(&conn)?;

    let mut api = CommentsApi::new(store, BearerTokenGate::new());
    let response = match cli.command {
        Command::AddUser { name } => {
            let user = User::new(name);
            api.service().store().insert_user(&user)?;
            info!("event=user_add module=cli status=ok user_id={}", user.id);
            println!("{}", user.id);
            return Ok(true);
        }
        Command::Get { comment_id } => api.get_comment(&comment_id),
        Command::List { user_id } => api.list_user_comments(&user_id),
        Command::Create { user, content } => {
            let header = bearer_for(&mut api, user);
            api.create_comment(Some(header.as_str()), Some(content.as_str()))
        }
        Command::Update {
            user,
            comment_id,
            content,
        } => {
            let header = bearer_for(&mut api, user);
            api.update_comment(Some(header.as_str()), &comment_id, Some(content.as_str()))
        }
        Command::Delete { user, comment_id } => {
            let header = bearer_for(&mut api, user);
            api.delete_comment(Some(header.as_str()), &comment_id)
        }
    };

    print_response(&response)?;
    Ok(response.is_success())
}

fn bearer_for<S: DocumentStore>(api: &mut CommentsApi<S, BearerTokenGate>, user: Uuid) -> String {
    format!("Bearer {}", api.gate_mut().issue(user))
}

fn print_response(response: &ApiResponse) -> Result<(), Box<dyn Error>> {
    println!("status={}", response.status);
    println!("{}", serde_json::to_string_pretty(&response.body)?);
    Ok(())
}
