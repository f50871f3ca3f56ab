use std::path::PathBuf;

use cdnhub::error::{AppError, AppResult};
use cdnhub::{ContentOptions, ContentStore};
use clap::{Parser, Subcommand};
use error_stack::ResultExt;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Parser)]
#[command(name = "cdnhub", version, about = "Use a GitHub repository as a file store")]
struct Cli {
    /// Target repository as `owner/repo`
    #[arg(long, env = "CDNHUB_REPO")]
    repo: String,

    /// Branch to read and commit to [default: main]
    #[arg(long, env = "CDNHUB_BRANCH")]
    branch: Option<String>,

    /// Token used to authenticate with GitHub
    #[arg(long, env = "CDNHUB_TOKEN", hide_env_values = true)]
    token: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or overwrite a file
    Put {
        path: String,
        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Print the content of a file
    Get {
        path: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a file
    Drop {
        path: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List a directory as JSON
    Ls {
        #[arg(default_value = "")]
        path: String,
        #[arg(long)]
        with_content: bool,
    },
    /// List the whole repository as JSON
    Tree {
        #[arg(long)]
        with_content: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(AppError::from)?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let store = ContentStore::connect(&cli.repo, cli.branch.as_deref(), &cli.token)
        .change_context(AppError::Storage)?;
    tracing::debug!(%store, "connected");

    match cli.command {
        Command::Put {
            path,
            file,
            message,
        } => {
            let content = match file {
                Some(file) => tokio::fs::read(file).await.map_err(AppError::from)?,
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin()
                        .read_to_end(&mut buf)
                        .await
                        .map_err(AppError::from)?;
                    buf
                }
            };
            store
                .put(&path, &content, message.as_deref())
                .await
                .change_context(AppError::Storage)?;
        }
        Command::Get { path, output } => {
            let content = store.get(&path).await.change_context(AppError::Storage)?;
            match output {
                Some(output) => tokio::fs::write(output, content)
                    .await
                    .map_err(AppError::from)?,
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&content).await.map_err(AppError::from)?;
                    stdout.flush().await.map_err(AppError::from)?;
                }
            }
        }
        Command::Drop { path, message } => {
            store
                .drop(&path, message.as_deref())
                .await
                .change_context(AppError::Storage)?;
        }
        Command::Ls { path, with_content } => {
            let entries = store
                .contents(&path, ContentOptions { with_content })
                .await
                .change_context(AppError::Storage)?;
            print_json(&entries)?;
        }
        Command::Tree { with_content } => {
            let tree = store
                .tree(ContentOptions { with_content })
                .await
                .change_context(AppError::Storage)?;
            print_json(&tree)?;
        }
    }

    Ok(())
}
