use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pollcast_client::{display, identity, watch, PollClient};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pollcast", about = "Create, vote on and follow pollcast polls")]
struct Cli {
    /// Base URL of the pollcast server.
    #[arg(long, global = true, default_value = "http://localhost:5000")]
    server: String,

    /// Where the local voter id is kept. Defaults to ~/.pollcast_user.
    #[arg(long, global = true)]
    identity_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all polls, newest first.
    List,
    /// Show a poll's tallies and whether you have voted.
    Show { poll_id: String },
    /// Create a poll.
    Create {
        question: String,
        #[arg(required = true, num_args = 1..)]
        options: Vec<String>,
        /// Let voters pick more than one option.
        #[arg(long)]
        multiple: bool,
    },
    /// Vote for one or more options by index.
    Vote {
        poll_id: String,
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        indices: Vec<i64>,
    },
    /// Report whether you have voted on a poll.
    Status { poll_id: String },
    /// Refresh a poll every few seconds until interrupted.
    Watch { poll_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pollcast=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = PollClient::new(&cli.server)?;
    let identity_path = cli.identity_file.clone().unwrap_or_else(identity::default_path);
    let voter = || {
        identity::load_or_create(&identity_path)
            .with_context(|| format!("cannot use identity file {}", identity_path.display()))
    };

    match cli.command {
        Command::List => {
            let polls = client.list_polls().await?;
            if polls.is_empty() {
                println!("no polls yet");
            }
            for poll in &polls {
                println!("{}", display::poll_line(poll));
            }
        }
        Command::Show { poll_id } => {
            let user_id = voter()?;
            let snapshot = watch::fetch_snapshot(&client, &poll_id, &user_id).await?;
            println!("{}", display::poll_details(&snapshot.poll, Some(&snapshot.status)));
        }
        Command::Create {
            question,
            options,
            multiple,
        } => {
            let poll = client.create_poll(&question, &options, multiple).await?;
            println!("created poll {}", poll.id);
            println!("{}", display::poll_details(&poll, None));
        }
        Command::Vote { poll_id, indices } => {
            let user_id = voter()?;
            let poll = client.vote(&poll_id, &user_id, &indices).await?;
            let status = pollcast_models::VoteStatus {
                has_voted: true,
                voted_options: poll
                    .voters
                    .iter()
                    .find(|v| v.user_id == user_id)
                    .map(|v| v.voted_options.clone()),
            };
            println!("vote recorded");
            println!("{}", display::poll_details(&poll, Some(&status)));
        }
        Command::Status { poll_id } => {
            let user_id = voter()?;
            let status = client.check_vote(&poll_id, &user_id).await?;
            match status.voted_options {
                Some(options) if status.has_voted => {
                    println!("{user_id} voted for options {options:?}")
                }
                _ if status.has_voted => println!("{user_id} has voted"),
                _ => println!("{user_id} has not voted"),
            }
        }
        Command::Watch { poll_id } => {
            let user_id = voter()?;
            let watching = watch::watch(
                &client,
                &poll_id,
                &user_id,
                watch::REFRESH_INTERVAL,
                |snapshot| {
                    println!("{}\n", display::poll_details(&snapshot.poll, Some(&snapshot.status)));
                    true
                },
            );
            tokio::select! {
                result = watching => result?,
                _ = tokio::signal::ctrl_c() => {}
            }
        }
    }

    Ok(())
}
