use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pollcast-server", about = "Pollcast poll and voting server")]
pub struct Args {
    /// Path to a TOML config file; defaults and environment apply without one.
    #[arg(short, long)]
    pub config: Option<String>,
}
