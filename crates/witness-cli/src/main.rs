#![forbid(unsafe_code)]

mod cmd;
mod output;
mod store;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::OutputMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "wtn: operator tooling for witness log stores",
    long_about = None
)]
struct Cli {
    /// Store directory (defaults to $WITNESS_STORE, then ./.witness).
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    fn store_dir(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(|| {
            env::var_os("WITNESS_STORE")
                .map_or_else(|| PathBuf::from(".witness"), PathBuf::from)
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Initialize a store",
        after_help = "EXAMPLES:\n    # Initialize ./.witness\n    wtn init\n\n    # Initialize a specific directory\n    wtn --store /var/lib/witness init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        about = "List streams in the store",
        after_help = "EXAMPLES:\n    # Live streams only\n    wtn ls\n\n    # Include tombstones\n    wtn ls --all --json"
    )]
    Ls(cmd::ls::LsArgs),

    #[command(
        about = "Show one stream or tombstone",
        after_help = "EXAMPLES:\n    wtn show <final-hash>\n    wtn show '{\"student\":[\"Alice\"],\"tool\":[\"editor\"]}'"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        about = "Verify the hash chain of one stream",
        after_help = "EXAMPLES:\n    wtn verify <final-hash>\n    wtn verify <final-hash> --json"
    )]
    Verify(cmd::verify::VerifyArgs),

    #[command(
        about = "List finished sessions for a category value",
        after_help = "EXAMPLES:\n    wtn sessions student Alice"
    )]
    Sessions(cmd::sessions::SessionsArgs),

    #[command(
        about = "Erase a stream, leaving a tombstone",
        after_help = "EXAMPLES:\n    wtn delete <final-hash> --reason 'erasure request #42'"
    )]
    Delete(cmd::delete::DeleteArgs),
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("WITNESS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();
    let store_dir = cli.store_dir();

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, output, &store_dir),
        Commands::Ls(args) => cmd::ls::run_ls(&args, output, &store_dir),
        Commands::Show(args) => cmd::show::run_show(&args, output, &store_dir),
        Commands::Verify(args) => cmd::verify::run_verify(&args, output, &store_dir),
        Commands::Sessions(args) => cmd::sessions::run_sessions(&args, output, &store_dir),
        Commands::Delete(args) => cmd::delete::run_delete(&args, output, &store_dir),
    }
}
