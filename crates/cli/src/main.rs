use anyhow::Result;
use clap::{Parser, Subcommand};
use cleanvid_core::config;
use cli::{records, watch};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => watch::watch(cfg).await,
        Commands::Once { json } => {
            let summary = watch::run_once(cfg).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "candidates: {}  processed: {}  failed: {}  unchanged: {}  unstable: {}",
                    summary.discovered,
                    summary.processed,
                    summary.failed,
                    summary.unchanged,
                    summary.unstable
                );
            }
            Ok(())
        }
        Commands::List { json } => {
            let rows = records::list_records(&cfg.db_path);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No processed files recorded in {}", cfg.db_path);
            } else {
                for row in rows {
                    let video = row
                        .video
                        .map(|v| format!("{} bytes @ {}", v.size, v.mtime))
                        .unwrap_or_else(|| "-".to_string());
                    let subs = row
                        .subs
                        .map(|s| format!("{} bytes @ {}", s.size, s.mtime))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{}\n  video: {}  subs: {}  processed: {}",
                        row.path, video, subs, row.processed_at
                    );
                }
            }
            Ok(())
        }
        Commands::Forget { paths } => {
            let removed = records::forget(&cfg.db_path, &paths)?;
            println!("Forgot {} of {} path(s)", removed, paths.len());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[derive(Parser)]
#[command(name = "cleanvid-watch")]
#[command(about = "Watches folders and runs cleanvid on new or changed videos", long_about = None)]
struct Cli {
    /// Path to config file (otherwise config/cleanvid if present)
    #[arg(short, long)]
    config: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the watch directories until interrupted (default)
    Run,
    /// Run a single cycle and print what happened
    Once {
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// List processed files recorded in the database
    List {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove records so the files are processed again next cycle
    Forget {
        /// Video paths as they appear in the watch directories
        #[arg(required = true)]
        paths: Vec<String>,
    },
}
