//! cinder — operator CLI for on-demand heap diagnostics.
//!
//! Two commands mirror the two capture kinds: `heap-summary` for an
//! in-memory histogram delivered via upload (with local-save fallback) and
//! `heap-dump` for a full dump written to disk with optional compression.

mod backend;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use cinder_core::ActivityLog;
use cinder_core::DumpOptions;
use cinder_core::HeapAnalysis;
use cinder_core::JsonlActivityLog;
use cinder_core::NotificationSink;
use cinder_core::SummaryOptions;
use cinder_core::UploadClient;
use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::EnvFilter;

use crate::backend::SmapsBackend;

const DEFAULT_POST_URL: &str = "https://bin.cinder.dev/post";
const DEFAULT_VIEWER_URL: &str = "https://heap.cinder.dev/";

#[derive(Debug, Parser)]
#[command(name = "cinder", about = "Heap diagnostics for a running process")]
struct Cli {
    /// Upload endpoint for hosted artifact delivery.
    #[arg(long, default_value = DEFAULT_POST_URL, global = true)]
    endpoint: String,

    /// Viewer base URL used to build result links.
    #[arg(long, default_value = DEFAULT_VIEWER_URL, global = true)]
    viewer: String,

    /// Directory for saved artifacts. Defaults to the working directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capture a class-histogram summary of the live heap.
    HeapSummary {
        /// Issue an advisory garbage-collection request before capture.
        #[arg(long)]
        run_gc_before: bool,

        /// Skip upload and write the summary straight to disk.
        #[arg(long)]
        save_to_file: bool,
    },

    /// Capture a full heap dump to a file.
    HeapDump {
        /// Issue an advisory garbage-collection request before capture.
        #[arg(long)]
        run_gc_before: bool,

        /// Include objects that are no longer live.
        #[arg(long)]
        include_non_live: bool,

        /// Compress the dump afterwards (gzip or zstd). Unknown values
        /// disable compression without an error.
        #[arg(long, value_name = "method")]
        compress: Option<String>,
    },
}

/// Renders broadcast messages to stdout, one per line.
struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn broadcast(&self, message: String) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "[cinder] {message}");
    }
}

fn actor() -> String {
    std::env::var("USER").unwrap_or_else(|_| "operator".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let save_dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot resolve working directory")?,
    };

    let activity = JsonlActivityLog::new(save_dir.join("cinder-activity.jsonl"));
    let pipeline = HeapAnalysis::new(
        Arc::new(SmapsBackend),
        UploadClient::new(cli.endpoint, cli.viewer),
        Arc::new(StdoutSink),
        Arc::new(activity) as Arc<dyn ActivityLog>,
        save_dir,
    );

    let delivered = match cli.command {
        Command::HeapSummary {
            run_gc_before,
            save_to_file,
        } => {
            let opts = SummaryOptions {
                run_gc_before,
                save_to_file,
            };
            pipeline.heap_summary(&actor(), opts).await.is_some()
        }
        Command::HeapDump {
            run_gc_before,
            include_non_live,
            compress,
        } => {
            let opts = DumpOptions {
                run_gc_before,
                include_non_live,
                compress,
            };
            pipeline.heap_dump(&actor(), opts).await.is_some()
        }
    };

    Ok(if delivered {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
