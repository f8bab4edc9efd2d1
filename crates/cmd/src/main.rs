// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use bucketfs::BucketFs;
use clap::{Parser, Subcommand};
use cmd::commands::{cat_command, ls_command, serve_command, tree_command, zip_command};
use cmd::config::Config;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "bucketfs")]
/// Interacts with the files inside an object storage bucket as a read-only filesystem
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Concatenate files to standard output
    Cat {
        /// Files to print, in order
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// List the entries of a directory; directories end in '/'
    Ls {
        /// Directory to list
        path: String,
    },
    /// Display files and folders as a tree
    Tree {
        /// Directory to start from
        #[arg(default_value = ".")]
        path: String,
    },
    /// Create a zip archive with the contents of the bucket
    Zip {
        /// Archive file to create
        output: PathBuf,
    },
    /// Serve bucket files over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}

/// Cancelled on the first Ctrl-C so that stalled requests give up
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            diagnostics::info!("Interrupted");
            cancel.cancel();
        }
    });
    token
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init();

    let cli = Cli::parse();
    let config = cli.config;
    let fs = config.open_fs()?;

    // One-shot commands share a single deadline and stop on Ctrl-C
    let one_shot = |fs: BucketFs| config.with_deadline(fs).with_cancellation(interrupt_token());

    match cli.command {
        Commands::Serve { port } => serve_command(fs, config.timeout, port, print_line).await?,
        Commands::Cat { files } => {
            let mut stdout = tokio::io::stdout();
            _ = cat_command(&one_shot(fs), &files, &mut stdout).await?;
        }
        Commands::Ls { path } => ls_command(&one_shot(fs), &path, print_line).await?,
        Commands::Tree { path } => tree_command(&one_shot(fs), &path, print_line).await?,
        Commands::Zip { output } => {
            _ = zip_command(&one_shot(fs), &output).await?;
        }
    }
    Ok(())
}
