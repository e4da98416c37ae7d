//! Command-line front end for the classifier.
//!
//! # Responsibility
//! - Verify `parasort_core` linkage without starting the HTTP server.
//! - Print classifier verdicts as JSON for quick local checks.

use anyhow::Result;
use clap::{Parser, Subcommand};
use parasort_core::Classifier;

#[derive(Debug, Parser)]
#[command(name = "parasort", version, about = "PARA note classifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core version and a linkage ping.
    Version,
    /// Classify one note and print the verdict as JSON.
    Classify {
        /// Note body.
        content: String,
        #[arg(long)]
        title: Option<String>,
        /// Tag attached to the note; repeatable.
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    println!("{}", render(cli.command)?);
    Ok(())
}

fn render(command: Command) -> Result<String> {
    match command {
        Command::Version => Ok(format!(
            "parasort_core ping={} version={}",
            parasort_core::ping(),
            parasort_core::core_version()
        )),
        Command::Classify {
            content,
            title,
            tags,
        } => {
            let result =
                Classifier::default().classify(&content, title.as_deref(), Some(tags.as_slice()));
            Ok(serde_json::to_string_pretty(&result)?)
        }
    }
}
