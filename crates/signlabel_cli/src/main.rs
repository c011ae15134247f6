//! `signlabel` command-line entry point.
//!
//! # Responsibility
//! - Expose labeling use-cases (draw, submit, progress, stats) to scripts
//!   and terminal volunteers.
//! - Keep output line-oriented so it can be piped.

use clap::{Parser, Subcommand};
use log::{info, warn};
use signlabel_core::{
    core_version, image_url, init_logging, sample_examples, LabelSession, LabelerConfig,
    LabelingService,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "signlabel", version, about = "Crowd-sourced street-sign labeling")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, default_value = "signlabel.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Draw an image that still needs labels.
    Next {
        #[arg(long)]
        user: String,
    },
    /// Record one label and wait until it is stored.
    Submit {
        #[arg(long)]
        user: String,
        #[arg(long)]
        image: String,
        /// Category key or title; repeat for several.
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Show how much of the catalog is labeled.
    Progress,
    /// Show a volunteer's label count and rank.
    Stats {
        #[arg(long)]
        user: String,
    },
    /// List categories with a few example images each.
    Categories {
        #[arg(long, default_value_t = 4)]
        examples: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = LabelerConfig::load(&cli.config)?;
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let mut service = LabelingService::open(&config)?;
    info!(
        "event=cli_start module=cli status=ok core_version={} images={}",
        core_version(),
        service.catalog().len()
    );
    if service.catalog().is_empty() {
        warn!("event=cli_start module=cli status=degraded reason=empty_catalog");
    }

    match cli.command {
        Command::Next { user } => {
            let mut session = LabelSession::new();
            service.login(&mut session, &user)?;
            match service.present(&mut session)? {
                Some(image) => {
                    println!("image={image}");
                    println!("url={}", image_url(&config.image_base_url, &image));
                }
                None => println!("All images have been labeled twice. Thank you!"),
            }
        }
        Command::Submit {
            user,
            image,
            categories,
        } => {
            let submission = service.submit_label(&user, &image, &categories)?;
            let id = submission.pending.wait()?;
            println!(
                "stored id={id} user={} image={} categories={}",
                submission.event.user,
                submission.event.image,
                submission
                    .event
                    .categories
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(",")
            );
        }
        Command::Progress => {
            let progress = service.progress()?;
            println!(
                "{} out of {} images have been labeled by at least 1 user ({:.1}%)",
                progress.labeled_once,
                progress.total,
                progress.fraction_once() * 100.0
            );
            println!(
                "{} out of {} images are complete ({:.1}%)",
                progress.labeled_complete,
                progress.total,
                progress.fraction_complete() * 100.0
            );
        }
        Command::Stats { user } => {
            let stats = service.user_stats(&user)?;
            match stats.rank {
                Some(rank) => println!("user={user} labeled={} rank={rank}", stats.total_labeled),
                None => println!("user={user} labeled=0 rank=-"),
            }
        }
        Command::Categories { examples } => {
            let mut rng = rand::thread_rng();
            for category in service.categories().iter() {
                println!("{}\t{}\t{}", category.key, category.title, category.explanation);
                if let Some(dir) = &config.examples_dir {
                    for path in sample_examples(dir, &category.key, examples, &mut rng) {
                        println!("  example={}", path.display());
                    }
                }
            }
        }
    }
    Ok(())
}
