use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use mediatidy::core::config::{DEFAULT_HASH_SIZE, DEFAULT_SIMILARITY};
use mediatidy::core::deletion::bytes_to_megabytes;
use mediatidy::core::scanner::remove_empty_folders;
use mediatidy::{
    DuplicatesConfig, ResolutionStrategy, RunSummary, TerminalPrompter, remove_duplicates,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mediatidy", version, about = "Tidy up a photo and video collection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find similar images and remove the redundant copies
    Duplicates(DuplicatesArgs),
}

#[derive(Args, Debug)]
struct DuplicatesArgs {
    /// Directory with the images to process
    #[arg(value_name = "DIR")]
    path: PathBuf,

    /// Only look at the files directly inside DIR
    #[arg(long = "no-recursive", action = ArgAction::SetFalse)]
    recursive: bool,

    /// Side of the perceptual hash. Larger values are more exhaustive but slower; 0 skips the search
    #[arg(long, default_value_t = DEFAULT_HASH_SIZE)]
    hash_size: u32,

    /// Similarity (0 to 100) that makes two images duplicates; 100 means identical
    #[arg(short, long, default_value_t = DEFAULT_SIMILARITY, allow_negative_numbers = true)]
    similarity: i64,

    /// What to do with each group; asked interactively when omitted
    #[arg(long, value_enum)]
    strategy: Option<ResolutionStrategy>,

    /// Do not preview the images of a group before asking about it
    #[arg(long)]
    plot_disabled: bool,

    /// Only show what would be deleted
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation of the keep-largest and keep-newest strategies
    #[arg(short, long)]
    yes: bool,

    /// Remove folders left empty after deleting files
    #[arg(long)]
    prune_empty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl From<&DuplicatesArgs> for DuplicatesConfig {
    fn from(args: &DuplicatesArgs) -> Self {
        DuplicatesConfig {
            directory: args.path.clone(),
            recursive: args.recursive,
            hash_size: args.hash_size,
            similarity: args.similarity,
            verbose: args.verbose,
            plot_disabled: args.plot_disabled,
            strategy: args.strategy,
            dry_run: args.dry_run,
            assume_yes: args.yes,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Duplicates(args) => {
            setup_logging(args.verbose);
            let config = DuplicatesConfig::from(&args);

            println!("▶ Looking for duplicates in: {}", config.directory.display());
            let mut prompter = TerminalPrompter::new();
            let mut summary = remove_duplicates(&config, &mut prompter)?;
            print_summary(&summary, config.dry_run);
            if let Some(failure) = summary.failure.take() {
                return Err(failure.into());
            }

            if args.prune_empty && !config.dry_run && !summary.deleted.is_empty() {
                let removed = remove_empty_folders(&config.directory).with_context(|| {
                    format!("Failed to prune {}", config.directory.display())
                })?;
                println!("🧹 Removed {} empty folder(s)", removed.len());
            }
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    if summary.disabled {
        println!("✱ Hash size is 0, duplicate search skipped.");
        return;
    }
    if summary.groups.is_empty() {
        println!(
            "✔ No duplicates found! ({} images compared)",
            summary.images_hashed
        );
        return;
    }

    println!(
        "\n✱ {} group(s) of duplicates in {} images",
        summary.groups.len(),
        summary.images_hashed
    );
    if summary.failure.is_some() {
        println!(
            "⚠️  Stopped on a failed deletion after removing {} images ({}MB freed).",
            summary.deleted.len(),
            bytes_to_megabytes(summary.bytes_freed)
        );
    } else if summary.cancelled {
        println!("Deletion cancelled, no files were changed.");
    } else if summary.deleted.is_empty() {
        println!("No files were deleted.");
    } else if dry_run {
        println!(
            "⚠️  Dry-run only: {} images would be deleted, saving {}MB of space.",
            summary.deleted.len(),
            bytes_to_megabytes(summary.bytes_freed)
        );
    } else {
        println!(
            "✅ {} images deleted successfully. You saved {}MB of space!",
            summary.deleted.len(),
            bytes_to_megabytes(summary.bytes_freed)
        );
    }
}
