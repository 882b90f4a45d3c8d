use crate::core::config::DuplicatesConfig;
use crate::core::deletion::{DeletionError, DeletionExecutor};
use crate::core::duplicate::{DuplicateGroup, diff_limit, find_similar_groups};
use crate::core::perceptual::{PerceptualHasher, hashed_files};
use crate::core::prompt::Prompter;
use crate::core::resolver::{GroupResolver, ResolutionStrategy, ResolveError};
use crate::core::scanner::{IMAGE_EXTENSIONS, filter_filepaths, get_filepaths};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// What a run found and did.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// The hash size was 0, so nothing was scanned.
    pub disabled: bool,
    pub files_scanned: usize,
    pub images_hashed: usize,
    pub groups: Vec<DuplicateGroup>,
    pub strategy: Option<ResolutionStrategy>,
    pub deleted: Vec<PathBuf>,
    pub bytes_freed: u64,
    pub cancelled: bool,
    /// The removal that stopped the run. `deleted` and `bytes_freed` cover
    /// what was removed before it.
    pub failure: Option<DeletionError>,
}

/// Run `f()`, log how long it took (with `label`), and return its result.
pub fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    info!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}

/// Scan, hash and group the images under `config.directory`.
pub fn find_duplicates(config: &DuplicatesConfig) -> Result<RunSummary> {
    let Some(hasher) = PerceptualHasher::new(config.hash_size) else {
        info!("Hash size is 0, skipping the duplicate search");
        return Ok(RunSummary {
            disabled: true,
            ..RunSummary::default()
        });
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message("Scanning for images…");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let files = get_filepaths(&config.directory, config.recursive)
        .with_context(|| format!("Failed to scan {}", config.directory.display()))?;
    spinner.finish_with_message(format!("Scan complete, {} files found", files.len()));

    let files_scanned = files.len();
    let images = filter_filepaths(files, IMAGE_EXTENSIONS);
    info!("{} of {} files are images", images.len(), files_scanned);

    let progress = ProgressBar::new(images.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("Finding duplicates: {bar:50.cyan/blue} {pos}/{len} {msg}")?,
    );
    let outcomes = benchmark("hashing all images", || {
        hasher.hash_files(&images, || progress.inc(1))
    });
    progress.finish_with_message("Complete");

    let hashed = hashed_files(outcomes);
    if hashed.len() < images.len() {
        info!(
            "{} images could not be hashed and were skipped",
            images.len() - hashed.len()
        );
    }

    let similarity = config.clamped_similarity();
    info!(
        "Comparing with similarity {}% (at most {} differing bits)",
        similarity,
        diff_limit(config.hash_size, similarity).saturating_sub(1)
    );
    let groups = benchmark("grouping similar images", || {
        find_similar_groups(&hashed, config.hash_size, similarity)
    });

    Ok(RunSummary {
        files_scanned,
        images_hashed: hashed.len(),
        groups,
        ..RunSummary::default()
    })
}

/// Print every group with its similarity and members.
pub fn print_groups(groups: &[DuplicateGroup]) {
    println!("✱ {} duplicates found:", groups.len());
    for group in groups {
        println!();
        println!("Similarity: {}%:", group.similarity_percent());
        for file in &group.files {
            println!("- {}", file.display());
        }
    }
    println!();
}

/// Ask which strategy to use for this run.
pub fn choose_strategy<P: Prompter>(prompter: &mut P) -> Result<ResolutionStrategy> {
    let labels: Vec<&str> = ResolutionStrategy::ALL.iter().map(|s| s.label()).collect();
    let index = prompter
        .select("What do you want to do with the duplicates?", &labels)
        .context("Failed to read the resolution strategy")?;
    Ok(ResolutionStrategy::ALL[index.min(ResolutionStrategy::ALL.len() - 1)])
}

/// Find the near-duplicate images under `config.directory` and resolve them
/// with the configured (or interactively chosen) strategy.
///
/// A failed removal does not discard the run: it is returned in
/// `RunSummary::failure` next to what was deleted before it.
pub fn remove_duplicates<P: Prompter>(
    config: &DuplicatesConfig,
    prompter: &mut P,
) -> Result<RunSummary> {
    let mut summary = find_duplicates(config)?;
    if summary.disabled || summary.groups.is_empty() {
        return Ok(summary);
    }

    print_groups(&summary.groups);

    let strategy = match config.strategy {
        Some(strategy) => strategy,
        None => choose_strategy(prompter)?,
    };
    summary.strategy = Some(strategy);

    let executor = if config.dry_run {
        DeletionExecutor::dry_run()
    } else {
        DeletionExecutor::new()
    };

    let outcome = GroupResolver::new(prompter, executor)
        .plot_disabled(config.plot_disabled)
        .assume_yes(config.assume_yes && !strategy.is_manual())
        .resolve(&summary.groups, strategy);
    let resolution = match outcome {
        Ok(resolution) => resolution,
        Err(ResolveError::Deletion { source, resolution }) => {
            summary.failure = Some(source);
            *resolution
        }
        Err(e) => return Err(e.into()),
    };

    summary.deleted = resolution.report.deleted;
    summary.bytes_freed = resolution.report.bytes_freed;
    summary.cancelled = resolution.cancelled;
    Ok(summary)
}
