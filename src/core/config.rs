use crate::core::resolver::ResolutionStrategy;
use std::path::PathBuf;

pub const DEFAULT_HASH_SIZE: u32 = 16;
pub const DEFAULT_SIMILARITY: i64 = 96;

/// Settings for one duplicate-removal run, built once by the CLI and passed down.
#[derive(Debug, Clone)]
pub struct DuplicatesConfig {
    pub directory: PathBuf,
    pub recursive: bool,
    /// Side of the N×N hash. 0 disables the duplicate search.
    pub hash_size: u32,
    /// Requested similarity in percent. Out-of-range values are clamped, not rejected.
    pub similarity: i64,
    pub verbose: bool,
    pub plot_disabled: bool,
    /// Strategy chosen up front; asked interactively when `None`.
    pub strategy: Option<ResolutionStrategy>,
    pub dry_run: bool,
    /// Answer the batch confirmation of the keep-largest/keep-newest strategies with "yes".
    pub assume_yes: bool,
}

impl DuplicatesConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            recursive: true,
            hash_size: DEFAULT_HASH_SIZE,
            similarity: DEFAULT_SIMILARITY,
            verbose: false,
            plot_disabled: false,
            strategy: None,
            dry_run: false,
            assume_yes: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.hash_size > 0
    }

    pub fn clamped_similarity(&self) -> u8 {
        clamp_similarity(self.similarity)
    }
}

pub fn clamp_similarity(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}
