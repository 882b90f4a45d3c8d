use crate::core::deletion::{DeletionError, DeletionExecutor, DeletionReport};
use crate::core::duplicate::DuplicateGroup;
use crate::core::exif::organization_date;
use crate::core::prompt::{PromptError, Prompter, display_size, plot_images};
use clap::ValueEnum;
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// A removal failed. `resolution` holds everything deleted before it.
    #[error("{source}")]
    Deletion {
        #[source]
        source: DeletionError,
        resolution: Box<Resolution>,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("'{0}' is not a valid index")]
    NotANumber(String),

    #[error("Index {index} is out of range for a group of {len} files")]
    OutOfRange { index: usize, len: usize },

    #[error("At least one file of the group must be kept")]
    NoSurvivor,
}

/// How every duplicate group of a run is resolved. Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolutionStrategy {
    /// Keep everything.
    None,
    /// Keep the biggest file of each group.
    KeepLargest,
    /// Keep the most recently dated file of each group.
    KeepNewest,
    /// Ask, per group, which files to keep.
    ManualKeep,
    /// Ask, per group, which files to delete.
    ManualDelete,
}

impl ResolutionStrategy {
    pub const ALL: [ResolutionStrategy; 5] = [
        ResolutionStrategy::None,
        ResolutionStrategy::KeepLargest,
        ResolutionStrategy::KeepNewest,
        ResolutionStrategy::ManualKeep,
        ResolutionStrategy::ManualDelete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ResolutionStrategy::None => "Do nothing",
            ResolutionStrategy::KeepLargest => "Keep the largest file of each group",
            ResolutionStrategy::KeepNewest => "Keep the newest file of each group",
            ResolutionStrategy::ManualKeep => "Choose the files to keep in each group",
            ResolutionStrategy::ManualDelete => "Choose the files to delete in each group",
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(
            self,
            ResolutionStrategy::ManualKeep | ResolutionStrategy::ManualDelete
        )
    }
}

/// Outcome of resolving all groups of a run.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Every path selected for deletion, without repeats.
    pub deletion_set: Vec<PathBuf>,
    pub report: DeletionReport,
    /// The batch confirmation was declined and nothing was deleted.
    pub cancelled: bool,
}

/// Parse a comma-separated list of indices into a group of `len` files.
///
/// An empty (or blank) answer selects nothing. Repeated indices collapse.
pub fn parse_selection(input: &str, len: usize) -> Result<BTreeSet<usize>, SelectionError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(BTreeSet::new());
    }

    input
        .split(',')
        .map(|token| {
            let token = token.trim();
            let index: usize = token
                .parse()
                .map_err(|_| SelectionError::NotANumber(token.to_string()))?;
            if index >= len {
                return Err(SelectionError::OutOfRange { index, len });
            }
            Ok(index)
        })
        .collect()
}

/// Files of `members` to delete for a manual answer.
///
/// With `ManualKeep` the listed indices survive; with `ManualDelete` they go.
/// An empty answer deletes nothing in both modes. Automatic strategies never
/// delete through this path.
pub fn manual_deletions(
    strategy: ResolutionStrategy,
    input: &str,
    members: &[PathBuf],
) -> Result<Vec<PathBuf>, SelectionError> {
    let selected = parse_selection(input, members.len())?;
    if selected.is_empty() {
        return Ok(Vec::new());
    }

    let to_delete: Vec<PathBuf> = match strategy {
        ResolutionStrategy::ManualKeep => members
            .iter()
            .enumerate()
            .filter(|(i, _)| !selected.contains(i))
            .map(|(_, path)| path.clone())
            .collect(),
        ResolutionStrategy::ManualDelete => selected.iter().map(|&i| members[i].clone()).collect(),
        _ => Vec::new(),
    };

    if to_delete.len() == members.len() {
        return Err(SelectionError::NoSurvivor);
    }
    Ok(to_delete)
}

/// Split `members` into the survivor (highest key) and the rest.
///
/// Members without a key are left out. Ties go to the earliest member.
/// Returns `None` when fewer than two members have a key.
pub fn split_survivor<K, F>(members: &[PathBuf], key: F) -> Option<(PathBuf, Vec<PathBuf>)>
where
    K: Ord,
    F: Fn(&Path) -> Option<K>,
{
    let mut ranked: Vec<(&PathBuf, K)> = members
        .iter()
        .filter_map(|path| key(path.as_path()).map(|k| (path, k)))
        .collect();
    if ranked.len() < 2 {
        return None;
    }

    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let mut ranked = ranked.into_iter().map(|(path, _)| path.clone());
    let survivor = ranked.next()?;
    Some((survivor, ranked.collect()))
}

fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(|metadata| metadata.is_file())
        .map(|metadata| metadata.len())
}

fn file_date(path: &Path) -> Option<chrono::NaiveDateTime> {
    if file_size(path).is_none() {
        return None;
    }
    organization_date(path).ok()
}

/// Drives one strategy over every duplicate group and deletes what it selects.
pub struct GroupResolver<'a, P: Prompter> {
    prompter: &'a mut P,
    executor: DeletionExecutor,
    plot_disabled: bool,
    assume_yes: bool,
    /// Paths already deleted or queued for deletion in this run.
    removed: HashSet<PathBuf>,
}

impl<'a, P: Prompter> GroupResolver<'a, P> {
    pub fn new(prompter: &'a mut P, executor: DeletionExecutor) -> Self {
        Self {
            prompter,
            executor,
            plot_disabled: false,
            assume_yes: false,
            removed: HashSet::new(),
        }
    }

    pub fn plot_disabled(mut self, disabled: bool) -> Self {
        self.plot_disabled = disabled;
        self
    }

    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn resolve(
        &mut self,
        groups: &[DuplicateGroup],
        strategy: ResolutionStrategy,
    ) -> Result<Resolution, ResolveError> {
        info!(
            "Resolving {} group(s) with strategy {:?}",
            groups.len(),
            strategy
        );
        match strategy {
            ResolutionStrategy::None => Ok(Resolution::default()),
            ResolutionStrategy::KeepLargest => self.resolve_automatic(groups, file_size),
            ResolutionStrategy::KeepNewest => self.resolve_automatic(groups, file_date),
            ResolutionStrategy::ManualKeep | ResolutionStrategy::ManualDelete => {
                self.resolve_manual(groups, strategy)
            }
        }
    }

    /// Members still on disk and not already picked for deletion in this run.
    fn live_members(&self, group: &DuplicateGroup) -> Vec<PathBuf> {
        group
            .files
            .iter()
            .filter(|path| !self.removed.contains(*path) && path.is_file())
            .cloned()
            .collect()
    }

    /// Pick a survivor per group by `key`, then delete all the others in one confirmed batch.
    fn resolve_automatic<K, F>(
        &mut self,
        groups: &[DuplicateGroup],
        key: F,
    ) -> Result<Resolution, ResolveError>
    where
        K: Ord,
        F: Fn(&Path) -> Option<K>,
    {
        let mut deletion_set = Vec::new();

        for (i, group) in groups.iter().enumerate() {
            let members = self.live_members(group);
            let Some((survivor, redundant)) = split_survivor(&members, &key) else {
                debug!("Group {} has fewer than two files left, skipping", i + 1);
                continue;
            };

            println!("\n✨ Group {}:", i + 1);
            println!("   🏆 Keeping → {}", survivor.display());
            for path in redundant {
                if self.removed.insert(path.clone()) {
                    println!("   🗑️  Deleting → {} ({})", path.display(), display_size(&path));
                    deletion_set.push(path);
                }
            }
        }

        if deletion_set.is_empty() {
            return Ok(Resolution::default());
        }

        let question = format!(
            "Do you want to delete these {} files?",
            deletion_set.len()
        );
        let confirmed = self.assume_yes || self.prompter.confirm(&question)?;
        if !confirmed {
            info!("Deletion of {} files cancelled", deletion_set.len());
            return Ok(Resolution {
                deletion_set,
                report: DeletionReport::default(),
                cancelled: true,
            });
        }

        match self.executor.delete_all(&deletion_set) {
            Ok(report) => Ok(Resolution {
                deletion_set,
                report,
                cancelled: false,
            }),
            Err(source) => {
                let resolution = Resolution {
                    report: source.partial().clone(),
                    deletion_set,
                    cancelled: false,
                };
                Err(ResolveError::Deletion {
                    source,
                    resolution: Box::new(resolution),
                })
            }
        }
    }

    /// Ask about each group in turn and delete its selection right away.
    fn resolve_manual(
        &mut self,
        groups: &[DuplicateGroup],
        strategy: ResolutionStrategy,
    ) -> Result<Resolution, ResolveError> {
        let message = match strategy {
            ResolutionStrategy::ManualKeep => {
                "Indices of the files to KEEP, comma separated (empty keeps all)"
            }
            _ => "Indices of the files to DELETE, comma separated (empty deletes none)",
        };

        let mut resolution = Resolution::default();

        for (i, group) in groups.iter().enumerate() {
            let members = self.live_members(group);
            if members.len() < 2 {
                debug!("Group {} has fewer than two files left, skipping", i + 1);
                continue;
            }

            let title = format!(
                "Group {} of {} (similarity {}%)",
                i + 1,
                groups.len(),
                group.similarity_percent()
            );
            if self.plot_disabled {
                println!("\n✨ {}", title);
                for (index, path) in members.iter().enumerate() {
                    println!("   [{}] {} ({})", index, path.display(), display_size(path));
                }
            } else {
                plot_images(&members, &title, false);
            }

            let to_delete = loop {
                let answer = self.prompter.input(message)?;
                match manual_deletions(strategy, &answer, &members) {
                    Ok(paths) => break paths,
                    Err(e) => {
                        warn!("Rejected selection {:?}: {}", answer, e);
                        println!("   ⚠️  {}. Try again.", e);
                    }
                }
            };

            if to_delete.is_empty() {
                continue;
            }

            let outcome = self.executor.delete_all(&to_delete);
            self.removed.extend(to_delete.iter().cloned());
            resolution.deletion_set.extend(to_delete);
            match outcome {
                Ok(report) => resolution.report.merge(report),
                Err(source) => {
                    resolution.report.merge(source.partial().clone());
                    return Err(ResolveError::Deletion {
                        source,
                        resolution: Box::new(resolution),
                    });
                }
            }
        }

        Ok(resolution)
    }
}
