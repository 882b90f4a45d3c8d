pub mod core;

pub use crate::core::config::DuplicatesConfig;
pub use crate::core::deletion::{DeletionExecutor, DeletionReport};
pub use crate::core::duplicate::DuplicateGroup;
pub use crate::core::prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use crate::core::remover::{RunSummary, remove_duplicates};
pub use crate::core::resolver::ResolutionStrategy;
