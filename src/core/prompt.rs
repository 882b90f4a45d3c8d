use dialoguer::{Confirm, Input, Select};
use humansize::{DECIMAL, format_size};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Terminal prompt failed: {0}")]
    Terminal(#[from] dialoguer::Error),

    #[error("No answer left for prompt: {prompt}")]
    Exhausted { prompt: String },
}

/// Source of the user's answers during a run.
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool, PromptError>;

    /// Free-text answer. An empty string is a valid answer.
    fn input(&mut self, message: &str) -> Result<String, PromptError>;

    /// Index into `choices`.
    fn select(&mut self, message: &str, choices: &[&str]) -> Result<usize, PromptError>;
}

/// Interactive prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
        Ok(Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()?)
    }

    fn input(&mut self, message: &str) -> Result<String, PromptError> {
        Ok(Input::<String>::new()
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()?)
    }

    fn select(&mut self, message: &str, choices: &[&str]) -> Result<usize, PromptError> {
        Ok(Select::new()
            .with_prompt(message)
            .items(choices)
            .default(0)
            .interact()?)
    }
}

/// Replays queued answers; used for non-interactive runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    confirms: VecDeque<bool>,
    inputs: VecDeque<String>,
    selects: VecDeque<usize>,
    /// Every prompt shown, in order.
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirms(mut self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.confirms.extend(answers);
        self
    }

    pub fn with_inputs<S: Into<String>>(mut self, answers: impl IntoIterator<Item = S>) -> Self {
        self.inputs.extend(answers.into_iter().map(Into::into));
        self
    }

    pub fn with_selects(mut self, answers: impl IntoIterator<Item = usize>) -> Self {
        self.selects.extend(answers);
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
        self.asked.push(question.to_string());
        self.confirms.pop_front().ok_or_else(|| PromptError::Exhausted {
            prompt: question.to_string(),
        })
    }

    fn input(&mut self, message: &str) -> Result<String, PromptError> {
        self.asked.push(message.to_string());
        self.inputs.pop_front().ok_or_else(|| PromptError::Exhausted {
            prompt: message.to_string(),
        })
    }

    fn select(&mut self, message: &str, choices: &[&str]) -> Result<usize, PromptError> {
        self.asked.push(message.to_string());
        let index = self.selects.pop_front().ok_or_else(|| PromptError::Exhausted {
            prompt: message.to_string(),
        })?;
        Ok(index.min(choices.len().saturating_sub(1)))
    }
}

/// Size of a file for display, e.g. "2.10 MB". Missing files show as "missing".
pub fn display_size(path: &Path) -> String {
    match fs::metadata(path) {
        Ok(metadata) => format_size(metadata.len(), DECIMAL),
        Err(_) => "missing".to_string(),
    }
}

/// Text preview of a group: dimensions and size of each image.
pub fn plot_images(paths: &[PathBuf], title: &str, disabled: bool) {
    if disabled {
        return;
    }
    println!("\n🖼  {}", title);
    for (i, path) in paths.iter().enumerate() {
        let dimensions = image::image_dimensions(path)
            .map(|(w, h)| format!("{}x{}", w, h))
            .unwrap_or_else(|_| "?x?".to_string());
        println!(
            "   [{}] {} ({}, {})",
            i,
            path.display(),
            dimensions,
            display_size(path)
        );
    }
}
