use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

/// Capability for confirming destructive operations.
///
/// Command handlers take this as a parameter so the logic around deletions
/// stays testable without a terminal.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Asks on stdout and reads the answer from stdin. Anything other than
/// `y`/`yes` declines.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        print!("{prompt} [y/N] ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("Failed to read confirmation")?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// Confirms everything without prompting (`--yes`).
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) struct ScriptedConfirm {
    pub answers: Vec<bool>,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedConfirm {
    pub(crate) fn new(answers: &[bool]) -> Self {
        // Answers are handed out in the order given.
        let mut answers = answers.to_vec();
        answers.reverse();
        Self {
            answers,
            prompts: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop().unwrap_or(false))
    }
}
