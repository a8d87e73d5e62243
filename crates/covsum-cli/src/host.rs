//! Terminal implementation of the page host.
//!
//! Alerts and progress go to stderr, prompts read stdin, generated files
//! land in the working directory unless a path was given on the command line.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use covsum_page::{PageHost, PageState, SectionId};

use crate::clipboard::Clipboard;

#[derive(Debug, Default)]
pub struct TerminalHost {
    /// Preset answers in prompt order; `None` reads that answer from stdin.
    answers: VecDeque<Option<String>>,
    /// Where a saved file goes instead of `./<filename>`.
    save_to: Option<PathBuf>,
    alerts: Vec<String>,
    last_progress: Option<(String, String)>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers(mut self, answers: impl IntoIterator<Item = Option<String>>) -> Self {
        self.answers.extend(answers);
        self
    }

    pub fn save_to(mut self, path: Option<PathBuf>) -> Self {
        self.save_to = path;
        self
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }
}

impl PageHost for TerminalHost {
    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
        self.alerts.push(message.to_string());
    }

    fn prompt(&mut self, message: &str) -> Option<String> {
        if let Some(Some(answer)) = self.answers.pop_front() {
            return Some(answer);
        }

        let mut stderr = io::stderr();
        let _ = write!(stderr, "{message} ");
        let _ = stderr.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String> {
        Clipboard::copy(text).map_err(|e| e.to_string())
    }

    fn save_file(&mut self, filename: &str, contents: &str) -> Result<PathBuf> {
        let path = self
            .save_to
            .clone()
            .unwrap_or_else(|| PathBuf::from(filename));
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        eprintln!("Saved {}", path.display());
        Ok(path)
    }

    fn on_update(&mut self, state: &PageState) {
        if !state.is_visible(SectionId::Progress) {
            self.last_progress = None;
            return;
        }
        let current = (
            format!("{:.1}", state.progress.percentage),
            state.progress.display_message(),
        );
        if self.last_progress.as_ref() != Some(&current) {
            eprintln!("[{:>5}%] {}", current.0, current.1);
            self.last_progress = Some(current);
        }
    }
}
