//! What the page needs from its surroundings.
//!
//! A browser would give the page alerts, prompts, a clipboard and downloads
//! for free. Here the embedding program supplies them through `PageHost`.

use std::path::PathBuf;

use crate::state::PageState;

pub trait PageHost {
    /// Shows a blocking notice.
    fn alert(&mut self, message: &str);

    /// Asks for one line of input; `None` when the user dismissed the prompt.
    fn prompt(&mut self, message: &str) -> Option<String>;

    /// # Errors
    /// Returns a displayable reason when no clipboard is reachable.
    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), String>;

    /// Stores a generated file; returns where it landed.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    fn save_file(&mut self, filename: &str, contents: &str) -> anyhow::Result<PathBuf>;

    fn scroll_to(&mut self, _target: &str) {}

    /// Called after every reducer step.
    fn on_update(&mut self, _state: &PageState) {}
}
