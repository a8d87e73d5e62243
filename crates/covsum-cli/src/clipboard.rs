//! Clipboard access for the terminal host.
//!
//! Transports, in order:
//! 1. System clipboard via `arboard`
//! 2. OSC 52 escape sequence, only when stdout is a terminal (works over SSH)

use std::fmt;
use std::io::{IsTerminal, Write};

pub struct Clipboard;

impl Clipboard {
    /// Copies text to the clipboard.
    ///
    /// # Errors
    /// Returns the system error when neither transport is available.
    pub fn copy(text: &str) -> Result<(), ClipboardError> {
        match Self::copy_system(text) {
            Ok(()) => Ok(()),
            Err(system) if std::io::stdout().is_terminal() => {
                Self::copy_osc52(text).map_err(|osc| {
                    tracing::debug!(%osc, "OSC 52 fallback failed");
                    system
                })
            }
            Err(system) => Err(system),
        }
    }

    fn copy_system(text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::System(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::System(e.to_string()))
    }

    /// OSC 52 format: ESC ] 52 ; c ; <base64-data> ESC \
    fn copy_osc52(text: &str) -> Result<(), ClipboardError> {
        use base64::Engine;

        let encoded = base64::engine::general_purpose::STANDARD.encode(text);
        let mut stdout = std::io::stdout();
        write!(stdout, "\x1b]52;c;{encoded}\x1b\\")
            .map_err(|e| ClipboardError::Osc52(e.to_string()))?;
        stdout
            .flush()
            .map_err(|e| ClipboardError::Osc52(e.to_string()))
    }
}

#[derive(Debug)]
pub enum ClipboardError {
    Osc52(String),
    System(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Osc52(msg) => write!(f, "OSC 52 clipboard failed: {msg}"),
            ClipboardError::System(msg) => write!(f, "System clipboard failed: {msg}"),
        }
    }
}

impl std::error::Error for ClipboardError {}
