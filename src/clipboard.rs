//! Copying results to the clipboard
//!
//! Two strategies, tried in order: the system clipboard through `arboard`,
//! then an external copy command (wl-copy, xclip, ...) fed on stdin.
//! Failures never leave this module as errors, only as [`CopyOutcome::Failed`].

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::config::{ClipboardConfig, CopyCommand};

/// Upper bound for a single copy attempt (both strategies)
pub const COPY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("system clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("clipboard write failed: {0}")]
    Write(String),
    #[error("no copy command succeeded (tried: {0})")]
    NoCommand(String),
}

impl From<arboard::Error> for ClipboardError {
    fn from(e: arboard::Error) -> Self {
        ClipboardError::Write(e.to_string())
    }
}

pub trait ClipboardBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Succeeded { backend: &'static str },
    Failed,
}

/// System clipboard via arboard.
///
/// The handle is kept for the whole process: on X11 the copied text is
/// served by its owner and disappears once the owner is dropped.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Mutex<Option<arboard::Clipboard>>,
}

impl ClipboardBackend for SystemClipboard {
    fn name(&self) -> &'static str {
        "system"
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self
            .handle
            .lock()
            .map_err(|_| ClipboardError::Unavailable("clipboard lock poisoned".to_string()))?;

        if guard.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            *guard = Some(clipboard);
        }

        match guard.as_mut() {
            Some(clipboard) => Ok(clipboard.set_text(text.to_owned())?),
            None => Err(ClipboardError::Unavailable("no clipboard handle".to_string())),
        }
    }
}

/// Pipe the text into the first external copy command that succeeds
pub struct CommandClipboard {
    commands: Vec<CopyCommand>,
}

impl CommandClipboard {
    pub fn new(commands: Vec<CopyCommand>) -> Self {
        Self { commands }
    }

    fn run(command: &CopyCommand, text: &str) -> std::io::Result<bool> {
        // stdout/stderr are not captured: wl-copy and xclip fork a server
        // that would otherwise hold the pipes open
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        Ok(child.wait()?.success())
    }
}

impl ClipboardBackend for CommandClipboard {
    fn name(&self) -> &'static str {
        "command"
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        for command in &self.commands {
            match Self::run(command, text) {
                Ok(true) => {
                    tracing::debug!("copied with {}", command.program);
                    return Ok(());
                }
                Ok(false) => tracing::debug!("{} exited with failure", command.program),
                Err(e) => tracing::debug!("{} unavailable: {}", command.program, e),
            }
        }

        let tried: Vec<&str> = self.commands.iter().map(|c| c.program.as_str()).collect();
        Err(ClipboardError::NoCommand(tried.join(", ")))
    }
}

/// Primary strategy with an optional fallback
pub struct Copier {
    primary: Box<dyn ClipboardBackend>,
    fallback: Option<Box<dyn ClipboardBackend>>,
}

impl Copier {
    pub fn new(
        primary: Box<dyn ClipboardBackend>,
        fallback: Option<Box<dyn ClipboardBackend>>,
    ) -> Self {
        Self { primary, fallback }
    }

    pub fn from_config(config: &ClipboardConfig) -> Self {
        let fallback: Option<Box<dyn ClipboardBackend>> = if config.fallback {
            Some(Box::new(CommandClipboard::new(config.commands.clone())))
        } else {
            None
        };
        Self::new(Box::new(SystemClipboard::default()), fallback)
    }

    /// Run one copy attempt off the UI thread
    pub async fn copy(self: Arc<Self>, text: String) -> CopyOutcome {
        let result = timeout(
            COPY_TIMEOUT,
            tokio::task::spawn_blocking(move || self.copy_blocking(&text)),
        )
        .await;

        match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!("Copy task failed: {}", e);
                CopyOutcome::Failed
            }
            Err(_) => {
                tracing::warn!("Copy timed out after {:?}", COPY_TIMEOUT);
                CopyOutcome::Failed
            }
        }
    }

    pub fn copy_blocking(&self, text: &str) -> CopyOutcome {
        match self.primary.write_text(text) {
            Ok(()) => {
                return CopyOutcome::Succeeded {
                    backend: self.primary.name(),
                }
            }
            Err(e) => tracing::warn!("{} clipboard failed: {}", self.primary.name(), e),
        }

        let Some(fallback) = &self.fallback else {
            return CopyOutcome::Failed;
        };

        match fallback.write_text(text) {
            Ok(()) => CopyOutcome::Succeeded {
                backend: fallback.name(),
            },
            Err(e) => {
                tracing::error!("{} clipboard failed: {}", fallback.name(), e);
                CopyOutcome::Failed
            }
        }
    }
}
