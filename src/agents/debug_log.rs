// Pipeline debug channel with optional file sink

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Debug messages gated by the session's debug level
///
/// Messages go to the `log` facade and, once `set_path` was called, are also
/// appended to a file. File errors are ignored.
#[derive(Debug, Default)]
pub struct DebugLog {
    path: Option<PathBuf>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_path(&mut self, path: &Path) {
        self.path = Some(path.to_path_buf());
    }

    /// Line written to the log file for a message
    pub fn format_line(level: u8, message: &str) -> String {
        format!("[agent:debug:{}] {}", level, message)
    }

    /// Emit `message` if `level` is enabled by `configured_level`
    pub fn emit(&self, configured_level: u8, level: u8, message: &str) {
        if level == 0 || level > configured_level {
            return;
        }

        let line = Self::format_line(level, message);
        log::debug!("{}", line);

        if let Some(ref path) = self.path {
            let written = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| writeln!(file, "{}", line));
            if let Err(e) = written {
                log::trace!("[DebugLog] Ignoring write failure for {}: {}", path.display(), e);
            }
        }
    }
}
