//! Two-stage script templating.
//!
//! The entry template runs the bound call; the launcher template runs the entry
//! script. Placeholders are substituted literally, with no escaping.
use std::path::Path;

use crate::error::CoreError;

/// Entry placeholder: path of the encoded bound call.
pub const DUMP_PATH: &str = "{dump_path}";
/// Entry placeholder: path the return value is written to.
pub const RET_PATH: &str = "{ret_path}";
/// Optional entry placeholder: worker executable that understands the entry flag.
pub const WORKER: &str = "{worker}";
/// Launcher placeholder: path of the rendered entry script.
pub const TARGET: &str = "{target}";

/// Default entry script: hand the dump to the worker executable.
pub const DEFAULT_ENTRY_TEMPLATE: &str =
    "#!/bin/sh\nexec \"{worker}\" __runwith-entry \"{dump_path}\" \"{ret_path}\"\n";

/// Default launcher: run the entry script under bash.
pub const DEFAULT_LAUNCHER_TEMPLATE: &str = "#!/bin/bash\nbash \"{target}\"\n\n";

/// Entry and launcher templates used to materialize one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePair {
    entry: String,
    launcher: String,
}

impl TemplatePair {
    pub fn new(entry: impl Into<String>, launcher: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            launcher: launcher.into(),
        }
    }

    /// Default entry template with a custom launcher.
    pub fn with_launcher(launcher: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENTRY_TEMPLATE, launcher)
    }

    /// Launcher that runs the entry script under `interpreter` instead of bash.
    pub fn interpreter(interpreter: &str) -> Self {
        Self::with_launcher(format!("#!/bin/bash\n{interpreter} \"{TARGET}\"\n\n"))
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn launcher(&self) -> &str {
        &self.launcher
    }

    /// Returns `true` if the entry template needs a worker executable.
    pub fn needs_worker(&self) -> bool {
        self.entry.contains(WORKER)
    }

    /// Check that every required placeholder is present.
    ///
    /// Rules:
    /// - entry contains `{dump_path}` and `{ret_path}`;
    /// - launcher contains `{target}`.
    pub fn validate(&self) -> Result<(), CoreError> {
        require("entry", &self.entry, DUMP_PATH)?;
        require("entry", &self.entry, RET_PATH)?;
        require("launcher", &self.launcher, TARGET)
    }

    /// Render the entry script.
    pub fn render_entry(&self, dump: &Path, ret: &Path, worker: Option<&Path>) -> String {
        let rendered = self
            .entry
            .replace(DUMP_PATH, &dump.display().to_string())
            .replace(RET_PATH, &ret.display().to_string());
        match worker {
            Some(w) => rendered.replace(WORKER, &w.display().to_string()),
            None => rendered,
        }
    }

    /// Render the launcher script.
    pub fn render_launcher(&self, target: &Path) -> String {
        self.launcher.replace(TARGET, &target.display().to_string())
    }
}

impl Default for TemplatePair {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_TEMPLATE, DEFAULT_LAUNCHER_TEMPLATE)
    }
}

fn require(template: &'static str, content: &str, placeholder: &'static str) -> Result<(), CoreError> {
    if content.contains(placeholder) {
        Ok(())
    } else {
        Err(CoreError::Template {
            template,
            placeholder,
            content: content.to_string(),
        })
    }
}
