//! Stylesheet and script embedded into every report.
//!
//! Both are looked up by fixed name in the configured resources directory
//! and fall back to the copies compiled into the binary when absent.

use std::io::ErrorKind;
use std::path::Path;

use crate::ReportError;

pub const STYLE_FILE: &str = "report_style.css";
pub const SCRIPT_FILE: &str = "report_script.js";

const DEFAULT_STYLE: &str = include_str!("../resources/report_style.css");
const DEFAULT_SCRIPT: &str = include_str!("../resources/report_script.js");

/// CSS and JavaScript text inserted verbatim into a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    pub style: String,
    /// Either bare JavaScript or a complete `<script>` element.
    pub script: String,
}

impl Default for Resources {
    fn default() -> Self {
        Self::embedded()
    }
}

impl Resources {
    /// The built-in stylesheet and pop-up script.
    #[must_use]
    pub fn embedded() -> Self {
        Self {
            style: DEFAULT_STYLE.to_string(),
            script: DEFAULT_SCRIPT.to_string(),
        }
    }

    /// Reads `report_style.css` and `report_script.js` from `dir`. A file
    /// that does not exist is replaced by its embedded default.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Io`] if a file exists but cannot be read.
    pub fn load(dir: &Path) -> Result<Self, ReportError> {
        Ok(Self {
            style: read_or_default(dir, STYLE_FILE, DEFAULT_STYLE)?,
            script: read_or_default(dir, SCRIPT_FILE, DEFAULT_SCRIPT)?,
        })
    }

    /// The script as a complete `<script>` element.
    #[must_use]
    pub fn script_element(&self) -> String {
        if self.script.trim_start().starts_with("<script") {
            self.script.clone()
        } else {
            format!("<script>\n{}\n</script>", self.script)
        }
    }
}

fn read_or_default(dir: &Path, name: &str, default: &str) -> Result<String, ReportError> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            log::debug!("Using report resource {}", path.display());
            Ok(contents)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("{} not found, using built-in {name}", path.display());
            Ok(default.to_string())
        }
        Err(source) => Err(ReportError::Io { path, source }),
    }
}
