use crate::error::{IoContext, PipelineError, PipelineResult};
use crate::types::ReleaseEntry;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const RECEIPT_FILE_NAME: &str = ".tn-receipt.json";

/// Record of what was installed, written inside the install directory itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub tool: String,
    pub version: String,
    pub artifact: String,
    pub checksum: String,
    pub url: String,
    pub installed_at: String,
}

impl Receipt {
    pub fn new(tool: &str, version: &str, entry: &ReleaseEntry) -> Self {
        Self {
            tool: tool.to_string(),
            version: version.to_string(),
            artifact: entry.file_name().to_string(),
            checksum: entry.checksum.trim().to_lowercase(),
            url: entry.url.clone(),
            installed_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn path_in(install_dir: &Path) -> PathBuf {
        install_dir.join(RECEIPT_FILE_NAME)
    }

    pub fn write_into(&self, install_dir: &Path) -> PipelineResult<()> {
        let path = Self::path_in(install_dir);
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::io("Failed to serialize receipt", e.into()))?;
        fs::write(&path, content).at("write", &path)
    }

    /// `Ok(None)` when the directory has no receipt.
    pub fn read(install_dir: &Path) -> PipelineResult<Option<Receipt>> {
        let path = Self::path_in(install_dir);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).at("read", &path)?;
        let receipt = serde_json::from_str(&content)
            .map_err(|e| PipelineError::io_at("parse", &path, e.into()))?;
        Ok(Some(receipt))
    }
}

/// Receipt of each named tool under `base_dir`, in the order given.
pub fn list_installed(
    base_dir: &Path,
    tools: &[&'static str],
) -> PipelineResult<Vec<(&'static str, Option<Receipt>)>> {
    tools
        .iter()
        .map(|tool| Ok((*tool, Receipt::read(&base_dir.join(tool))?)))
        .collect()
}
