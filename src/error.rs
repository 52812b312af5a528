//! Failure taxonomy shared by every pipeline stage.

use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("could not reach release source {url}: {source}")]
    SourceUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected release source format: {0}")]
    SourceFormat(String),

    #[error("no release available for platform {platform}")]
    NotFound { platform: String },

    #[error("download of {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid archive: {0}")]
    ArchiveFormat(String),

    #[error("could not determine installed version: {0}")]
    Probe(String),

    #[error("bad checksum for {name}: expected {expected}")]
    ChecksumMismatch { name: String, expected: String },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        PipelineError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn io_at(action: &str, path: &Path, source: io::Error) -> Self {
        Self::io(format!("Failed to {} {}", action, path.display()), source)
    }

    /// Short stable label used in the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::SourceUnreachable { .. } => "source unreachable",
            PipelineError::SourceFormat(_) => "source format",
            PipelineError::NotFound { .. } => "not found",
            PipelineError::Network { .. } => "network",
            PipelineError::Io { .. } => "io",
            PipelineError::ArchiveFormat(_) => "archive format",
            PipelineError::Probe(_) => "probe",
            PipelineError::ChecksumMismatch { .. } => "bad checksum",
        }
    }
}

/// Extension for attaching path context to raw `io::Result`s.
pub trait IoContext<T> {
    fn at(self, action: &str, path: &Path) -> PipelineResult<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, action: &str, path: &Path) -> PipelineResult<T> {
        self.map_err(|e| PipelineError::io_at(action, path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_mismatch_reads_as_bad_checksum() {
        let err = PipelineError::ChecksumMismatch {
            name: "go1.22.0.linux-amd64.tar.gz".to_string(),
            expected: "aa".to_string(),
        };
        assert!(err.to_string().starts_with("bad checksum"));
        assert_eq!(err.kind(), "bad checksum");
    }

    #[test]
    fn io_context_names_the_path() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.at("open", Path::new("/tmp/x")).unwrap_err();
        assert_eq!(err.to_string(), "Failed to open /tmp/x: gone");
    }
}
