//! The acquisition pipeline shared by every toolchain:
//! release source -> platform match -> download -> verify -> stage -> swap.

use crate::archive;
use crate::config::APP_NAME;
use crate::download::download;
use crate::error::{PipelineError, PipelineResult};
use crate::platform::select_entry;
use crate::probe::installed_version;
use crate::receipt::Receipt;
use crate::source::list_releases;
use crate::toolchain::Toolchain;
use crate::types::{PlatformInfo, ReleaseEntry, Settings};
use anyhow::{Context, Result};
use futures_util::future::join_all;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Installed { version: String },
    Updated { from: String, to: String },
    UpToDate { version: String },
}

#[derive(Debug)]
pub struct ToolReport {
    pub tool: &'static str,
    pub result: PipelineResult<Outcome>,
}

pub fn build_client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

pub struct Pipeline {
    client: reqwest::Client,
    base_dir: PathBuf,
    platform: PlatformInfo,
    show_progress: bool,
}

impl Pipeline {
    pub fn new(client: reqwest::Client, base_dir: &Path, platform: PlatformInfo) -> Self {
        Self {
            client,
            base_dir: base_dir.to_path_buf(),
            platform,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// The single active install directory for `toolchain`.
    pub fn install_dir(&self, toolchain: &dyn Toolchain) -> PathBuf {
        self.base_dir.join(toolchain.name())
    }

    pub async fn install(&self, toolchain: &dyn Toolchain) -> PipelineResult<Outcome> {
        let entries = list_releases(&self.client, &toolchain.source(&self.platform)).await?;
        let version = self.acquire(toolchain, &entries).await?;
        Ok(Outcome::Installed { version })
    }

    /// Install only when the installed version differs from the advertised latest.
    pub async fn update(&self, toolchain: &dyn Toolchain) -> PipelineResult<Outcome> {
        let dest = self.install_dir(toolchain);
        let source = toolchain.source(&self.platform);

        let (installed, entries) = tokio::join!(
            installed_version(toolchain, &dest),
            list_releases(&self.client, &source)
        );
        let installed = installed?;
        let entries = entries?;
        let latest = toolchain.latest_version(&entries)?;

        match installed {
            Some(current) if current == latest => {
                tracing::info!("Up to date: {}", current);
                Ok(Outcome::UpToDate { version: current })
            }
            Some(current) => {
                tracing::info!("Version mismatch latest: {}, installed: {}", latest, current);
                let version = self.acquire(toolchain, &entries).await?;
                Ok(Outcome::Updated {
                    from: current,
                    to: version,
                })
            }
            None => {
                tracing::info!("Not installed; installing {}", latest);
                let version = self.acquire(toolchain, &entries).await?;
                Ok(Outcome::Installed { version })
            }
        }
    }

    /// Select, download, verify and install. Returns the installed version.
    async fn acquire(
        &self,
        toolchain: &dyn Toolchain,
        entries: &[ReleaseEntry],
    ) -> PipelineResult<String> {
        let entry = select_entry(entries, &toolchain.platform_rule(&self.platform))?;
        let mut file = download(&self.client, &entry, self.show_progress).await?;

        let valid = crate::verify::verify(&mut file, &entry.checksum)?;
        if !valid {
            return Err(PipelineError::ChecksumMismatch {
                name: entry.file_name().to_string(),
                expected: entry.checksum.clone(),
            });
        }

        let version = toolchain.entry_version(&entry);
        let codec = toolchain.codec_for(&entry);
        let receipt = Receipt::new(toolchain.name(), &version, &entry);
        let dest = self.install_dir(toolchain);
        let base_dir = self.base_dir.clone();

        tokio::task::spawn_blocking(move || -> PipelineResult<()> {
            let staged = archive::stage(&mut file, codec, &base_dir)?;
            receipt.write_into(staged.root())?;
            staged.commit(&dest)
        })
        .await
        .map_err(|e| {
            PipelineError::io("Extraction task failed", io::Error::new(io::ErrorKind::Other, e))
        })??;

        Ok(version)
    }
}

/// Run `action` for every toolchain concurrently and wait for all of them.
///
/// A failing toolchain is reported and never stops its siblings.
pub async fn run_all(
    pipeline: &Pipeline,
    toolchains: &[Box<dyn Toolchain>],
    action: Action,
) -> Vec<ToolReport> {
    let tasks = toolchains.iter().map(|toolchain| {
        let tool = toolchain.name();
        let span = tracing::info_span!("toolchain", tool);
        async move {
            let result = match action {
                Action::Install => pipeline.install(toolchain.as_ref()).await,
                Action::Update => pipeline.update(toolchain.as_ref()).await,
            };
            if let Err(e) = &result {
                tracing::error!("{}", e);
            }
            ToolReport { tool, result }
        }
        .instrument(span)
    });

    join_all(tasks).await
}
