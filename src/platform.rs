use crate::error::{PipelineError, PipelineResult};
use crate::types::*;

/// Host platform in Rust's own vocabulary (`std::env::consts`).
pub fn get_system_info() -> PlatformInfo {
    PlatformInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

/// `<goos>-<goarch>` as it appears in Go archive names, e.g. `linux-amd64`.
pub fn go_platform_tag(info: &PlatformInfo) -> String {
    let os = match info.os.as_str() {
        "macos" => "darwin",
        other => other,
    };
    let arch = match info.arch.as_str() {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "arm" => "armv6l",
        "loongarch64" => "loong64",
        "powerpc64" => "ppc64",
        other => other,
    };
    format!("{}-{}", os, arch)
}

/// `<arch>-<os>` as used for keys in the Zig download index, e.g. `x86_64-linux`.
pub fn zig_platform_key(info: &PlatformInfo) -> String {
    let arch = match info.arch.as_str() {
        "arm" => "armv7a",
        "powerpc64" => "powerpc64le",
        other => other,
    };
    format!("{}-{}", arch, info.os)
}

/// How a toolchain picks its artifact out of a parsed release list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformRule {
    /// First entry whose name contains the tag wins.
    NameContains(String),
    /// The source already resolved the platform; at most one candidate exists.
    Single(String),
}

impl PlatformRule {
    pub fn platform(&self) -> &str {
        match self {
            PlatformRule::NameContains(tag) | PlatformRule::Single(tag) => tag,
        }
    }
}

pub fn select_entry(entries: &[ReleaseEntry], rule: &PlatformRule) -> PipelineResult<ReleaseEntry> {
    tracing::trace!("Selecting from {} entries with {:?}", entries.len(), rule);

    let found = match rule {
        PlatformRule::NameContains(tag) => entries.iter().find(|e| e.name.contains(tag.as_str())),
        PlatformRule::Single(_) => {
            if entries.len() > 1 {
                tracing::warn!(
                    "Expected a single candidate but the source returned {}; using the first",
                    entries.len()
                );
            }
            entries.first()
        }
    };

    match found {
        Some(entry) => {
            tracing::info!(
                "Found best match: '{}' [{}]",
                entry.name,
                entry.platform.as_deref().unwrap_or(rule.platform())
            );
            Ok(entry.clone())
        }
        None => Err(PipelineError::NotFound {
            platform: rule.platform().to_string(),
        }),
    }
}
