use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One downloadable artifact as published by a release source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseEntry {
    /// File name for listing pages, version string for index channels.
    pub name: String,
    pub checksum: String,
    pub url: String,
    /// `None` for rolling channels that publish a single build per platform lookup.
    pub platform: Option<String>,
}

impl ReleaseEntry {
    /// Last path segment of the download URL.
    pub fn file_name(&self) -> &str {
        self.url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_go_origin")]
    pub go_origin: String,
    #[serde(default = "default_zig_index_url")]
    pub zig_index_url: String,
    #[serde(default = "default_zig_channel")]
    pub zig_channel: String,
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,
    #[serde(default = "default_shell_profile")]
    pub shell_profile: PathBuf,
}

fn default_http_timeout_secs() -> u64 {
    600
}
fn default_connect_timeout_secs() -> u64 {
    30
}
fn default_go_origin() -> String {
    "https://go.dev".to_string()
}
fn default_zig_index_url() -> String {
    "https://ziglang.org/download/index.json".to_string()
}
fn default_zig_channel() -> String {
    "master".to_string()
}
fn default_tools() -> Vec<String> {
    vec!["go".to_string(), "zig".to_string()]
}
fn default_shell_profile() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bash_profile")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            go_origin: default_go_origin(),
            zig_index_url: default_zig_index_url(),
            zig_channel: default_zig_channel(),
            tools: default_tools(),
            shell_profile: default_shell_profile(),
        }
    }
}
