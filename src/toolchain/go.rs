use super::{exe, Toolchain};
use crate::archive::Codec;
use crate::error::{PipelineError, PipelineResult};
use crate::platform::{go_platform_tag, PlatformRule};
use crate::source::ReleaseSource;
use crate::types::{PlatformInfo, ReleaseEntry};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Go, scraped from the `/dl/` listing page.
#[derive(Debug, Clone)]
pub struct Go {
    origin: String,
}

impl Go {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
        }
    }
}

/// `go1.22.0` out of `go1.22.0.src.tar.gz` or `go1.22.0.linux-amd64.tar.gz`.
pub fn release_version(name: &str) -> Option<String> {
    if let Some((version, _)) = name.split_once(".src") {
        return Some(version.to_string());
    }
    static VERSION: OnceLock<Regex> = OnceLock::new();
    let re = VERSION.get_or_init(|| {
        Regex::new(r"^go\d+(?:\.\d+)*(?:(?:rc|beta)\d+)?").expect("version pattern is valid")
    });
    re.find(name).map(|m| m.as_str().to_string())
}

impl Toolchain for Go {
    fn name(&self) -> &'static str {
        "go"
    }

    fn source(&self, _platform: &PlatformInfo) -> ReleaseSource {
        ReleaseSource::ListingPage {
            origin: self.origin.clone(),
            page_path: "/dl/".to_string(),
        }
    }

    fn platform_rule(&self, platform: &PlatformInfo) -> PlatformRule {
        PlatformRule::NameContains(go_platform_tag(platform))
    }

    fn default_codec(&self) -> Codec {
        Codec::TarGz
    }

    /// The listing opens with the newest stable source archive.
    fn latest_version(&self, entries: &[ReleaseEntry]) -> PipelineResult<String> {
        let first = entries
            .first()
            .ok_or_else(|| PipelineError::SourceFormat("listing page has no releases".to_string()))?;
        release_version(&first.name).ok_or_else(|| {
            PipelineError::SourceFormat(format!("cannot read a version from '{}'", first.name))
        })
    }

    fn entry_version(&self, entry: &ReleaseEntry) -> String {
        release_version(&entry.name).unwrap_or_else(|| entry.name.clone())
    }

    fn binary(&self, install_dir: &Path) -> PathBuf {
        install_dir.join("bin").join(exe("go"))
    }

    /// Without this a go.mod in the working tree can make `go` switch to
    /// (and report) a different toolchain.
    fn version_env(&self) -> &'static [(&'static str, &'static str)] {
        &[("GOTOOLCHAIN", "local")]
    }

    /// `go version go1.22.0 linux/amd64` => `go1.22.0`
    fn parse_version_output(&self, stdout: &str) -> PipelineResult<String> {
        let fields: Vec<&str> = stdout.split_whitespace().collect();
        match fields.as_slice() {
            ["go", "version", version, ..] if version.starts_with("go") => Ok(version.to_string()),
            _ => Err(PipelineError::Probe(format!(
                "unexpected `go version` output: '{}'",
                stdout.trim()
            ))),
        }
    }

    fn path_dir(&self, install_dir: &Path) -> PathBuf {
        install_dir.join("bin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ReleaseEntry {
        ReleaseEntry {
            name: name.to_string(),
            checksum: String::new(),
            url: format!("https://go.dev/dl/{}", name),
            platform: None,
        }
    }

    #[test]
    fn version_command_disables_toolchain_switching() {
        let go = Go::new("https://go.dev");
        assert_eq!(go.version_env(), &[("GOTOOLCHAIN", "local")]);
    }

    #[test]
    fn src_suffix_is_stripped() {
        assert_eq!(release_version("go1.22.0.src.tar.gz").as_deref(), Some("go1.22.0"));
        assert_eq!(release_version("go1.23rc1.src.tar.gz").as_deref(), Some("go1.23rc1"));
    }

    #[test]
    fn platform_archives_yield_their_version() {
        assert_eq!(
            release_version("go1.22.0.linux-amd64.tar.gz").as_deref(),
            Some("go1.22.0")
        );
        assert_eq!(release_version("README"), None);
    }

    #[test]
    fn latest_comes_from_the_first_row() {
        let go = Go::new("https://go.dev/");
        let entries = vec![entry("go1.22.0.src.tar.gz"), entry("go1.21.7.src.tar.gz")];
        assert_eq!(go.latest_version(&entries).unwrap(), "go1.22.0");
        assert!(go.latest_version(&[]).is_err());
    }

    #[test]
    fn version_output_is_parsed() {
        let go = Go::new("https://go.dev");
        assert_eq!(
            go.parse_version_output("go version go1.22.0 linux/amd64\n").unwrap(),
            "go1.22.0"
        );
        assert!(matches!(
            go.parse_version_output("command not understood"),
            Err(PipelineError::Probe(_))
        ));
    }

    #[test]
    fn binary_lives_in_bin() {
        let go = Go::new("https://go.dev");
        let bin = go.binary(Path::new("/home/u/.tn/go"));
        assert!(bin.starts_with("/home/u/.tn/go/bin"));
        assert_eq!(go.path_dir(Path::new("/b/go")), PathBuf::from("/b/go/bin"));
    }

    #[test]
    fn listing_source_points_at_dl_page() {
        let go = Go::new("https://go.dev/");
        let platform = PlatformInfo {
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        };
        assert_eq!(go.source(&platform).url(), "https://go.dev/dl/");
        assert_eq!(
            go.platform_rule(&platform),
            PlatformRule::NameContains("linux-amd64".to_string())
        );
    }
}
