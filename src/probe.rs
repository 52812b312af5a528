use crate::error::{PipelineError, PipelineResult};
use crate::toolchain::Toolchain;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Ask the toolchain installed at `install_dir` for its version.
///
/// `Ok(None)` means nothing is installed there.
pub async fn installed_version(
    toolchain: &dyn Toolchain,
    install_dir: &Path,
) -> PipelineResult<Option<String>> {
    installed_version_within(toolchain, install_dir, PROBE_TIMEOUT).await
}

/// [`installed_version`] with an explicit bound on the version command.
pub async fn installed_version_within(
    toolchain: &dyn Toolchain,
    install_dir: &Path,
    timeout: Duration,
) -> PipelineResult<Option<String>> {
    let binary = toolchain.binary(install_dir);
    tracing::info!("Checking installed version via {}", binary.display());

    if !binary.exists() {
        tracing::debug!("{} does not exist", binary.display());
        return Ok(None);
    }

    let mut cmd = Command::new(&binary);
    cmd.args(toolchain.version_args())
        .envs(toolchain.version_env().iter().copied())
        .current_dir(install_dir)
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => {
            return Err(PipelineError::Probe(format!(
                "{} did not answer within {:?}",
                binary.display(),
                timeout
            )))
        }
        Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Ok(Err(e)) => {
            return Err(PipelineError::Probe(format!(
                "could not run {}: {}",
                binary.display(),
                e
            )))
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        return Err(PipelineError::Probe(format!(
            "{} exited with {}: {}",
            binary.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = toolchain.parse_version_output(&stdout)?;
    tracing::debug!("Installed version: {}", version);
    Ok(Some(version))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::toolchain::{Go, Zig};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn missing_install_is_none() {
        let base = tempfile::tempdir().unwrap();
        let go = Go::new("https://go.dev");
        let version = installed_version(&go, &base.path().join("go")).await.unwrap();
        assert_eq!(version, None);
    }

    #[tokio::test]
    async fn go_version_is_read_from_the_binary() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("go");
        write_script(&dir.join("bin/go"), "echo 'go version go1.22.0 linux/amd64'");

        let go = Go::new("https://go.dev");
        let version = installed_version(&go, &dir).await.unwrap();
        assert_eq!(version.as_deref(), Some("go1.22.0"));
    }

    #[tokio::test]
    async fn zig_version_is_read_from_the_binary() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("zig");
        write_script(&dir.join("zig"), "echo '0.14.0-dev.1+abc'");

        let zig = Zig::new("http://unused", "master");
        let version = installed_version(&zig, &dir).await.unwrap();
        assert_eq!(version.as_deref(), Some("0.14.0-dev.1+abc"));
    }

    #[tokio::test]
    async fn go_is_pinned_to_the_installed_toolchain() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("go");
        write_script(
            &dir.join("bin/go"),
            r#"pwd > cwd.txt; echo "go version go1.22.0-$GOTOOLCHAIN linux/amd64""#,
        );

        let go = Go::new("https://go.dev");
        let version = installed_version(&go, &dir).await.unwrap();

        assert_eq!(version.as_deref(), Some("go1.22.0-local"));
        let cwd = fs::read_to_string(dir.join("cwd.txt")).unwrap();
        assert_eq!(
            fs::canonicalize(cwd.trim()).unwrap(),
            fs::canonicalize(&dir).unwrap()
        );
    }

    #[tokio::test]
    async fn version_command_runs_inside_the_install_dir() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("zig");
        write_script(&dir.join("zig"), "test -d lib && echo '0.13.0'");
        fs::create_dir_all(dir.join("lib")).unwrap();

        let zig = Zig::new("http://unused", "master");
        let version = installed_version(&zig, &dir).await.unwrap();
        assert_eq!(version.as_deref(), Some("0.13.0"));
    }

    #[tokio::test]
    async fn hanging_binary_times_out() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("zig");
        write_script(&dir.join("zig"), "sleep 5; echo '0.13.0'");

        let zig = Zig::new("http://unused", "master");
        let started = std::time::Instant::now();
        let result = installed_version_within(&zig, &dir, Duration::from_millis(200)).await;

        assert!(matches!(result, Err(PipelineError::Probe(_))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn failing_binary_is_a_probe_error() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("go");
        write_script(&dir.join("bin/go"), "echo broken >&2; exit 3");

        let go = Go::new("https://go.dev");
        let result = installed_version(&go, &dir).await;
        assert!(matches!(result, Err(PipelineError::Probe(_))));
    }

    #[tokio::test]
    async fn garbled_output_is_a_probe_error() {
        let base = tempfile::tempdir().unwrap();
        let dir = base.path().join("go");
        write_script(&dir.join("bin/go"), "echo hello");

        let go = Go::new("https://go.dev");
        let result = installed_version(&go, &dir).await;
        assert!(matches!(result, Err(PipelineError::Probe(_))));
    }
}
