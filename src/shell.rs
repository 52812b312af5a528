use crate::config::SETUP_FILE_NAME;
use crate::toolchain::Toolchain;
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write `<base>/setup`, which puts every toolchain's binary directory on `PATH`.
pub fn write_setup_script(base_dir: &Path, toolchains: &[Box<dyn Toolchain>]) -> Result<PathBuf> {
    fs::create_dir_all(base_dir)
        .with_context(|| format!("Failed to create {}", base_dir.display()))?;

    let setup_path = base_dir.join(SETUP_FILE_NAME);
    let content: String = toolchains
        .iter()
        .map(|tc| {
            let dir = tc.path_dir(&base_dir.join(tc.name()));
            format!("export PATH=\"$PATH:{}\"\n", dir.display())
        })
        .collect();

    fs::write(&setup_path, content)
        .with_context(|| format!("Failed to write {}", setup_path.display()))?;
    tracing::debug!("Wrote {}", setup_path.display());
    Ok(setup_path)
}

/// Append `. "<setup>"` to `profile` unless some line already sources it.
///
/// Returns whether the profile was changed.
pub fn ensure_profile_sources_setup(profile: &Path, setup_path: &Path) -> Result<bool> {
    let line = format!(". \"{}\"", setup_path.display());

    let existing = match fs::read_to_string(profile) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", profile.display()));
        }
    };

    if existing.lines().any(|l| l.contains(&line)) {
        tracing::debug!("{} already sources {}", profile.display(), setup_path.display());
        return Ok(false);
    }

    if let Some(parent) = profile.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(profile)
        .with_context(|| format!("Failed to open {}", profile.display()))?;

    let separator = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    writeln!(file, "{}{}", separator, line)
        .with_context(|| format!("Failed to append to {}", profile.display()))?;

    tracing::info!("Added '{}' to {}", line, profile.display());
    Ok(true)
}
