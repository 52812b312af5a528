//! Archive installation
//!
//! Artifacts are unpacked into a staging directory next to the active
//! install directory and only then swapped into place, so a reader of
//! `<base>/<tool>` sees either the complete old tree or the complete new one.
//!
//! Only directories and regular files are accepted. Every entry has to live
//! under one top-level directory; that directory becomes the active install
//! directory whatever it was called inside the archive.

use crate::error::{IoContext, PipelineError, PipelineResult};
use flate2::read::GzDecoder;
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tempfile::TempDir;

const DEFAULT_DIR_MODE: u32 = 0o755;
const DEFAULT_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    TarGz,
    TarXz,
    Zip,
}

impl Codec {
    pub fn from_file_name(name: &str) -> Option<Codec> {
        let name = name.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Codec::TarGz)
        } else if name.ends_with(".tar.xz") {
            Some(Codec::TarXz)
        } else if name.ends_with(".zip") {
            Some(Codec::Zip)
        } else {
            None
        }
    }
}

/// An extracted tree waiting to be swapped into place.
///
/// Dropping it without committing removes everything that was extracted.
#[derive(Debug)]
pub struct StagedInstall {
    staging: TempDir,
    root: PathBuf,
}

impl StagedInstall {
    /// The single top-level directory of the archive, inside the staging area.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replace `dest` with the staged tree.
    ///
    /// The previous directory is renamed aside first and restored if the
    /// final rename fails; nothing is ever written into `dest` in place.
    pub fn commit(self, dest: &Path) -> PipelineResult<()> {
        let parent = self
            .staging
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = dest
            .file_name()
            .ok_or_else(|| PipelineError::io_at("resolve", dest, io::ErrorKind::InvalidInput.into()))?;

        let retired = if fs::symlink_metadata(dest).is_ok() {
            let holder = tempfile::Builder::new()
                .prefix(".tn-retired-")
                .tempdir_in(&parent)
                .at("create retirement directory in", &parent)?;
            let aside = holder.path().join(name);
            fs::rename(dest, &aside).at("move aside", dest)?;
            tracing::debug!("Moved previous install to {}", aside.display());
            Some((holder, aside))
        } else {
            None
        };

        if let Err(e) = fs::rename(&self.root, dest) {
            if let Some((holder, aside)) = retired {
                restore_previous(holder, &aside, dest);
            }
            return Err(PipelineError::io_at("move staged install to", dest, e));
        }

        tracing::info!("Installed into {}", dest.display());
        // The retired tree and the emptied staging area are removed on drop.
        drop(retired);
        Ok(())
    }
}

/// Move the retired tree back to `dest`.
///
/// If that fails too, the retirement directory is kept on disk since it holds
/// the only remaining copy of the previous install.
fn restore_previous(holder: TempDir, aside: &Path, dest: &Path) {
    if let Err(e) = fs::rename(aside, dest) {
        let name = aside.file_name().map(PathBuf::from).unwrap_or_default();
        let kept = holder.into_path().join(name);
        tracing::error!(
            "Could not restore previous install to {}: {}. It was left at {}",
            dest.display(),
            e,
            kept.display()
        );
    }
}

/// Extract into a fresh staging directory created under `parent`.
pub fn stage<R: Read + Seek>(
    reader: &mut R,
    codec: Codec,
    parent: &Path,
) -> PipelineResult<StagedInstall> {
    tracing::info!("Extracting ({:?})", codec);
    fs::create_dir_all(parent).at("create", parent)?;
    let staging = tempfile::Builder::new()
        .prefix(".tn-staging-")
        .tempdir_in(parent)
        .at("create staging directory in", parent)?;

    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| PipelineError::io("Failed to rewind artifact", e))?;

    let mut top_level = TopLevel::default();
    match codec {
        Codec::TarGz => unpack_tar(GzDecoder::new(reader), staging.path(), &mut top_level)?,
        Codec::TarXz => unpack_tar(
            xz2::read::XzDecoder::new(reader),
            staging.path(),
            &mut top_level,
        )?,
        Codec::Zip => unpack_zip(reader, staging.path(), &mut top_level)?,
    }

    let root = staging.path().join(top_level.single()?);
    tracing::debug!("Staged install at {}", root.display());
    Ok(StagedInstall { staging, root })
}

/// Top-level directory names seen while extracting.
#[derive(Debug, Default)]
struct TopLevel {
    dirs: BTreeSet<String>,
}

impl TopLevel {
    fn record(&mut self, path: &Path, is_dir: bool) -> PipelineResult<()> {
        let mut components = path.components().filter(|c| !matches!(c, Component::CurDir));
        let first = match components.next() {
            Some(Component::Normal(name)) => name.to_string_lossy().into_owned(),
            _ => {
                return Err(PipelineError::ArchiveFormat(format!(
                    "entry with empty path: '{}'",
                    path.display()
                )))
            }
        };
        if !is_dir && components.next().is_none() {
            return Err(PipelineError::ArchiveFormat(format!(
                "file '{}' is not inside a top-level directory",
                first
            )));
        }
        self.dirs.insert(first);
        Ok(())
    }

    fn single(self) -> PipelineResult<String> {
        let mut dirs = self.dirs.into_iter();
        match (dirs.next(), dirs.next()) {
            (Some(only), None) => Ok(only),
            (None, _) => Err(PipelineError::ArchiveFormat(
                "archive has no entries".to_string(),
            )),
            (Some(first), Some(second)) => Err(PipelineError::ArchiveFormat(format!(
                "archive has several top-level directories ({}, {}, ...)",
                first, second
            ))),
        }
    }
}

/// A directory entry such as `./` that names the archive itself.
fn is_archive_root(path: &Path) -> bool {
    !path
        .components()
        .any(|c| matches!(c, Component::Normal(_)))
}

/// Read-side failures are malformed input unless the OS itself reported them.
fn read_error(what: &str, e: io::Error) -> PipelineError {
    if e.raw_os_error().is_some() {
        PipelineError::io(format!("Failed to read {}", what), e)
    } else {
        PipelineError::ArchiveFormat(format!("{}: {}", what, e))
    }
}

fn validate_entry_path(path: &Path) -> PipelineResult<()> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(PipelineError::ArchiveFormat(format!(
            "refusing to extract '{}' outside the install directory",
            path.display()
        )));
    }
    Ok(())
}

fn create_dir(path: &Path, mode: Option<u32>) -> PipelineResult<()> {
    fs::create_dir_all(path).at("create directory", path)?;
    // Owner must be able to populate it with the entries that follow.
    set_mode(path, mode.unwrap_or(DEFAULT_DIR_MODE) | 0o700)
}

fn write_file<R: Read>(path: &Path, content: &mut R, mode: Option<u32>) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).at("create directory", parent)?;
    }
    let mut file = fs::File::create(path).at("create", path)?;
    io::copy(content, &mut file).map_err(|e| {
        if e.raw_os_error().is_some() {
            PipelineError::io_at("write", path, e)
        } else {
            PipelineError::ArchiveFormat(format!("{}: {}", path.display(), e))
        }
    })?;
    set_mode(path, mode.unwrap_or(DEFAULT_FILE_MODE))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> PipelineResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777)).at("set permissions on", path)
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> PipelineResult<()> {
    Ok(())
}

fn unpack_tar<R: Read>(reader: R, staging: &Path, top_level: &mut TopLevel) -> PipelineResult<()> {
    let mut archive = Archive::new(reader);
    let entries = archive.entries().map_err(|e| read_error("archive", e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| read_error("archive entry", e))?;
        let path = entry
            .path()
            .map_err(|e| read_error("entry path", e))?
            .into_owned();
        validate_entry_path(&path)?;

        let entry_type = entry.header().entry_type();
        let mode = entry.header().mode().ok();
        let target = staging.join(&path);

        match entry_type {
            EntryType::Directory if is_archive_root(&path) => {
                tracing::debug!("Skipping archive root entry '{}'", path.display());
            }
            EntryType::Directory => {
                top_level.record(&path, true)?;
                create_dir(&target, mode)?;
            }
            EntryType::Regular | EntryType::Continuous => {
                top_level.record(&path, false)?;
                write_file(&target, &mut entry, mode)?;
            }
            EntryType::XGlobalHeader => {
                tracing::debug!("Consumed pax global header {}", path.display());
            }
            other => {
                return Err(PipelineError::ArchiveFormat(format!(
                    "unsupported entry type {:?} for '{}'",
                    other,
                    path.display()
                )));
            }
        }
    }

    Ok(())
}

fn unpack_zip<R: Read + Seek>(reader: R, staging: &Path, top_level: &mut TopLevel) -> PipelineResult<()> {
    let zip_error = |e: zip::result::ZipError| match e {
        zip::result::ZipError::Io(e) => read_error("zip archive", e),
        other => PipelineError::ArchiveFormat(other.to_string()),
    };

    let mut archive = zip::ZipArchive::new(reader).map_err(zip_error)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(zip_error)?;
        let path = file.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            PipelineError::ArchiveFormat(format!(
                "refusing to extract '{}' outside the install directory",
                file.name()
            ))
        })?;
        validate_entry_path(&path)?;

        let mode = file.unix_mode();
        let target = staging.join(&path);

        if file.is_dir() && is_archive_root(&path) {
            tracing::debug!("Skipping archive root entry '{}'", path.display());
        } else if file.is_dir() {
            top_level.record(&path, true)?;
            create_dir(&target, mode)?;
        } else if mode.is_some_and(|m| m & 0o170000 != 0 && m & 0o170000 != 0o100000) {
            return Err(PipelineError::ArchiveFormat(format!(
                "unsupported entry type (mode {:o}) for '{}'",
                mode.unwrap_or_default(),
                path.display()
            )));
        } else {
            top_level.record(&path, false)?;
            write_file(&target, &mut file, mode)?;
        }
    }

    Ok(())
}
