//! SHA-256 integrity check for downloaded artifacts.

use crate::error::{PipelineError, PipelineResult};
use sha2::{Digest, Sha256};
use std::io::{self, Read, Seek, SeekFrom};

/// Lower-case hex SHA-256 of everything from the start of `reader`.
///
/// The read position is back at zero when this returns successfully.
pub fn compute_sha256<R: Read + Seek>(reader: &mut R) -> io::Result<String> {
    reader.seek(SeekFrom::Start(0))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    reader.seek(SeekFrom::Start(0))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Compare the artifact's digest against the published checksum.
///
/// A mismatch is `Ok(false)`; only an unreadable artifact is an error.
pub fn verify<R: Read + Seek>(reader: &mut R, expected: &str) -> PipelineResult<bool> {
    tracing::info!("Validating checksum");
    let actual = compute_sha256(reader)
        .map_err(|e| PipelineError::io("Failed to re-read downloaded artifact", e))?;
    let expected = expected.trim().to_lowercase();

    if actual != expected {
        tracing::warn!("Checksum mismatch: expected {}, got {}", expected, actual);
        return Ok(false);
    }
    Ok(true)
}
