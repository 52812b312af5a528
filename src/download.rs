use crate::error::{PipelineError, PipelineResult};
use crate::types::ReleaseEntry;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{Seek, SeekFrom, Write};
use tempfile::NamedTempFile;

fn progress_bar(total_size: u64, file_name: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total_size);
    let style = ProgressStyle::default_bar()
        .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(format!("Downloading {}", file_name));
    pb
}

/// Stream the entry's artifact into a temporary file.
///
/// The file is removed when the returned handle drops, and it comes back
/// rewound to offset zero so the verifier can read it from the start.
pub async fn download(
    client: &reqwest::Client,
    entry: &ReleaseEntry,
    show_progress: bool,
) -> PipelineResult<NamedTempFile> {
    let file_name = entry.file_name().to_string();
    tracing::info!("Downloading {}...", file_name);

    let network = |source| PipelineError::Network {
        url: entry.url.clone(),
        source,
    };

    let response = client
        .get(&entry.url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(network)?;
    let total_size = response.content_length().unwrap_or(0);

    let mut file = tempfile::Builder::new()
        .prefix(&format!("{}-", file_name))
        .tempfile()
        .map_err(|e| PipelineError::io("Failed to create temporary download file", e))?;

    let pb = progress_bar(total_size, &file_name, show_progress);
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(network)?;
        file.write_all(&chunk)
            .map_err(|e| PipelineError::io_at("write", file.path(), e))?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()
        .map_err(|e| PipelineError::io_at("flush", file.path(), e))?;
    file.seek(SeekFrom::Start(0))
        .map_err(|e| PipelineError::io_at("rewind", file.path(), e))?;

    pb.finish_with_message("Download complete");
    tracing::debug!("Downloaded {} bytes to {}", downloaded, file.path().display());
    Ok(file)
}
