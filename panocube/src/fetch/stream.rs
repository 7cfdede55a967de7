//! Streaming a response body to disk.

use std::path::Path;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::FetchError;

/// Write granularity for downloaded bodies.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Bytes between two progress log lines.
const PROGRESS_STEP: u64 = 16 * CHUNK_SIZE as u64;

/// Writes every chunk of `body` to `dest`, creating or truncating it.
///
/// Writes are buffered into [`CHUNK_SIZE`] blocks so the whole body is never
/// held in memory. Returns the number of bytes written.
pub async fn stream_to_file<S, E>(
    mut body: S,
    dest: &Path,
    expected: Option<u64>,
) -> Result<u64, FetchError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<FetchError>,
{
    let file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| FetchError::io(dest, e))?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);

    let mut written: u64 = 0;
    let mut next_report = PROGRESS_STEP;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| -> FetchError { e.into() })?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(dest, e))?;
        written += chunk.len() as u64;

        if written >= next_report {
            debug!(
                path = %dest.display(),
                bytes = written,
                expected = expected.unwrap_or(0),
                "Download progress"
            );
            next_report += PROGRESS_STEP;
        }
    }

    writer.flush().await.map_err(|e| FetchError::io(dest, e))?;
    Ok(written)
}
