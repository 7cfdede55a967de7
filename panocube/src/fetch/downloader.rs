//! Downloader abstraction.

use std::fmt;
use std::future::Future;
use std::path::Path;

use super::FetchError;

/// A file on the remote drive service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFile {
    /// Opaque file id.
    pub id: String,
    /// Human-readable file name, used for the local copy.
    pub name: String,
}

impl RemoteFile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// One way of retrieving a remote file.
///
/// Implementations perform a single attempt; retries and fallback routing
/// live in [`ResilientFetcher`](super::ResilientFetcher). Mock
/// implementations are used in tests.
pub trait Downloader: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Remote size in bytes, when the service can tell without a download.
    fn probe_size(
        &self,
        _file: &RemoteFile,
    ) -> impl Future<Output = Result<Option<u64>, FetchError>> + Send {
        async { Ok(None) }
    }

    /// Downloads `file` into `dest`, returning the number of bytes written.
    fn download(
        &self,
        file: &RemoteFile,
        dest: &Path,
    ) -> impl Future<Output = Result<u64, FetchError>> + Send;
}
