use super::Source;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to download file: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to download file: {url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("Failed to write download: {0}")]
    Io(#[from] std::io::Error),
}

/// A local file ready for loading.
///
/// Downloads live in a temporary file that is deleted when this value drops.
#[derive(Debug)]
pub enum FetchedFile {
    Local(PathBuf),
    Downloaded(TempPath),
}

impl FetchedFile {
    pub fn path(&self) -> &Path {
        match self {
            FetchedFile::Local(path) => path.as_path(),
            FetchedFile::Downloaded(temp) => &**temp,
        }
    }
}

/// Resolves sources to local files, downloading remote ones.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    /// Build a fetcher whose downloads give up after `timeout` (`None` waits forever).
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Parse `raw` and make it available as a local file.
    pub fn fetch(&self, raw: &str) -> Result<FetchedFile, FetchError> {
        let source = Source::parse(raw)?;
        let suffix = source.extension().unwrap_or_default();
        match source {
            Source::Local(path) => {
                if path.is_file() {
                    Ok(FetchedFile::Local(path))
                } else {
                    Err(FetchError::NotFound(path))
                }
            }
            Source::Remote(url) => self.download(&url, &suffix),
        }
    }

    /// Stream `url` into a temporary file named with `suffix`.
    #[instrument(level = "info", skip(self, suffix), fields(url = %url))]
    fn download(&self, url: &Url, suffix: &str) -> Result<FetchedFile, FetchError> {
        let mut tmp = tempfile::Builder::new()
            .prefix("warehouse-")
            .suffix(suffix)
            .tempfile()?;
        debug!(path = %tmp.path().display(), "downloading into temporary file");

        let start = Instant::now();
        let mut resp = self.client.get(url.as_str()).send()?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }
        let bytes = resp.copy_to(tmp.as_file_mut())?;

        info!(bytes, elapsed = ?start.elapsed(), "downloaded");
        Ok(FetchedFile::Downloaded(tmp.into_temp_path()))
    }
}
