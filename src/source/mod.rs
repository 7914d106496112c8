//! Source module - resolving a path or URL to a readable local file

mod fetch;

pub use fetch::{FetchError, FetchedFile, SourceFetcher};

use std::path::{Path, PathBuf};
use url::Url;

/// Where an ingestion reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Remote(Url),
}

impl Source {
    /// Classify raw user input. Anything that isn't an `http(s)://` URL is a path.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw).map_err(|source| FetchError::InvalidUrl {
                url: raw.to_string(),
                source,
            })?;
            Ok(Source::Remote(url))
        } else {
            Ok(Source::Local(PathBuf::from(raw)))
        }
    }

    /// Lower-cased extension with its leading dot, e.g. `.csv`.
    ///
    /// For URLs only the path counts; query string and fragment are ignored.
    pub fn extension(&self) -> Option<String> {
        let ext = match self {
            Source::Local(path) => path.extension(),
            Source::Remote(url) => Path::new(url.path()).extension(),
        }?;
        Some(format!(".{}", ext.to_string_lossy().to_lowercase()))
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Local(path) => write!(f, "{}", path.display()),
            Source::Remote(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_and_paths_are_told_apart() {
        assert!(matches!(
            Source::parse("https://example.com/a.csv").unwrap(),
            Source::Remote(_)
        ));
        assert!(matches!(
            Source::parse("http://example.com/a.csv").unwrap(),
            Source::Remote(_)
        ));
        assert!(matches!(Source::parse("data/a.csv").unwrap(), Source::Local(_)));
        assert!(matches!(
            Source::parse("ftp://example.com/a.csv").unwrap(),
            Source::Local(_)
        ));
    }

    #[test]
    fn input_is_trimmed() {
        assert_eq!(
            Source::parse("  ./arrests.csv \n").unwrap(),
            Source::Local(PathBuf::from("./arrests.csv"))
        );
    }

    #[test]
    fn url_extension_ignores_query() {
        let source = Source::parse("https://data.example.com/api/Arrests.JSON?limit=5#top").unwrap();
        assert_eq!(source.extension().as_deref(), Some(".json"));
    }

    #[test]
    fn missing_extension() {
        let source = Source::parse("https://data.example.com/api/rows").unwrap();
        assert_eq!(source.extension(), None);
        assert_eq!(Source::parse("README").unwrap().extension(), None);
    }

    #[test]
    fn malformed_url_is_rejected() {
        assert!(matches!(
            Source::parse("http://"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
