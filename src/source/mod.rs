// src/source/mod.rs
pub mod client;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::utils::error::SourceError;

/// Where a page comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    File(PathBuf),
    Url(String),
}

impl DocumentSource {
    /// `http://` and `https://` inputs are URLs, anything else is a path.
    pub fn parse(input: &str) -> Self {
        let lower = input.trim().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(input.trim().to_string())
        } else {
            Self::File(PathBuf::from(input))
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path.as_path()),
            Self::Url(_) => None,
        }
    }

    /// Short name used for output files.
    pub fn stem(&self) -> String {
        let raw = match self {
            Self::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Self::Url(url) => url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .trim_end_matches(".html")
                .trim_end_matches(".htm")
                .to_string(),
        };

        let clean: String = raw
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        if clean.is_empty() { "document".to_string() } else { clean }
    }

    pub async fn load(&self) -> Result<String, SourceError> {
        match self {
            Self::File(path) => {
                tracing::info!("Reading document from: {}", path.display());
                if !path.exists() {
                    return Err(SourceError::NotFound(path.display().to_string()));
                }
                let bytes = tokio::fs::read(path).await?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Self::Url(url) => client::download_page(url).await,
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_kind() {
        assert_eq!(
            DocumentSource::parse("https://example.org/boletim"),
            DocumentSource::Url("https://example.org/boletim".into())
        );
        assert_eq!(
            DocumentSource::parse("HTTP://x.org"),
            DocumentSource::Url("HTTP://x.org".into())
        );
        assert_eq!(
            DocumentSource::parse("pages/boletim.html"),
            DocumentSource::File("pages/boletim.html".into())
        );
    }

    #[test]
    fn test_stem() {
        assert_eq!(DocumentSource::parse("pages/boletim 2024.html").stem(), "boletim_2024");
        let url = DocumentSource::parse("https://example.org/aluno/notas.html?bim=2");
        assert_eq!(url.stem(), "notas");
        assert_eq!(DocumentSource::parse("https://example.org/").stem(), "example_org");
    }

    #[test]
    fn test_load_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<table><tr><td>9</td></tr></table>").unwrap();

        let source = DocumentSource::File(path);
        let body = tokio_test::block_on(source.load()).unwrap();
        assert!(body.contains("<td>9</td>"));
    }

    #[test]
    fn test_load_missing_file() {
        let source = DocumentSource::parse("/definitely/not/here.html");
        let err = tokio_test::block_on(source.load()).unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }
}
