use crate::config::Configuration;
use crate::http::HttpClient;
use crate::models::{Movie, RawMovie};
use crate::normalize::normalize;
use anyhow::Result;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tracing::{info, instrument, warn};
use url::Url;

/// Where the dataset dump lives: a remote JSON document or a local file.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    Url(String),
    Path(PathBuf),
}

impl DatasetSource {
    /// A command-line override beats the configuration file.
    pub fn resolve(cli_value: Option<&str>, config: &Configuration) -> Result<Self> {
        if let Some(value) = cli_value {
            return Ok(Self::from_value(value));
        }
        let Some(dataset) = &config.dataset else {
            return Err(anyhow::anyhow!(
                "No dataset configured: set dataset.url or dataset.path, or pass --dataset"
            ));
        };
        if let Some(url) = &dataset.url {
            Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid dataset url {}: {}", url, e))?;
            Ok(DatasetSource::Url(url.clone()))
        } else if let Some(path) = &dataset.path {
            Ok(DatasetSource::Path(PathBuf::from(path)))
        } else {
            Err(anyhow::anyhow!(
                "Dataset section is empty: set dataset.url or dataset.path"
            ))
        }
    }

    fn from_value(value: &str) -> Self {
        match Url::parse(value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                DatasetSource::Url(value.to_string())
            }
            _ => DatasetSource::Path(PathBuf::from(value)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DatasetSource::Url(url) => url.clone(),
            DatasetSource::Path(path) => path.display().to_string(),
        }
    }
}

pub struct CatalogClient {
    http: HttpClient,
    source: DatasetSource,
}

impl CatalogClient {
    pub fn new(http: HttpClient, source: DatasetSource) -> Self {
        Self { http, source }
    }

    /// One-shot catalog load: fetch the raw JSON array, normalize every
    /// entry. No retries; a failure is the caller's empty state.
    #[instrument(skip(self), fields(source = %self.source.describe()))]
    pub async fn load(&self) -> Result<Vec<Movie>> {
        info!("Loading catalog");
        let raw: Vec<RawMovie> = match &self.source {
            DatasetSource::Url(url) => self.http.get_json(url).await?,
            DatasetSource::Path(path) => {
                let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                    anyhow::anyhow!("Failed to read dataset {}: {}", path.display(), e)
                })?;
                serde_json::from_str(&content).map_err(|e| {
                    anyhow::anyhow!("Failed to parse dataset {}: {}", path.display(), e)
                })?
            }
        };
        info!("Fetched {} raw catalog entries", raw.len());

        let movies: Vec<Movie> = raw.into_iter().map(normalize).collect();
        warn_on_duplicate_ids(&movies);
        Ok(movies)
    }
}

/// Ids are expected to be unique within a collection; a dump that violates
/// that is worth a log line but not a failure.
fn warn_on_duplicate_ids(movies: &[Movie]) {
    let mut seen = HashSet::new();
    for movie in movies {
        if !seen.insert(movie.id.as_str()) {
            warn!("Duplicate record id in catalog: {}", movie.id);
        }
    }
}

/// Distinct genres across the collection, sorted.
pub fn distinct_genres(movies: &[Movie]) -> Vec<String> {
    movies
        .iter()
        .flat_map(|m| m.genre.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_override_beats_configuration() {
        let config = Configuration {
            dataset: Some(crate::config::DatasetConfig {
                url: Some("https://example.com/movies.json".to_string()),
                path: None,
            }),
            ..Configuration::default()
        };
        let source = DatasetSource::resolve(Some("local.json"), &config).unwrap();
        assert!(matches!(source, DatasetSource::Path(_)));

        let source = DatasetSource::resolve(None, &config).unwrap();
        assert!(matches!(source, DatasetSource::Url(_)));
    }

    #[test]
    fn http_looking_values_resolve_as_urls() {
        assert!(matches!(
            DatasetSource::from_value("https://example.com/a.json"),
            DatasetSource::Url(_)
        ));
        assert!(matches!(
            DatasetSource::from_value("data/movies.json"),
            DatasetSource::Path(_)
        ));
    }

    #[test]
    fn missing_dataset_is_an_error() {
        let config = Configuration::default();
        assert!(DatasetSource::resolve(None, &config).is_err());
    }

    #[tokio::test]
    async fn loads_and_normalizes_a_local_dump() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"index": 1, "title": " Nayakan ", "year": "1987", "genre": "Crime, Drama"}}, {{}}]"#
        )
        .unwrap();

        let client = CatalogClient::new(
            HttpClient::new(),
            DatasetSource::Path(file.path().to_path_buf()),
        );
        let movies = client.load().await.unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Nayakan");
        assert_eq!(movies[0].year, Some(1987));
        assert_eq!(movies[1].title, "Untitled");
        assert_eq!(distinct_genres(&movies), vec!["Crime", "Drama"]);
    }

    #[tokio::test]
    async fn unreadable_dump_is_an_error_not_a_panic() {
        let client = CatalogClient::new(
            HttpClient::new(),
            DatasetSource::Path(PathBuf::from("/does/not/exist.json")),
        );
        assert!(client.load().await.is_err());
    }
}
