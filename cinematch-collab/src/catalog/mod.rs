use std::{collections::HashSet, fs, path::Path};

use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use thiserror::Error;

mod builtin;

/// The type used for movie ids, unique within a room's list.
pub type MovieId = u32;

/// A movie as served to clients. Never changes once a room has it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MovieData {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Could not read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Catalog contains no movies")]
    Empty,
    #[error("Catalog contains movie id {0} more than once")]
    DuplicateId(MovieId),
}

/// Represents a source of movies that rooms draw their list from
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the list a new room will swipe through, in order.
    async fn movies(&self) -> Result<Vec<MovieData>, CatalogError>;
}

/// A fixed list of movies, either built in or loaded from a file on startup.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    movies: Vec<MovieData>,
}

impl StaticCatalog {
    pub fn new(movies: Vec<MovieData>) -> Result<Self, CatalogError> {
        if movies.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = movies.iter().find(|m| !seen.insert(m.id)) {
            return Err(CatalogError::DuplicateId(duplicate.id));
        }

        Ok(Self { movies })
    }

    /// Loads a JSON array of movies
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let movies: Vec<MovieData> = serde_json::from_str(&contents)?;

        info!("Loaded {} movies from {}", movies.len(), path.display());

        Self::new(movies)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self {
            movies: builtin::movies(),
        }
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn movies(&self) -> Result<Vec<MovieData>, CatalogError> {
        Ok(self.movies.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, title: &str) -> MovieData {
        MovieData {
            id,
            title: title.to_string(),
            year: None,
            genre: None,
            poster_url: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_builtin_catalog_is_ordered_and_unique() {
        let catalog = StaticCatalog::default();
        let movies = catalog.movies().await.unwrap();

        assert_eq!(movies.len(), 50);
        assert_eq!(movies[0].title, "The Shawshank Redemption");

        let ids: Vec<_> = movies.iter().map(|m| m.id).collect();
        let expected: Vec<_> = (1..=50).collect();
        assert_eq!(ids, expected, "builtin ids should be 1..=50 in order");
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = StaticCatalog::new(vec![movie(1, "Up"), movie(1, "Coco")]);

        assert!(matches!(result, Err(CatalogError::DuplicateId(1))));
    }

    #[test]
    fn test_rejects_empty_catalog() {
        assert!(matches!(
            StaticCatalog::new(vec![]),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_parses_movies_with_missing_optional_fields() {
        let json = r#"[{"id": 7, "title": "Heat", "year": 1995}]"#;
        let movies: Vec<MovieData> = serde_json::from_str(json).unwrap();

        assert_eq!(movies[0].year, Some(1995));
        assert_eq!(movies[0].genre, None);
    }
}
