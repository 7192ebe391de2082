//! In-memory vector store

use super::document::Document;
use anyhow::{bail, Result};
use std::cmp::Ordering;

/// Documents with their embeddings, searched by cosine similarity
///
/// A store is built for one pipeline run and dropped with it.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    entries: Vec<(Document, Vec<f32>)>,
    dimension: Option<usize>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that only accepts vectors of the given length, when known
    pub fn with_dimension(dimension: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            dimension: dimension.filter(|d| *d > 0),
        }
    }

    /// Add one document; the first vector fixes the store's dimension
    pub fn add(&mut self, document: Document, embedding: Vec<f32>) -> Result<()> {
        match self.dimension {
            Some(dim) if dim != embedding.len() => {
                bail!(
                    "embedding dimension mismatch: expected {}, got {}",
                    dim,
                    embedding.len()
                );
            }
            None if embedding.is_empty() => bail!("empty embedding"),
            None => self.dimension = Some(embedding.len()),
            _ => {}
        }
        self.entries.push((document, embedding));
        Ok(())
    }

    /// Add documents paired with embeddings
    pub fn add_documents(
        &mut self,
        documents: Vec<Document>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()> {
        if documents.len() != embeddings.len() {
            bail!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            );
        }
        for (document, embedding) in documents.into_iter().zip(embeddings) {
            self.add(document, embedding)?;
        }
        Ok(())
    }

    /// The `k` most similar documents, best first, with `metadata.score` set
    ///
    /// Equal scores keep insertion order.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<Document>> {
        if let Some(dim) = self.dimension {
            if dim != query.len() {
                bail!(
                    "query dimension mismatch: expected {}, got {}",
                    dim,
                    query.len()
                );
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, embedding))| (i, cosine_similarity(query, embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| {
                let mut document = self.entries[i].0.clone();
                document.metadata.score = Some(score);
                document
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Distinct source URLs in insertion order
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for (document, _) in &self.entries {
            let source = document.metadata.source.as_str();
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        sources
    }
}

/// Cosine similarity; zero vectors are dissimilar to everything
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VectorStore {
        let mut store = VectorStore::new();
        store
            .add_documents(
                vec![
                    Document::new("x axis").with_source("https://a.example"),
                    Document::new("y axis").with_source("https://b.example"),
                    Document::new("diagonal").with_source("https://a.example"),
                ],
                vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_similarity_search_ranks_and_scores() {
        let results = store().similarity_search(&[1.0, 0.1], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].page_content, "x axis");
        assert_eq!(results[1].page_content, "diagonal");
        assert!(results[0].metadata.score.unwrap() > results[1].metadata.score.unwrap());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut store = VectorStore::new();
        store.add(Document::new("first"), vec![1.0, 0.0]).unwrap();
        store.add(Document::new("second"), vec![2.0, 0.0]).unwrap();
        let results = store.similarity_search(&[1.0, 0.0], 5).unwrap();
        let contents: Vec<_> = results.iter().map(|d| d.page_content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn test_dimension_checks() {
        let mut store = store();
        assert_eq!(store.dimension(), Some(2));
        assert!(store.add(Document::new("bad"), vec![1.0, 2.0, 3.0]).is_err());
        assert!(store.similarity_search(&[1.0], 1).is_err());
        assert!(VectorStore::new().add(Document::new("empty"), vec![]).is_err());
    }

    #[test]
    fn test_fixed_dimension_rejects_other_lengths() {
        let mut store = VectorStore::with_dimension(Some(3));
        assert_eq!(store.dimension(), Some(3));
        assert!(store.add(Document::new("short"), vec![1.0, 0.0]).is_err());
        assert!(store.add(Document::new("fits"), vec![1.0, 0.0, 0.0]).is_ok());
        assert_eq!(VectorStore::with_dimension(None).dimension(), None);
    }

    #[test]
    fn test_sources_are_distinct() {
        assert_eq!(
            store().sources(),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_empty_store_search() {
        assert!(VectorStore::new()
            .similarity_search(&[1.0, 0.0], 3)
            .unwrap()
            .is_empty());
    }
}
