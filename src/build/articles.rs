//! Article listing built from document front matter.
//!
//! The index only looks at the metadata block; bodies are never rendered
//! here. Unpublished articles are kept so they stay addressable by slug,
//! but they never show up in listings.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::build::document::{Document, DocumentNotFound, Slug};
use crate::build::format::FormatRegistry;
use crate::build::frontmatter::{DocDate, Frontmatter, extract};
use crate::build::pipeline::{PipelineError, StageError};

/// Listing entry for one article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub title: String,
    pub slug: Slug,
    pub date: DocDate,
    pub categories: Vec<String>,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Article {
    pub fn from_front_matter(slug: Slug, front_matter: &Frontmatter) -> Self {
        Self {
            title: front_matter.title.clone(),
            slug,
            date: front_matter.date.clone(),
            categories: front_matter.categories.clone(),
            published: front_matter.published,
            description: front_matter.description.clone(),
        }
    }

    /// True if any of `tags` names one of this article's categories (ASCII case-insensitive).
    fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| {
            self.categories
                .iter()
                .any(|category| category.eq_ignore_ascii_case(tag))
        })
    }
}

/// Filters applied on top of the published listing.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    /// Keep articles sharing at least one category; empty means no filter
    pub tags: Vec<String>,
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    pub limit: Option<usize>,
}

/// Result of scanning a set of documents: the index plus every document
/// whose metadata could not be read.
#[derive(Debug)]
pub struct ScanReport {
    pub index: ArticleIndex,
    pub failures: Vec<PipelineError>,
}

/// All known articles, keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct ArticleIndex {
    articles: BTreeMap<Slug, Article>,
}

impl ArticleIndex {
    pub fn new(articles: impl IntoIterator<Item = Article>) -> Self {
        Self {
            articles: articles
                .into_iter()
                .map(|article| (article.slug.clone(), article))
                .collect(),
        }
    }

    /// Extract metadata from every document with a registered extension.
    ///
    /// A document that fails is reported and left out; the rest are indexed.
    /// When two documents share a slug the first one keeps it.
    pub fn from_documents(
        docs: impl IntoIterator<Item = Document>,
        formats: &FormatRegistry,
    ) -> ScanReport {
        let mut articles = Vec::new();
        let mut failures = Vec::new();
        let mut owners: HashMap<Slug, String> = HashMap::new();

        for doc in docs {
            if !formats.is_document(&doc.path) {
                continue;
            }
            let slug = match doc.slug() {
                Ok(slug) => slug,
                Err(e) => {
                    failures.push(PipelineError::new("document", doc.display_name(), e));
                    continue;
                }
            };
            if let Some(first) = owners.get(&slug) {
                let source = StageError::DuplicateSlug {
                    first: first.clone(),
                };
                failures.push(PipelineError::new("document", doc.display_name(), source));
                continue;
            }
            owners.insert(slug.clone(), doc.display_name());

            match extract(&doc.source) {
                Ok(extracted) => {
                    articles.push(Article::from_front_matter(slug, &extracted.front_matter));
                }
                Err(e) => {
                    tracing::warn!(document = %slug, error = %e, "skipping article with unreadable metadata");
                    failures.push(PipelineError::new("frontmatter", slug.as_str(), e));
                }
            }
        }

        ScanReport {
            index: Self::new(articles),
            failures,
        }
    }

    /// Published articles, newest first. Articles sharing a date are ordered by slug.
    pub fn articles(&self) -> Vec<&Article> {
        let mut listing: Vec<&Article> = self.articles.values().filter(|a| a.published).collect();
        // Values come out in slug order and the sort is stable
        listing.sort_by(|a, b| b.date.cmp(&a.date));
        listing
    }

    pub fn query(&self, query: &ArticleQuery) -> Vec<&Article> {
        let title = query.title.as_ref().map(|t| t.to_lowercase());

        self.articles()
            .into_iter()
            .filter(|a| query.tags.is_empty() || a.has_any_tag(&query.tags))
            .filter(|a| {
                title
                    .as_ref()
                    .is_none_or(|t| a.title.to_lowercase().contains(t.as_str()))
            })
            .take(query.limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Look up any article, published or not.
    pub fn get(&self, slug: &str) -> Result<&Article, DocumentNotFound> {
        self.articles
            .get(slug)
            .ok_or_else(|| DocumentNotFound::new(slug))
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
