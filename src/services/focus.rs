//! Focus Entity Resolution
//!
//! The focus entity is the paper the user currently has open. The host owns
//! paper storage; the orchestrator only needs a summary for the prompt and
//! for focus-bound tools.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Summary of the focused paper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusEntity {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_excerpt: Option<String>,
}

impl FocusEntity {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            year: None,
            abstract_excerpt: None,
        }
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_abstract(mut self, excerpt: impl Into<String>) -> Self {
        self.abstract_excerpt = Some(excerpt.into());
        self
    }

    /// Multi-line summary for the prompt.
    pub fn summary(&self) -> String {
        let mut out = format!("Title: {}\nID: {}", self.title, self.id);
        if !self.authors.is_empty() {
            out.push_str(&format!("\nAuthors: {}", self.authors.join(", ")));
        }
        if let Some(year) = self.year {
            out.push_str(&format!("\nYear: {}", year));
        }
        if let Some(excerpt) = &self.abstract_excerpt {
            out.push_str(&format!("\nAbstract: {}", excerpt));
        }
        out
    }
}

/// Resolves a focus id to its entity.
#[async_trait]
pub trait FocusResolver: Send + Sync {
    /// Returns `None` when the id does not resolve.
    async fn lookup_focus_entity(&self, focus_id: &str) -> Option<FocusEntity>;
}

/// Resolver for hosts without paper storage; nothing resolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFocusResolver;

#[async_trait]
impl FocusResolver for NoFocusResolver {
    async fn lookup_focus_entity(&self, _focus_id: &str) -> Option<FocusEntity> {
        None
    }
}

/// In-memory resolver keyed by entity id.
#[derive(Debug, Clone, Default)]
pub struct StaticFocusResolver {
    entities: HashMap<String, FocusEntity>,
}

impl StaticFocusResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: FocusEntity) -> Self {
        self.insert(entity);
        self
    }

    pub fn insert(&mut self, entity: FocusEntity) {
        self.entities.insert(entity.id.clone(), entity);
    }
}

#[async_trait]
impl FocusResolver for StaticFocusResolver {
    async fn lookup_focus_entity(&self, focus_id: &str) -> Option<FocusEntity> {
        self.entities.get(focus_id).cloned()
    }
}
