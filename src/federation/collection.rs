//! Paginated ActivityStreams collections
//!
//! Followers, following and outbox are all rendered by one [`Paginator`]:
//! an `OrderedCollection` index carrying the grand total, and numbered
//! `OrderedCollectionPage`s linked with `next`/`prev`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::compaction::{self, Compactor};
use super::identity::ActorUri;
use crate::error::AppError;

/// Ordered, owner-scoped resource set backing a collection
#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// Number of items in the whole collection
    async fn count(&self) -> Result<u64, AppError>;

    /// Item URIs in ascending creation order
    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<String>, AppError>;
}

/// The collections an actor exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Followers,
    Following,
    Outbox,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::Following => "following",
            Self::Outbox => "outbox",
        }
    }

    fn page_context(&self) -> Value {
        match self {
            Self::Followers | Self::Following => compaction::graph_page_context(),
            Self::Outbox => compaction::outbox_page_context(),
        }
    }
}

/// A collection of a specific actor
#[derive(Debug, Clone)]
pub struct Collection {
    pub kind: CollectionKind,
    pub actor: ActorUri,
}

impl Collection {
    pub fn new(kind: CollectionKind, actor: ActorUri) -> Self {
        Self { kind, actor }
    }

    pub fn id(&self) -> String {
        match self.kind {
            CollectionKind::Followers => self.actor.followers(),
            CollectionKind::Following => self.actor.following(),
            CollectionKind::Outbox => self.actor.outbox(),
        }
    }

    pub fn page_id(&self, page: u64) -> String {
        match self.kind {
            CollectionKind::Followers => self.actor.followers_page(page),
            CollectionKind::Following => self.actor.following_page(page),
            CollectionKind::Outbox => self.actor.outbox_page(page),
        }
    }
}

/// Collection index document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub total_items: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
}

/// One page of a collection
///
/// `total_items` counts the items on this page only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollectionPage {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub total_items: u64,
    pub part_of: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ordered_items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

/// Parse a `page` query value, coercing junk and values below 1 to 1
pub fn parse_page_number(raw: &str) -> u64 {
    match raw.parse::<i64>() {
        Ok(page) if page >= 1 => page as u64,
        Ok(page) => {
            tracing::warn!(page, "Collection page below 1, using first page");
            1
        }
        Err(error) => {
            tracing::warn!(%error, page = raw, "Invalid collection page, using first page");
            1
        }
    }
}

/// Renders collections with a fixed page size
#[derive(Clone)]
pub struct Paginator {
    page_size: u64,
    compactor: Arc<dyn Compactor>,
}

impl Paginator {
    pub fn new(page_size: usize, compactor: Arc<dyn Compactor>) -> Self {
        Self {
            page_size: page_size.max(1) as u64,
            compactor,
        }
    }

    /// Build the index document for a collection holding `total` items
    pub fn index_document(&self, collection: &Collection, total: u64) -> OrderedCollection {
        OrderedCollection {
            kind: "OrderedCollection",
            id: collection.id(),
            total_items: total,
            first: (total > 0).then(|| collection.page_id(1)),
        }
    }

    /// Build page `page` from the items fetched for it
    ///
    /// A full page advertises `next` even when nothing follows it.
    pub fn page_document(
        &self,
        collection: &Collection,
        page: u64,
        items: Vec<String>,
    ) -> OrderedCollectionPage {
        let returned = items.len() as u64;

        OrderedCollectionPage {
            kind: "OrderedCollectionPage",
            id: collection.page_id(page),
            total_items: returned,
            part_of: collection.id(),
            ordered_items: items,
            next: (returned == self.page_size).then(|| collection.page_id(page + 1)),
            prev: (page > 1).then(|| collection.page_id(page - 1)),
        }
    }

    /// Render the index (no `page` parameter) or a numbered page
    pub async fn render<S>(
        &self,
        collection: &Collection,
        source: &S,
        page: Option<&str>,
    ) -> Result<Value, AppError>
    where
        S: CollectionSource + ?Sized,
    {
        match page.filter(|raw| !raw.is_empty()) {
            None => self.render_index(collection, source).await,
            Some(raw) => {
                self.render_page(collection, source, parse_page_number(raw))
                    .await
            }
        }
    }

    pub async fn render_index<S>(&self, collection: &Collection, source: &S) -> Result<Value, AppError>
    where
        S: CollectionSource + ?Sized,
    {
        let total = source.count().await?;
        let document = self.index_document(collection, total);

        self.compact(&document, compaction::base_context())
    }

    pub async fn render_page<S>(
        &self,
        collection: &Collection,
        source: &S,
        page: u64,
    ) -> Result<Value, AppError>
    where
        S: CollectionSource + ?Sized,
    {
        let page = page.max(1);
        let offset = (page - 1).saturating_mul(self.page_size);
        let items = source.fetch(offset, self.page_size).await?;

        tracing::debug!(
            collection = %collection.id(),
            page,
            items = items.len(),
            "Rendering collection page"
        );

        let document = self.page_document(collection, page, items);
        self.compact(&document, collection.kind.page_context())
    }

    fn compact<T: Serialize>(&self, document: &T, context: Value) -> Result<Value, AppError> {
        let document = serde_json::to_value(document).map_err(|e| AppError::Internal(e.into()))?;
        Ok(self.compactor.compact(document, &context)?)
    }
}
