//! Read operations over the [`DocumentStore`].
//!
//! Visibility rules:
//! - `public` documents appear everywhere
//! - `unlisted` documents are left out of listings but found by search and
//!   by slug
//! - `hidden` documents are never returned

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::document::{Document, DocumentMeta, Manifest, PageInfo, SearchPage, Visibility};
use crate::store::DocumentStore;

const TAG_PREFIX: &str = "tag:";
const SECONDS_PER_DAY: i64 = 86_400;

impl DocumentStore {
    /// Public documents, newest first.
    ///
    /// Documents are ordered by their front matter date, or by modification
    /// time when the date is missing or unparseable.
    #[must_use]
    pub fn list_public(&self) -> Vec<DocumentMeta> {
        sorted_metas(
            self.snapshot()
                .into_iter()
                .filter(|doc| doc.meta.visibility == Visibility::Public),
        )
    }

    /// Search documents, newest first.
    ///
    /// - An empty query lists public documents, like [`list_public`](Self::list_public)
    /// - `tag:<value>` matches documents carrying that tag, case-insensitively
    /// - Anything else is a case-insensitive substring match on the title,
    ///   the tags and the body text
    ///
    /// Non-empty queries return public and unlisted documents.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<DocumentMeta> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_public();
        }

        let matcher = Matcher::parse(query);
        sorted_metas(
            self.snapshot()
                .into_iter()
                .filter(|doc| doc.meta.visibility.is_visible() && matcher.matches(doc)),
        )
    }

    /// One page of [`search`](Self::search) results.
    ///
    /// `page` is 1-based. Zero values for `page` and `page_size` are
    /// treated as 1.
    #[must_use]
    pub fn search_page(&self, query: &str, page: usize, page_size: usize) -> SearchPage {
        let results = self.search(query);
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total = results.len();
        let total_pages = total.div_ceil(page_size);

        let items = results
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        SearchPage {
            items,
            page: PageInfo {
                total,
                page,
                page_size,
                total_pages,
                has_prev: page > 1,
                has_next: page < total_pages,
            },
        }
    }

    /// Full document by slug. Hidden documents are not found.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<Arc<Document>> {
        self.lookup(slug)
            .filter(|doc| doc.meta.visibility.is_visible())
    }

    /// Document metadata by slug. Hidden documents are not found.
    #[must_use]
    pub fn meta(&self, slug: &str) -> Option<DocumentMeta> {
        self.get(slug).map(|doc| doc.meta.clone())
    }

    /// Chunk layout by slug. Hidden documents are not found.
    #[must_use]
    pub fn manifest(&self, slug: &str) -> Option<Manifest> {
        self.get(slug).map(|doc| doc.manifest())
    }

    /// One chunk body by slug and zero-based index.
    #[must_use]
    pub fn chunk(&self, slug: &str, index: usize) -> Option<String> {
        self.get(slug)
            .and_then(|doc| doc.chunks.chunks.get(index).cloned())
    }

    /// Source modification time by slug, regardless of visibility.
    #[must_use]
    pub fn updated_at(&self, slug: &str) -> Option<f64> {
        self.lookup(slug).map(|doc| doc.updated_at)
    }

    /// Validation token for document listings.
    #[must_use]
    pub fn etag_for_documents(&self) -> String {
        format!("W/\"posts-{}\"", self.version())
    }

    /// Validation token for one document.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn etag_for_document(&self, slug: &str) -> Option<String> {
        let updated_at = self.updated_at(slug)?;
        Some(format!("W/\"post-{slug}-{}\"", updated_at as i64))
    }

    /// Public documents dated within the year before `now`, counted per day.
    ///
    /// Keys are the Unix timestamps of UTC day starts.
    #[must_use]
    pub fn activity(&self, now: DateTime<Utc>) -> BTreeMap<i64, usize> {
        let since = now - TimeDelta::days(365);
        let mut activity = BTreeMap::new();

        for doc in self.snapshot() {
            if doc.meta.visibility != Visibility::Public {
                continue;
            }
            let Some(date) = doc.meta.date.as_deref().and_then(parse_date) else {
                continue;
            };
            if date > since {
                let timestamp = date.timestamp();
                let day_start = timestamp - timestamp.rem_euclid(SECONDS_PER_DAY);
                *activity.entry(day_start).or_insert(0) += 1;
            }
        }
        activity
    }
}

enum Matcher {
    Tag(String),
    Text(String),
}

impl Matcher {
    fn parse(query: &str) -> Self {
        match query.get(..TAG_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(TAG_PREFIX) => {
                Self::Tag(query[TAG_PREFIX.len()..].trim().to_lowercase())
            }
            _ => Self::Text(query.to_lowercase()),
        }
    }

    fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::Tag(tag) => doc.meta.tags.iter().any(|t| t.to_lowercase() == *tag),
            Self::Text(needle) => {
                doc.meta.title.to_lowercase().contains(needle)
                    || doc
                        .meta
                        .tags
                        .iter()
                        .any(|t| t.to_lowercase().contains(needle))
                    || doc.content_text.to_lowercase().contains(needle)
            }
        }
    }
}

/// Sort newest first and keep the metadata.
///
/// The sort is stable, so ties keep slug order.
fn sorted_metas(documents: impl Iterator<Item = Arc<Document>>) -> Vec<DocumentMeta> {
    let mut keyed: Vec<(f64, Arc<Document>)> =
        documents.map(|doc| (sort_key(&doc), doc)).collect();
    keyed.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    keyed.into_iter().map(|(_, doc)| doc.meta.clone()).collect()
}

#[allow(clippy::cast_precision_loss)]
fn sort_key(doc: &Document) -> f64 {
    doc.meta
        .date
        .as_deref()
        .and_then(parse_date)
        .map_or(doc.updated_at, |date| date.timestamp_millis() as f64 / 1000.0)
}

/// Parse a front matter date.
///
/// Accepts RFC 3339 and the common `YYYY-MM-DD[ HH:MM:SS]` forms. Dates
/// without an offset are taken as UTC.
pub(crate) fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
