//! The fetch assembler: one request in, one client-ready document out.
//!
//! Given a requested URL the assembler classifies the object by its first
//! type tag and runs the matching pipeline:
//!
//! - **reader channel**: child candidates from the entry lists of its
//!   subscriptions; filter, ACL, paginate, preload at feed depth.
//! - **dynamic feed**: child candidates from a URL-prefix scan; same
//!   pipeline, feed depth.
//! - **entry**: no candidate enumeration; stored children are embedded
//!   inline and the preload frontier runs at entry depth.
//!
//! Each fetch is a single-pass pure function of store state: every call
//! allocates its own frontier and visited structures, and failures to find
//! referenced rows degrade gracefully rather than erroring.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use loam_core::{collect_urls, contains, is_visible, ObjectKind, StoredObject};
use loam_graph::{substitute, Denormalizer};
use loam_store::ObjectStore;

use crate::config::LoamConfig;
use crate::error::Result;
use crate::paginator::{page, Candidate};

/// One fetch request.
///
/// The principal is threaded explicitly through every ACL check; there is
/// no ambient identity. An empty principal matches only public objects.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    /// Canonical URL of the requested object.
    pub url: String,
    /// URL prefix bounding a dynamic feed's candidates. Defaults to the
    /// origin of `url`.
    pub uri_prefix: Option<String>,
    /// Page size; defaults to the configured limit.
    pub limit: Option<usize>,
    /// Upper pagination cursor (exclusive).
    pub before: Option<DateTime<Utc>>,
    /// Lower pagination cursor (exclusive).
    pub after: Option<DateTime<Utc>>,
    /// Template parameters for the feed's filter expressions.
    pub params: HashMap<String, String>,
    /// The requesting principal, for ACL checks on everything but the top
    /// object itself.
    pub principal: String,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Assembles fetch responses against a store snapshot.
pub struct Fetcher<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    config: &'a LoamConfig,
}

impl<'a, S: ObjectStore + ?Sized> Fetcher<'a, S> {
    pub fn new(store: &'a S, config: &'a LoamConfig) -> Self {
        Self { store, config }
    }

    /// Assemble the document for one request.
    ///
    /// Returns `None` when no live object exists at the URL. The top
    /// object's own ACL is deliberately not checked here; that gate belongs
    /// to the caller, which knows the request context.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Option<Value>> {
        let Some(top) = self.store.get_by_url(&request.url).await? else {
            return Ok(None);
        };
        if top.deleted {
            return Ok(None);
        }

        let limit = request.limit.unwrap_or(self.config.default_page_limit);
        debug!(url = %request.url, kind = ?top.kind(), "assembling fetch");

        let assembled = match top.kind() {
            ObjectKind::ReaderChannel => self.assemble_channel(&top, request, limit).await?,
            ObjectKind::DynamicFeed => self.assemble_dynamic_feed(&top, request, limit).await?,
            ObjectKind::Entry => self.assemble_entry(&top, request).await?,
        };
        Ok(Some(assembled))
    }

    /// Reader channel: the candidate set is the union of `entries` across
    /// all subscriptions, in subscription order.
    async fn assemble_channel(
        &self,
        top: &StoredObject,
        request: &FetchRequest,
        limit: usize,
    ) -> Result<Value> {
        let mut candidate_urls = Vec::new();
        let mut seen = BTreeSet::new();

        if let Some(Value::Array(subscriptions)) = top.properties.get("subscriptions") {
            for subscription in subscriptions {
                let entries = match subscription {
                    // A reference to a stored feed object. The feed's own
                    // ACL gates its membership list: a feed the principal
                    // may not see contributes nothing, and neither does a
                    // tombstoned one.
                    Value::String(feed_url) => match self.store.get_by_url(feed_url).await? {
                        Some(feed)
                            if !feed.deleted && is_visible(&feed.acl, &request.principal) =>
                        {
                            entry_urls(&feed)
                        }
                        _ => Vec::new(),
                    },
                    // An inline subscription object
                    Value::Object(map) => inline_entry_urls(map),
                    _ => Vec::new(),
                };
                for url in entries {
                    if seen.insert(url.clone()) {
                        candidate_urls.push(url);
                    }
                }
            }
        }

        let mut candidates = Vec::with_capacity(candidate_urls.len());
        for url in &candidate_urls {
            // Missing entries degrade silently; they may simply not have
            // been fetched into this store yet.
            if let Some(object) = self.store.get_by_url(url).await? {
                candidates.push(object);
            }
        }

        self.assemble_feed(top, candidates, request, limit).await
    }

    /// Dynamic feed: the candidate set is every stored object under the
    /// request's URI prefix, except the feed object itself.
    async fn assemble_dynamic_feed(
        &self,
        top: &StoredObject,
        request: &FetchRequest,
        limit: usize,
    ) -> Result<Value> {
        let prefix = request
            .uri_prefix
            .clone()
            .unwrap_or_else(|| origin_prefix(&request.url));

        let mut candidates = self.store.get_by_url_prefix(&prefix).await?;
        candidates.retain(|c| c.url() != Some(request.url.as_str()));

        self.assemble_feed(top, candidates, request, limit).await
    }

    /// Shared feed pipeline: filter/unfilter, ACL, paginate, preload.
    async fn assemble_feed(
        &self,
        top: &StoredObject,
        candidates: Vec<StoredObject>,
        request: &FetchRequest,
        limit: usize,
    ) -> Result<Value> {
        let filters = predicate_list(top, "filter", &request.params);
        let unfilters = predicate_list(top, "unfilter", &request.params);

        let page_candidates: Vec<Candidate> = candidates
            .iter()
            .filter(|c| is_visible(&c.acl, &request.principal))
            .filter(|c| passes_filters(c, &filters, &unfilters))
            .filter_map(|c| {
                c.url()
                    .map(|url| Candidate::new(url, c.published(), c.deleted))
            })
            .collect();

        let children = page(page_candidates, limit, request.before, request.after);
        let preloaded = self
            .preload(top, &children, self.config.preload_depth_feed, request)
            .await?;

        let mut view = top.client_view();
        if let Value::Object(map) = &mut view {
            map.insert(
                "children".into(),
                Value::Array(children.into_iter().map(Value::String).collect()),
            );
            map.insert("preloaded".into(), Value::Object(preloaded));
        }
        Ok(view)
    }

    /// Plain entry: embed stored children inline, preload the property
    /// reference frontier at entry depth.
    async fn assemble_entry(&self, top: &StoredObject, request: &FetchRequest) -> Result<Value> {
        let depth = self.config.preload_depth_entry;
        let preloaded = self.preload(top, &[], depth, request).await?;

        let mut view = top.client_view();
        if let Value::Object(map) = &mut view {
            if !top.children.is_empty() {
                let children = Value::Array(top.children.clone());
                // Embedding is ACL-gated per object: references the
                // principal may not see stay bare URL strings.
                let principal = request.principal.clone();
                let embedded =
                    Denormalizer::with_visibility(self.store, move |o: &StoredObject| {
                        is_visible(&o.acl, &principal)
                    })
                    .denormalize(&children, depth)
                    .await?;
                map.insert("children".into(), embedded);
            }
            map.insert("preloaded".into(), Value::Object(preloaded));
        }
        Ok(view)
    }

    /// Breadth-first, flat preload of referenced objects.
    ///
    /// The frontier starts with every absolute-URL string in the top
    /// object's properties plus the paginated child list, and expands one
    /// wave per depth unit by scanning each newly loaded object for further
    /// references. Objects failing the ACL check (or tombstoned) are
    /// silently dropped and their references are not followed; their
    /// existence must not leak.
    async fn preload(
        &self,
        top: &StoredObject,
        child_urls: &[String],
        depth: u32,
        request: &FetchRequest,
    ) -> Result<Map<String, Value>> {
        let mut preloaded = Map::new();
        let mut seen = BTreeSet::new();
        seen.insert(request.url.clone());

        let mut frontier = BTreeSet::new();
        collect_urls(&Value::Object(top.properties.clone()), &mut frontier);
        frontier.extend(child_urls.iter().cloned());

        for _wave in 0..depth {
            let wave: Vec<String> = frontier
                .into_iter()
                .filter(|url| !seen.contains(url))
                .collect();
            if wave.is_empty() {
                break;
            }

            frontier = BTreeSet::new();
            for url in wave {
                seen.insert(url.clone());
                let Some(object) = self.store.get_by_url(&url).await? else {
                    continue;
                };
                if object.deleted || !is_visible(&object.acl, &request.principal) {
                    continue;
                }
                collect_urls(&Value::Object(object.properties.clone()), &mut frontier);
                preloaded.insert(url, object.client_view());
            }
        }

        Ok(preloaded)
    }
}

/// Entry URLs listed on a stored feed object's `entries` property.
fn entry_urls(feed: &StoredObject) -> Vec<String> {
    match feed.properties.get("entries") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|e| e.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Entry URLs of an inline subscription object, which may carry its
/// `entries` list directly or nested under `properties`.
fn inline_entry_urls(subscription: &Map<String, Value>) -> Vec<String> {
    let entries = subscription.get("entries").or_else(|| {
        subscription
            .get("properties")
            .and_then(|p| p.get("entries"))
    });
    match entries {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|e| e.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// The feed's stored predicate list under `name`, with request params
/// substituted in.
fn predicate_list(top: &StoredObject, name: &str, params: &HashMap<String, String>) -> Vec<Value> {
    match top.properties.get(name) {
        Some(Value::Array(predicates)) => {
            predicates.iter().map(|p| substitute(p, params)).collect()
        }
        _ => Vec::new(),
    }
}

/// Keep iff at least one filter matches (or there are none) and no unfilter
/// matches.
fn passes_filters(candidate: &StoredObject, filters: &[Value], unfilters: &[Value]) -> bool {
    let properties = Value::Object(candidate.properties.clone());
    let selected = filters.is_empty() || filters.iter().any(|f| contains(&properties, f));
    selected && !unfilters.iter().any(|f| contains(&properties, f))
}

/// `https://host/` for `https://host/anything`; used when a dynamic feed
/// request carries no explicit prefix.
fn origin_prefix(url: &str) -> String {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[after_scheme..].find('/') {
        Some(i) => url[..after_scheme + i + 1].to_string(),
        None => format!("{url}/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_origin_prefix() {
        assert_eq!(origin_prefix("https://a.example/feed/all"), "https://a.example/");
        assert_eq!(origin_prefix("https://a.example"), "https://a.example/");
        assert_eq!(origin_prefix("http://1"), "http://1/");
    }

    #[test]
    fn test_passes_filters() {
        let candidate = StoredObject::from_value(json!({
            "type": ["h-entry"],
            "properties": {"url": ["https://a.example/1"], "category": ["rust", "indieweb"]}
        }))
        .unwrap();

        // No filters keeps everything
        assert!(passes_filters(&candidate, &[], &[]));
        // Any-of across the filter list
        assert!(passes_filters(
            &candidate,
            &[json!({"category": ["python"]}), json!({"category": ["rust"]})],
            &[]
        ));
        assert!(!passes_filters(&candidate, &[json!({"category": ["python"]})], &[]));
        // Unfilter wins over filter
        assert!(!passes_filters(
            &candidate,
            &[json!({"category": ["rust"]})],
            &[json!({"category": ["indieweb"]})]
        ));
    }

    #[test]
    fn test_predicate_list_substitutes_params() {
        let top = StoredObject::from_value(json!({
            "type": ["h-x-dynamic-feed"],
            "properties": {
                "url": ["https://a.example/feed"],
                "filter": [{"category": ["{tag}"]}]
            }
        }))
        .unwrap();

        let mut params = HashMap::new();
        params.insert("tag".to_string(), "rust".to_string());
        let predicates = predicate_list(&top, "filter", &params);
        assert_eq!(predicates, vec![json!({"category": ["rust"]})]);
    }
}
