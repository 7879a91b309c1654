// ABOUTME: Bounded ETag cache and conditional-GET middleware
// ABOUTME: SHA-256 over response bodies, LRU eviction, If-None-Match handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! ETag support
//!
//! Successful GET responses are hashed and remembered per caller and request
//! path; a later GET with a matching `If-None-Match` short-circuits to 304.
//! The store is an explicit LRU with a fixed capacity, so it cannot grow
//! without bound.
//!
//! Every resource in the API is scoped to its owner, and derived resources
//! (like `/api/entries/stats`) change whenever any of the owner's entries
//! change. Invalidation therefore drops ALL of a caller's cached tags on any
//! successful write by that caller, not just the written path.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::Mutex;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use lru::LruCache;
use sha2::{Digest, Sha256};

use crate::server::ServerResources;

/// Fallback capacity if config supplies zero
const MIN_CAPACITY: usize = 16;
/// Upper bound on buffered response size (2 MiB)
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
/// Hex chars of the scope digest kept in cache keys
const SCOPE_LEN: usize = 16;

/// Bounded map from (caller scope, request path) to the ETag of the last
/// response served for it
pub struct EtagCache {
    entries: Mutex<LruCache<String, String>>,
}

impl EtagCache {
    /// Create a cache holding at most `capacity` tags
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(MIN_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Current ETag for a caller's path, if cached
    #[must_use]
    pub fn get(&self, scope: &str, path: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(&key(scope, path)).cloned())
    }

    /// Remember the ETag for a caller's path, evicting the least-recently-used
    /// entry when full
    pub fn put(&self, scope: &str, path: &str, etag: String) {
        if let Ok(mut cache) = self.entries.lock() {
            cache.put(key(scope, path), etag);
        }
    }

    /// Drop every cached tag belonging to a caller. Called after any
    /// successful write, because derived resources can change on any of the
    /// caller's mutations.
    pub fn invalidate_scope(&self, scope: &str) {
        if let Ok(mut cache) = self.entries.lock() {
            let prefix = format!("{scope}|");
            let stale: Vec<String> = cache
                .iter()
                .filter(|(k, _)| k.starts_with(&prefix))
                .map(|(k, _)| k.clone())
                .collect();
            for k in stale {
                cache.pop(&k);
            }
        }
    }

    /// Number of cached tags
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(scope: &str, path: &str) -> String {
    format!("{scope}|{path}")
}

/// Compute the quoted ETag value for a response body
#[must_use]
pub fn compute_etag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    format!("\"{}\"", hex::encode(digest))
}

/// Derive the caller scope from the authorization header. Anonymous callers
/// share one scope; nothing cached for them carries private data anyway,
/// since unauthenticated GETs only reach public routes.
fn caller_scope(headers: &HeaderMap) -> String {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map_or_else(
            || "anon".to_owned(),
            |auth| {
                let digest = Sha256::digest(auth.as_bytes());
                hex::encode(digest)[..SCOPE_LEN].to_owned()
            },
        )
}

/// Middleware adding ETag/If-None-Match handling to GET responses
pub async fn etag_middleware(
    State(resources): State<Arc<ServerResources>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let scope = caller_scope(request.headers());
    let if_none_match = request
        .headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    if method != Method::GET {
        let response = next.run(request).await;
        if response.status().is_success() {
            resources.etag_cache.invalidate_scope(&scope);
        }
        return response;
    }

    // Serve 304 without running the handler only when the caller presents
    // the tag we last served them for this path
    if let (Some(cached), Some(client)) = (resources.etag_cache.get(&scope, &path), &if_none_match)
    {
        if &cached == client {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            if let Ok(value) = cached.parse() {
                response.headers_mut().insert(header::ETAG, value);
            }
            return response;
        }
    }

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    let (parts, body) = response.into_parts();
    let Ok(bytes) = to_bytes(body, MAX_BODY_BYTES).await else {
        // Body too large to hash; pass through without an ETag
        return Response::from_parts(parts, Body::empty());
    };

    let etag = compute_etag(&bytes);
    resources.etag_cache.put(&scope, &path, etag.clone());

    if if_none_match.as_deref() == Some(etag.as_str()) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        if let Ok(value) = etag.parse() {
            response.headers_mut().insert(header::ETAG, value);
        }
        return response;
    }

    let mut response = Response::from_parts(parts, Body::from(bytes));
    if let Ok(value) = etag.parse() {
        response.headers_mut().insert(header::ETAG, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_is_stable_for_identical_bodies() {
        let a = compute_etag(b"{\"total_entries\":3}");
        let b = compute_etag(b"{\"total_entries\":3}");
        assert_eq!(a, b);
        assert!(a.starts_with('"') && a.ends_with('"'));
    }

    #[test]
    fn cache_evicts_least_recently_used() {
        let cache = EtagCache::new(MIN_CAPACITY);
        for i in 0..MIN_CAPACITY + 4 {
            cache.put("user1", &format!("/api/habits/{i}"), format!("\"tag{i}\""));
        }
        assert_eq!(cache.len(), MIN_CAPACITY);
        assert!(cache.get("user1", "/api/habits/0").is_none());
        assert!(cache
            .get("user1", &format!("/api/habits/{}", MIN_CAPACITY + 3))
            .is_some());
    }

    #[test]
    fn scopes_are_isolated() {
        let cache = EtagCache::new(64);
        cache.put("alice", "/api/entries/stats", "\"a\"".to_owned());
        cache.put("bob", "/api/entries/stats", "\"b\"".to_owned());

        assert_eq!(
            cache.get("alice", "/api/entries/stats"),
            Some("\"a\"".to_owned())
        );
        assert_eq!(
            cache.get("bob", "/api/entries/stats"),
            Some("\"b\"".to_owned())
        );
    }

    #[test]
    fn invalidating_a_scope_keeps_other_scopes() {
        let cache = EtagCache::new(64);
        cache.put("alice", "/api/entries", "\"a1\"".to_owned());
        cache.put("alice", "/api/entries/stats", "\"a2\"".to_owned());
        cache.put("bob", "/api/entries/stats", "\"b\"".to_owned());

        cache.invalidate_scope("alice");

        assert!(cache.get("alice", "/api/entries").is_none());
        assert!(cache.get("alice", "/api/entries/stats").is_none());
        assert!(cache.get("bob", "/api/entries/stats").is_some());
    }
}
