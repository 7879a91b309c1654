// ABOUTME: Hypermedia link tables fixed at compile time per resource state
// ABOUTME: Replaces runtime route-table reflection with static rel/method/template tuples
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cadence

//! Resource links
//!
//! Each resource state maps to a fixed table of `(rel, method, template)`
//! tuples. Templates use a literal `{id}` placeholder filled by plain string
//! substitution; there is no route reflection. Links are only attached when
//! the client asks for them (`include_links=true`).

use serde::{Deserialize, Serialize};

/// A single hypermedia link in a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation name, e.g. "self", "update", "delete"
    pub rel: String,
    /// HTTP method to use
    pub method: String,
    /// Resolved URL path
    pub href: String,
}

/// Compile-time link table row
#[derive(Debug, Clone, Copy)]
pub struct LinkSpec {
    /// Relation name
    pub rel: &'static str,
    /// HTTP method
    pub method: &'static str,
    /// Path template containing `{id}`
    pub template: &'static str,
}

const fn spec(rel: &'static str, method: &'static str, template: &'static str) -> LinkSpec {
    LinkSpec {
        rel,
        method,
        template,
    }
}

/// Links for a habit resource
pub const HABIT_LINKS: &[LinkSpec] = &[
    spec("self", "GET", "/api/habits/{id}"),
    spec("update", "PUT", "/api/habits/{id}"),
    spec("partial-update", "PATCH", "/api/habits/{id}"),
    spec("delete", "DELETE", "/api/habits/{id}"),
    spec("upsert-tags", "PUT", "/api/habits/{id}/tags"),
];

/// Links for a tag resource
pub const TAG_LINKS: &[LinkSpec] = &[
    spec("self", "GET", "/api/tags/{id}"),
    spec("update", "PUT", "/api/tags/{id}"),
    spec("delete", "DELETE", "/api/tags/{id}"),
];

/// Links for a live (non-archived) entry
pub const ENTRY_LINKS: &[LinkSpec] = &[
    spec("self", "GET", "/api/entries/{id}"),
    spec("update", "PUT", "/api/entries/{id}"),
    spec("archive", "PUT", "/api/entries/{id}/archive"),
    spec("delete", "DELETE", "/api/entries/{id}"),
];

/// Links for an archived entry
pub const ENTRY_LINKS_ARCHIVED: &[LinkSpec] = &[
    spec("self", "GET", "/api/entries/{id}"),
    spec("update", "PUT", "/api/entries/{id}"),
    spec("unarchive", "PUT", "/api/entries/{id}/unarchive"),
    spec("delete", "DELETE", "/api/entries/{id}"),
];

/// Collection-level links for the entries listing
pub const ENTRIES_COLLECTION_LINKS: &[LinkSpec] = &[
    spec("self", "GET", "/api/entries"),
    spec("stats", "GET", "/api/entries/stats"),
    spec("create", "POST", "/api/entries"),
    spec("create-batch", "POST", "/api/entries/batch"),
];

/// Table for an entry in the given archival state
#[must_use]
pub const fn entry_links(is_archived: bool) -> &'static [LinkSpec] {
    if is_archived {
        ENTRY_LINKS_ARCHIVED
    } else {
        ENTRY_LINKS
    }
}

/// Expand a link table for a concrete resource id
#[must_use]
pub fn expand(specs: &[LinkSpec], id: &str) -> Vec<Link> {
    specs
        .iter()
        .map(|s| Link {
            rel: s.rel.to_owned(),
            method: s.method.to_owned(),
            href: s.template.replace("{id}", id),
        })
        .collect()
}

/// Expand a collection-level table (templates without `{id}`)
#[must_use]
pub fn expand_collection(specs: &[LinkSpec]) -> Vec<Link> {
    specs
        .iter()
        .map(|s| Link {
            rel: s.rel.to_owned(),
            method: s.method.to_owned(),
            href: s.template.to_owned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_id_into_templates() {
        let links = expand(TAG_LINKS, "abc-123");
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].rel, "self");
        assert_eq!(links[0].href, "/api/tags/abc-123");
        assert_eq!(links[2].method, "DELETE");
    }

    #[test]
    fn archived_entries_link_unarchive() {
        let rels: Vec<&str> = entry_links(true).iter().map(|s| s.rel).collect();
        assert!(rels.contains(&"unarchive"));
        assert!(!rels.contains(&"archive"));

        let rels: Vec<&str> = entry_links(false).iter().map(|s| s.rel).collect();
        assert!(rels.contains(&"archive"));
        assert!(!rels.contains(&"unarchive"));
    }
}
