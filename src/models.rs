//! Wire types for the search service response.
//!
//! These mirror the Elasticsearch response envelope: a `hits.hits` array of
//! scored documents, each with an `_index`, an opaque `_score`, a `_source`
//! document, and optional `inner_hits` nested sub-matches. Fields this bridge
//! does not read are ignored on deserialization.

use serde::Deserialize;
use std::collections::HashMap;

/// Top-level search response envelope.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: HitsEnvelope,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// One retrieved document fragment, best-match first in the response order.
///
/// Immutable once returned; lives for a single question/answer exchange.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Hit {
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Relevance score assigned by the search service. Opaque to this crate.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: serde_json::Value,
    #[serde(default)]
    pub inner_hits: Option<HashMap<String, InnerHits>>,
}

/// Nested sub-match container, keyed in `inner_hits` by `<index>.<field>`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct InnerHits {
    #[serde(default)]
    pub hits: InnerHitsEnvelope,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InnerHitsEnvelope {
    #[serde(default)]
    pub hits: Vec<InnerHit>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InnerHit {
    #[serde(rename = "_source", default)]
    pub source: InnerHitSource,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InnerHitSource {
    #[serde(default)]
    pub text: String,
}

impl Hit {
    /// Text of the top-level source field, if present and a string.
    pub fn source_text(&self, field: &str) -> Option<&str> {
        self.source.get(field).and_then(|v| v.as_str())
    }

    /// Nested sub-match texts for `<index>.<field>`, in response order.
    ///
    /// Returns `None` when the hit carries no nested sub-matches under that
    /// path, in which case the top-level field should be used instead.
    pub fn inner_hit_texts(&self, field: &str) -> Option<Vec<&str>> {
        let path = format!("{}.{}", self.index, field);
        let inner = self.inner_hits.as_ref()?.get(&path)?;
        if inner.hits.hits.is_empty() {
            return None;
        }
        Some(
            inner
                .hits
                .hits
                .iter()
                .map(|h| h.source.text.as_str())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_RESPONSE: &str = r#"{
        "took": 4,
        "timed_out": false,
        "hits": {
            "total": { "value": 2, "relation": "eq" },
            "max_score": 1.7,
            "hits": [
                {
                    "_index": "general-rules-pdf",
                    "_id": "a1",
                    "_score": 1.7,
                    "_source": { "content": "Aturan umum berlaku untuk semua anggota." }
                },
                {
                    "_index": "general-rules-pdf",
                    "_id": "a2",
                    "_score": 1.2,
                    "_source": { "content": "Pelanggaran aturan dikenakan sanksi." }
                }
            ]
        }
    }"#;

    #[test]
    fn deserializes_plain_hits() {
        let resp: SearchResponse = serde_json::from_str(PLAIN_RESPONSE).unwrap();
        assert_eq!(resp.hits.hits.len(), 2);

        let first = &resp.hits.hits[0];
        assert_eq!(first.index, "general-rules-pdf");
        assert_eq!(first.score, Some(1.7));
        assert_eq!(
            first.source_text("content"),
            Some("Aturan umum berlaku untuk semua anggota.")
        );
        assert!(first.inner_hit_texts("content").is_none());
    }

    #[test]
    fn deserializes_inner_hits() {
        let json = r#"{
            "hits": {
                "hits": [
                    {
                        "_index": "general-rules-pdf",
                        "_score": 2.1,
                        "_source": { "content": "full chapter text" },
                        "inner_hits": {
                            "general-rules-pdf.content": {
                                "hits": {
                                    "hits": [
                                        { "_source": { "text": "passage one" } },
                                        { "_source": { "text": "passage two" } }
                                    ]
                                }
                            }
                        }
                    }
                ]
            }
        }"#;

        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        let hit = &resp.hits.hits[0];
        let texts = hit.inner_hit_texts("content").unwrap();
        assert_eq!(texts, vec!["passage one", "passage two"]);
    }

    #[test]
    fn inner_hits_under_other_path_are_ignored() {
        let json = r#"{
            "hits": {
                "hits": [
                    {
                        "_index": "general-rules-pdf",
                        "_source": { "content": "top level" },
                        "inner_hits": {
                            "other-index.content": {
                                "hits": { "hits": [ { "_source": { "text": "x" } } ] }
                            }
                        }
                    }
                ]
            }
        }"#;

        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(resp.hits.hits[0].inner_hit_texts("content").is_none());
    }

    #[test]
    fn empty_response_parses() {
        let resp: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.hits.hits.is_empty());
    }

    #[test]
    fn missing_source_field_is_none() {
        let hit = Hit {
            index: "general-rules-pdf".to_string(),
            score: None,
            source: serde_json::json!({ "title": "no content here" }),
            inner_hits: None,
        };
        assert!(hit.source_text("content").is_none());
    }
}
