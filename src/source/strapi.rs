//! Strapi content API implementation of the FAQ source.

use super::{FaqEntry, FaqSource};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// FAQ source backed by a Strapi collection at `GET {base}/api/faqs`.
///
/// Answers in Strapi are rich text: an array of block nodes whose children
/// hold the text. Only the first block's first child is read, matching the
/// upstream collection's flat single-paragraph answers. Multi-paragraph
/// answers lose content beyond the first block; this is a known limitation
/// of the extraction, not something this adapter papers over.
pub struct StrapiFaqSource {
    client: reqwest::Client,
    endpoint: String,
}

impl StrapiFaqSource {
    /// Create a source for the given FAQ collection endpoint.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        url::Url::parse(endpoint)
            .map_err(|e| SvarError::Config(format!("Invalid FAQ endpoint '{}': {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SvarError::Source(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    async fn fetch_page(&self, page: u32) -> Result<FaqListResponse> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("pagination[page]", page)])
            .send()
            .await
            .map_err(|e| SvarError::Source(format!("FAQ fetch failed: {}", e)))?
            .error_for_status()
            .map_err(|e| SvarError::Source(format!("FAQ fetch returned error status: {}", e)))?;

        response
            .json::<FaqListResponse>()
            .await
            .map_err(|e| SvarError::Source(format!("Malformed FAQ payload: {}", e)))
    }
}

#[async_trait]
impl FaqSource for StrapiFaqSource {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<FaqEntry>> {
        let first = self.fetch_page(1).await?;
        let page_count = first
            .meta
            .as_ref()
            .and_then(|m| m.pagination.as_ref())
            .map(|p| p.page_count)
            .unwrap_or(1);

        let mut entries = extract_entries(first);

        // Strapi paginates collections (25 per page by default); follow the
        // remaining pages so the whole corpus is indexed.
        for page in 2..=page_count {
            let payload = self.fetch_page(page).await?;
            entries.extend(extract_entries(payload));
        }

        debug!("Fetched {} FAQ entries", entries.len());
        Ok(entries)
    }
}

/// Flatten a Strapi FAQ payload into normalized entries.
///
/// Records whose answer has no text content are skipped with a warning.
fn extract_entries(payload: FaqListResponse) -> Vec<FaqEntry> {
    payload
        .data
        .into_iter()
        .filter_map(|item| {
            let attributes = item.attributes;
            let answer = attributes
                .answer
                .first()
                .and_then(|block| block.children.first())
                .map(|node| node.text.clone());

            match answer {
                Some(answer) => Some(FaqEntry {
                    question: attributes.question,
                    answer,
                }),
                None => {
                    warn!(question = %attributes.question, "Skipping FAQ entry with empty answer");
                    None
                }
            }
        })
        .collect()
}

// === Strapi payload shape ===

#[derive(Debug, Deserialize)]
struct FaqListResponse {
    data: Vec<FaqItem>,
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct FaqItem {
    attributes: FaqAttributes,
}

#[derive(Debug, Deserialize)]
struct FaqAttributes {
    #[serde(rename = "Question")]
    question: String,
    #[serde(rename = "Answer", default)]
    answer: Vec<RichTextBlock>,
}

#[derive(Debug, Deserialize)]
struct RichTextBlock {
    #[serde(default)]
    children: Vec<RichTextNode>,
}

#[derive(Debug, Deserialize)]
struct RichTextNode {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Meta {
    pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(rename = "pageCount")]
    page_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> FaqListResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_entries() {
        let payload = parse(
            r#"{
                "data": [
                    {
                        "id": 1,
                        "attributes": {
                            "Question": "What is Strapi?",
                            "Answer": [
                                { "type": "paragraph", "children": [ { "type": "text", "text": "A headless CMS." } ] }
                            ]
                        }
                    }
                ],
                "meta": { "pagination": { "page": 1, "pageSize": 25, "pageCount": 1, "total": 1 } }
            }"#,
        );

        let entries = extract_entries(payload);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question, "What is Strapi?");
        assert_eq!(entries[0].answer, "A headless CMS.");
    }

    #[test]
    fn test_extract_reads_only_first_block() {
        let payload = parse(
            r#"{
                "data": [
                    {
                        "id": 1,
                        "attributes": {
                            "Question": "Q",
                            "Answer": [
                                { "children": [ { "text": "First paragraph." } ] },
                                { "children": [ { "text": "Second paragraph." } ] }
                            ]
                        }
                    }
                ]
            }"#,
        );

        let entries = extract_entries(payload);
        assert_eq!(entries[0].answer, "First paragraph.");
    }

    #[test]
    fn test_extract_skips_empty_answers() {
        let payload = parse(
            r#"{
                "data": [
                    { "id": 1, "attributes": { "Question": "Q1", "Answer": [] } },
                    { "id": 2, "attributes": { "Question": "Q2", "Answer": [ { "children": [ { "text": "A2" } ] } ] } }
                ]
            }"#,
        );

        let entries = extract_entries(payload);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question, "Q2");
    }
}
