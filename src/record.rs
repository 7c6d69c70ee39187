use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One scraped title page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleRecord {
    pub url: String,
    pub title_name: Option<String>,
    pub title_name_en: Option<String>,
    pub cover_image_url: Option<String>,
    pub art_author: Option<String>,
    pub story_author: Option<String>,
    pub original_author: Option<String>,
    pub like_count: Option<u64>,
    pub view_count: Option<u64>,
    pub rating: Option<f64>,
    pub age_rating: Option<String>,
    pub status: Option<String>,
    pub genre: Option<String>,
    pub tagline: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TitleRecord {
    pub fn new(url: impl Into<String>) -> Self {
        TitleRecord {
            url: url.into(),
            ..Default::default()
        }
    }

    /// An error-only record: every content field stays absent.
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        TitleRecord {
            url: url.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
