use thiserror::Error;

/// A page could not be retrieved. Recorded on that page only.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("render service failed: {0}")]
    Render(String),
    #[error("no content returned for {0}")]
    Empty(String),
}

/// A fetched page yielded no record.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no __NEXT_DATA__ block tree in page")]
    MissingBlockTree,
    #[error("block tree is not valid JSON: {0}")]
    InvalidBlockTree(#[from] serde_json::Error),
    #[error("block tree has no titled page block")]
    NoPageBlock,
    #[error("extractor panicked: {0}")]
    Panicked(String),
}
