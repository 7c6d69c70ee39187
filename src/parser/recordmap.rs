//! toons.kr pages are Notion exports rendered by Next.js. Titles live in the
//! embedded `__NEXT_DATA__` document under `props.pageProps.recordMap.block`,
//! keyed by block id, with properties stored as rich-text arrays.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value};

use super::extract::{authors, tagline};
use super::rules::{ExtractObserver, Field};
use super::text;
use crate::error::ExtractError;
use crate::page::PageSnapshot;
use crate::record::TitleRecord;

pub const BASE_URL: &str = "https://www.toons.kr";

static NEXT_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)__NEXT_DATA__"\s+type="application/json"[^>]*>(\{.*?\})</script>"#).unwrap()
});

// Property ids of the title database schema.
const TITLE: &str = "title";
const TITLE_EN: &str = "@m~r";
const GENRE: &str = "JgOi";
const STORY: &str = "TGUB";
const ART: &str = "ft;E";
const SYNOPSIS: &str = "QvJr";
const STATUS: &str = "e}{q";

const SYNOPSIS_KEYWORDS: &[&str] = &["이야기", "스토리", "주인공", "세계"];

const COVER_SELECTORS: &[&str] = &[
    r#"img[src*="cdn."]"#,
    r#"img[src*="oopy."]"#,
    r#"img[src*="amazonaws"]"#,
    r#"img[src*="cloudfront"]"#,
    "img",
];

const COVER_SKIP: &[&str] = &["home", "logo", "icon", "favicon"];

/// A titled `page` block.
pub struct PageBlock<'a> {
    pub id: &'a str,
    value: &'a Map<String, Value>,
    properties: &'a Map<String, Value>,
}

impl<'a> PageBlock<'a> {
    pub fn property(&self, id: &str) -> Option<String> {
        self.properties
            .get(id)
            .map(rich_text)
            .and_then(|raw| text::clean(&raw))
    }

    pub fn url(&self) -> String {
        format!("{}/{}", BASE_URL, self.id)
    }

    /// Child block ids in display order.
    fn content(&self) -> impl Iterator<Item = &'a str> {
        self.value
            .get("content")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }
}

/// Decoded `recordMap.block` of one page.
pub struct BlockTree {
    blocks: Map<String, Value>,
}

impl BlockTree {
    pub fn from_html(html: &str) -> Result<Self, ExtractError> {
        let caps = NEXT_DATA
            .captures(html)
            .ok_or(ExtractError::MissingBlockTree)?;
        let data: Value = serde_json::from_str(&caps[1])?;
        match data.pointer("/props/pageProps/recordMap/block") {
            Some(Value::Object(blocks)) => Ok(BlockTree {
                blocks: blocks.clone(),
            }),
            _ => Err(ExtractError::MissingBlockTree),
        }
    }

    fn value(&self, id: &str) -> Option<&Map<String, Value>> {
        self.blocks.get(id)?.get("value")?.as_object()
    }

    /// Every block of type `page` that has a `title` property.
    pub fn pages(&self) -> impl Iterator<Item = PageBlock<'_>> {
        self.blocks.iter().filter_map(|(id, block)| {
            let value = block.get("value")?.as_object()?;
            if value.get("type").and_then(Value::as_str) != Some("page") {
                return None;
            }
            let properties = value.get("properties")?.as_object()?;
            properties.contains_key(TITLE).then_some(PageBlock {
                id,
                value,
                properties,
            })
        })
    }

    /// The page block for `url`. A URL without a block id (a slug path)
    /// resolves only when the tree holds a single titled page.
    pub fn page_for(&self, url: &str) -> Option<PageBlock<'_>> {
        let wanted = block_key(url);
        if let Some(page) = self.pages().find(|p| block_key(p.id) == wanted) {
            return Some(page);
        }
        if is_block_id(&wanted) {
            return None;
        }
        let mut pages = self.pages();
        match (pages.next(), pages.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// First `text` block whose content reads like a synopsis: the page's
    /// own children first, then the rest of the tree.
    fn synopsis_block(&self, page: &PageBlock<'_>) -> Option<String> {
        let children = page.content().filter_map(|id| self.value(id));
        let rest = self.blocks.values().filter_map(|b| b.get("value")?.as_object());
        children.chain(rest).find_map(|value| {
            if value.get("type").and_then(Value::as_str) != Some("text") {
                return None;
            }
            let raw = rich_text(value.get("properties")?.get(TITLE)?);
            let accepted = tagline::accept_structured(&raw)?;
            SYNOPSIS_KEYWORDS
                .iter()
                .any(|k| accepted.contains(k))
                .then_some(accepted)
        })
    }
}

/// Block ids show up with and without dashes; compare the bare hex.
fn block_key(s: &str) -> String {
    let last = s
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(s);
    let last = last.split(['?', '#']).next().unwrap_or(last);
    last.chars().filter(|c| *c != '-').collect::<String>().to_lowercase()
}

fn is_block_id(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// Flatten a rich-text property: `[["text", [annotations]], [["nested"]], ...]`.
/// Segments are joined with a space.
pub fn rich_text(value: &Value) -> String {
    let Some(items) = value.as_array() else {
        return value.as_str().unwrap_or_default().to_string();
    };
    items
        .iter()
        .filter_map(|item| leading_str(item.as_array()?.first()?))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// The first string reached by following index 0 down nested arrays.
fn leading_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => leading_str(items.first()?),
        _ => None,
    }
}

fn cover_image(page: &PageSnapshot, doc: &Html) -> Option<String> {
    for css in COVER_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let found = doc
            .select(&selector)
            .filter_map(|el| el.value().attr("src"))
            .find(|src| {
                let lower = src.to_lowercase();
                !src.trim().is_empty() && !COVER_SKIP.iter().any(|s| lower.contains(s))
            });
        if let Some(src) = found {
            return page.absolutize(src);
        }
    }
    None
}

fn observed(
    field: Field,
    rule: &str,
    value: Option<String>,
    observer: &dyn ExtractObserver,
) -> Option<String> {
    observer.rule_tried(field, rule);
    if let Some(v) = &value {
        observer.accepted(field, rule, v);
    }
    value
}

/// Build a record from a toons.kr title page. No free-text fallback: a page
/// without a usable block tree is an error.
pub fn extract(page: &PageSnapshot, observer: &dyn ExtractObserver) -> Result<TitleRecord, ExtractError> {
    let html = page.html.as_deref().ok_or(ExtractError::MissingBlockTree)?;
    let tree = BlockTree::from_html(html)?;
    let block = tree.page_for(&page.url).ok_or(ExtractError::NoPageBlock)?;

    let title_name = observed(Field::TitleName, TITLE, block.property(TITLE), observer);
    if title_name.is_none() {
        return Err(ExtractError::NoPageBlock);
    }

    let tagline = block
        .property(SYNOPSIS)
        .and_then(|s| tagline::accept_structured(&s))
        .or_else(|| tree.synopsis_block(&block));

    let cover_image_url = page
        .document()
        .and_then(|doc| cover_image(page, &doc));

    Ok(TitleRecord {
        url: page.url.clone(),
        title_name,
        title_name_en: observed(Field::TitleName, TITLE_EN, block.property(TITLE_EN), observer),
        genre: observed(Field::Genre, GENRE, block.property(GENRE), observer),
        story_author: observed(
            Field::StoryAuthor,
            STORY,
            block.property(STORY).and_then(|s| authors::accept_name(&s)),
            observer,
        ),
        art_author: observed(
            Field::ArtAuthor,
            ART,
            block.property(ART).and_then(|s| authors::accept_name(&s)),
            observer,
        ),
        tagline: observed(Field::Tagline, SYNOPSIS, tagline, observer),
        status: observed(Field::Status, STATUS, block.property(STATUS), observer),
        cover_image_url: observed(Field::CoverImage, "img", cover_image_url, observer),
        ..TitleRecord::default()
    })
}

/// Title URLs of every page block on the list page.
pub fn title_urls(html: &str) -> Result<Vec<String>, ExtractError> {
    let tree = BlockTree::from_html(html)?;
    Ok(tree.pages().map(|p| p.url()).collect())
}
