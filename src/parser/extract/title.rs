//! DOM-driven fields: title name, cover image and serialization status.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::page::{self, PageSnapshot};
use crate::parser::rules::{ExtractObserver, Field, Rule, RuleSet, Validity};

/// Headings on Naver title pages that are site chrome, not the title.
const HEADING_CHROME: &[&str] = &[
    "NAVER",
    "웹툰",
    "웹소설",
    "시리즈",
    "관련 상품",
    "작가의 다른 작품",
    "독자들이 많이 본",
];

static BADGE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\n(?:휴재|완결|신작|UP).*$").unwrap());

static HEADING: LazyLock<Validity> =
    LazyLock::new(|| Validity::chars(3, 99).deny(HEADING_CHROME));

static TITLE: LazyLock<Validity> = LazyLock::new(|| Validity::chars(1, 100));

const NAVER_TITLE_SELECTORS: &[&str] = &[
    ".EpisodeListInfo__title",
    ".comic_info .title",
    ".detail h2",
    "h2.title",
    ".title",
];

pub const SERIES_TITLE_SELECTORS: &[&str] = &[
    "h2.title",
    "h3.title",
    ".title",
    "h1",
    ".webtoon_title",
    ".series_title",
    ".product_title",
];

pub const KAKAO_TITLE_SELECTORS: &[&str] = &[
    "h1.title",
    "h2.title",
    "h3.title",
    ".title",
    ".webtoon_title",
    ".content_title",
    ".product_title",
];

const COVER_SELECTORS: &[&str] = &[
    ".thumb img",
    ".cover img",
    ".titleImg img",
    "img[alt*='썸네일']",
    ".comic_info .thumb img",
];

static STATUS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::Status,
        vec![
            Rule::template("completed", r"완결", "완결"),
            Rule::template("ongoing", r"연재\s*중", "연재중"),
        ],
    )
});

static STATUS_VALUE: LazyLock<Validity> = LazyLock::new(|| Validity::chars(1, 10));

fn offer(
    field: Field,
    rule: &str,
    raw: &str,
    validity: &Validity,
    observer: &dyn ExtractObserver,
) -> Option<String> {
    match validity.accept(raw) {
        Ok(value) => {
            observer.accepted(field, rule, &value);
            Some(value)
        }
        Err(why) => {
            observer.rejected(field, rule, raw, &why);
            None
        }
    }
}

/// First heading that is not chrome, minus any status badge line.
fn heading_title(doc: &Html, observer: &dyn ExtractObserver) -> Option<String> {
    observer.rule_tried(Field::TitleName, "heading");
    let selector = Selector::parse("h1, h2").ok()?;
    doc.select(&selector).find_map(|el| {
        let text = page::element_text(el);
        let stripped = BADGE_SUFFIX.replace(&text, "");
        offer(Field::TitleName, "heading", &stripped, &HEADING, observer)
    })
}

fn selector_title(
    doc: &Html,
    selectors: &[&str],
    observer: &dyn ExtractObserver,
) -> Option<String> {
    for &selector in selectors {
        observer.rule_tried(Field::TitleName, selector);
        if let Some(raw) = page::first_text(doc, &[selector], 1) {
            let stripped = BADGE_SUFFIX.replace(&raw, "");
            if let Some(found) = offer(Field::TitleName, selector, &stripped, &TITLE, observer) {
                return Some(found);
            }
        }
    }
    None
}

fn og_title(doc: &Html, observer: &dyn ExtractObserver) -> Option<String> {
    observer.rule_tried(Field::TitleName, "og:title");
    let raw = page::meta_content(doc, "og:title")?;
    // "화산귀환 | 네이버 웹툰"
    let name = raw.split(" | ").next().unwrap_or(&raw);
    offer(Field::TitleName, "og:title", name, &TITLE, observer)
}

pub fn naver_title(doc: &Html, observer: &dyn ExtractObserver) -> Option<String> {
    heading_title(doc, observer)
        .or_else(|| selector_title(doc, NAVER_TITLE_SELECTORS, observer))
        .or_else(|| og_title(doc, observer))
}

/// Selector list in order, then `og:title`.
pub fn listed_title(
    doc: &Html,
    selectors: &[&str],
    observer: &dyn ExtractObserver,
) -> Option<String> {
    selector_title(doc, selectors, observer).or_else(|| og_title(doc, observer))
}

fn usable_src(src: &str) -> bool {
    let src = src.trim();
    !src.is_empty() && !src.starts_with("data:")
}

fn img_src(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .find(|src| usable_src(src))
        .map(str::to_string)
}

/// An image that names itself a thumbnail or cover, by src or alt text.
fn labelled_cover(doc: &Html, title: Option<&str>) -> Option<String> {
    let selector = Selector::parse("img").ok()?;
    doc.select(&selector).find_map(|el| {
        let src = el.value().attr("src").filter(|s| usable_src(s))?;
        let alt = el.value().attr("alt").unwrap_or_default();
        let by_src = src.contains("thumb") || src.contains("cover");
        let by_alt = alt.contains("썸네일")
            || alt.to_lowercase().contains("title")
            || title.is_some_and(|t| alt.contains(t));
        (by_src || by_alt).then(|| src.to_string())
    })
}

pub fn naver_cover(
    page: &PageSnapshot,
    doc: &Html,
    title: Option<&str>,
    observer: &dyn ExtractObserver,
) -> Option<String> {
    observer.rule_tried(Field::CoverImage, "labelled_img");
    let src = labelled_cover(doc, title)
        .or_else(|| {
            COVER_SELECTORS.iter().find_map(|selector| {
                observer.rule_tried(Field::CoverImage, selector);
                img_src(doc, selector)
            })
        })
        .or_else(|| {
            observer.rule_tried(Field::CoverImage, "og:image");
            page::meta_content(doc, "og:image")
        })?;
    accept_cover(page, &src, observer)
}

/// `og:image` first, then the common thumbnail selectors.
pub fn og_cover(page: &PageSnapshot, doc: &Html, observer: &dyn ExtractObserver) -> Option<String> {
    observer.rule_tried(Field::CoverImage, "og:image");
    let src = page::meta_content(doc, "og:image").or_else(|| {
        COVER_SELECTORS.iter().find_map(|selector| {
            observer.rule_tried(Field::CoverImage, selector);
            img_src(doc, selector)
        })
    })?;
    accept_cover(page, &src, observer)
}

fn accept_cover(page: &PageSnapshot, src: &str, observer: &dyn ExtractObserver) -> Option<String> {
    let url = page.absolutize(src)?;
    observer.accepted(Field::CoverImage, "cover", &url);
    Some(url)
}

/// "완결" wins over "연재중" when both appear.
pub fn status(text: &str, observer: &dyn ExtractObserver) -> Option<String> {
    STATUS.first_valid(text, observer, &STATUS_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::rules::NoopObserver;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn naver_heading_skips_chrome_and_strips_badge() {
        let d = doc(r#"<body><h1>NAVER 웹툰</h1><h2>화산귀환
            <span>휴재</span></h2><h2>관련 상품</h2></body>"#);
        assert_eq!(naver_title(&d, &NoopObserver).as_deref(), Some("화산귀환"));
    }

    #[test]
    fn naver_title_falls_back_to_og_title() {
        let d = doc(r#"<head><meta property="og:title" content="신의 탑 | 네이버 웹툰"></head>
            <body><h1>웹툰</h1></body>"#);
        assert_eq!(naver_title(&d, &NoopObserver).as_deref(), Some("신의 탑"));
    }

    #[test]
    fn listed_title_uses_selector_order() {
        let d = doc(r#"<body><div class="title">보조 제목</div>
            <h3 class="title">나 혼자만 레벨업</h3></body>"#);
        assert_eq!(
            listed_title(&d, KAKAO_TITLE_SELECTORS, &NoopObserver).as_deref(),
            Some("나 혼자만 레벨업")
        );
    }

    #[test]
    fn cover_by_src_keyword_then_selector() {
        let page = PageSnapshot::from_text("https://comic.naver.com/webtoon/list?titleId=769209", "");
        let d = doc(r#"<body><img src="/logo.png"><img src="/images/thumb_769209.jpg"></body>"#);
        assert_eq!(
            naver_cover(&page, &d, None, &NoopObserver).as_deref(),
            Some("https://comic.naver.com/images/thumb_769209.jpg")
        );

        let d = doc(r#"<body><div class="titleImg"><img src="https://img.example.com/a.jpg"></div></body>"#);
        assert_eq!(
            naver_cover(&page, &d, None, &NoopObserver).as_deref(),
            Some("https://img.example.com/a.jpg")
        );
    }

    #[test]
    fn cover_by_alt_matching_title() {
        let page = PageSnapshot::from_text("https://comic.naver.com/webtoon/list?titleId=1", "");
        let d = doc(r#"<body><img src="data:image/gif;base64,R0l" alt="화산귀환">
            <img src="https://img.example.com/x.jpg" alt="화산귀환"></body>"#);
        assert_eq!(
            naver_cover(&page, &d, Some("화산귀환"), &NoopObserver).as_deref(),
            Some("https://img.example.com/x.jpg")
        );
    }

    #[test]
    fn cover_by_literal_title_alt() {
        let page = PageSnapshot::from_text("https://comic.naver.com/webtoon/list?titleId=1", "");
        let d = doc(r#"<body><img src="/banner/event.png" alt="이벤트">
            <img src="https://img.example.com/y.jpg" alt="Title Image"></body>"#);
        assert_eq!(
            naver_cover(&page, &d, None, &NoopObserver).as_deref(),
            Some("https://img.example.com/y.jpg")
        );
    }

    #[test]
    fn status_prefers_completed() {
        assert_eq!(status("연재중 ... 완결", &NoopObserver).as_deref(), Some("완결"));
        assert_eq!(status("매주 월요일 연재 중", &NoopObserver).as_deref(), Some("연재중"));
        assert_eq!(status("휴재", &NoopObserver), None);
    }
}
