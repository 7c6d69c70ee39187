use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never reaches the rendered page.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// What the fetch layer hands to the extractors: the page URL, the markup
/// (when there is any) and the visible text, one text node per line.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub url: String,
    pub html: Option<String>,
    pub text: String,
}

impl PageSnapshot {
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        let text = visible_text(&Html::parse_document(&html));
        PageSnapshot {
            url: url.into(),
            html: Some(html),
            text,
        }
    }

    /// A snapshot with rendered text only; DOM-based rules find nothing.
    pub fn from_text(url: impl Into<String>, text: impl Into<String>) -> Self {
        PageSnapshot {
            url: url.into(),
            html: None,
            text: text.into(),
        }
    }

    pub fn document(&self) -> Option<Html> {
        self.html.as_deref().map(Html::parse_document)
    }

    /// Resolve `src` against the page URL. Absolute inputs pass through.
    pub fn absolutize(&self, src: &str) -> Option<String> {
        let src = src.trim();
        if src.is_empty() {
            return None;
        }
        if let Ok(abs) = Url::parse(src) {
            return Some(abs.to_string());
        }
        let base = Url::parse(&self.url).ok()?;
        base.join(src).ok().map(|u| u.to_string())
    }
}

/// Text of every visible text node under `<body>`, one per line.
pub fn visible_text(doc: &Html) -> String {
    let root = match Selector::parse("body") {
        Ok(sel) => doc.select(&sel).next().unwrap_or_else(|| doc.root_element()),
        Err(_) => doc.root_element(),
    };

    let mut lines = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    lines.join("\n")
}

/// Text nodes of one element, one per line (like a browser's innerText
/// for block-level children).
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the first element matching any selector, in selector order.
pub fn first_text(doc: &Html, selectors: &[&str], min_chars: usize) -> Option<String> {
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(el) = doc.select(&selector).next() {
            let text = element_text(el);
            if text.chars().count() >= min_chars {
                return Some(text);
            }
        }
    }
    None
}

/// `content` of `<meta property=..>` or `<meta name=..>`.
pub fn meta_content(doc: &Html, key: &str) -> Option<String> {
    let css = format!(r#"meta[property="{key}"], meta[name="{key}"]"#);
    let selector = Selector::parse(&css).ok()?;
    doc.select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r##"<html><head><title>t</title>
        <meta property="og:title" content="화산귀환">
        <style>.x{color:red}</style></head>
        <body><h2>화산귀환<span>휴재</span></h2>
        <script>var a = "#hidden";</script>
        <p>JP ∙ 글</p><img src="/img/thumb.jpg"></body></html>"##;

    #[test]
    fn visible_text_skips_scripts_and_styles() {
        let page = PageSnapshot::from_html("https://comic.naver.com/webtoon/list?titleId=1", HTML);
        assert_eq!(page.text, "화산귀환\n휴재\nJP ∙ 글");
    }

    #[test]
    fn element_text_keeps_line_breaks() {
        let doc = Html::parse_document(HTML);
        assert_eq!(first_text(&doc, &["h1", "h2"], 1).as_deref(), Some("화산귀환\n휴재"));
        assert_eq!(meta_content(&doc, "og:title").as_deref(), Some("화산귀환"));
        assert_eq!(meta_content(&doc, "og:image"), None);
    }

    #[test]
    fn absolutize_relative_and_absolute() {
        let page = PageSnapshot::from_text("https://www.toons.kr/abc", "");
        assert_eq!(
            page.absolutize("/img/cover.png").as_deref(),
            Some("https://www.toons.kr/img/cover.png")
        );
        assert_eq!(
            page.absolutize("https://cdn.example.com/a.jpg").as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
        assert_eq!(page.absolutize("  "), None);
    }
}
