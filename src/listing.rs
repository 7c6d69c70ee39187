use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use scraper::Selector;
use tracing::{info, warn};
use url::Url;

use crate::batch::DelayPolicy;
use crate::fetch::PageSource;
use crate::page::PageSnapshot;
use crate::parser::recordmap;
use crate::sites::Site;

/// Title page URLs for `site`, deduplicated in listing order.
///
/// Naver falls back to its sample list when no listing page yields links;
/// toons.kr has no fallback and fails instead. Every listing request is
/// followed by the same pause as a title visit.
pub async fn title_urls(
    site: Site,
    source: &mut dyn PageSource,
    delay: DelayPolicy,
) -> Result<Vec<String>> {
    let urls = match site {
        Site::Naver => {
            let mut found = Vec::new();
            for list_url in site.listing_pages() {
                info!("Fetching title listing: {}", list_url);
                match source.fetch(list_url).await {
                    Ok(page) => found = naver_links(&page),
                    Err(e) => warn!("Listing page {} failed: {}", list_url, e),
                }
                tokio::time::sleep(delay.next()).await;
                if !found.is_empty() {
                    break;
                }
            }
            if found.is_empty() {
                warn!("No title links found, using the sample list");
                site.sample_urls()
            } else {
                found
            }
        }
        Site::Toons => {
            let list_url = site.listing_pages()[0];
            info!("Fetching title listing: {}", list_url);
            let page = source
                .fetch(list_url)
                .await
                .with_context(|| format!("Failed to fetch listing {}", list_url))?;
            tokio::time::sleep(delay.next()).await;
            let html = page.html.as_deref().unwrap_or_default();
            let urls = recordmap::title_urls(html).context("Failed to read listing block tree")?;
            if urls.is_empty() {
                bail!("Listing {} has no title pages", list_url);
            }
            urls
        }
        Site::Series | Site::Kakao => site.sample_urls(),
    };

    let urls = dedupe(urls);
    info!("Title pages after dedupe: {}", urls.len());
    Ok(urls)
}

/// Weekday-listing anchors pointing at title pages, canonicalized to
/// `/webtoon/list?titleId=<id>`.
pub fn naver_links(page: &PageSnapshot) -> Vec<String> {
    let Some(doc) = page.document() else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href*='titleId=']") else {
        return Vec::new();
    };
    let links = doc
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("/webtoon/list"))
        .filter_map(|href| page.absolutize(href))
        .filter_map(|abs| canonical_title_url(&abs))
        .collect();
    dedupe(links)
}

fn canonical_title_url(abs: &str) -> Option<String> {
    let url = Url::parse(abs).ok()?;
    let id = url
        .query_pairs()
        .find(|(k, _)| k == "titleId")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()))?;
    Some(format!("https://comic.naver.com/webtoon/list?titleId={}", id))
}

/// Drop repeats, keeping first occurrence order.
pub fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;

    use super::*;
    use crate::error::FetchError;

    const NO_DELAY: DelayPolicy = DelayPolicy::new(0, 0);

    struct Pages(HashMap<String, String>);

    #[async_trait]
    impl PageSource for Pages {
        async fn fetch(&mut self, url: &str) -> Result<PageSnapshot, FetchError> {
            match self.0.get(url) {
                Some(html) => Ok(PageSnapshot::from_html(url, html.clone())),
                None => Err(FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }

    const WEEKDAY: &str = r#"<body>
        <a href="/webtoon/list?titleId=748105&tab=mon">화산귀환</a>
        <a href="https://comic.naver.com/webtoon/list?titleId=183559">신의 탑</a>
        <a href="/webtoon/list?titleId=748105">화산귀환</a>
        <a href="/webtoon/detail?titleId=748105&no=1">1화</a>
        <a href="/webtoon/weekday">요일별</a>
    </body>"#;

    #[test]
    fn naver_links_are_canonical_and_unique() {
        let page = PageSnapshot::from_html("https://comic.naver.com/webtoon/weekday", WEEKDAY);
        assert_eq!(
            naver_links(&page),
            vec![
                "https://comic.naver.com/webtoon/list?titleId=748105".to_string(),
                "https://comic.naver.com/webtoon/list?titleId=183559".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn naver_uses_second_listing_page_then_samples() {
        let mut source = Pages(HashMap::from([(
            "https://comic.naver.com/webtoon".to_string(),
            WEEKDAY.to_string(),
        )]));
        let urls = title_urls(Site::Naver, &mut source, NO_DELAY).await.unwrap();
        assert_eq!(urls.len(), 2);

        let mut empty = Pages(HashMap::new());
        let urls = title_urls(Site::Naver, &mut empty, NO_DELAY).await.unwrap();
        // the sample list repeats nothing after dedupe
        assert_eq!(urls.len(), Site::Naver.sample_urls().len());
        assert!(urls[0].ends_with("titleId=183559"));
    }

    #[tokio::test]
    async fn toons_listing_failure_is_fatal() {
        let mut empty = Pages(HashMap::new());
        assert!(title_urls(Site::Toons, &mut empty, NO_DELAY).await.is_err());

        let mut no_tree = Pages(HashMap::from([(
            "https://www.toons.kr/toons/list".to_string(),
            "<body>목록</body>".to_string(),
        )]));
        assert!(title_urls(Site::Toons, &mut no_tree, NO_DELAY).await.is_err());
    }

    #[tokio::test]
    async fn listing_requests_are_paced() {
        // first listing page 404s, the second one has links
        let mut source = Pages(HashMap::from([(
            "https://comic.naver.com/webtoon".to_string(),
            WEEKDAY.to_string(),
        )]));
        let t0 = Instant::now();
        let urls = title_urls(Site::Naver, &mut source, DelayPolicy::new(40, 0)).await.unwrap();
        assert_eq!(urls.len(), 2);
        assert!(t0.elapsed() >= Duration::from_millis(80));

        let t0 = Instant::now();
        title_urls(Site::Kakao, &mut source, DelayPolicy::new(1000, 0)).await.unwrap();
        assert!(t0.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn dedupe_keeps_order() {
        let v = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedupe(v), vec!["b".to_string(), "a".to_string()]);
    }
}
