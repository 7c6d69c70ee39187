pub mod age;
pub mod authors;
pub mod counts;
pub mod tagline;
pub mod tags;
pub mod title;

use scraper::Html;

use super::rules::ExtractObserver;
use crate::page::PageSnapshot;
use crate::record::TitleRecord;

/// Fields every free-text site shares: credits, age rating, tagline, tags.
fn common(page: &PageSnapshot, doc: Option<&Html>, observer: &dyn ExtractObserver) -> TitleRecord {
    let text = page.text.as_str();
    let credits = authors::extract(text, observer);

    TitleRecord {
        url: page.url.clone(),
        art_author: credits.art,
        story_author: credits.story,
        original_author: credits.original,
        age_rating: age::extract(text, observer),
        tagline: tagline::extract(text, doc, observer),
        tags: tags::extract(text, observer),
        ..TitleRecord::default()
    }
}

/// comic.naver.com title page.
pub fn naver(page: &PageSnapshot, observer: &dyn ExtractObserver) -> TitleRecord {
    let doc = page.document();
    let mut record = common(page, doc.as_ref(), observer);

    record.like_count = counts::count(&counts::NAVER_LIKES, &page.text, observer);
    if let Some(doc) = &doc {
        record.title_name = title::naver_title(doc, observer);
        record.cover_image_url =
            title::naver_cover(page, doc, record.title_name.as_deref(), observer);
    }
    record
}

/// series.naver.com product page.
pub fn series(page: &PageSnapshot, observer: &dyn ExtractObserver) -> TitleRecord {
    let doc = page.document();
    let mut record = common(page, doc.as_ref(), observer);

    record.like_count = counts::count(&counts::SERIES_LIKES, &page.text, observer);
    record.view_count = counts::count(&counts::SERIES_VIEWS, &page.text, observer);
    record.status = title::status(&page.text, observer);
    if let Some(doc) = &doc {
        record.title_name = title::listed_title(doc, title::SERIES_TITLE_SELECTORS, observer);
        record.cover_image_url = title::og_cover(page, doc, observer);
    }
    record
}

/// page.kakao.com content page.
pub fn kakao(page: &PageSnapshot, observer: &dyn ExtractObserver) -> TitleRecord {
    let doc = page.document();
    let mut record = common(page, doc.as_ref(), observer);

    record.view_count = counts::count(&counts::KAKAO_VIEWS, &page.text, observer);
    record.rating = counts::rating(&page.text, observer);
    record.status = title::status(&page.text, observer);
    if let Some(doc) = &doc {
        record.title_name = title::listed_title(doc, title::KAKAO_TITLE_SELECTORS, observer);
        record.cover_image_url = title::og_cover(page, doc, observer);
    }
    record
}

// ── Tests ──
