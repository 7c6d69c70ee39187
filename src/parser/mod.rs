pub mod extract;
pub mod number;
pub mod recordmap;
pub mod rules;
pub mod text;

use std::panic::{self, AssertUnwindSafe};

use crate::error::ExtractError;
use crate::page::PageSnapshot;
use crate::record::TitleRecord;
use crate::sites::Site;
use rules::{ExtractObserver, TracingObserver};

/// Turns one page snapshot into a record. Must not mutate anything outside
/// the returned value.
pub trait PageExtractor: Send + Sync {
    fn extract(&self, page: &PageSnapshot) -> Result<TitleRecord, ExtractError>;
}

/// Per-site dispatch: free-text rules for the Naver and Kakao pages,
/// the block tree for toons.kr.
pub struct SiteExtractor {
    site: Site,
    observer: Box<dyn ExtractObserver>,
}

impl SiteExtractor {
    pub fn new(site: Site) -> Self {
        Self::with_observer(site, Box::new(TracingObserver))
    }

    pub fn with_observer(site: Site, observer: Box<dyn ExtractObserver>) -> Self {
        SiteExtractor { site, observer }
    }
}

impl PageExtractor for SiteExtractor {
    fn extract(&self, page: &PageSnapshot) -> Result<TitleRecord, ExtractError> {
        let observer = self.observer.as_ref();
        match self.site {
            Site::Naver => Ok(extract::naver(page, observer)),
            Site::Series => Ok(extract::series(page, observer)),
            Site::Kakao => Ok(extract::kakao(page, observer)),
            Site::Toons => recordmap::extract(page, observer),
        }
    }
}

/// Run `extractor` on `page`. Errors and panics both become an error-only
/// record for that page.
pub fn extract_record(extractor: &dyn PageExtractor, page: &PageSnapshot) -> TitleRecord {
    match panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(page))) {
        Ok(Ok(record)) => record,
        Ok(Err(e)) => TitleRecord::failed(&page.url, e.to_string()),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            TitleRecord::failed(&page.url, ExtractError::Panicked(msg).to_string())
        }
    }
}
