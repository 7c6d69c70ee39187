use std::fmt;

use clap::ValueEnum;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Site {
    /// comic.naver.com
    Naver,
    /// series.naver.com
    Series,
    /// page.kakao.com
    Kakao,
    /// www.toons.kr
    Toons,
}

const NAVER_SAMPLE_IDS: &[u32] = &[
    183559, 626907, 570503, 748105, 819217, 22897, 335885, 597447, 679519, 710751, 654774,
    758037, 783054, 779809, 822042, 818093, 796268, 747269, 789766, 759833, 671674, 725110,
    799893, 832351, 839004, 815094, 794456, 822856, 836447,
];

const SERIES_SAMPLE_IDS: &[u32] = &[6393990, 9478408, 6362438];

const KAKAO_SAMPLE_IDS: &[u32] = &[53764524, 58439503, 56453386, 67242927];

impl Site {
    pub fn slug(&self) -> &'static str {
        match self {
            Site::Naver => "naver",
            Site::Series => "series",
            Site::Kakao => "kakao",
            Site::Toons => "toons",
        }
    }

    /// Site owning `url`, by host.
    pub fn from_url(url: &str) -> Option<Site> {
        let parsed = Url::parse(url).ok()?;
        match parsed.host_str()? {
            "comic.naver.com" | "m.comic.naver.com" => Some(Site::Naver),
            "series.naver.com" | "m.series.naver.com" => Some(Site::Series),
            "page.kakao.com" => Some(Site::Kakao),
            "toons.kr" | "www.toons.kr" => Some(Site::Toons),
            _ => None,
        }
    }

    /// Pages whose links make up the title listing, tried in order.
    pub fn listing_pages(&self) -> &'static [&'static str] {
        match self {
            Site::Naver => &[
                "https://comic.naver.com/webtoon/weekday",
                "https://comic.naver.com/webtoon",
            ],
            Site::Toons => &["https://www.toons.kr/toons/list"],
            Site::Series | Site::Kakao => &[],
        }
    }

    /// Known title pages, used when the listing yields nothing. Empty for
    /// sites whose listing must succeed.
    pub fn sample_urls(&self) -> Vec<String> {
        match self {
            Site::Naver => NAVER_SAMPLE_IDS
                .iter()
                .map(|id| format!("https://comic.naver.com/webtoon/list?titleId={id}"))
                .collect(),
            Site::Series => SERIES_SAMPLE_IDS
                .iter()
                .map(|id| format!("https://series.naver.com/comic/detail.series?productNo={id}"))
                .collect(),
            Site::Kakao => KAKAO_SAMPLE_IDS
                .iter()
                .map(|id| format!("https://page.kakao.com/content/{id}"))
                .collect(),
            Site::Toons => Vec::new(),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_site_by_host() {
        assert_eq!(
            Site::from_url("https://comic.naver.com/webtoon/list?titleId=748105"),
            Some(Site::Naver)
        );
        assert_eq!(
            Site::from_url("https://series.naver.com/comic/detail.series?productNo=6393990"),
            Some(Site::Series)
        );
        assert_eq!(Site::from_url("https://page.kakao.com/content/53764524"), Some(Site::Kakao));
        assert_eq!(Site::from_url("https://www.toons.kr/abc"), Some(Site::Toons));
        assert_eq!(Site::from_url("https://example.com/"), None);
        assert_eq!(Site::from_url("not a url"), None);
    }

    #[test]
    fn slug_matches_cli_name() {
        for site in Site::value_variants() {
            let name = site.to_possible_value().unwrap();
            assert_eq!(name.get_name(), site.slug());
        }
    }

    #[test]
    fn toons_has_no_fallback() {
        assert!(Site::Toons.sample_urls().is_empty());
        assert_eq!(Site::Kakao.sample_urls().len(), 4);
    }
}
