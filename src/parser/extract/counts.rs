use std::sync::LazyLock;

use crate::parser::number::parse_count;
use crate::parser::rules::{ExtractObserver, Field, Rejection, Rule, RuleSet};

/// A count token: digits with optional grouping/decimal and a unit suffix.
macro_rules! count_pattern {
    ($before:literal, $after:literal) => {
        concat!($before, r"(\d[\d,]*(?:\.\d+)?[ \t]?[만천억]?)", $after)
    };
}

/// comic.naver.com: "+관심 86,571" on the title header.
pub static NAVER_LIKES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::LikeCount,
        vec![
            Rule::group("plus_interest", count_pattern!(r"\+관심\s*", ""), 1),
            Rule::group("interest", count_pattern!(r"관심\s*", ""), 1),
            Rule::group("likes", count_pattern!(r"좋아요\s*", ""), 1),
        ],
    )
});

/// series.naver.com: counts appear on either side of their label.
pub static SERIES_LIKES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::LikeCount,
        vec![
            Rule::group("count_interest", count_pattern!("", r"\s*관심"), 1),
            Rule::group("interest_count", count_pattern!(r"관심\s*", ""), 1),
            Rule::group("count_likes", count_pattern!("", r"\s*좋아요"), 1),
            Rule::group("likes_count", count_pattern!(r"좋아요\s*", ""), 1),
        ],
    )
});

pub static SERIES_VIEWS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::ViewCount,
        vec![
            Rule::group("count_downloads", count_pattern!("", r"\s*다운로드"), 1),
            Rule::group("downloads_count", count_pattern!(r"다운로드\s*", ""), 1),
            Rule::group("count_times", count_pattern!("", r"\s*회"), 1),
            Rule::group("views_count", count_pattern!(r"조회\s*", ""), 1),
        ],
    )
});

pub static KAKAO_VIEWS: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::ViewCount,
        vec![
            Rule::group("count_views", count_pattern!("", r"\s*조회"), 1),
            Rule::group("views_count", count_pattern!(r"조회\s*", ""), 1),
            Rule::group("count_view", count_pattern!("", r"\s*뷰"), 1),
            Rule::group("view_count", count_pattern!(r"뷰\s*", ""), 1),
        ],
    )
});

pub static KAKAO_RATING: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::Rating,
        vec![
            Rule::group("score_after", r"평점\s*(\d+(?:\.\d+)?)", 1),
            Rule::group("score_before", r"(\d+(?:\.\d+)?)\s*평점", 1),
            Rule::group("stars_after", r"별점\s*(\d+(?:\.\d+)?)", 1),
            Rule::group("stars_before", r"(\d+(?:\.\d+)?)\s*별점", 1),
        ],
    )
});

/// First positive count produced by `rules`.
pub fn count(rules: &RuleSet, text: &str, observer: &dyn ExtractObserver) -> Option<u64> {
    rules.first(text, observer, |c| parse_count(c).ok_or(Rejection::Unparsable))
}

/// First rating in (0, 10].
pub fn rating(text: &str, observer: &dyn ExtractObserver) -> Option<f64> {
    KAKAO_RATING.first(text, observer, |c| match c.parse::<f64>() {
        Ok(v) if v > 0.0 && v <= 10.0 => Ok(v),
        _ => Err(Rejection::Unparsable),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::rules::NoopObserver;

    #[test]
    fn naver_likes_with_commas() {
        assert_eq!(count(&NAVER_LIKES, "화산귀환\n+관심 86,571\n", &NoopObserver), Some(86571));
        assert_eq!(count(&NAVER_LIKES, "관심 1.2만", &NoopObserver), Some(12000));
        assert_eq!(count(&NAVER_LIKES, "관심 없음", &NoopObserver), None);
    }

    #[test]
    fn zero_is_treated_as_absent_and_next_match_wins() {
        assert_eq!(count(&NAVER_LIKES, "관심 0\n좋아요 35", &NoopObserver), Some(35));
    }

    #[test]
    fn series_counts_on_either_side() {
        assert_eq!(count(&SERIES_VIEWS, "4.1만 다운로드", &NoopObserver), Some(41000));
        assert_eq!(count(&SERIES_LIKES, "관심 3.2천", &NoopObserver), Some(3200));
    }

    #[test]
    fn kakao_views_and_rating() {
        assert_eq!(count(&KAKAO_VIEWS, "조회 512.3만", &NoopObserver), Some(5_123_000));
        assert_eq!(rating("평점 9.8", &NoopObserver), Some(9.8));
        assert_eq!(rating("평점 42", &NoopObserver), None);
    }
}
