use std::sync::LazyLock;

use crate::parser::rules::{ExtractObserver, Field, Rule, RuleSet, Validity};

static AGE: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::AgeRating,
        vec![
            Rule::template("all_ages", r"전체\s*연령가", "전체연령가"),
            Rule::template("age_use", r"(\d{1,2})세\s*이용가", "${1}세 이용가"),
            // 관람가 is the broadcast wording; stored the same way.
            Rule::template("age_view", r"(\d{1,2})세\s*관람가", "${1}세 이용가"),
        ],
    )
});

static RATING: LazyLock<Validity> = LazyLock::new(|| Validity::chars(1, 20));

pub fn extract(text: &str, observer: &dyn ExtractObserver) -> Option<String> {
    AGE.first_valid(text, observer, &RATING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::rules::NoopObserver;

    #[test]
    fn known_ratings() {
        assert_eq!(extract("장르 무협 전체연령가", &NoopObserver).as_deref(), Some("전체연령가"));
        assert_eq!(extract("15세 이용가", &NoopObserver).as_deref(), Some("15세 이용가"));
        assert_eq!(extract("12세이용가", &NoopObserver).as_deref(), Some("12세 이용가"));
        assert_eq!(extract("18세 관람가", &NoopObserver).as_deref(), Some("18세 이용가"));
    }

    #[test]
    fn rule_priority_not_text_position() {
        // "15세 이용가" comes first in the text, but 전체연령가 has priority.
        assert_eq!(
            extract("15세 이용가 ... 전체연령가", &NoopObserver).as_deref(),
            Some("전체연령가")
        );
    }

    #[test]
    fn absent() {
        assert_eq!(extract("연령 정보 없음", &NoopObserver), None);
    }
}
