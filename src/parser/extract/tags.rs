use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::parser::rules::{ExtractObserver, Field, Rule, RuleSet};

static HASHTAG: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::Tags,
        vec![Rule::group("hashtag", r"#[가-힣a-zA-Z0-9_]+", 0)],
    )
});

/// Every `#`-prefixed token in the text. Not first-match: all are kept,
/// duplicates collapse in the set.
pub fn extract(text: &str, observer: &dyn ExtractObserver) -> BTreeSet<String> {
    observer.rule_tried(Field::Tags, "hashtag");
    let tags: BTreeSet<String> = HASHTAG.all(text).collect();
    if !tags.is_empty() {
        let joined = tags.iter().cloned().collect::<Vec<_>>().join(" ");
        observer.accepted(Field::Tags, "hashtag", &joined);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::rules::NoopObserver;

    #[test]
    fn dedups_hashtags() {
        let tags = extract("#게임 #판타지 #게임", &NoopObserver);
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("#게임"));
        assert!(tags.contains("#판타지"));
    }

    #[test]
    fn stops_at_punctuation() {
        let tags = extract("태그: #회귀,#무협_액션 그리고 #1위!", &NoopObserver);
        let expected: BTreeSet<String> =
            ["#회귀", "#무협_액션", "#1위"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn none_found() {
        assert!(extract("태그 없음 # ", &NoopObserver).is_empty());
    }
}
