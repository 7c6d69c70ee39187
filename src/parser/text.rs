use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const EDGE_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '-', '_'];

/// Strip tags, collapse whitespace runs and trim edge punctuation.
///
/// Idempotent: every `<` left after tag removal has no `>` after it, so a
/// second pass finds nothing to strip.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let untagged = TAG_RE.replace_all(raw, " ");
    let collapsed = SPACE_RE.replace_all(&untagged, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c))
        .to_string()
}

/// `normalize`, mapping an empty result to `None`.
pub fn clean(raw: &str) -> Option<String> {
    let s = normalize(raw);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_tags() {
        assert_eq!(normalize("  화산\n\t귀환  "), "화산 귀환");
        assert_eq!(normalize("<b>대화산파</b> 13대 제자"), "대화산파 13대 제자");
        assert_eq!(normalize("a<br>b"), "a b");
    }

    #[test]
    fn trims_edge_punctuation() {
        assert_eq!(normalize(" - 이야기입니다. "), "이야기입니다");
        assert_eq!(normalize(":: 혜림 ,"), "혜림");
        assert_eq!(normalize("...!?"), "");
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n "), "");
        assert_eq!(clean(" \t"), None);
    }

    #[test]
    fn idempotent() {
        let samples = [
            "",
            "plain",
            "  spaced   out\ttext \n",
            "<p>문단</p>\n<p>두 번째 문단.</p>",
            "a<<b>>c",
            "x < y and y > z",
            "<<a>b>",
            "- _ .trailing. _ -",
            "끝에 열린 < 괄호",
            "&lt;b&gt; entity stays",
            "#게임 #판타지 #게임",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }
}
