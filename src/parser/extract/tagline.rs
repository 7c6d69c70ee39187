use std::sync::LazyLock;

use scraper::Html;

use crate::page;
use crate::parser::rules::{ExtractObserver, Field, Rule, RuleSet, Validity};

/// Tokens that belong to other fields or to site chrome. Tagline rules are
/// broad free-text patterns, so anything carrying these is a false positive.
const TAGLINE_NOISE: &[&str] = &[
    // age rating
    "이용가",
    "관람가",
    "연령가",
    // credits
    "글/그림",
    "원작",
    // counters
    "관심",
    "좋아요",
    // links
    "http://",
    "https://",
    "www.",
    // chrome
    "공지사항",
    "웹툰",
    "NAVER",
];

/// Role markers in every shape the author rules read: "JP ∙ 글",
/// "이히∙그림", "글: 추공", "그림：장성락".
const CREDIT_MARKER: &str = r"∙\s*(?:글|그림|원작)|(?:^|\s)(?:글|그림|원작)\s*[:：]";

static TAGLINE: LazyLock<Validity> = LazyLock::new(|| {
    Validity::chars(20, 500)
        .deny_prefixes(&["#"])
        .deny(TAGLINE_NOISE)
        .deny_pattern(CREDIT_MARKER)
});

/// Structured sources carry a typed synopsis; only the length bound applies.
static STRUCTURED: LazyLock<Validity> = LazyLock::new(|| Validity::chars(20, 500));

static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::Tagline,
        vec![
            // Naver lays out: rating, synopsis, hashtags.
            Rule::group(
                "after_age_rating",
                r"(?:전체\s*연령가|\d{1,2}세\s*이용가)\s+([^#]+)",
                1,
            ),
            Rule::group("quoted", r#""([^"\n]+)""#, 1),
            Rule::group("curly_quoted", r"“([^”\n]+)”", 1),
            Rule::group("first_person", r"나는\s+[^.#\n]+\.", 0),
            Rule::group("two_sentences", r"[^.#\n]+\.[^.#\n]+\.", 0),
        ],
    )
});

const SUMMARY_SELECTORS: &[&str] = &[
    ".detail .summary",
    ".comic_info .summary",
    "[class*=\"summary\"]",
    ".description",
    ".intro",
];

/// Text rules first, then the summary elements of the DOM.
pub fn extract(text: &str, doc: Option<&Html>, observer: &dyn ExtractObserver) -> Option<String> {
    if let Some(found) = RULES.first_valid(text, observer, &TAGLINE) {
        return Some(found);
    }

    let doc = doc?;
    observer.rule_tried(Field::Tagline, "summary_selectors");
    for &selector in SUMMARY_SELECTORS {
        let Some(raw) = page::first_text(doc, &[selector], 1) else {
            continue;
        };
        match TAGLINE.accept(&raw) {
            Ok(found) => {
                observer.accepted(Field::Tagline, selector, &found);
                return Some(found);
            }
            Err(why) => observer.rejected(Field::Tagline, selector, &raw, &why),
        }
    }
    None
}

/// Length-checked synopsis from a structured source. The free-text noise
/// list does not apply there.
pub fn accept_structured(raw: &str) -> Option<String> {
    STRUCTURED.accept(raw).ok()
}
