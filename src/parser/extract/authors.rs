use std::sync::LazyLock;

use crate::parser::rules::{ExtractObserver, Field, Rule, RuleSet, Validity};

/// Status and promo words that show up next to role markers on Naver pages.
const AUTHOR_NOISE: &[&str] = &[
    "완결", "휴재", "이벤트", "안내", "확인", "필요", "당첨", "월요웹툰", "금요웹툰",
];

static AUTHOR: LazyLock<Validity> = LazyLock::new(|| {
    Validity::chars(1, 50)
        .deny(AUTHOR_NOISE)
        .deny_pattern(r"^\d+화")
});

/// "혜림 글/그림" or "혜림 ∙ 글/그림": one person credited for both roles.
static COMBINED: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::CombinedAuthor,
        vec![Rule::group(
            "name_before_combined",
            r"([가-힣a-zA-Z]+)\s*∙?\s*글/그림",
            1,
        )],
    )
});

static ART: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::ArtAuthor,
        vec![
            Rule::group("name_before_role", r"([가-힣a-zA-Z]+)\s*∙\s*그림", 1),
            Rule::group("role_before_name", r"\b그림\s*[:：]?\s*([가-힣a-zA-Z]+)", 1),
        ],
    )
});

static STORY: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::StoryAuthor,
        vec![
            Rule::group("name_before_role", r"([가-힣a-zA-Z]+)\s*∙\s*글", 1),
            Rule::group("role_before_name", r"\b글\s*[:：]?\s*([가-힣a-zA-Z]+)", 1),
        ],
    )
});

static ORIGINAL: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::new(
        Field::OriginalAuthor,
        vec![
            Rule::group("name_before_role", r"([가-힣a-zA-Z]+)\s*∙\s*원작", 1),
            Rule::group("role_before_name", r"\b원작\s*[:：]?\s*([가-힣a-zA-Z]+)", 1),
        ],
    )
});

#[derive(Debug, Default, PartialEq)]
pub struct Credits {
    pub art: Option<String>,
    pub story: Option<String>,
    pub original: Option<String>,
}

/// Resolve author credits from page text.
///
/// Precedence: the combined-credit rule runs first. When it yields an
/// accepted name, art and story are both set to it and the per-role rules
/// are not evaluated at all. The original-author rules always run.
pub fn extract(text: &str, observer: &dyn ExtractObserver) -> Credits {
    let (art, story) = match COMBINED.first_valid(text, observer, &AUTHOR) {
        Some(name) => (Some(name.clone()), Some(name)),
        None => (
            ART.first_valid(text, observer, &AUTHOR),
            STORY.first_valid(text, observer, &AUTHOR),
        ),
    };
    let original = ORIGINAL.first_valid(text, observer, &AUTHOR);

    Credits { art, story, original }
}

/// Author filter shared with the structured-block path.
pub fn accept_name(raw: &str) -> Option<String> {
    AUTHOR.accept(raw).ok()
}
