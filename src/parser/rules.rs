//! Ordered (pattern, validity) rule tables.
//!
//! Every field owns a `RuleSet`: a fixed priority list of regex rules. The
//! rules are tried in order, every match of a rule is offered to the
//! field's acceptance predicate, and the first accepted candidate wins.
//! Later rules are never evaluated once a value is accepted.

use std::fmt;

use regex::{Captures, Regex};
use tracing::debug;

use super::text::{char_len, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TitleName,
    CoverImage,
    CombinedAuthor,
    ArtAuthor,
    StoryAuthor,
    OriginalAuthor,
    LikeCount,
    ViewCount,
    Rating,
    AgeRating,
    Status,
    Genre,
    Tagline,
    Tags,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::TitleName => "title_name",
            Field::CoverImage => "cover_image_url",
            Field::CombinedAuthor => "combined_author",
            Field::ArtAuthor => "art_author",
            Field::StoryAuthor => "story_author",
            Field::OriginalAuthor => "original_author",
            Field::LikeCount => "like_count",
            Field::ViewCount => "view_count",
            Field::Rating => "rating",
            Field::AgeRating => "age_rating",
            Field::Status => "status",
            Field::Genre => "genre",
            Field::Tagline => "tagline",
            Field::Tags => "tags",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a candidate was turned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    TooShort(usize),
    TooLong(usize),
    Noise(String),
    Unparsable,
}

/// Receives extraction events. All methods default to no-ops so the
/// extractor carries no logging configuration of its own.
pub trait ExtractObserver: Send + Sync {
    fn rule_tried(&self, _field: Field, _rule: &str) {}
    fn rejected(&self, _field: Field, _rule: &str, _candidate: &str, _why: &Rejection) {}
    fn accepted(&self, _field: Field, _rule: &str, _value: &str) {}
}

/// Forwards rejections and acceptances to `tracing` at debug level.
pub struct TracingObserver;

impl ExtractObserver for TracingObserver {
    fn rejected(&self, field: Field, rule: &str, candidate: &str, why: &Rejection) {
        debug!(%field, rule, candidate, ?why, "candidate rejected");
    }

    fn accepted(&self, field: Field, rule: &str, value: &str) {
        debug!(%field, rule, value, "field accepted");
    }
}

pub struct NoopObserver;

impl ExtractObserver for NoopObserver {}

/// How a rule turns a match into a candidate string.
pub enum Render {
    Group(usize),
    /// `Captures::expand` template, e.g. `"${1}세 이용가"`.
    Template(&'static str),
}

pub struct Rule {
    pub name: &'static str,
    pattern: Regex,
    render: Render,
}

impl Rule {
    pub fn group(name: &'static str, pattern: &str, group: usize) -> Self {
        Rule {
            name,
            pattern: Regex::new(pattern).unwrap(),
            render: Render::Group(group),
        }
    }

    pub fn template(name: &'static str, pattern: &str, template: &'static str) -> Self {
        Rule {
            name,
            pattern: Regex::new(pattern).unwrap(),
            render: Render::Template(template),
        }
    }

    fn render(&self, caps: &Captures<'_>) -> Option<String> {
        match self.render {
            Render::Group(i) => caps.get(i).map(|m| m.as_str().to_string()),
            Render::Template(t) => {
                let mut out = String::new();
                caps.expand(t, &mut out);
                Some(out)
            }
        }
    }

    pub fn candidates<'t>(&'t self, text: &'t str) -> impl Iterator<Item = String> + 't {
        self.pattern
            .captures_iter(text)
            .filter_map(move |caps| self.render(&caps))
    }
}

pub struct RuleSet {
    pub field: Field,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(field: Field, rules: Vec<Rule>) -> Self {
        RuleSet { field, rules }
    }

    /// First candidate, in rule priority order, that `accept` converts.
    pub fn first<T, F>(&self, text: &str, observer: &dyn ExtractObserver, mut accept: F) -> Option<T>
    where
        T: fmt::Display,
        F: FnMut(&str) -> Result<T, Rejection>,
    {
        for rule in &self.rules {
            observer.rule_tried(self.field, rule.name);
            for candidate in rule.candidates(text) {
                match accept(&candidate) {
                    Ok(value) => {
                        observer.accepted(self.field, rule.name, &value.to_string());
                        return Some(value);
                    }
                    Err(why) => observer.rejected(self.field, rule.name, &candidate, &why),
                }
            }
        }
        None
    }

    /// `first` with a text `Validity` filter.
    pub fn first_valid(
        &self,
        text: &str,
        observer: &dyn ExtractObserver,
        validity: &Validity,
    ) -> Option<String> {
        self.first(text, observer, |c| validity.accept(c))
    }

    /// Every candidate of every rule, in order. Used by collect-all fields.
    pub fn all<'t>(&'t self, text: &'t str) -> impl Iterator<Item = String> + 't {
        self.rules.iter().flat_map(move |r| r.candidates(text))
    }
}

/// Field-specific acceptance filter for text candidates.
pub struct Validity {
    min_chars: usize,
    max_chars: usize,
    noise: &'static [&'static str],
    noise_prefixes: &'static [&'static str],
    noise_pattern: Option<Regex>,
}

impl Validity {
    pub fn chars(min_chars: usize, max_chars: usize) -> Self {
        Validity {
            min_chars,
            max_chars,
            noise: &[],
            noise_prefixes: &[],
            noise_pattern: None,
        }
    }

    pub fn deny(mut self, tokens: &'static [&'static str]) -> Self {
        self.noise = tokens;
        self
    }

    pub fn deny_prefixes(mut self, prefixes: &'static [&'static str]) -> Self {
        self.noise_prefixes = prefixes;
        self
    }

    pub fn deny_pattern(mut self, pattern: &str) -> Self {
        self.noise_pattern = Some(Regex::new(pattern).unwrap());
        self
    }

    /// Normalize `raw` and check it; returns the cleaned value.
    pub fn accept(&self, raw: &str) -> Result<String, Rejection> {
        let cleaned = normalize(raw);
        self.check(&cleaned)?;
        Ok(cleaned)
    }

    pub fn check(&self, candidate: &str) -> Result<(), Rejection> {
        if candidate.is_empty() {
            return Err(Rejection::Empty);
        }
        let len = char_len(candidate);
        if len < self.min_chars {
            return Err(Rejection::TooShort(len));
        }
        if len > self.max_chars {
            return Err(Rejection::TooLong(len));
        }
        if let Some(p) = self.noise_prefixes.iter().find(|p| candidate.starts_with(**p)) {
            return Err(Rejection::Noise(p.to_string()));
        }
        if let Some(token) = self.noise.iter().find(|t| candidate.contains(**t)) {
            return Err(Rejection::Noise(token.to_string()));
        }
        if let Some(m) = self.noise_pattern.as_ref().and_then(|re| re.find(candidate)) {
            return Err(Rejection::Noise(m.as_str().to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every event for later assertions.
    #[derive(Default)]
    pub struct RecordingObserver {
        pub tried: Mutex<Vec<(Field, String)>>,
        pub rejected: Mutex<Vec<(Field, String, Rejection)>>,
    }

    impl RecordingObserver {
        pub fn tried_fields(&self) -> Vec<Field> {
            self.tried.lock().unwrap().iter().map(|(f, _)| *f).collect()
        }
    }

    impl ExtractObserver for RecordingObserver {
        fn rule_tried(&self, field: Field, rule: &str) {
            self.tried.lock().unwrap().push((field, rule.to_string()));
        }

        fn rejected(&self, field: Field, _rule: &str, candidate: &str, why: &Rejection) {
            self.rejected
                .lock()
                .unwrap()
                .push((field, candidate.to_string(), why.clone()));
        }
    }
}
