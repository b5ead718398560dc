//! The legacy tag-based dialect.
//!
//! Sections are introduced by a bare `Info`, `Question`, `Answer` or
//! `Solution` line. The question body carries a script prologue and the
//! display text:
//!
//! ```text
//! Question
//! <eqn> $a = 3; ''</eqn>
//! <watex>What is $a squared?</watex>
//! <_>
//! ```
//!
//! The output has the same shape as the `<<section>>` dialect, so everything
//! downstream is dialect-agnostic.

use super::cleanup::clean_legacy_text;
use super::raw_value::RawValue;
use super::sections::{SectionMap, SectionValue, finish, parse_mapping, strip_comment};
use crate::ParseError;
use crate::problem::SCRIPT_KEY;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacySection {
    Info,
    Question,
    Answer,
    Solution,
}

impl LegacySection {
    fn from_line(line: &str) -> Option<Self> {
        match line.trim() {
            "Info" => Some(Self::Info),
            "Question" => Some(Self::Question),
            "Answer" => Some(Self::Answer),
            "Solution" => Some(Self::Solution),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Question => "question",
            Self::Answer => "answer",
            Self::Solution => "solution",
        }
    }
}

#[derive(Debug, Default)]
struct RawLegacy {
    info: Option<String>,
    question: Option<String>,
    answer: Option<String>,
    solution: Option<String>,
}

impl RawLegacy {
    fn slot(&mut self, section: LegacySection) -> &mut Option<String> {
        match section {
            LegacySection::Info => &mut self.info,
            LegacySection::Question => &mut self.question,
            LegacySection::Answer => &mut self.answer,
            LegacySection::Solution => &mut self.solution,
        }
    }
}

/// Parse text in the legacy dialect into a [`SectionMap`].
pub fn parse_legacy(text: &str) -> Result<SectionMap, ParseError> {
    let raw = split(text)?;
    let mut map = SectionMap::new();

    if let Some(body) = &raw.info {
        let entries = parse_mapping(body).unwrap_or_else(|| {
            tracing::warn!("malformed Info section; using an empty mapping");
            IndexMap::new()
        });
        map.insert("info", SectionValue::Mapping(entries));
    }

    if let Some(body) = &raw.question {
        let (code, display) = split_question(body);
        if let Some(code) = code {
            let mut parameters = IndexMap::new();
            parameters.insert(SCRIPT_KEY.to_string(), RawValue::Str(code.to_string()));
            map.insert("parameters", SectionValue::Mapping(parameters));
        }
        map.insert("statement", SectionValue::Text(clean_legacy_text(display)));
    }

    if let Some(body) = &raw.answer {
        let choices = body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| clean_legacy_text(watex(line).unwrap_or(line)))
            .collect();
        map.insert("choices", SectionValue::Items(choices));
    }

    if let Some(body) = &raw.solution {
        map.insert("solution", SectionValue::Text(clean_legacy_text(watex(body).unwrap_or(body))));
    }

    finish(&mut map);
    tracing::debug!(sections = map.len(), "parsed legacy section map");
    Ok(map)
}

fn split(text: &str) -> Result<RawLegacy, ParseError> {
    let mut raw = RawLegacy::default();
    let mut current: Option<LegacySection> = None;

    for (idx, line) in text.lines().enumerate() {
        let line = strip_comment(line);
        if line.is_empty() {
            continue;
        }
        if let Some(section) = LegacySection::from_line(line) {
            let slot = raw.slot(section);
            if slot.is_some() {
                return Err(ParseError::DuplicateSection { name: section.name().to_string(), line: idx + 1 });
            }
            *slot = Some(String::new());
            current = Some(section);
            continue;
        }
        let Some(section) = current else {
            continue;
        };
        if let Some(body) = raw.slot(section) {
            body.push_str(line);
            if section != LegacySection::Solution {
                body.push('\n');
            }
        }
    }
    Ok(raw)
}

/// Split a question body into its script prologue and display text.
fn split_question(body: &str) -> (Option<&str>, &str) {
    if let Some(caps) = regex!(r"(?si)<eqn>(.*?)''</eqn>\s*<watex>(.*?)</watex>\s*<_>").captures(body) {
        if let (Some(code), Some(display)) = (caps.get(1), caps.get(2)) {
            return (Some(code.as_str()), display.as_str());
        }
    }
    (None, watex(body).unwrap_or(body))
}

fn watex(text: &str) -> Option<&str> {
    regex!(r"(?s)<watex>(.*?)</watex>").captures(text).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}
