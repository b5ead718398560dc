//! The `<<section>>` grammar.
//!
//! Parsing runs in two phases:
//!
//! 1. **Split** (`split_sections`): a line-oriented state machine collects
//!    the raw body of every section. Comments and blank lines are dropped
//!    here.
//! 2. **Decode** (`decode_section`): each body is decoded according to its
//!    section name. A body that does not decode degrades to an empty default
//!    and a `warn!`; it never stops the other sections.
//!
//! Both dialects finish through [`finish`], which merges `info` keys into the
//! top level.

use super::cleanup::clean_text;
use super::raw_value::{RawValue, unescape};
use crate::ParseError;
use indexmap::IndexMap;
use serde::Serialize;

/// Decoded body of one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionValue {
    /// `statement`, `answer`, `solution`: cleaned single-line text.
    Text(String),
    /// `parameters`, `info`: `key: value` entries in declaration order.
    Mapping(IndexMap<String, RawValue>),
    /// `choices`: one entry per `-` item.
    Items(Vec<String>),
    /// Any other section, and merged `info` keys.
    Value(RawValue),
}

/// Section name → decoded value, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SectionMap {
    sections: IndexMap<String, SectionValue>,
}

impl SectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&SectionValue> {
        self.sections.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: SectionValue) -> Option<SectionValue> {
        self.sections.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<SectionValue> {
        self.sections.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectionValue)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for SectionMap {
    type Item = (String, SectionValue);
    type IntoIter = indexmap::map::IntoIter<String, SectionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.into_iter()
    }
}

/// Sections whose bodies are literals, where `#` inside quotes is text.
fn is_literal_section(name: &str) -> bool {
    matches!(name, "parameters" | "info")
}

/// Parse text in the `<<section>>` dialect.
pub fn parse_sections(text: &str) -> Result<SectionMap, ParseError> {
    let raw = split_sections(text)?;
    let mut map = SectionMap::new();
    for (name, body) in raw {
        let value = decode_section(&name, &body);
        map.insert(name, value);
    }
    finish(&mut map);
    tracing::debug!(sections = map.len(), "parsed section map");
    Ok(map)
}

// --- phase 1: split ---------------------------------------------------------

fn split_sections(text: &str) -> Result<IndexMap<String, String>, ParseError> {
    let mut raw: IndexMap<String, String> = IndexMap::new();
    let mut current: Option<String> = None;
    let mut quote = QuoteState::default();

    for (idx, line) in text.lines().enumerate() {
        if let Some(caps) = regex!(r"^\s*<<\s*([A-Za-z]+)\s*>>\s*(?:#.*)?$").captures(line) {
            let name = caps[1].to_lowercase();
            if raw.contains_key(&name) {
                return Err(ParseError::DuplicateSection { name, line: idx + 1 });
            }
            raw.insert(name.clone(), String::new());
            current = Some(name);
            quote = QuoteState::default();
            continue;
        }

        let Some(name) = &current else {
            continue;
        };
        let kept = if is_literal_section(name) { quote.strip_comment(line) } else { strip_comment(line) };
        if kept.trim().is_empty() {
            continue;
        }
        if let Some(body) = raw.get_mut(name) {
            body.push_str(kept.trim_end());
            body.push('\n');
        }
    }
    Ok(raw)
}

/// Everything before the first `#`.
pub(crate) fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(kept, _)| kept)
}

/// Quote tracking across the lines of one literal section, so that `#`
/// inside a (possibly multi-line) string is not a comment.
#[derive(Debug, Default, Clone, Copy)]
struct QuoteState {
    open: Option<(char, bool)>,
}

impl QuoteState {
    fn strip_comment<'a>(&mut self, line: &'a str) -> &'a str {
        let triple_at = |idx: usize, q: char| line[idx..].chars().take(3).filter(|&c| c == q).count() == 3;
        let mut chars = line.char_indices();
        while let Some((idx, c)) = chars.next() {
            match self.open {
                Some((q, true)) => {
                    if c == q && triple_at(idx, q) {
                        self.open = None;
                        chars.nth(1);
                    }
                }
                Some((q, false)) => {
                    if c == '\\' {
                        chars.next();
                    } else if c == q {
                        self.open = None;
                    }
                }
                None => match c {
                    '#' => return &line[..idx],
                    '"' | '\'' => {
                        let triple = triple_at(idx, c);
                        self.open = Some((c, triple));
                        if triple {
                            chars.nth(1);
                        }
                    }
                    _ => {}
                },
            }
        }
        // single-quoted strings never span lines
        if matches!(self.open, Some((_, false))) {
            self.open = None;
        }
        line
    }
}

// --- phase 2: decode --------------------------------------------------------

pub(crate) fn decode_section(name: &str, body: &str) -> SectionValue {
    match name {
        "parameters" | "info" => SectionValue::Mapping(parse_mapping(body).unwrap_or_else(|| {
            tracing::warn!(section = name, "malformed mapping; using an empty one");
            IndexMap::new()
        })),
        "statement" | "answer" | "solution" => SectionValue::Text(clean_text(&flatten(body))),
        "choices" => SectionValue::Items(parse_items(body).unwrap_or_else(|| {
            tracing::warn!(section = name, "choices must start with '-'");
            vec![String::new()]
        })),
        _ => SectionValue::Value(RawValue::decode(body)),
    }
}

/// Trim every line and join the non-empty ones with single spaces.
pub(crate) fn flatten(body: &str) -> String {
    body.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" ")
}

/// `- item` lists; lines without a leading dash continue the previous item.
pub(crate) fn parse_items(body: &str) -> Option<Vec<String>> {
    let mut items: Vec<String> = Vec::new();
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match (line.strip_prefix('-'), items.last_mut()) {
            (Some(item), _) => items.push(item.trim().to_string()),
            (None, Some(last)) => {
                last.push('\n');
                last.push_str(line);
            }
            (None, None) => return None,
        }
    }
    Some(items)
}

/// `key: value` entries, one per physical line, optionally wrapped in braces
/// and followed by commas. Triple-quoted values may continue over lines.
pub(crate) fn parse_mapping(body: &str) -> Option<IndexMap<String, RawValue>> {
    let mut text = body.trim();
    if let Some(inner) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        text = inner;
    }

    let mut entries = IndexMap::new();
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    while let Some(line) = lines.next() {
        let (key, rest) = mapping_key(line)?;
        let mut value = rest.trim().to_string();

        if let Some(triple) = ["\"\"\"", "'''"].into_iter().find(|t| value.starts_with(t)) {
            while value.len() < 6 || !value.trim_end_matches(',').trim_end().ends_with(triple) {
                value.push('\n');
                value.push_str(lines.next()?);
            }
        }

        let value = value.strip_suffix(',').map_or(value.as_str(), str::trim_end);
        entries.insert(key, RawValue::decode(value));
    }
    Some(entries)
}

fn mapping_key(line: &str) -> Option<(String, &str)> {
    if let Some(caps) = regex!(r"^([A-Za-z_][A-Za-z0-9_]*)\s*:").captures(line) {
        let whole = caps.get(0)?;
        return Some((caps[1].to_string(), &line[whole.end()..]));
    }
    let quote = line.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let (key, rest) = unescape(&line[1..], quote)?;
    let rest = rest.trim_start().strip_prefix(':')?;
    Some((key, rest))
}

// --- post-processing --------------------------------------------------------

/// Merge `info` entries into the top level and rename `id` to `problem_id`.
pub(crate) fn finish(map: &mut SectionMap) {
    match map.remove("info") {
        Some(SectionValue::Mapping(entries)) => {
            for (key, value) in entries {
                map.insert(key, SectionValue::Value(value));
            }
        }
        Some(other) => {
            tracing::warn!(?other, "info section did not decode to a mapping; ignored");
        }
        None => {}
    }
    if let Some(id) = map.remove("id") {
        map.insert("problem_id", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mapping(pairs: &[(&str, RawValue)]) -> SectionValue {
        SectionValue::Mapping(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn splits_and_decodes_sections() {
        let src = "ignored preamble\n<<statement>>\nWhat is @{a}+@{b}?\n<<parameters>>\na: randnum(1,5)\nb: randnum(1,5)\n<<answer>>\n@{a+b}\n";
        let map = parse_sections(src).unwrap();
        assert_eq!(map.get("statement"), Some(&SectionValue::Text("What is @{a}+@{b}?".to_string())));
        assert_eq!(map.get("parameters"), Some(&mapping(&[("a", text("randnum(1,5)")), ("b", text("randnum(1,5)"))])));
        assert_eq!(map.get("answer"), Some(&SectionValue::Text("@{a+b}".to_string())));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn headers_are_case_folded_and_padded() {
        let map = parse_sections("  << Statement >>  \nHi\n").unwrap();
        assert_eq!(map.get("statement"), Some(&SectionValue::Text("Hi".to_string())));
    }

    #[test]
    fn text_sections_are_flattened_and_cleaned() {
        let map = parse_sections("<<solution>>\n  First \\bf{line}   \n\n  second line # a comment\n").unwrap();
        assert_eq!(map.get("solution"), Some(&SectionValue::Text("First <b>line</b> second line".to_string())));
    }

    #[test]
    fn hash_inside_quotes_is_kept_in_literal_sections() {
        let map = parse_sections("<<parameters>>\ncolor: \"#ff0000\" # red\nn: 3 # count\n").unwrap();
        assert_eq!(
            map.get("parameters"),
            Some(&mapping(&[("color", RawValue::Str("#ff0000".to_string())), ("n", RawValue::Int(3))]))
        );
    }

    #[test]
    fn triple_quoted_values_span_lines() {
        let src = "<<parameters>>\n{\ncode: \"\"\"\na = 1 # not a comment\nb = 2\n\"\"\",\n}\n";
        let map = parse_sections(src).unwrap();
        assert_eq!(map.get("parameters"), Some(&mapping(&[("code", RawValue::Str("\na = 1 # not a comment\nb = 2\n".into()))])));
    }

    #[test]
    fn malformed_mapping_degrades_to_empty() {
        let map = parse_sections("<<parameters>>\nthis is not a mapping\n<<statement>>\nok\n").unwrap();
        assert_eq!(map.get("parameters"), Some(&SectionValue::Mapping(IndexMap::new())));
        assert_eq!(map.get("statement"), Some(&SectionValue::Text("ok".to_string())));
    }

    #[test]
    fn choices_split_on_dashes() {
        let map = parse_sections("<<choices>>\n- 4\n- 5\n- 6\n").unwrap();
        assert_eq!(map.get("choices"), Some(&SectionValue::Items(vec!["4".into(), "5".into(), "6".into()])));

        assert_eq!(parse_items("- a\n  continued\n- b"), Some(vec!["a\ncontinued".to_string(), "b".to_string()]));
        let map = parse_sections("<<choices>>\nno dash\n- 5\n").unwrap();
        assert_eq!(map.get("choices"), Some(&SectionValue::Items(vec![String::new()])));
    }

    #[test]
    fn info_is_merged_and_id_renamed() {
        let map = parse_sections("<<info>>\ndifficulty: 3\nauthor: \"jane\"\nid: \"p1\"\n<<statement>>\nx\n").unwrap();
        assert_eq!(map.get("difficulty"), Some(&SectionValue::Value(RawValue::Int(3))));
        assert_eq!(map.get("author"), Some(&SectionValue::Value(RawValue::Str("jane".into()))));
        assert_eq!(map.get("problem_id"), Some(&SectionValue::Value(RawValue::Str("p1".into()))));
        assert!(!map.contains("info"));
        assert!(!map.contains("id"));
    }

    #[test]
    fn unknown_sections_pass_through() {
        let map = parse_sections("<<hint>>\n  'think'\n<<weight>>\n2\n").unwrap();
        assert_eq!(map.get("hint"), Some(&SectionValue::Value(RawValue::Str("think".into()))));
        assert_eq!(map.get("weight"), Some(&SectionValue::Value(RawValue::Int(2))));
    }

    #[test]
    fn repeated_sections_are_rejected() {
        let err = parse_sections("<<statement>>\na\n<<answer>>\n1\n<<STATEMENT>>\nb\n").unwrap_err();
        assert_eq!(err, ParseError::DuplicateSection { name: "statement".to_string(), line: 5 });
    }

    #[test]
    fn quoted_keys_and_trailing_commas() {
        let parsed = parse_mapping("{'my key': [1, 2],\n\"b\": 'x',\n}").unwrap();
        assert_eq!(parsed.get("my key"), Some(&RawValue::List(vec![RawValue::Int(1), RawValue::Int(2)])));
        assert_eq!(parsed.get("b"), Some(&RawValue::Str("x".into())));
    }
}
