//! YAML front matter.
//!
//! A document may open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Release notes
//! date: 2024-03-01
//! tags: [rust, release]
//! visibility: unlisted
//! ---
//! # Body starts here
//! ```
//!
//! Known keys are typed; everything else is kept in [`FrontMatter::extra`]
//! and passed through untouched. An unterminated block is not front matter
//! at all and the whole file is treated as body.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;

use crate::document::Visibility;

/// Parsed front matter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    /// Date as written, scalars stringified.
    pub date: Option<String>,
    /// Tags in written order, duplicates and blanks removed.
    pub tags: Vec<String>,
    pub visibility: Visibility,
    pub summary: Option<String>,
    /// Keys with no dedicated field.
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Error type for front matter parsing.
#[derive(Debug, thiserror::Error)]
pub enum FrontMatterError {
    /// YAML parsing error.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The block parsed, but not to a key/value mapping.
    #[error("Front matter must be a mapping")]
    NotMapping,
}

#[derive(Deserialize)]
struct RawFrontMatter {
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    tags: Option<Value>,
    #[serde(default)]
    visibility: Option<Value>,
    #[serde(default)]
    summary: Option<Value>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

/// Split `content` into front matter and body.
///
/// Content without a leading `---` block yields default front matter and
/// the full content as body.
///
/// # Errors
///
/// Returns [`FrontMatterError`] if the block is not valid YAML or is not a
/// mapping.
pub fn parse(content: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    let Some((yaml, body)) = split(content) else {
        return Ok((FrontMatter::default(), content));
    };

    let value: Value = serde_yaml::from_str(yaml)?;
    let raw = match value {
        Value::Null => return Ok((FrontMatter::default(), body)),
        Value::Mapping(_) => serde_yaml::from_value::<RawFrontMatter>(value)?,
        _ => return Err(FrontMatterError::NotMapping),
    };

    let front_matter = FrontMatter {
        title: raw.title.as_ref().and_then(scalar_to_string),
        date: raw.date.as_ref().and_then(scalar_to_string),
        tags: raw.tags.as_ref().map(parse_tags).unwrap_or_default(),
        visibility: raw
            .visibility
            .as_ref()
            .and_then(scalar_to_string)
            .map_or_else(Visibility::default, |v| Visibility::parse(&v)),
        summary: raw.summary.as_ref().and_then(scalar_to_string),
        extra: raw.extra,
    };
    Ok((front_matter, body))
}

/// Locate the YAML block and the body following it.
fn split(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (first, rest) = content.split_once('\n')?;
    if first.trim_end() != "---" {
        return None;
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn scalar_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Tags as a YAML list or a comma-separated string.
fn parse_tags(value: &Value) -> Vec<String> {
    let candidates: Vec<String> = match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect(),
        other => scalar_to_string(other).into_iter().collect(),
    };

    let mut tags: Vec<String> = Vec::with_capacity(candidates.len());
    for tag in candidates {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_no_front_matter() {
        let (fm, body) = parse("# Title\n\nText").unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, "# Title\n\nText");
    }

    #[test]
    fn test_full_front_matter() {
        let content = "---\ntitle: Hello\ndate: 2024-03-01\ntags: [rust, web]\nvisibility: Unlisted\nsummary: Short\n---\n# Body\n";
        let (fm, body) = parse(content).unwrap();

        assert_eq!(fm.title.as_deref(), Some("Hello"));
        assert_eq!(fm.date.as_deref(), Some("2024-03-01"));
        assert_eq!(fm.tags, vec!["rust", "web"]);
        assert_eq!(fm.visibility, Visibility::Unlisted);
        assert_eq!(fm.summary.as_deref(), Some("Short"));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_tags_comma_separated() {
        let (fm, _) = parse("---\ntags: \"a, b ,, a\"\n---\n").unwrap();
        assert_eq!(fm.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_scalars_are_stringified() {
        let (fm, _) = parse("---\ntitle: 2024\ndate: 20240301\ntags: [1, true]\n---\nx").unwrap();
        assert_eq!(fm.title.as_deref(), Some("2024"));
        assert_eq!(fm.date.as_deref(), Some("20240301"));
        assert_eq!(fm.tags, vec!["1", "true"]);
    }

    #[test]
    fn test_unknown_visibility_is_public() {
        let (fm, _) = parse("---\nvisibility: secret\n---\n").unwrap();
        assert_eq!(fm.visibility, Visibility::Public);
    }

    #[test]
    fn test_extra_keys_preserved() {
        let (fm, _) = parse("---\ntitle: T\ncover: /img/a.png\nseries:\n  name: intro\n---\n").unwrap();
        assert_eq!(fm.extra.len(), 2);
        assert_eq!(fm.extra["cover"], serde_json::json!("/img/a.png"));
        assert_eq!(fm.extra["series"], serde_json::json!({"name": "intro"}));
    }

    #[test]
    fn test_empty_block() {
        let (fm, body) = parse("---\n---\nBody").unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_unterminated_block_is_body() {
        let content = "---\ntitle: Open\n\nNo closing fence";
        let (fm, body) = parse(content).unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, content);
    }

    #[test]
    fn test_invalid_yaml() {
        let result = parse("---\ntitle: [unclosed\n---\nBody");
        assert!(matches!(result, Err(FrontMatterError::Yaml(_))));
    }

    #[test]
    fn test_non_mapping() {
        let result = parse("---\n- a\n- b\n---\nBody");
        assert!(matches!(result, Err(FrontMatterError::NotMapping)));
    }

    #[test]
    fn test_crlf_and_bom() {
        let (fm, body) = parse("\u{feff}---\r\ntitle: Win\r\n---\r\nBody").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Win"));
        assert_eq!(body, "Body");
    }
}
