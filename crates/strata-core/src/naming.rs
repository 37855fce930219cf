//! Field-name conventions.
//!
//! Servers return snake_case (or kebab-case) column names. Callers that
//! prefer camelCase ask for [`FieldNaming::CamelCase`] and every field and
//! relationship name is run through [`camel_case`] before it is assigned.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Naming convention applied to field and relationship names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNaming {
    /// Use names exactly as the server sends them
    #[default]
    Verbatim,
    /// Convert `snake_case` / `kebab-case` names to `camelCase`
    CamelCase,
}

impl FieldNaming {
    /// Apply this convention to a single name.
    pub fn apply<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            Self::Verbatim => Cow::Borrowed(name),
            Self::CamelCase => Cow::Owned(camel_case(name)),
        }
    }
}

fn is_separator(c: char) -> bool {
    c == '_' || c == '-'
}

/// Convert a `snake_case` or `kebab-case` name to `camelCase`.
///
/// Leading and trailing separator runs are kept verbatim, so `_a_single`
/// becomes `_aSingle` and a name made only of separators comes back
/// unchanged. Runs of separators inside the name collapse (`a--single`
/// becomes `aSingle`). A name with a single segment is returned untouched,
/// casing included. With more than one segment every segment is lowercased
/// first and then re-capitalized, which normalizes irregular input casing.
pub fn camel_case(name: &str) -> String {
    let start = name.len() - name.trim_start_matches(is_separator).len();
    let end = name.trim_end_matches(is_separator).len();
    if start >= end {
        return name.to_string();
    }

    let segments: Vec<&str> = name[start..end]
        .split(is_separator)
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.len() == 1 {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    out.push_str(&name[..start]);
    for (i, segment) in segments.iter().enumerate() {
        let lower = segment.to_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out.push_str(&name[end..]);
    out
}

/// [`camel_case`] for optional input; `None` passes through.
pub fn camel_case_opt(name: Option<&str>) -> Option<String> {
    name.map(camel_case)
}
