//! Character-level formatting marks.

use crate::core::schema::NodeRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// A formatting attribute applied to a run of characters.
///
/// The derived ordering is the canonical mark order used when a mark set is
/// serialized: bold, italic, underline, strike, code, highlight, link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Highlight,
    Link { href: String },
}

/// The set of marks carried by one text run. At most one mark per [`MarkType`].
pub type MarkSet = BTreeSet<Mark>;

/// The attribute-free kind of a [`Mark`], used to query and toggle marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkType {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Highlight,
    Link,
}

impl MarkType {
    /// Every mark type in canonical order.
    pub const ALL: [MarkType; 7] = [
        MarkType::Bold,
        MarkType::Italic,
        MarkType::Underline,
        MarkType::Strike,
        MarkType::Code,
        MarkType::Highlight,
        MarkType::Link,
    ];

    /// Returns the JSON name of this mark type (e.g. `"strike"`).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strike => "strike",
            Self::Code => "code",
            Self::Highlight => "highlight",
            Self::Link => "link",
        }
    }

    /// Looks up a mark type by its JSON name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Builds the attribute-free mark of this type. Returns `None` for
    /// [`MarkType::Link`], which needs an `href`.
    #[must_use]
    pub fn plain_mark(self) -> Option<Mark> {
        match self {
            Self::Bold => Some(Mark::Bold),
            Self::Italic => Some(Mark::Italic),
            Self::Underline => Some(Mark::Underline),
            Self::Strike => Some(Mark::Strike),
            Self::Code => Some(Mark::Code),
            Self::Highlight => Some(Mark::Highlight),
            Self::Link => None,
        }
    }
}

impl Mark {
    /// Returns the kind of this mark.
    #[must_use]
    pub fn mark_type(&self) -> MarkType {
        match self {
            Self::Bold => MarkType::Bold,
            Self::Italic => MarkType::Italic,
            Self::Underline => MarkType::Underline,
            Self::Strike => MarkType::Strike,
            Self::Code => MarkType::Code,
            Self::Highlight => MarkType::Highlight,
            Self::Link { .. } => MarkType::Link,
        }
    }

    /// Builds a mark from its type and optional attributes.
    ///
    /// Returns `None` for a link without a non-empty string `href`.
    #[must_use]
    pub fn with_attrs(mark_type: MarkType, attrs: Option<&Value>) -> Option<Self> {
        match mark_type {
            MarkType::Link => {
                let href = attrs?.get("href")?.as_str()?;
                if href.is_empty() {
                    return None;
                }
                Some(Self::Link { href: href.to_string() })
            }
            other => other.plain_mark(),
        }
    }

    /// Renders this mark as `{"type": ..., "attrs"?: {...}}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Link { href } => json!({ "type": "link", "attrs": { "href": href } }),
            other => json!({ "type": other.mark_type().name() }),
        }
    }

    /// Parses a mark from its JSON form against the registered mark specs.
    /// Unknown types and marks missing a registered attribute yield `None`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let spec = NodeRegistry::global().mark_spec_by_name(value.get("type")?.as_str()?)?;
        let attrs = value.get("attrs");
        if spec.attrs.iter().any(|name| attrs.and_then(|a| a.get(*name)).is_none()) {
            return None;
        }
        Self::with_attrs(spec.mark_type, attrs)
    }
}

/// Returns `true` if `marks` contains a mark of `mark_type`.
#[must_use]
pub fn has_mark_type(marks: &MarkSet, mark_type: MarkType) -> bool {
    marks.iter().any(|m| m.mark_type() == mark_type)
}

/// Inserts `mark`, replacing any existing mark of the same type.
pub fn put_mark(marks: &mut MarkSet, mark: Mark) {
    let mark_type = mark.mark_type();
    marks.retain(|m| m.mark_type() != mark_type);
    marks.insert(mark);
}

/// Removes every mark of `mark_type`.
pub fn drop_mark_type(marks: &mut MarkSet, mark_type: MarkType) {
    marks.retain(|m| m.mark_type() != mark_type);
}
