//! Free-text answer parsing.
//!
//! Every parser is total: an answer that does not match the expected shape,
//! or that carries conflicting signals, yields `None`. The client reads `None`
//! as "ask again at a higher temperature".

mod classes;
mod numeric;
mod stars;

pub use classes::parse_class;
pub use numeric::{parse_number, DEFAULT_MAX, DEFAULT_MIN};
pub use stars::parse_stars;

use crate::model::ParsedValue;
use serde::{Deserialize, Serialize};

/// Which parser a template uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParserKind {
    Numeric { min: i64, max: i64 },
    Stars,
    Classes { labels: Vec<String> },
}

impl ParserKind {
    pub fn numeric() -> Self {
        ParserKind::Numeric {
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
        }
    }

    pub fn classes<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParserKind::Classes {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parse(&self, text: &str) -> Option<ParsedValue> {
        match self {
            ParserKind::Numeric { min, max } => {
                parse_number(text, *min, *max).map(ParsedValue::Score)
            }
            ParserKind::Stars => parse_stars(text).map(ParsedValue::Score),
            ParserKind::Classes { labels } => parse_class(text, labels).map(ParsedValue::Class),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParserKind::Numeric { .. } => "numeric",
            ParserKind::Stars => "stars",
            ParserKind::Classes { .. } => "classes",
        }
    }
}
