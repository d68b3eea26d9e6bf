//! Token Model - Compiled Form of a Component
//!
//! A component is lexed once into a flat, ordered token sequence.
//! Every construct of the template language has exactly one variant here.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    String,
    Number,
    Boolean,
    Object,
    #[default]
    Any,
}

impl PropType {
    pub const ALL: [PropType; 5] = [
        PropType::String,
        PropType::Number,
        PropType::Boolean,
        PropType::Object,
        PropType::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropType::String => "string",
            PropType::Number => "number",
            PropType::Boolean => "boolean",
            PropType::Object => "object",
            PropType::Any => "any",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == word)
    }
}

impl fmt::Display for PropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ArgFragment {
    Literal(String),
    Prop(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InlineArg {
    /// `key="text ${prop} text"` or the `$key` relay shorthand
    Named { name: String, fragments: Vec<ArgFragment> },
    /// `$*`: forward everything the including component was handed
    Wildcard,
}

impl InlineArg {
    pub fn relay(name: impl Into<String>) -> Self {
        let name = name.into();
        InlineArg::Named {
            fragments: vec![ArgFragment::Prop(name.clone())],
            name,
        }
    }
}

/// A `<ez .../>` or `<ez-for .../>` tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inclusion {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub args: Vec<InlineArg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    Literal { text: String },
    Prop { name: String, prop_type: PropType },
    Attr { name: String },
    AttrsForward,
    Sub(Inclusion),
    Subs(Inclusion),
}

impl Token {
    pub fn literal(text: impl Into<String>) -> Self {
        Token::Literal { text: text.into() }
    }

    pub fn prop(name: impl Into<String>, prop_type: PropType) -> Self {
        Token::Prop { name: name.into(), prop_type }
    }

    pub fn attr(name: impl Into<String>) -> Self {
        Token::Attr { name: name.into() }
    }

    pub fn inclusion(&self) -> Option<&Inclusion> {
        match self {
            Token::Sub(inc) | Token::Subs(inc) => Some(inc),
            _ => None,
        }
    }
}
