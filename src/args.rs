//! Inline-argument evaluation.
//!
//! Arguments on an inclusion tag are resolved in the scope of the
//! *including* component and handed to the child as a flat string map.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::component::stringify;
use crate::error::RenderError;
use crate::token::{ArgFragment, InlineArg};

/// Caller-supplied data for one render call.
pub type PropMap = Map<String, Value>;

/// Resolved inline arguments, in declaration order.
pub type AttrMap = IndexMap<String, String>;

/// `inherited` is the map the including component itself was handed by
/// its parent; a wildcard argument passes it through unchanged. Later
/// arguments override earlier ones with the same key.
pub fn evaluate(args: &[InlineArg], props: &PropMap, inherited: &AttrMap) -> Result<AttrMap, RenderError> {
    let mut resolved = AttrMap::with_capacity(args.len());
    for arg in args {
        match arg {
            InlineArg::Wildcard => {
                for (key, value) in inherited {
                    resolved.insert(key.clone(), value.clone());
                }
            }
            InlineArg::Named { name, fragments } => {
                let mut text = String::new();
                for fragment in fragments {
                    match fragment {
                        ArgFragment::Literal(s) => text.push_str(s),
                        ArgFragment::Prop(key) => {
                            let value = props
                                .get(key)
                                .ok_or_else(|| RenderError::MissingProp(key.clone()))?;
                            text.push_str(&stringify(value));
                        }
                    }
                }
                resolved.insert(name.clone(), text);
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> PropMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_fragments_concatenate() {
        let args = vec![InlineArg::Named {
            name: "href".into(),
            fragments: vec![
                ArgFragment::Literal("/users/".into()),
                ArgFragment::Prop("id".into()),
                ArgFragment::Literal("?tab=".into()),
                ArgFragment::Prop("tab".into()),
            ],
        }];
        let out = evaluate(&args, &props(json!({"id": 7, "tab": "posts"})), &AttrMap::new()).unwrap();
        assert_eq!(out.get("href").map(String::as_str), Some("/users/7?tab=posts"));
    }

    #[test]
    fn test_relay_and_missing_prop() {
        let args = vec![InlineArg::relay("title")];
        let out = evaluate(&args, &props(json!({"title": "Hi"})), &AttrMap::new()).unwrap();
        assert_eq!(out["title"], "Hi");

        let err = evaluate(&args, &PropMap::new(), &AttrMap::new()).unwrap_err();
        assert_eq!(err, RenderError::MissingProp("title".into()));
    }

    #[test]
    fn test_wildcard_passes_inherited_through() {
        let mut inherited = AttrMap::new();
        inherited.insert("class".into(), "big".into());
        inherited.insert("role".into(), "button".into());

        let args = vec![
            InlineArg::Wildcard,
            InlineArg::Named {
                name: "role".into(),
                fragments: vec![ArgFragment::Literal("link".into())],
            },
        ];
        let out = evaluate(&args, &PropMap::new(), &inherited).unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["class", "role"]);
        assert_eq!(out["role"], "link");
    }

    #[test]
    fn test_empty_value() {
        let args = vec![InlineArg::Named { name: "hidden".into(), fragments: vec![] }];
        let out = evaluate(&args, &PropMap::new(), &AttrMap::new()).unwrap();
        assert_eq!(out["hidden"], "");
    }
}
