//! Component - Compiled Template and Render
//!
//! A component is lexed once and never changes afterwards. It holds no
//! reference to the registry; sub-component names are resolved against
//! whichever registry the render call is handed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::trace;

use crate::args::{self, AttrMap, PropMap};
use crate::error::RenderError;
use crate::hashing::{canonical_json, source_hash};
use crate::lexer::{Lexer, Recovery};
use crate::registry::Registry;
use crate::token::{ArgFragment, Inclusion, InlineArg, PropType, Token};
use crate::validation::Schema;

/// Key injected into each element of a repeated inclusion.
pub const LOOP_INDEX: &str = "i";

/// Sub-component a component includes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub id: String,
    pub repeated: bool,
}

#[derive(Debug, Clone)]
pub struct Component {
    tokens: Vec<Token>,
    recovered: Vec<Recovery>,
    source_hash: String,
}

impl Component {
    pub fn new(source: &str) -> Self {
        Self::with_lexer(&mut Lexer::new(), source)
    }

    pub fn with_lexer(lexer: &mut Lexer, source: &str) -> Self {
        let lexed = lexer.lex(source);
        Self {
            tokens: lexed.tokens,
            recovered: lexed.recovered,
            source_hash: source_hash(source),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Constructs that were kept as literal text because they were malformed
    pub fn recovered(&self) -> &[Recovery] {
        &self.recovered
    }

    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }

    /// Prop names used by `${...}` and attribute shorthands, with their
    /// declared type. A name declared with two different types is `any`.
    pub fn declared_props(&self) -> BTreeMap<String, PropType> {
        let mut props = BTreeMap::new();
        for token in &self.tokens {
            let (name, prop_type) = match token {
                Token::Prop { name, prop_type } => (name, *prop_type),
                Token::Attr { name } => (name, PropType::Any),
                _ => continue,
            };
            props
                .entry(name.clone())
                .and_modify(|known: &mut PropType| {
                    if *known != prop_type {
                        *known = PropType::Any;
                    }
                })
                .or_insert(prop_type);
        }
        props
    }

    pub fn dependencies(&self) -> Vec<Dependency> {
        self.tokens
            .iter()
            .filter_map(|token| {
                let repeated = matches!(token, Token::Subs(_));
                token.inclusion().map(|inc| Dependency {
                    name: inc.name.clone(),
                    id: inc.id.clone(),
                    repeated,
                })
            })
            .collect()
    }

    /// Schema of the top-level props a render call needs: every declared
    /// prop, every prop an inline argument references, and the array behind
    /// each repeated inclusion.
    pub fn signature(&self) -> Schema {
        let mut fields: BTreeMap<String, Schema> = self
            .declared_props()
            .into_iter()
            .map(|(name, t)| (name, Schema::Tag(t)))
            .collect();
        for token in &self.tokens {
            let Some(inc) = token.inclusion() else { continue };
            for key in inline_prop_refs(inc) {
                fields.entry(key.to_string()).or_insert(Schema::Tag(PropType::Any));
            }
            if matches!(token, Token::Subs(_)) {
                fields.insert(inc.id.clone(), Schema::Tag(PropType::Object));
            }
        }
        Schema::Object(fields)
    }

    pub fn render(&self, registry: &Registry, props: &PropMap, forwarded: &AttrMap) -> Result<String, RenderError> {
        self.render_at(registry, props, forwarded, 0)
    }

    fn render_at(
        &self,
        registry: &Registry,
        props: &PropMap,
        forwarded: &AttrMap,
        depth: usize,
    ) -> Result<String, RenderError> {
        let mut out = String::new();

        for token in &self.tokens {
            match token {
                Token::Literal { text } => out.push_str(text),
                Token::Prop { name, prop_type } => {
                    let value = lookup(props, name)?;
                    if !prop_type.matches(value) {
                        return Err(RenderError::TypeMismatch(name.clone(), *prop_type));
                    }
                    out.push_str(&stringify(value));
                }
                Token::Attr { name } => {
                    let value = lookup(props, name)?;
                    out.push_str(&format!("{}=\"{}\"", name, stringify(value)));
                }
                Token::AttrsForward => {
                    let attrs: Vec<_> = forwarded
                        .iter()
                        .map(|(key, value)| format!("{}=\"{}\"", key, value))
                        .collect();
                    out.push_str(&attrs.join(" "));
                }
                Token::Sub(inc) => {
                    let child = resolve(registry, inc, depth)?;
                    let child_props = match props.get(&inc.id) {
                        Some(Value::Object(fields)) => Cow::Borrowed(fields),
                        _ => Cow::Owned(PropMap::new()),
                    };
                    let attrs = args::evaluate(&inc.args, props, forwarded)?;

                    trace!(component = %inc.name, id = %inc.id, depth, "including component");
                    let rendered = child
                        .render_at(registry, &child_props, &attrs, depth + 1)
                        .map_err(|e| RenderError::nested(&inc.name, &inc.id, e))?;
                    out.push_str(&rendered);
                }
                Token::Subs(inc) => {
                    let child = resolve(registry, inc, depth)?;
                    let elements = element_maps(props, &inc.id)?;
                    // arguments see the outer scope, not the element being rendered
                    let attrs = args::evaluate(&inc.args, props, forwarded)?;

                    trace!(component = %inc.name, id = %inc.id, depth, count = elements.len(), "including repeated component");
                    let mut parts = Vec::with_capacity(elements.len());
                    for (index, fields) in elements.into_iter().enumerate() {
                        let scoped = with_loop_index(fields, index);
                        let rendered = child
                            .render_at(registry, &scoped, &attrs, depth + 1)
                            .map_err(|e| RenderError::nested(&inc.name, &inc.id, e))?;
                        parts.push(rendered);
                    }
                    out.push_str(&parts.join("\n"));
                }
            }
        }

        Ok(out)
    }
}

fn lookup<'p>(props: &'p PropMap, name: &str) -> Result<&'p Value, RenderError> {
    props
        .get(name)
        .ok_or_else(|| RenderError::MissingProp(name.to_string()))
}

fn resolve<'r>(registry: &'r Registry, inc: &Inclusion, depth: usize) -> Result<&'r Component, RenderError> {
    let child = registry
        .get(&inc.name)
        .ok_or_else(|| RenderError::UnknownComponent(inc.name.clone()))?;
    if depth >= registry.max_depth() {
        return Err(RenderError::DepthExceeded {
            name: inc.name.clone(),
            limit: registry.max_depth(),
        });
    }
    Ok(child)
}

fn element_maps<'p>(props: &'p PropMap, id: &str) -> Result<Vec<&'p PropMap>, RenderError> {
    let invalid = || RenderError::InvalidArrayProp(id.to_string());
    let Some(Value::Array(items)) = props.get(id) else {
        return Err(invalid());
    };
    items
        .iter()
        .map(|item| item.as_object().ok_or_else(invalid))
        .collect()
}

/// The caller's element is never modified; the index goes into a copy.
fn with_loop_index(fields: &PropMap, index: usize) -> Cow<'_, PropMap> {
    if fields.contains_key(LOOP_INDEX) {
        Cow::Borrowed(fields)
    } else {
        let mut scoped = fields.clone();
        scoped.insert(LOOP_INDEX.to_string(), Value::from(index));
        Cow::Owned(scoped)
    }
}

fn inline_prop_refs(inc: &Inclusion) -> impl Iterator<Item = &str> {
    inc.args.iter().flat_map(|arg| match arg {
        InlineArg::Named { fragments, .. } => fragments
            .iter()
            .filter_map(|f| match f {
                ArgFragment::Prop(key) => Some(key.as_str()),
                ArgFragment::Literal(_) => None,
            })
            .collect::<Vec<_>>(),
        InlineArg::Wildcard => Vec::new(),
    })
}

/// Text form of a prop value: strings verbatim, structures as canonical
/// JSON, other scalars in their JSON form.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => canonical_json(value).unwrap_or_else(|_| value.to_string()),
        other => other.to_string(),
    }
}
