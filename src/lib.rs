//! ez-ssr - Server-Side Component Templating
//!
//! Components are small HTML-like fragments, lexed once into tokens and
//! rendered many times against JSON prop bindings. A component may
//! include other components by name, once (`<ez .../>`) or once per
//! element of an array prop (`<ez-for .../>`).
//!
//! Lexing never fails: malformed constructs stay literal text and are
//! reported. Rendering fails fast with the inclusion chain that led to
//! the first error.

pub mod token;
pub mod lexer;
pub mod validation;
pub mod args;
pub mod component;
pub mod registry;
pub mod engine;
pub mod config;
pub mod error;
pub mod hashing;

pub use token::{ArgFragment, Inclusion, InlineArg, PropType, Token};
pub use lexer::{lex, Lexed, Lexer, Recovery};
pub use validation::{validate, Schema, SchemaViolation};
pub use args::{AttrMap, PropMap};
pub use component::{stringify, Component, Dependency};
pub use registry::{LoadReport, Registry};
pub use engine::{Engine, ReloadOutcome};
pub use config::EngineConfig;
pub use error::{ConfigError, LoadError, RenderError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
