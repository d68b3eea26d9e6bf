//! Component Registry - Sole Owner of Components
//!
//! Built completely before any render call and read-only afterwards.
//! Components refer to each other by name only, so a registry can be
//! rebuilt and swapped as a whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::args::{AttrMap, PropMap};
use crate::component::{Component, Dependency};
use crate::config::{EngineConfig, DEFAULT_MAX_DEPTH};
use crate::error::{LoadError, RenderError};
use crate::hashing::registry_fingerprint;
use crate::lexer::{Lexer, Recovery};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveredEntry {
    pub component: String,
    #[serde(flatten)]
    pub recovery: Recovery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedEntry {
    pub component: String,
    #[serde(flatten)]
    pub dependency: Dependency,
}

/// Non-fatal findings of a load, for tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub components: usize,
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
    pub recovered: Vec<RecoveredEntry>,
    pub unresolved: Vec<UnresolvedEntry>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.recovered.is_empty() && self.unresolved.is_empty()
    }

    /// Whether any source had malformed constructs. Unresolved inclusions
    /// do not count; they only fail when rendered.
    pub fn has_malformed(&self) -> bool {
        !self.recovered.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    components: HashMap<String, Component>,
    max_depth: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            components: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walk `config.components_dir` and register every file with a known
    /// extension under its relative path, extension stripped.
    pub fn load_from_dir(config: &EngineConfig) -> Result<Self, LoadError> {
        let dir = config.components_dir.as_path();
        let mut registry = Self::new().with_max_depth(config.max_depth);
        if !dir.exists() {
            warn!(dir = %dir.display(), "component directory does not exist");
            return Ok(registry);
        }

        let mut lexer = Lexer::new();
        let walker = WalkDir::new(dir)
            .follow_links(config.follow_symlinks)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !config.accepts(entry.path()) {
                continue;
            }

            let path = entry.path();
            let name = component_name(dir, path)?;
            let source = fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;

            let component = Component::with_lexer(&mut lexer, &source);
            debug!(component = %name, tokens = component.tokens().len(), "registered component");
            for r in component.recovered() {
                warn!(
                    component = %name,
                    line = r.line,
                    column = r.column,
                    reason = %r.reason,
                    "malformed {:?} kept as literal text",
                    r.construct
                );
            }
            registry.components.insert(name, component);
        }

        for entry in registry.unresolved() {
            warn!(
                component = %entry.component,
                missing = %entry.dependency.name,
                "inclusion of unregistered component"
            );
        }
        info!(dir = %dir.display(), components = registry.len(), "loaded components");

        Ok(registry)
    }

    /// Lex `source` and register it as `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, source: &str) -> &Component {
        let name = name.into();
        debug!(component = %name, "registered component");
        self.components.insert(name.clone(), Component::new(source));
        &self.components[&name]
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Render the named component with `props` as its root binding.
    pub fn render_component(&self, name: &str, props: &PropMap) -> Result<String, RenderError> {
        let component = self
            .get(name)
            .ok_or_else(|| RenderError::UnknownComponent(name.to_string()))?;
        component.render(self, props, &AttrMap::new())
    }

    pub fn recovered(&self) -> Vec<RecoveredEntry> {
        let mut entries = Vec::new();
        for name in self.names() {
            for recovery in self.components[name].recovered() {
                entries.push(RecoveredEntry {
                    component: name.to_string(),
                    recovery: recovery.clone(),
                });
            }
        }
        entries
    }

    /// Inclusions whose target name is not registered
    pub fn unresolved(&self) -> Vec<UnresolvedEntry> {
        let mut entries = Vec::new();
        for name in self.names() {
            for dependency in self.components[name].dependencies() {
                if !self.contains(&dependency.name) {
                    entries.push(UnresolvedEntry {
                        component: name.to_string(),
                        dependency,
                    });
                }
            }
        }
        entries
    }

    pub fn fingerprint(&self) -> String {
        registry_fingerprint(
            self.components
                .iter()
                .map(|(name, c)| (name.as_str(), c.source_hash())),
        )
        .unwrap_or_default()
    }

    pub fn report(&self) -> LoadReport {
        LoadReport {
            components: self.len(),
            fingerprint: self.fingerprint(),
            loaded_at: Utc::now(),
            recovered: self.recovered(),
            unresolved: self.unresolved(),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// `root/widgets/card.html` -> `widgets/card`
fn component_name(root: &Path, path: &Path) -> Result<String, LoadError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| LoadError::InvalidPath(path.to_path_buf()))?
        .with_extension("");
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| LoadError::InvalidPath(path.to_path_buf()))?;
    Ok(parts.join("/"))
}
