//! Render Engine - Single Entry Point
//!
//! Owns the live registry behind a lock that is only ever held long
//! enough to clone or replace an `Arc`. A render works on the snapshot
//! it started with; a reload builds the new registry completely before
//! swapping it in, so in-flight renders never see a partial registry.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::args::PropMap;
use crate::config::EngineConfig;
use crate::error::{LoadError, RenderError};
use crate::registry::{LoadReport, Registry};
use crate::validation::{check, SchemaViolation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadOutcome {
    /// False when the sources on disk match the live registry; it is then kept.
    pub changed: bool,
    pub report: LoadReport,
}

pub struct Engine {
    config: EngineConfig,
    registry: RwLock<Arc<Registry>>,
}

impl Engine {
    /// Load every component under `config.components_dir`.
    pub fn load(config: EngineConfig) -> Result<(Self, LoadReport), LoadError> {
        let registry = Registry::load_from_dir(&config)?;
        let report = registry.report();
        let engine = Self {
            config,
            registry: RwLock::new(Arc::new(registry)),
        };
        Ok((engine, report))
    }

    pub fn from_registry(registry: Registry) -> Self {
        let config = EngineConfig {
            max_depth: registry.max_depth(),
            ..EngineConfig::default()
        };
        Self {
            config,
            registry: RwLock::new(Arc::new(registry)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The live registry. Holding the snapshot does not block reloads.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.read().clone()
    }

    pub fn render_component(&self, name: &str, props: &PropMap) -> Result<String, RenderError> {
        debug!(component = %name, "render");
        self.registry().render_component(name, props)
    }

    /// Check `props` against the top-level signature of `name` without rendering.
    pub fn check_props(&self, name: &str, props: &PropMap) -> Result<Option<SchemaViolation>, RenderError> {
        let registry = self.registry();
        let component = registry
            .get(name)
            .ok_or_else(|| RenderError::UnknownComponent(name.to_string()))?;
        let value = serde_json::Value::Object(props.clone());
        Ok(check(&component.signature(), &value).err())
    }

    /// Rebuild the registry from disk and swap it in if anything changed.
    /// On error the live registry is left untouched.
    pub fn reload(&self) -> Result<ReloadOutcome, LoadError> {
        let fresh = Registry::load_from_dir(&self.config)?;
        let report = fresh.report();
        let changed = report.fingerprint != self.registry().fingerprint();
        if changed {
            self.swap(fresh);
        }
        info!(changed, components = report.components, "reloaded components");
        Ok(ReloadOutcome { changed, report })
    }

    /// Replace the live registry, returning the previous one.
    pub fn swap(&self, registry: Registry) -> Arc<Registry> {
        std::mem::replace(&mut *self.registry.write(), Arc::new(registry))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::from_registry(Registry::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn props(value: serde_json::Value) -> PropMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_snapshot_survives_swap() {
        let mut first = Registry::new();
        first.register("greet", "Hello ${name}");
        let engine = Engine::from_registry(first);

        let snapshot = engine.registry();
        let mut second = Registry::new();
        second.register("greet", "Bye ${name}");
        let previous = engine.swap(second);

        let p = props(json!({"name": "Ann"}));
        assert_eq!(snapshot.render_component("greet", &p).unwrap(), "Hello Ann");
        assert_eq!(previous.render_component("greet", &p).unwrap(), "Hello Ann");
        assert_eq!(engine.render_component("greet", &p).unwrap(), "Bye Ann");
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.html"), "v1").unwrap();
        let config = EngineConfig::default().with_components_dir(dir.path());
        let (engine, report) = Engine::load(config).unwrap();
        assert_eq!(report.components, 1);

        assert!(!engine.reload().unwrap().changed);

        fs::write(dir.path().join("a.html"), "v2").unwrap();
        let outcome = engine.reload().unwrap();
        assert!(outcome.changed);
        assert_eq!(engine.render_component("a", &PropMap::new()).unwrap(), "v2");
    }

    #[test]
    fn test_check_props() {
        let mut registry = Registry::new();
        registry.register("card", "${title:string} ${n:number}");
        let engine = Engine::from_registry(registry);

        assert_eq!(engine.check_props("card", &props(json!({"title": "x", "n": 1}))).unwrap(), None);
        let violation = engine
            .check_props("card", &props(json!({"title": "x", "n": "1"})))
            .unwrap()
            .unwrap();
        assert_eq!(violation.path, "n");
        assert!(engine.check_props("ghost", &PropMap::new()).is_err());
    }
}
