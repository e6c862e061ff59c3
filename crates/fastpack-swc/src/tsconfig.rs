//! Project compiler-config discovery and caching.
//!
//! Looks for `tsconfig.json`, then `jsconfig.json`, at the project root and
//! extracts the fields the phases care about. Absence is a normal state: the
//! resolver returns an empty config without error. Loaded configs are cached
//! per phase and invalidated per phase when the host reconfigures, so each
//! configuration epoch performs at most one filesystem load per phase.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap as HashMap;
use serde::Deserialize;

use crate::error::Error;
use crate::options::{EsTarget, Phase};

/// Config file names in priority order.
const CONFIG_FILES: &[&str] = &["tsconfig.json", "jsconfig.json"];

/// The fields this crate reads from a project compiler config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    /// Declared language target.
    pub target: Option<EsTarget>,
    /// Decorator syntax enabled.
    pub experimental_decorators: Option<bool>,
    /// Emit decorator metadata.
    pub emit_decorator_metadata: Option<bool>,
    /// JSX factory name (classic runtime).
    pub jsx_factory: Option<String>,
    /// JSX fragment factory name (classic runtime).
    pub jsx_fragment_factory: Option<String>,
    /// Module the automatic JSX runtime imports from.
    pub jsx_import_source: Option<String>,
}

/// On-disk shape: the interesting fields live under `compilerOptions`.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProjectConfigFile {
    #[serde(rename = "compilerOptions")]
    compiler_options: ProjectConfig,
}

/// Find a project config file in the given root directory.
#[must_use]
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Per-phase cache of the loaded project config.
///
/// Reads are lock-cheap and return a shared handle; writes happen only on a
/// cache miss or an explicit invalidation, which the host guarantees is never
/// interleaved with per-file transforms.
pub struct ProjectConfigCache {
    root: PathBuf,
    entries: RwLock<HashMap<Phase, Arc<ProjectConfig>>>,
    loads: AtomicU32,
}

impl ProjectConfigCache {
    /// Create a cache rooted at the given project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: RwLock::new(HashMap::default()),
            loads: AtomicU32::new(0),
        }
    }

    /// Project root this cache reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the project config for a phase, loading it on first access.
    ///
    /// A missing config file is not an error; malformed JSON is.
    pub fn get(&self, phase: Phase) -> Result<Arc<ProjectConfig>, Error> {
        if let Some(cached) = self.entries.read().expect("config cache poisoned").get(&phase) {
            return Ok(Arc::clone(cached));
        }

        let loaded = Arc::new(self.load()?);
        self.entries
            .write()
            .expect("config cache poisoned")
            .insert(phase, Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Drop the cached entry for a phase; the next access reloads from disk.
    pub fn invalidate(&self, phase: Phase) {
        tracing::debug!(phase = phase.as_str(), "invalidating project config");
        self.entries
            .write()
            .expect("config cache poisoned")
            .remove(&phase);
    }

    /// Number of filesystem loads performed so far.
    #[must_use]
    pub fn loads(&self) -> u32 {
        self.loads.load(Ordering::Relaxed)
    }

    fn load(&self) -> Result<ProjectConfig, Error> {
        self.loads.fetch_add(1, Ordering::Relaxed);

        let Some(path) = find_config_file(&self.root) else {
            tracing::debug!(root = %self.root.display(), "no project config found");
            return Ok(ProjectConfig::default());
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let file: ProjectConfigFile =
            serde_json::from_str(&raw).map_err(|source| Error::ConfigParse {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "loaded project config");
        Ok(file.compiler_options)
    }
}
