//! Phase orchestrators.
//!
//! One orchestrator per lifecycle phase, all sharing one [`SharedState`]
//! context. Exactly one phase is the active identity of an orchestrator
//! instance: the closed [`PhasePlugin`] enum plus the single
//! [`PhasePlugin::new`] factory make the selection exhaustive at compile
//! time instead of a set of ad hoc flags.

mod build;
mod minify;
mod serve;

pub use build::{downlevel_supported, resolve_targets, BuildPlugin, MODULES_BASELINE};
pub use minify::{resolve_minify, MinifyPlugin};
pub use serve::ServePlugin;

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use fastpack_host::{
    Apply, ChunkInfo, HookResult, HostConfig, LoadResult, Plugin, PluginEnforce, PluginError,
    ResolveIdResult, TransformResult,
};
use rustc_hash::FxHashMap as HashMap;

use crate::engine::TransformEngine;
use crate::error::Error;
use crate::options::{Phase, SwcOptions};
use crate::tsconfig::ProjectConfigCache;

/// State shared by the orchestrators of one configuration epoch.
///
/// Holds the captured host define map and the per-phase project-config
/// cache. Writes happen only inside `config` hooks, which the host never
/// interleaves with per-file transforms; everything else only reads.
pub struct SharedState {
    defines: RwLock<HashMap<String, String>>,
    project: ProjectConfigCache,
}

impl SharedState {
    /// Create shared state rooted at the given project directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            defines: RwLock::new(HashMap::default()),
            project: ProjectConfigCache::new(root),
        }
    }

    /// Replace the captured define map (configuration hook only).
    pub fn capture_defines(&self, defines: HashMap<String, String>) {
        tracing::debug!(count = defines.len(), "captured host define map");
        *self.defines.write().expect("define map poisoned") = defines;
    }

    /// Snapshot of the captured define map.
    #[must_use]
    pub fn defines(&self) -> HashMap<String, String> {
        self.defines.read().expect("define map poisoned").clone()
    }

    /// The per-phase project-config cache.
    #[must_use]
    pub fn project(&self) -> &ProjectConfigCache {
        &self.project
    }
}

/// Capture the host's define map and disable its builtin transform.
///
/// The serve and build phases fully replace the builtin per-file transform;
/// its define map is kept for compatibility with code relying on it.
fn take_builtin_transform(shared: &SharedState, config: &mut HostConfig) {
    if let Some(builtin) = config.builtin_transform.take() {
        shared.capture_defines(builtin.define);
    }
}

/// Wrap an internal failure into the host's plugin error envelope.
fn hook_err(plugin: &str, hook: &'static str, err: impl std::fmt::Display) -> PluginError {
    PluginError::new(plugin, hook, err.to_string())
}

/// One orchestrator, tagged by its phase.
pub enum PhasePlugin {
    Serve(ServePlugin),
    Build(BuildPlugin),
    Minify(MinifyPlugin),
}

impl std::fmt::Debug for PhasePlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serve(_) => f.write_str("PhasePlugin::Serve"),
            Self::Build(_) => f.write_str("PhasePlugin::Build"),
            Self::Minify(_) => f.write_str("PhasePlugin::Minify"),
        }
    }
}

impl PhasePlugin {
    /// Construct the orchestrator for `phase`.
    ///
    /// Returns `Ok(None)` when the phase's own switch is explicitly off, and
    /// a [`Error::PhaseConflict`] when another phase's switch is explicitly
    /// on — mutual exclusion is checked before any file is processed.
    pub fn new(
        phase: Phase,
        engine: Arc<dyn TransformEngine>,
        shared: Arc<SharedState>,
        options: SwcOptions,
    ) -> Result<Option<Self>, Error> {
        if let Some(conflicting) = options.conflicting_phase(phase) {
            return Err(Error::PhaseConflict { phase, conflicting });
        }
        if options.phase_enabled(phase) == Some(false) {
            return Ok(None);
        }

        Ok(Some(match phase {
            Phase::Serve => Self::Serve(ServePlugin::new(engine, shared, options)),
            Phase::Build => Self::Build(BuildPlugin::new(engine, shared, options)),
            Phase::Minify => Self::Minify(MinifyPlugin::new(engine, shared, options)),
        }))
    }

    /// The phase this orchestrator instruments.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Serve(_) => Phase::Serve,
            Self::Build(_) => Phase::Build,
            Self::Minify(_) => Phase::Minify,
        }
    }
}

impl Plugin for PhasePlugin {
    fn name(&self) -> &str {
        match self {
            Self::Serve(p) => p.name(),
            Self::Build(p) => p.name(),
            Self::Minify(p) => p.name(),
        }
    }

    fn enforce(&self) -> PluginEnforce {
        match self {
            Self::Serve(p) => p.enforce(),
            Self::Build(p) => p.enforce(),
            Self::Minify(p) => p.enforce(),
        }
    }

    fn apply(&self) -> Apply {
        match self {
            Self::Serve(p) => p.apply(),
            Self::Build(p) => p.apply(),
            Self::Minify(p) => p.apply(),
        }
    }

    fn config(&self, config: &mut HostConfig) -> HookResult<()> {
        match self {
            Self::Serve(p) => p.config(config),
            Self::Build(p) => p.config(config),
            Self::Minify(p) => p.config(config),
        }
    }

    fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&str>,
    ) -> HookResult<Option<ResolveIdResult>> {
        match self {
            Self::Serve(p) => p.resolve_id(specifier, importer),
            Self::Build(p) => p.resolve_id(specifier, importer),
            Self::Minify(p) => p.resolve_id(specifier, importer),
        }
    }

    fn load(&self, id: &str) -> HookResult<Option<LoadResult>> {
        match self {
            Self::Serve(p) => p.load(id),
            Self::Build(p) => p.load(id),
            Self::Minify(p) => p.load(id),
        }
    }

    fn transform(&self, code: &str, id: &str) -> HookResult<Option<TransformResult>> {
        match self {
            Self::Serve(p) => p.transform(code, id),
            Self::Build(p) => p.transform(code, id),
            Self::Minify(p) => p.transform(code, id),
        }
    }

    fn render_chunk(&self, code: &str, chunk: &ChunkInfo) -> HookResult<Option<TransformResult>> {
        match self {
            Self::Serve(p) => p.render_chunk(code, chunk),
            Self::Build(p) => p.render_chunk(code, chunk),
            Self::Minify(p) => p.render_chunk(code, chunk),
        }
    }

    fn transform_index_html(&self, html: &str) -> HookResult<Option<String>> {
        match self {
            Self::Serve(p) => p.transform_index_html(html),
            Self::Build(p) => p.transform_index_html(html),
            Self::Minify(p) => p.transform_index_html(html),
        }
    }
}
