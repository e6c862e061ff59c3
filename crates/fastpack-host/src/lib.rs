//! Plugin interface for the fastpack bundler.
//!
//! Provides a Rollup-compatible plugin surface with Vite-style extensions
//! (`config`, `apply`, `enforce`, `transform_index_html`). Plugins implement
//! the [`Plugin`] trait; the host drives them through a [`PluginContainer`].
//!
//! ## Example
//!
//! ```ignore
//! use fastpack_host::{Plugin, HookResult, TransformResult};
//!
//! struct Upper;
//!
//! impl Plugin for Upper {
//!     fn name(&self) -> &str { "upper" }
//!
//!     fn transform(&self, code: &str, id: &str) -> HookResult<Option<TransformResult>> {
//!         if id.ends_with(".txt") {
//!             return Ok(Some(TransformResult::code(code.to_uppercase())));
//!         }
//!         Ok(None)
//!     }
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::unused_self)]

use rustc_hash::FxHashMap as HashMap;
use std::path::PathBuf;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin hook.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl PluginError {
    /// Create a new plugin error.
    #[must_use]
    pub fn new(
        plugin: impl Into<String>,
        hook: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

/// Plugin enforcement ordering.
///
/// Controls where a plugin runs relative to others in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PluginEnforce {
    /// Runs before normal plugins (e.g., alias resolution).
    Pre,
    /// Default ordering.
    #[default]
    Normal,
    /// Runs after normal plugins (e.g., minification).
    Post,
}

/// Host lifecycle a plugin participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Apply {
    /// Dev server only.
    Serve,
    /// Production build only.
    Build,
    /// Both lifecycles.
    #[default]
    Always,
}

impl Apply {
    /// Whether a plugin with this setting runs under the given host mode.
    #[must_use]
    pub fn matches(self, mode: HostMode) -> bool {
        match self {
            Self::Always => true,
            Self::Serve => mode == HostMode::Serve,
            Self::Build => mode == HostMode::Build,
        }
    }
}

/// The lifecycle the host is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostMode {
    /// Development server.
    #[default]
    Serve,
    /// Production build.
    Build,
}

/// Declared output target for a production build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildTarget {
    /// The `"modules"` sentinel: browsers with native ES module support.
    Modules,
    /// An explicit browser/engine version list.
    Browsers(Vec<String>),
}

/// Build-output section of the host configuration.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Declared output target, if any.
    pub target: Option<BuildTarget>,
    /// Whether final output should carry source maps.
    pub sourcemap: bool,
    /// Whether the host's own minification step is enabled.
    pub minify: bool,
}

/// The host's builtin per-file transform step.
///
/// Plugins that fully replace the builtin transform set this to `None` in
/// their `config` hook, after capturing anything they need from it.
#[derive(Debug, Clone, Default)]
pub struct BuiltinTransform {
    /// Global-constant substitutions (identifier -> replacement source text).
    pub define: HashMap<String, String>,
}

/// Host build configuration, passed mutably to the `config` hook.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Project root directory.
    pub root: PathBuf,
    /// The builtin transform, or `None` if disabled.
    pub builtin_transform: Option<BuiltinTransform>,
    /// Build-output options.
    pub build: BuildConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_default(),
            builtin_transform: Some(BuiltinTransform::default()),
            build: BuildConfig::default(),
        }
    }
}

/// Result of the `resolve_id` hook.
#[derive(Debug, Clone)]
pub struct ResolveIdResult {
    /// Resolved module ID (usually a file path or virtual ID).
    pub id: String,
    /// Whether this module is external (don't bundle).
    pub external: bool,
}

impl ResolveIdResult {
    /// Create a resolved module result.
    pub fn resolved(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: false,
        }
    }

    /// Create an external module result.
    pub fn external(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: true,
        }
    }
}

/// Result of the `load` hook.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Module source code.
    pub code: String,
    /// Optional source map.
    pub map: Option<String>,
}

impl LoadResult {
    /// Create a load result with code only.
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }
}

/// Result of the `transform` and `render_chunk` hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    /// Transformed code.
    pub code: String,
    /// Optional source map.
    pub map: Option<String>,
}

impl TransformResult {
    /// Create a transform result with code only.
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            map: None,
        }
    }

    /// Attach a source map.
    #[must_use]
    pub fn with_map(mut self, map: impl Into<String>) -> Self {
        self.map = Some(map.into());
        self
    }
}

/// Chunk descriptor passed to `render_chunk`.
#[derive(Debug, Clone)]
pub struct ChunkInfo {
    /// Output file name of the chunk.
    pub file_name: String,
    /// Whether this is the entry chunk.
    pub is_entry: bool,
}

/// The main plugin trait.
///
/// All hooks have default no-op implementations, so plugins only implement
/// the hooks they care about.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Plugin ordering: `Pre`, `Normal` (default), or `Post`.
    fn enforce(&self) -> PluginEnforce {
        PluginEnforce::Normal
    }

    /// Which host lifecycle this plugin participates in.
    fn apply(&self) -> Apply {
        Apply::Always
    }

    /// Modify the host configuration before it is finalized.
    ///
    /// Called once per (re)configuration, never interleaved with per-file
    /// hooks.
    fn config(&self, _config: &mut HostConfig) -> HookResult<()> {
        Ok(())
    }

    /// Resolve a module specifier to an ID.
    ///
    /// Return `Some(result)` to handle this resolution, or `None` to let the
    /// next plugin or the default resolver handle it.
    fn resolve_id(
        &self,
        _specifier: &str,
        _importer: Option<&str>,
    ) -> HookResult<Option<ResolveIdResult>> {
        Ok(None)
    }

    /// Load a module by ID.
    fn load(&self, _id: &str) -> HookResult<Option<LoadResult>> {
        Ok(None)
    }

    /// Transform module source code.
    ///
    /// Return `Some(result)` to transform the code, or `None` to pass it
    /// through unchanged.
    fn transform(&self, _code: &str, _id: &str) -> HookResult<Option<TransformResult>> {
        Ok(None)
    }

    /// Transform a rendered output chunk after bundle assembly.
    fn render_chunk(
        &self,
        _code: &str,
        _chunk: &ChunkInfo,
    ) -> HookResult<Option<TransformResult>> {
        Ok(None)
    }

    /// Transform the index HTML page (dev server only).
    ///
    /// Return `Some(html)` to replace the HTML, or `None` to pass through.
    fn transform_index_html(&self, _html: &str) -> HookResult<Option<String>> {
        Ok(None)
    }
}

/// A container for managing multiple plugins.
///
/// Plugins are sorted by their `enforce()` ordering: `Pre` -> `Normal` ->
/// `Post`, with insertion order preserved within each level. Plugins whose
/// `apply()` does not match the host mode are skipped by every dispatcher.
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
    mode: HostMode,
}

impl PluginContainer {
    /// Create a new container for the given host mode.
    #[must_use]
    pub fn new(mode: HostMode) -> Self {
        Self {
            plugins: Vec::new(),
            mode,
        }
    }

    /// Add a plugin, keeping the list in enforce order.
    ///
    /// Insertion order is preserved within each enforce level, so the list is
    /// valid for dispatch at all times regardless of which hook runs first.
    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        let enforce = plugin.enforce();
        let pos = self
            .plugins
            .iter()
            .rposition(|p| p.enforce() <= enforce)
            .map_or(0, |i| i + 1);
        self.plugins.insert(pos, plugin);
    }

    fn active(&self) -> impl Iterator<Item = &Box<dyn Plugin>> {
        let mode = self.mode;
        self.plugins.iter().filter(move |p| p.apply().matches(mode))
    }

    /// Check if any plugins are registered.
    #[must_use]
    pub fn has_plugins(&self) -> bool {
        !self.plugins.is_empty()
    }

    /// Call `config` on all active plugins, letting each mutate the config.
    pub fn run_config(&self, config: &mut HostConfig) -> HookResult<()> {
        for plugin in self.active() {
            plugin.config(config)?;
        }
        Ok(())
    }

    /// Try to resolve a module ID through plugins (first non-`None` wins).
    pub fn resolve_id(
        &self,
        specifier: &str,
        importer: Option<&str>,
    ) -> HookResult<Option<ResolveIdResult>> {
        for plugin in self.active() {
            if let Some(result) = plugin.resolve_id(specifier, importer)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Try to load a module through plugins (first non-`None` wins).
    pub fn load(&self, id: &str) -> HookResult<Option<LoadResult>> {
        for plugin in self.active() {
            if let Some(result) = plugin.load(id)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Transform code through all active plugins in order.
    ///
    /// Each plugin's output is fed to the next; the last emitted source map
    /// wins.
    pub fn transform(&self, code: &str, id: &str) -> HookResult<TransformResult> {
        let mut current = TransformResult::code(code);
        for plugin in self.active() {
            if let Some(result) = plugin.transform(&current.code, id)? {
                current = result;
            }
        }
        Ok(current)
    }

    /// Transform a rendered chunk through all active plugins in order.
    pub fn render_chunk(&self, code: &str, chunk: &ChunkInfo) -> HookResult<TransformResult> {
        let mut current = TransformResult::code(code);
        for plugin in self.active() {
            if let Some(result) = plugin.render_chunk(&current.code, chunk)? {
                current = result;
            }
        }
        Ok(current)
    }

    /// Transform the index HTML through all active plugins (chained).
    pub fn transform_index_html(&self, html: &str) -> HookResult<String> {
        let mut current = html.to_string();
        for plugin in self.active() {
            if let Some(transformed) = plugin.transform_index_html(&current)? {
                current = transformed;
            }
        }
        Ok(current)
    }
}

impl Default for PluginContainer {
    fn default() -> Self {
        Self::new(HostMode::default())
    }
}
