//! Compiler-engine boundary.
//!
//! The actual transform engine is an external collaborator: this crate only
//! defines the request/response shapes and the [`TransformEngine`] trait. A
//! host wires in a concrete engine (an in-process SWC binding, a worker, a
//! subprocess); tests use a recording mock.

use rustc_hash::FxHashMap as HashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::options::{EsTarget, JsxRuntime, PolyfillMode};

/// Failure reported by the transform engine.
///
/// Never caught or translated by this crate; the message propagates unchanged
/// to the host's error-reporting path.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    /// Create a new engine error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parser syntax selection, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "syntax", rename_all = "lowercase")]
pub enum Syntax {
    /// Plain script, optionally with JSX.
    Ecmascript { jsx: bool },
    /// TypeScript, optionally with TSX.
    Typescript { tsx: bool },
}

impl Syntax {
    /// Whether JSX parsing is enabled.
    #[must_use]
    pub fn jsx(self) -> bool {
        match self {
            Self::Ecmascript { jsx } => jsx,
            Self::Typescript { tsx } => tsx,
        }
    }
}

/// React JSX transform configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactConfig {
    pub runtime: JsxRuntime,
    /// JSX factory (classic runtime).
    pub pragma: Option<String>,
    /// JSX fragment factory (classic runtime).
    pub pragma_frag: Option<String>,
    /// Module the automatic runtime imports from.
    pub import_source: Option<String>,
    /// Emit fast-refresh registration calls.
    pub refresh: bool,
    /// Use builtin helpers for refresh instrumentation.
    pub use_builtins: bool,
    /// Development-mode JSX semantics.
    pub development: bool,
}

impl Default for ReactConfig {
    fn default() -> Self {
        Self {
            runtime: JsxRuntime::Automatic,
            pragma: None,
            pragma_frag: None,
            import_source: None,
            refresh: false,
            use_builtins: false,
            development: false,
        }
    }
}

/// Down-level environment request (build phase only).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvConfig {
    /// Resolved browser/engine target list, or `None` for the library default.
    pub targets: Option<Vec<String>>,
    /// Polyfill injection mode.
    pub mode: PolyfillMode,
    /// Pinned polyfill-library major version.
    pub core_js: String,
    /// Whether dynamic import is supported.
    pub dynamic_import: bool,
    /// Passthrough env options.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Compression request (minify phase only).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressRequest {
    /// Allow top-level inlining.
    pub toplevel: bool,
    /// Passthrough compressor options.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CompressRequest {
    fn default() -> Self {
        Self {
            toplevel: false,
            extra: Map::new(),
        }
    }
}

/// Minification request (minify phase only).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinifyRequest {
    /// Compression config, or `None` when compression is disabled entirely.
    pub compress: Option<CompressRequest>,
    /// Whether to mangle identifiers.
    pub mangle: bool,
}

/// The fully merged, phase-specific request passed to the engine.
///
/// Constructed fresh per file or chunk by the layered merge in
/// [`crate::request`]; never reused across calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    /// Absolute file identifier (or chunk file name for minify).
    pub filename: String,
    /// Parser syntax selection.
    #[serde(flatten)]
    pub syntax: Syntax,
    /// Language target version.
    pub target: EsTarget,
    /// Keep original class names.
    pub keep_class_names: bool,
    /// Parse decorator syntax.
    pub decorators: bool,
    /// Use the legacy decorator transform.
    pub legacy_decorator: bool,
    /// Emit decorator metadata (only meaningful when decorators are on).
    pub decorator_metadata: Option<bool>,
    /// Parse dynamic import.
    pub dynamic_import: bool,
    /// React JSX transform configuration.
    pub react: ReactConfig,
    /// Global-constant substitutions.
    pub defines: HashMap<String, String>,
    /// Down-level env request (build phase only).
    pub env: Option<EnvConfig>,
    /// Minification request (minify phase only).
    pub minify: Option<MinifyRequest>,
    /// Emit a source map.
    pub source_maps: bool,
    /// Let the engine auto-discover its own config files.
    ///
    /// Always forced off by the phase invariants: this crate is the single
    /// source of compiler options.
    pub config_discovery: bool,
    /// Open-ended passthrough options, merged verbatim from user options.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Output text plus optional source map, as returned by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Transformed code.
    pub code: String,
    /// Source map, if one was requested and generated.
    pub map: Option<String>,
}

impl TransformOutput {
    /// Create an output with code only.
    pub fn new(code: impl Into<String>) -> Self {
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

/// The external transform engine.
///
/// One synchronous request/response operation; each call is independent and
/// must be safe to invoke from interleaved per-file hooks.
pub trait TransformEngine: Send + Sync {
    /// Transform `source` according to `request`.
    fn transform(
        &self,
        request: &TransformRequest,
        source: &str,
    ) -> Result<TransformOutput, EngineError>;
}
