#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! SWC-backed compilation plugins for the fastpack host.
//!
//! Three host plugins, one per lifecycle phase: a serve-time per-file
//! transform with react fast-refresh, a build-time per-file transform with
//! optional down-leveling, and a post-bundle per-chunk minifier. All three
//! share one option record ([`SwcOptions`]) and one compiler boundary
//! ([`TransformEngine`]); the combined [`plugins`] factory builds the whole
//! set, [`phase_plugin`] builds a single phase.

pub mod engine;
pub mod error;
pub mod options;
pub mod refresh;
pub mod request;
pub mod tsconfig;

mod phases;

use std::path::PathBuf;
use std::sync::Arc;

use fastpack_host::Plugin;

pub use engine::{EngineError, Syntax, TransformEngine, TransformOutput, TransformRequest};
pub use error::Error;
pub use options::{EsTarget, JsxRuntime, Phase, SwcOptions};
pub use phases::{
    downlevel_supported, resolve_minify, resolve_targets, BuildPlugin, MinifyPlugin, PhasePlugin,
    ServePlugin, SharedState, MODULES_BASELINE,
};

/// The plugin set produced by the combined factory.
///
/// Slots are `None` when the corresponding phase switch was explicitly off.
pub struct PluginSet {
    /// Development-server transform plugin.
    pub serve: Option<PhasePlugin>,
    /// Production transform plugin.
    pub build: Option<PhasePlugin>,
    /// Post-bundle minification plugin.
    pub minify: Option<PhasePlugin>,
}

impl PluginSet {
    /// Flatten the enabled plugins into a host registration list.
    #[must_use]
    pub fn into_plugins(self) -> Vec<Box<dyn Plugin>> {
        let mut plugins: Vec<Box<dyn Plugin>> = Vec::with_capacity(3);
        if let Some(serve) = self.serve {
            plugins.push(Box::new(serve));
        }
        if let Some(build) = self.build {
            plugins.push(Box::new(build));
        }
        if let Some(minify) = self.minify {
            plugins.push(Box::new(minify));
        }
        plugins
    }
}

/// Build the full plugin set rooted at the current working directory.
pub fn plugins(
    engine: Arc<dyn TransformEngine>,
    options: &SwcOptions,
) -> Result<PluginSet, Error> {
    let root = std::env::current_dir().map_err(|source| Error::ConfigRead {
        path: PathBuf::from("."),
        source,
    })?;
    plugins_in(root, engine, options)
}

/// Build the full plugin set rooted at `root`.
///
/// One orchestrator per phase, all sharing one state context so defines
/// captured by any phase's config hook are visible to the others. Phase
/// switches select which slots are populated; the per-phase conflict check
/// never fires here because the switches are stripped before construction.
pub fn plugins_in(
    root: impl Into<PathBuf>,
    engine: Arc<dyn TransformEngine>,
    options: &SwcOptions,
) -> Result<PluginSet, Error> {
    let shared = Arc::new(SharedState::new(root));
    let stripped = options.without_phase_switches();

    let mut set = PluginSet {
        serve: None,
        build: None,
        minify: None,
    };
    for phase in [Phase::Serve, Phase::Build, Phase::Minify] {
        if options.phase_enabled(phase) == Some(false) {
            continue;
        }
        let plugin = PhasePlugin::new(
            phase,
            Arc::clone(&engine),
            Arc::clone(&shared),
            stripped.clone(),
        )?;
        match phase {
            Phase::Serve => set.serve = plugin,
            Phase::Build => set.build = plugin,
            Phase::Minify => set.minify = plugin,
        }
    }
    Ok(set)
}

/// Build a single phase plugin rooted at the current working directory.
///
/// Unlike [`plugins`], the options are taken as-is: an explicitly enabled
/// switch for a different phase is a [`Error::PhaseConflict`].
pub fn phase_plugin(
    phase: Phase,
    engine: Arc<dyn TransformEngine>,
    options: SwcOptions,
) -> Result<Option<PhasePlugin>, Error> {
    let root = std::env::current_dir().map_err(|source| Error::ConfigRead {
        path: PathBuf::from("."),
        source,
    })?;
    phase_plugin_in(root, phase, engine, options)
}

/// Build a single phase plugin rooted at `root`.
pub fn phase_plugin_in(
    root: impl Into<PathBuf>,
    phase: Phase,
    engine: Arc<dyn TransformEngine>,
    options: SwcOptions,
) -> Result<Option<PhasePlugin>, Error> {
    let shared = Arc::new(SharedState::new(root));
    PhasePlugin::new(phase, engine, shared, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TransformOutput;

    struct EchoEngine;

    impl TransformEngine for EchoEngine {
        fn transform(
            &self,
            _request: &TransformRequest,
            source: &str,
        ) -> Result<TransformOutput, EngineError> {
            Ok(TransformOutput::new(source))
        }
    }

    #[test]
    fn default_options_populate_all_slots() {
        let set = plugins_in("/nonexistent-project", Arc::new(EchoEngine), &SwcOptions::default()).unwrap();
        assert!(set.serve.is_some());
        assert!(set.build.is_some());
        assert!(set.minify.is_some());
        assert_eq!(set.into_plugins().len(), 3);
    }

    #[test]
    fn disabled_switch_leaves_slot_empty() {
        let options = SwcOptions {
            minify: Some(false),
            ..SwcOptions::default()
        };
        let set = plugins_in("/nonexistent-project", Arc::new(EchoEngine), &options).unwrap();
        assert!(set.serve.is_some());
        assert!(set.build.is_some());
        assert!(set.minify.is_none());
    }

    #[test]
    fn enabled_switch_populates_only_that_slot_without_conflict() {
        let options = SwcOptions {
            build: Some(true),
            ..SwcOptions::default()
        };
        let set = plugins_in("/nonexistent-project", Arc::new(EchoEngine), &options).unwrap();
        // Other phases stay on: an explicit `true` narrows nothing here.
        assert!(set.serve.is_some());
        assert!(set.build.is_some());
        assert!(set.minify.is_some());
    }

    #[test]
    fn single_phase_factory_rejects_foreign_switch() {
        let options = SwcOptions {
            build: Some(true),
            ..SwcOptions::default()
        };
        let err = phase_plugin_in("/nonexistent-project", Phase::Serve, Arc::new(EchoEngine), options)
            .expect_err("foreign explicit switch must conflict");
        match err {
            Error::PhaseConflict { phase, conflicting } => {
                assert_eq!(phase, Phase::Serve);
                assert_eq!(conflicting, Phase::Build);
            }
            other => panic!("expected phase conflict, got {other}"),
        }
    }
}
