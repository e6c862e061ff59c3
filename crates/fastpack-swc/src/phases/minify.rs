//! Minify orchestrator: post-bundle per-chunk compression and mangling.

use std::sync::{Arc, RwLock};

use fastpack_host::{
    Apply, ChunkInfo, HookResult, HostConfig, Plugin, PluginEnforce, TransformResult,
};

use super::{hook_err, SharedState};
use crate::engine::{CompressRequest, MinifyRequest, Syntax, TransformEngine};
use crate::options::{CompressSetting, MinifyOverrides, Phase, SwcOptions};
use crate::request;

/// Resolve user minify overrides against the fixed defaults.
///
/// Compression defaults to on with top-level inlining disabled; mangling
/// defaults to on. `compress = false` disables compression entirely; a
/// compress sub-config is merged over the default field by field.
#[must_use]
pub fn resolve_minify(overrides: Option<&MinifyOverrides>) -> MinifyRequest {
    let compress = match overrides.and_then(|o| o.compress.as_ref()) {
        Some(CompressSetting::Flag(false)) => None,
        Some(CompressSetting::Flag(true)) | None => Some(CompressRequest::default()),
        Some(CompressSetting::Overrides(user)) => Some(CompressRequest {
            toplevel: user.toplevel.unwrap_or(false),
            extra: user.extra.clone(),
        }),
    };

    MinifyRequest {
        compress,
        mangle: overrides.and_then(|o| o.mangle).unwrap_or(true),
    }
}

/// Post-bundle minification plugin.
///
/// Runs once per output chunk after bundle assembly and fully replaces the
/// host's own minification step.
pub struct MinifyPlugin {
    engine: Arc<dyn TransformEngine>,
    shared: Arc<SharedState>,
    options: SwcOptions,
    host_sourcemap: RwLock<bool>,
}

impl MinifyPlugin {
    pub(super) fn new(
        engine: Arc<dyn TransformEngine>,
        shared: Arc<SharedState>,
        options: SwcOptions,
    ) -> Self {
        Self {
            engine,
            shared,
            options,
            host_sourcemap: RwLock::new(false),
        }
    }
}

impl Plugin for MinifyPlugin {
    fn name(&self) -> &str {
        "swc-minify"
    }

    fn apply(&self) -> Apply {
        Apply::Build
    }

    fn enforce(&self) -> PluginEnforce {
        PluginEnforce::Post
    }

    fn config(&self, config: &mut HostConfig) -> HookResult<()> {
        // This plugin replaces the host's minifier entirely.
        config.build.minify = false;
        *self.host_sourcemap.write().expect("sourcemap flag poisoned") = config.build.sourcemap;
        self.shared.project().invalidate(Phase::Minify);
        Ok(())
    }

    fn render_chunk(&self, code: &str, chunk: &ChunkInfo) -> HookResult<Option<TransformResult>> {
        let project = self
            .shared
            .project()
            .get(Phase::Minify)
            .map_err(|e| hook_err(self.name(), "render_chunk", e))?;

        // Chunks are plain assembled scripts; no TS or JSX left to parse.
        let mut req = request::base_request(&chunk.file_name, Syntax::Ecmascript { jsx: false });
        request::apply_project(&mut req, &project);
        request::apply_user(&mut req, &self.options, &self.shared.defines());
        req.config_discovery = false;
        req.minify = Some(resolve_minify(self.options.minify_options.as_ref()));
        req.source_maps = self
            .options
            .sourcemap
            .unwrap_or(*self.host_sourcemap.read().expect("sourcemap flag poisoned"));

        let output = self
            .engine
            .transform(&req, code)
            .map_err(|e| hook_err(self.name(), "render_chunk", e))?;

        let mut result = TransformResult::code(output.code);
        result.map = output.map;
        Ok(Some(result))
    }
}
