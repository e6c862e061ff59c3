//! Serve orchestrator: per-file development transform with hot reload.

use std::sync::Arc;

use fastpack_host::{
    Apply, HookResult, HostConfig, LoadResult, Plugin, ResolveIdResult, TransformResult,
};

use super::{hook_err, take_builtin_transform, SharedState};
use crate::engine::TransformEngine;
use crate::options::{Phase, SwcOptions};
use crate::refresh;
use crate::request;

/// Development-server transform plugin.
///
/// Compiles one file at a time on demand and, when `refresh` is on, rewrites
/// modules that declare refresh-eligible components to participate in hot
/// reload. Also serves the refresh runtime as a virtual module and injects
/// its bootstrap into the index HTML.
pub struct ServePlugin {
    engine: Arc<dyn TransformEngine>,
    shared: Arc<SharedState>,
    options: SwcOptions,
    refresh: bool,
}

impl ServePlugin {
    pub(super) fn new(
        engine: Arc<dyn TransformEngine>,
        shared: Arc<SharedState>,
        options: SwcOptions,
    ) -> Self {
        let refresh = options.refresh;
        Self {
            engine,
            shared,
            options,
            refresh,
        }
    }
}

impl Plugin for ServePlugin {
    fn name(&self) -> &str {
        "swc-serve"
    }

    fn apply(&self) -> Apply {
        Apply::Serve
    }

    fn config(&self, config: &mut HostConfig) -> HookResult<()> {
        take_builtin_transform(&self.shared, config);
        self.shared.project().invalidate(Phase::Serve);
        Ok(())
    }

    fn resolve_id(
        &self,
        specifier: &str,
        _importer: Option<&str>,
    ) -> HookResult<Option<ResolveIdResult>> {
        if self.refresh && specifier == refresh::RUNTIME_PUBLIC_PATH {
            return Ok(Some(ResolveIdResult::resolved(specifier)));
        }
        Ok(None)
    }

    fn load(&self, id: &str) -> HookResult<Option<LoadResult>> {
        if self.refresh && id == refresh::RUNTIME_PUBLIC_PATH {
            return Ok(Some(LoadResult::code(refresh::runtime_source())));
        }
        Ok(None)
    }

    fn transform(&self, code: &str, id: &str) -> HookResult<Option<TransformResult>> {
        let Some(syntax) = request::eligible_syntax(id) else {
            return Ok(None);
        };

        let project = self
            .shared
            .project()
            .get(Phase::Serve)
            .map_err(|e| hook_err(self.name(), "transform", e))?;

        let mut req = request::base_request(id, syntax);
        request::apply_project(&mut req, &project);
        request::apply_user(&mut req, &self.options, &self.shared.defines());
        request::apply_serve_invariants(&mut req, self.refresh);

        let output = self
            .engine
            .transform(&req, code)
            .map_err(|e| hook_err(self.name(), "transform", e))?;

        // Refresh instrumentation only applies to modules that registered
        // refresh-eligible components.
        if self.refresh && refresh::has_refresh_marker(&output.code) {
            let wrapped = refresh::wrap_module(id, &output.code);
            let mut result = TransformResult::code(wrapped);
            result.map = output.map;
            return Ok(Some(result));
        }

        let mut result = TransformResult::code(output.code);
        result.map = output.map;
        Ok(Some(result))
    }

    fn transform_index_html(&self, html: &str) -> HookResult<Option<String>> {
        if !self.refresh {
            return Ok(None);
        }
        Ok(Some(refresh::inject_bootstrap(html)))
    }
}
