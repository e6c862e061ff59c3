//! Build orchestrator: per-file production transform with down-leveling.

use std::sync::{Arc, RwLock};

use fastpack_host::{Apply, BuildTarget, HookResult, HostConfig, Plugin, TransformResult};

use super::{hook_err, take_builtin_transform, SharedState};
use crate::engine::{EnvConfig, TransformEngine};
use crate::error::Error;
use crate::options::{EnvOverrides, Phase, PolyfillMode, SwcOptions};
use crate::request;

/// Baseline targets substituted for the host's `"modules"` sentinel.
pub const MODULES_BASELINE: [&str; 5] =
    ["es2019", "edge88", "firefox78", "chrome87", "safari13.1"];

/// Whether down-level target resolution was compiled in.
#[must_use]
pub fn downlevel_supported() -> bool {
    cfg!(feature = "browserslist")
}

/// Resolve the host's declared build target into an engine target list.
#[must_use]
pub fn resolve_targets(target: Option<&BuildTarget>) -> Option<Vec<String>> {
    match target {
        Some(BuildTarget::Modules) => {
            Some(MODULES_BASELINE.iter().map(ToString::to_string).collect())
        }
        Some(BuildTarget::Browsers(list)) => Some(list.clone()),
        None => None,
    }
}

/// Check that requested env options can actually be honored.
///
/// Down-leveling silently skipped would produce output that does not run on
/// the requested targets, so a missing resolver is fatal, not a warning.
fn ensure_downlevel_support(env: Option<&EnvOverrides>) -> Result<(), Error> {
    if env.is_some() && !downlevel_supported() {
        return Err(Error::DownlevelUnavailable);
    }
    Ok(())
}

/// Merge phase defaults with user env overrides into the engine env request.
fn resolve_env(target: Option<&BuildTarget>, user: Option<&EnvOverrides>) -> EnvConfig {
    let mut env = EnvConfig {
        targets: resolve_targets(target),
        mode: PolyfillMode::Usage,
        core_js: "3".to_string(),
        dynamic_import: true,
        extra: serde_json::Map::new(),
    };

    if let Some(user) = user {
        if let Some(targets) = &user.targets {
            env.targets = Some(targets.clone());
        }
        if let Some(mode) = user.mode {
            env.mode = mode;
        }
        if let Some(core_js) = &user.core_js {
            env.core_js = core_js.clone();
        }
        if let Some(dynamic_import) = user.dynamic_import {
            env.dynamic_import = dynamic_import;
        }
        env.extra.extend(user.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    env
}

/// Production transform plugin.
///
/// Source maps are always generated here regardless of the user's final
/// policy: the minify pass that follows must remap positions back through
/// this step.
pub struct BuildPlugin {
    engine: Arc<dyn TransformEngine>,
    shared: Arc<SharedState>,
    options: SwcOptions,
    host_target: RwLock<Option<BuildTarget>>,
}

impl BuildPlugin {
    pub(super) fn new(
        engine: Arc<dyn TransformEngine>,
        shared: Arc<SharedState>,
        options: SwcOptions,
    ) -> Self {
        Self {
            engine,
            shared,
            options,
            host_target: RwLock::new(None),
        }
    }
}

impl Plugin for BuildPlugin {
    fn name(&self) -> &str {
        "swc-build"
    }

    fn apply(&self) -> Apply {
        Apply::Build
    }

    fn config(&self, config: &mut HostConfig) -> HookResult<()> {
        take_builtin_transform(&self.shared, config);
        *self.host_target.write().expect("host target poisoned") = config.build.target.clone();
        self.shared.project().invalidate(Phase::Build);

        if let Err(err) = ensure_downlevel_support(self.options.env.as_ref()) {
            // Continuing would silently skip down-leveling and ship output
            // that cannot run on the requested targets.
            tracing::error!("{err}");
            eprintln!("{err}");
            std::process::exit(1);
        }
        Ok(())
    }

    fn transform(&self, code: &str, id: &str) -> HookResult<Option<TransformResult>> {
        let Some(syntax) = request::eligible_syntax(id) else {
            return Ok(None);
        };

        let project = self
            .shared
            .project()
            .get(Phase::Build)
            .map_err(|e| hook_err(self.name(), "transform", e))?;

        let mut req = request::base_request(id, syntax);
        request::apply_project(&mut req, &project);
        request::apply_user(&mut req, &self.options, &self.shared.defines());
        request::apply_build_invariants(&mut req);

        if downlevel_supported() {
            let target = self.host_target.read().expect("host target poisoned");
            req.env = Some(resolve_env(target.as_ref(), self.options.env.as_ref()));
        }

        let output = self
            .engine
            .transform(&req, code)
            .map_err(|e| hook_err(self.name(), "transform", e))?;

        let mut result = TransformResult::code(output.code);
        result.map = output.map;
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modules_sentinel_resolves_to_baseline() {
        let targets = resolve_targets(Some(&BuildTarget::Modules)).unwrap();
        assert_eq!(
            targets,
            vec!["es2019", "edge88", "firefox78", "chrome87", "safari13.1"]
        );
    }

    #[test]
    fn explicit_browser_list_passes_through() {
        let list = BuildTarget::Browsers(vec!["chrome100".to_string()]);
        assert_eq!(
            resolve_targets(Some(&list)),
            Some(vec!["chrome100".to_string()])
        );
        assert_eq!(resolve_targets(None), None);
    }

    #[test]
    fn env_defaults_pin_polyfill_policy() {
        let env = resolve_env(Some(&BuildTarget::Modules), None);
        assert_eq!(env.mode, PolyfillMode::Usage);
        assert_eq!(env.core_js, "3");
        assert!(env.dynamic_import);
        assert_eq!(env.targets.as_ref().map(Vec::len), Some(5));
    }

    #[test]
    fn user_env_overrides_take_precedence() {
        let user = EnvOverrides {
            targets: Some(vec!["ie11".to_string()]),
            mode: Some(PolyfillMode::Entry),
            core_js: None,
            dynamic_import: Some(false),
            extra: serde_json::Map::new(),
        };
        let env = resolve_env(Some(&BuildTarget::Modules), Some(&user));
        assert_eq!(env.targets, Some(vec!["ie11".to_string()]));
        assert_eq!(env.mode, PolyfillMode::Entry);
        assert_eq!(env.core_js, "3");
        assert!(!env.dynamic_import);
    }

    #[test]
    #[cfg(not(feature = "browserslist"))]
    fn env_options_without_resolver_are_fatal() {
        let env = EnvOverrides::default();
        match ensure_downlevel_support(Some(&env)) {
            Err(Error::DownlevelUnavailable) => {}
            other => panic!("expected DownlevelUnavailable, got {other:?}"),
        }
        assert!(ensure_downlevel_support(None).is_ok());
    }

    #[test]
    #[cfg(feature = "browserslist")]
    fn env_options_with_resolver_are_accepted() {
        let env = EnvOverrides::default();
        assert!(ensure_downlevel_support(Some(&env)).is_ok());
    }
}
