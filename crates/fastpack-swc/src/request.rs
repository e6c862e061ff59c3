//! Layered option merging.
//!
//! Every request is built the same way: start from the phase defaults, then
//! apply the inferred project-config values, then the explicit user
//! overrides, and finally the non-overridable phase invariants. Each layer is
//! a named function so precedence stays auditable and testable in isolation.

use rustc_hash::FxHashMap as HashMap;

use crate::engine::{ReactConfig, Syntax, TransformRequest};
use crate::options::SwcOptions;
use crate::tsconfig::ProjectConfig;

/// Directory segment that marks vendored dependencies.
const VENDOR_SEGMENT: &str = "node_modules";

/// Classify a file identifier into a parser syntax.
///
/// Returns `None` for anything the per-file phases must leave untouched:
/// vendored files and extensions outside {js, ts, jsx, tsx}.
#[must_use]
pub fn eligible_syntax(id: &str) -> Option<Syntax> {
    if id.contains(VENDOR_SEGMENT) {
        return None;
    }
    if id.ends_with(".ts") {
        Some(Syntax::Typescript { tsx: false })
    } else if id.ends_with(".tsx") {
        Some(Syntax::Typescript { tsx: true })
    } else if id.ends_with(".js") {
        Some(Syntax::Ecmascript { jsx: false })
    } else if id.ends_with(".jsx") {
        Some(Syntax::Ecmascript { jsx: true })
    } else {
        None
    }
}

/// Layer 1: phase-independent defaults.
#[must_use]
pub fn base_request(filename: impl Into<String>, syntax: Syntax) -> TransformRequest {
    TransformRequest {
        filename: filename.into(),
        syntax,
        target: crate::options::EsTarget::Es2020,
        keep_class_names: false,
        decorators: false,
        legacy_decorator: false,
        decorator_metadata: None,
        dynamic_import: true,
        react: ReactConfig::default(),
        defines: HashMap::default(),
        env: None,
        minify: None,
        source_maps: false,
        config_discovery: true,
        extra: serde_json::Map::new(),
    }
}

/// Layer 2: values inferred from the project compiler config.
pub fn apply_project(request: &mut TransformRequest, project: &ProjectConfig) {
    if let Some(target) = project.target {
        request.target = target;
    }

    let decorators = project.experimental_decorators.unwrap_or(false);
    request.keep_class_names = decorators;
    request.decorators = decorators;
    request.legacy_decorator = decorators;
    request.decorator_metadata = if decorators {
        project.emit_decorator_metadata
    } else {
        None
    };

    request.react.pragma = project.jsx_factory.clone();
    request.react.pragma_frag = project.jsx_fragment_factory.clone();
    request.react.import_source = project.jsx_import_source.clone();
}

/// Layer 3: explicit user options, including the captured host define map.
///
/// `captured_defines` is applied first so user-supplied defines win on key
/// collisions.
pub fn apply_user(
    request: &mut TransformRequest,
    options: &SwcOptions,
    captured_defines: &HashMap<String, String>,
) {
    for (key, value) in captured_defines {
        request.defines.insert(key.clone(), value.clone());
    }
    for (key, value) in &options.overrides.defines {
        request.defines.insert(key.clone(), value.clone());
    }

    if let Some(target) = options.target {
        request.target = target;
    }
    if let Some(sourcemap) = options.sourcemap {
        request.source_maps = sourcemap;
    }

    request.react.runtime = options.runtime;
    let react = &options.overrides.react;
    if react.pragma.is_some() {
        request.react.pragma = react.pragma.clone();
    }
    if react.pragma_frag.is_some() {
        request.react.pragma_frag = react.pragma_frag.clone();
    }
    if react.import_source.is_some() {
        request.react.import_source = react.import_source.clone();
    }

    if let Some(keep) = options.overrides.keep_class_names {
        request.keep_class_names = keep;
    }
    if let Some(decorators) = options.overrides.decorators {
        request.decorators = decorators;
        request.legacy_decorator = decorators;
    }
    if options.overrides.decorator_metadata.is_some() {
        request.decorator_metadata = options.overrides.decorator_metadata;
    }

    for (key, value) in &options.overrides.extra {
        request.extra.insert(key.clone(), value.clone());
    }
}

/// Layer 4 (serve): non-overridable development invariants.
///
/// The engine's own config-file discovery is disabled and JSX always runs
/// with development semantics; refresh instrumentation follows the
/// orchestrator's `refresh` setting.
pub fn apply_serve_invariants(request: &mut TransformRequest, refresh: bool) {
    request.config_discovery = false;
    request.react.development = true;
    request.react.refresh = refresh;
    request.react.use_builtins = refresh;
}

/// Layer 4 (build): non-overridable production invariants.
///
/// Source maps are forced on regardless of the user's final policy: build
/// output feeds the minify pass, which must remap positions back through this
/// step. The user's own sourcemap preference is honored by the minify phase.
pub fn apply_build_invariants(request: &mut TransformRequest) {
    request.config_discovery = false;
    request.source_maps = true;
    request.react.development = false;
    request.react.refresh = false;
    request.react.use_builtins = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{EsTarget, JsxRuntime};

    fn ts_request() -> TransformRequest {
        base_request("/src/app.ts", Syntax::Typescript { tsx: false })
    }

    #[test]
    fn eligible_syntax_classifies_extensions() {
        assert_eq!(
            eligible_syntax("/src/app.ts"),
            Some(Syntax::Typescript { tsx: false })
        );
        assert_eq!(
            eligible_syntax("/src/App.tsx"),
            Some(Syntax::Typescript { tsx: true })
        );
        assert_eq!(
            eligible_syntax("/src/main.js"),
            Some(Syntax::Ecmascript { jsx: false })
        );
        assert_eq!(
            eligible_syntax("/src/Button.jsx"),
            Some(Syntax::Ecmascript { jsx: true })
        );
        assert_eq!(eligible_syntax("/src/style.css"), None);
        assert_eq!(eligible_syntax("/src/data.json"), None);
    }

    #[test]
    fn eligible_syntax_skips_vendored_files() {
        assert_eq!(eligible_syntax("/app/node_modules/react/index.js"), None);
    }

    #[test]
    fn base_request_defaults() {
        let request = ts_request();
        assert_eq!(request.target, EsTarget::Es2020);
        assert!(request.dynamic_import);
        assert!(!request.decorators);
        assert!(request.config_discovery);
        assert!(request.defines.is_empty());
    }

    #[test]
    fn project_layer_infers_decorators_and_jsx_names() {
        let mut request = ts_request();
        let project = ProjectConfig {
            target: Some(EsTarget::Es2017),
            experimental_decorators: Some(true),
            emit_decorator_metadata: Some(true),
            jsx_factory: Some("h".into()),
            jsx_fragment_factory: Some("Fragment".into()),
            jsx_import_source: Some("preact".into()),
        };
        apply_project(&mut request, &project);

        assert_eq!(request.target, EsTarget::Es2017);
        assert!(request.keep_class_names);
        assert!(request.decorators);
        assert!(request.legacy_decorator);
        assert_eq!(request.decorator_metadata, Some(true));
        assert_eq!(request.react.pragma.as_deref(), Some("h"));
        assert_eq!(request.react.import_source.as_deref(), Some("preact"));
    }

    #[test]
    fn decorator_metadata_requires_decorators() {
        let mut request = ts_request();
        let project = ProjectConfig {
            emit_decorator_metadata: Some(true),
            ..ProjectConfig::default()
        };
        apply_project(&mut request, &project);
        assert_eq!(request.decorator_metadata, None);
    }

    #[test]
    fn user_layer_wins_over_project_layer() {
        let mut request = ts_request();
        apply_project(
            &mut request,
            &ProjectConfig {
                target: Some(EsTarget::Es2017),
                ..ProjectConfig::default()
            },
        );

        let mut options = SwcOptions::default();
        options.target = Some(EsTarget::EsNext);
        options.runtime = JsxRuntime::Classic;
        options.overrides.keep_class_names = Some(true);
        apply_user(&mut request, &options, &HashMap::default());

        assert_eq!(request.target, EsTarget::EsNext);
        assert_eq!(request.react.runtime, JsxRuntime::Classic);
        assert!(request.keep_class_names);
    }

    #[test]
    fn user_defines_win_over_captured_defines() {
        let mut request = ts_request();
        let mut captured = HashMap::default();
        captured.insert("__DEV__".to_string(), "true".to_string());
        captured.insert("VERSION".to_string(), "\"1.0\"".to_string());

        let mut options = SwcOptions::default();
        options
            .overrides
            .defines
            .insert("__DEV__".to_string(), "false".to_string());
        apply_user(&mut request, &options, &captured);

        assert_eq!(request.defines["__DEV__"], "false");
        assert_eq!(request.defines["VERSION"], "\"1.0\"");
    }

    #[test]
    fn serve_invariants_are_final() {
        let mut request = ts_request();
        apply_serve_invariants(&mut request, true);
        assert!(!request.config_discovery);
        assert!(request.react.development);
        assert!(request.react.refresh);
        assert!(request.react.use_builtins);

        apply_serve_invariants(&mut request, false);
        assert!(!request.react.refresh);
        assert!(request.react.development);
    }

    #[test]
    fn build_invariants_force_source_maps_on() {
        let mut request = ts_request();
        let mut options = SwcOptions::default();
        options.sourcemap = Some(false);
        apply_user(&mut request, &options, &HashMap::default());
        assert!(!request.source_maps);

        apply_build_invariants(&mut request);
        assert!(request.source_maps);
        assert!(!request.react.development);
    }
}
