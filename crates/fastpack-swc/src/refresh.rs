//! Hot-reload code injection.
//!
//! The serve phase wraps compiled modules that register fast-refresh
//! components with a literal header/footer pair. The header imports the
//! refresh runtime, verifies the host page installed the global registration
//! hooks, and swaps in per-file hooks tagged with the module id; the footer
//! restores the previous hooks, marks the module hot-accepted, and enqueues a
//! refresh update. Wrapping is plain text concatenation around the opaque
//! compiled body; the source map is passed through unmodified.

/// Well-known virtual module id of the refresh runtime.
pub const RUNTIME_PUBLIC_PATH: &str = "/@react-refresh";

/// Marker the JSX transform leaves in output that declares refresh-eligible
/// components. Modules without it are never wrapped.
pub const REFRESH_MARKER: &str = "$RefreshReg$";

/// Bundled refresh runtime source, served for [`RUNTIME_PUBLIC_PATH`].
const RUNTIME_SOURCE: &str = include_str!("refresh-runtime.js");

/// Bootstrap snippet injected into the index HTML.
///
/// Installs no-op registration hooks and wires the runtime into the global
/// hook before any application module runs.
const BOOTSTRAP: &str = concat!(
    "import{injectIntoGlobalHook}from\"/@react-refresh\";",
    "injectIntoGlobalHook(window);",
    "window.$RefreshReg$=()=>{};",
    "window.$RefreshSig$=()=>(type)=>type;"
);

/// The refresh runtime module source.
#[must_use]
pub fn runtime_source() -> &'static str {
    RUNTIME_SOURCE
}

/// Whether compiled output declares refresh-eligible components.
#[must_use]
pub fn has_refresh_marker(code: &str) -> bool {
    code.contains(REFRESH_MARKER)
}

/// Wrap a compiled module body with the refresh header and footer.
///
/// The body is preserved verbatim between the two.
#[must_use]
pub fn wrap_module(id: &str, code: &str) -> String {
    let escaped = escape_id(id);
    let header = format!(
        concat!(
            "import * as RefreshRuntime from \"{runtime}\";",
            "let prevRefreshReg;",
            "let prevRefreshSig;",
            "if(!window.$RefreshReg$)throw new Error(\"React refresh preamble was not loaded!\");",
            "prevRefreshReg=window.$RefreshReg$;",
            "prevRefreshSig=window.$RefreshSig$;",
            "window.$RefreshReg$=RefreshRuntime.getRefreshReg(\"{id}\");",
            "window.$RefreshSig$=RefreshRuntime.createSignatureFunctionForTransform;"
        ),
        runtime = RUNTIME_PUBLIC_PATH,
        id = escaped,
    );
    let footer = concat!(
        ";window.$RefreshReg$=prevRefreshReg;",
        "window.$RefreshSig$=prevRefreshSig;",
        "import.meta.hot.accept();",
        "RefreshRuntime.enqueueUpdate();"
    );
    format!("{header}{code}{footer}")
}

/// Inject the bootstrap module script into an HTML page.
///
/// The script is placed before the first application script tag so the
/// registration hooks exist before any module executes; pages without a
/// script tag get it appended to `<head>`, and bare fragments get it
/// prepended.
#[must_use]
pub fn inject_bootstrap(html: &str) -> String {
    let tag = format!("<script type=\"module\">{BOOTSTRAP}</script>");

    if let Some(idx) = html.find("<script") {
        let mut out = String::with_capacity(html.len() + tag.len() + 1);
        out.push_str(&html[..idx]);
        out.push_str(&tag);
        out.push('\n');
        out.push_str(&html[idx..]);
        return out;
    }
    if let Some(idx) = html.find("</head>") {
        let mut out = String::with_capacity(html.len() + tag.len() + 1);
        out.push_str(&html[..idx]);
        out.push_str(&tag);
        out.push('\n');
        out.push_str(&html[idx..]);
        return out;
    }
    format!("{tag}\n{html}")
}

fn escape_id(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_detection() {
        assert!(has_refresh_marker("var _c; $RefreshReg$(_c, \"App\");"));
        assert!(!has_refresh_marker("export const x = 42;"));
    }

    #[test]
    fn wrap_preserves_body_verbatim() {
        let body = "const App = () => _jsx(\"div\", {});\n$RefreshReg$(App, \"App\");";
        let wrapped = wrap_module("/src/App.tsx", body);

        assert!(wrapped.starts_with("import * as RefreshRuntime from \"/@react-refresh\";"));
        assert!(wrapped.ends_with("RefreshRuntime.enqueueUpdate();"));
        assert!(wrapped.contains(body));
        assert!(wrapped.contains("getRefreshReg(\"/src/App.tsx\")"));
        assert!(wrapped.contains("import.meta.hot.accept()"));
    }

    #[test]
    fn wrap_escapes_windows_paths() {
        let wrapped = wrap_module(r"C:\app\src\App.tsx", "$RefreshReg$");
        assert!(wrapped.contains(r#"getRefreshReg("C:\\app\\src\\App.tsx")"#));
    }

    #[test]
    fn bootstrap_lands_before_first_script() {
        let html = "<html><head><script type=\"module\" src=\"/src/main.tsx\"></script></head></html>";
        let out = inject_bootstrap(html);

        let bootstrap_at = out.find("injectIntoGlobalHook").unwrap();
        let app_at = out.find("/src/main.tsx").unwrap();
        assert!(bootstrap_at < app_at);
    }

    #[test]
    fn bootstrap_falls_back_to_head() {
        let html = "<html><head></head><body></body></html>";
        let out = inject_bootstrap(html);
        assert!(out.contains("<script type=\"module\">"));
        assert!(out.find("</head>").unwrap() > out.find("injectIntoGlobalHook").unwrap());
    }

    #[test]
    fn runtime_asset_exports_protocol_surface() {
        let runtime = runtime_source();
        assert!(runtime.contains("injectIntoGlobalHook"));
        assert!(runtime.contains("getRefreshReg"));
        assert!(runtime.contains("createSignatureFunctionForTransform"));
        assert!(runtime.contains("enqueueUpdate"));
    }
}
