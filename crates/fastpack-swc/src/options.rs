//! User-facing plugin options.
//!
//! [`SwcOptions`] is the single option record shared by all three phases.
//! The three activation switches (`serve`, `build`, `minify`) select phases;
//! everything else feeds the per-request option merge in [`crate::request`].

use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Lifecycle phase instrumented by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Development-server per-file transform.
    Serve,
    /// Production per-file transform.
    Build,
    /// Post-bundle per-chunk minification.
    Minify,
}

impl Phase {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Serve => "serve",
            Self::Build => "build",
            Self::Minify => "minify",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JSX runtime mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JsxRuntime {
    /// Classic JSX transform (`React.createElement`).
    Classic,
    /// Automatic JSX transform (React 17+ / jsx-runtime).
    #[default]
    Automatic,
}

impl JsxRuntime {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Automatic => "automatic",
        }
    }
}

/// ECMAScript language version tag.
///
/// Parses case-insensitively so tsconfig spellings like `"ES2020"` and the
/// legacy `"ES6"` alias are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EsTarget {
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    #[default]
    Es2020,
    Es2021,
    Es2022,
    Es2023,
    Es2024,
    EsNext,
}

impl EsTarget {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Es5 => "es5",
            Self::Es2015 => "es2015",
            Self::Es2016 => "es2016",
            Self::Es2017 => "es2017",
            Self::Es2018 => "es2018",
            Self::Es2019 => "es2019",
            Self::Es2020 => "es2020",
            Self::Es2021 => "es2021",
            Self::Es2022 => "es2022",
            Self::Es2023 => "es2023",
            Self::Es2024 => "es2024",
            Self::EsNext => "esnext",
        }
    }
}

impl std::fmt::Display for EsTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EsTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "es5" => Ok(Self::Es5),
            "es6" | "es2015" => Ok(Self::Es2015),
            "es2016" => Ok(Self::Es2016),
            "es2017" => Ok(Self::Es2017),
            "es2018" => Ok(Self::Es2018),
            "es2019" => Ok(Self::Es2019),
            "es2020" => Ok(Self::Es2020),
            "es2021" => Ok(Self::Es2021),
            "es2022" => Ok(Self::Es2022),
            "es2023" => Ok(Self::Es2023),
            "es2024" => Ok(Self::Es2024),
            "esnext" => Ok(Self::EsNext),
            other => Err(format!("unknown language target: {other}")),
        }
    }
}

impl Serialize for EsTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EsTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Polyfill injection mode for down-leveling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolyfillMode {
    /// Inject polyfills based on detected usage.
    #[default]
    Usage,
    /// Inject the full entry polyfill set.
    Entry,
}

/// User overrides for the build phase's down-level env config.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvOverrides {
    /// Explicit target list; overrides the host's declared target.
    pub targets: Option<Vec<String>>,
    /// Polyfill injection mode.
    pub mode: Option<PolyfillMode>,
    /// Polyfill-library major version.
    pub core_js: Option<String>,
    /// Whether dynamic import is supported.
    pub dynamic_import: Option<bool>,
    /// Passthrough env options merged verbatim into the request.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User compression setting: a flat on/off switch or a sub-config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CompressSetting {
    /// `true` keeps the default compression, `false` disables it entirely.
    Flag(bool),
    /// Field-by-field overrides merged over the default compression config.
    Overrides(CompressOverrides),
}

/// Compression sub-config overrides.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct CompressOverrides {
    /// Allow top-level inlining.
    pub toplevel: Option<bool>,
    /// Passthrough compressor options merged verbatim into the request.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User overrides for the minify phase.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct MinifyOverrides {
    /// Compression setting.
    pub compress: Option<CompressSetting>,
    /// Whether to mangle identifiers.
    pub mangle: Option<bool>,
}

/// User overrides for the react transform naming.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReactOverrides {
    /// JSX factory (classic runtime).
    pub pragma: Option<String>,
    /// JSX fragment factory (classic runtime).
    pub pragma_frag: Option<String>,
    /// Module the automatic runtime imports from.
    pub import_source: Option<String>,
}

/// Passthrough compiler options applied after inferred project settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestOverrides {
    /// Keep original class names through the transform.
    pub keep_class_names: Option<bool>,
    /// Parse decorator syntax.
    pub decorators: Option<bool>,
    /// Emit decorator metadata.
    pub decorator_metadata: Option<bool>,
    /// React transform naming overrides.
    pub react: ReactOverrides,
    /// Global-constant substitutions layered over the captured host defines.
    pub defines: HashMap<String, String>,
    /// Open-ended options merged verbatim into the request.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

/// Options for the SWC phase plugins.
///
/// One record configures all three phases. The activation switches default to
/// on; setting one explicitly `true` on a plugin of a different phase is a
/// configuration conflict, not a silent override.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SwcOptions {
    /// Minify phase switch.
    pub minify: Option<bool>,
    /// Build phase switch.
    pub build: Option<bool>,
    /// Serve phase switch.
    pub serve: Option<bool>,
    /// Hot-reload injection switch (serve phase).
    #[serde(default = "default_true")]
    pub refresh: bool,
    /// JSX transform mode.
    pub runtime: JsxRuntime,
    /// Language target; falls back to the project config, then es2020.
    pub target: Option<EsTarget>,
    /// Source-map policy; phase-specific fallbacks apply when unset.
    pub sourcemap: Option<bool>,
    /// Minify-phase sub-config.
    pub minify_options: Option<MinifyOverrides>,
    /// Build-phase down-level env overrides.
    pub env: Option<EnvOverrides>,
    /// Passthrough compiler options.
    #[serde(flatten)]
    pub overrides: RequestOverrides,
}

impl Default for SwcOptions {
    fn default() -> Self {
        Self {
            minify: None,
            build: None,
            serve: None,
            refresh: true,
            runtime: JsxRuntime::default(),
            target: None,
            sourcemap: None,
            minify_options: None,
            env: None,
            overrides: RequestOverrides::default(),
        }
    }
}

impl SwcOptions {
    /// Whether the switch for `phase` is explicitly enabled.
    #[must_use]
    pub fn phase_enabled(&self, phase: Phase) -> Option<bool> {
        match phase {
            Phase::Serve => self.serve,
            Phase::Build => self.build,
            Phase::Minify => self.minify,
        }
    }

    /// First phase other than `own` whose switch is explicitly `true`.
    #[must_use]
    pub fn conflicting_phase(&self, own: Phase) -> Option<Phase> {
        [Phase::Serve, Phase::Build, Phase::Minify]
            .into_iter()
            .find(|&p| p != own && self.phase_enabled(p) == Some(true))
    }

    /// Copy of these options with all three phase switches cleared.
    ///
    /// Used by the combined factory so per-phase constructors never see the
    /// other phases' switches.
    #[must_use]
    pub fn without_phase_switches(&self) -> Self {
        Self {
            minify: None,
            build: None,
            serve: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn es_target_parses_case_insensitively() {
        assert_eq!("ES2020".parse::<EsTarget>().unwrap(), EsTarget::Es2020);
        assert_eq!("esnext".parse::<EsTarget>().unwrap(), EsTarget::EsNext);
        assert_eq!("ES6".parse::<EsTarget>().unwrap(), EsTarget::Es2015);
        assert!("es1999".parse::<EsTarget>().is_err());
    }

    #[test]
    fn es_target_json_round_trip() {
        let target: EsTarget = serde_json::from_str("\"ES2019\"").unwrap();
        assert_eq!(target, EsTarget::Es2019);
        assert_eq!(serde_json::to_string(&target).unwrap(), "\"es2019\"");
    }

    #[test]
    fn options_default_to_all_phases_unset_and_refresh_on() {
        let options = SwcOptions::default();
        assert_eq!(options.serve, None);
        assert_eq!(options.build, None);
        assert_eq!(options.minify, None);
        assert!(options.refresh);
        assert_eq!(options.runtime, JsxRuntime::Automatic);
    }

    #[test]
    fn options_deserialize_with_passthrough() {
        let options: SwcOptions = serde_json::from_str(
            r#"{
                "serve": true,
                "refresh": false,
                "runtime": "classic",
                "target": "es2022",
                "keepClassNames": true,
                "someEngineKnob": 3
            }"#,
        )
        .unwrap();

        assert_eq!(options.serve, Some(true));
        assert!(!options.refresh);
        assert_eq!(options.runtime, JsxRuntime::Classic);
        assert_eq!(options.target, Some(EsTarget::Es2022));
        assert_eq!(options.overrides.keep_class_names, Some(true));
        assert_eq!(
            options.overrides.extra.get("someEngineKnob"),
            Some(&Value::from(3))
        );
    }

    #[test]
    fn compress_setting_accepts_flag_or_config() {
        let off: MinifyOverrides = serde_json::from_str(r#"{"compress": false}"#).unwrap();
        assert_eq!(off.compress, Some(CompressSetting::Flag(false)));

        let cfg: MinifyOverrides =
            serde_json::from_str(r#"{"compress": {"toplevel": true, "passes": 2}}"#).unwrap();
        match cfg.compress {
            Some(CompressSetting::Overrides(o)) => {
                assert_eq!(o.toplevel, Some(true));
                assert_eq!(o.extra.get("passes"), Some(&Value::from(2)));
            }
            other => panic!("expected overrides, got {other:?}"),
        }
    }

    #[test]
    fn conflicting_phase_reports_explicit_switches_only() {
        let mut options = SwcOptions::default();
        assert_eq!(options.conflicting_phase(Phase::Serve), None);

        options.build = Some(true);
        assert_eq!(options.conflicting_phase(Phase::Serve), Some(Phase::Build));
        assert_eq!(options.conflicting_phase(Phase::Build), None);

        options.build = Some(false);
        assert_eq!(options.conflicting_phase(Phase::Serve), None);
    }
}
