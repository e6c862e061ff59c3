use std::path::PathBuf;
use thiserror::Error;

use crate::options::Phase;

/// Core error type for the fastpack SWC phases.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot enable {conflicting} options on the {phase} plugin; construct the phases separately or use the combined factory")]
    PhaseConflict { phase: Phase, conflicting: Phase },

    #[error("failed to read project config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse project config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("env options were supplied but down-level target resolution is not compiled in; enable the `browserslist` feature")]
    DownlevelUnavailable,
}
