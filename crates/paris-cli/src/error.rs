//! Errors reported by the command line front end.

use paris_core::{FieldError, TracerouteError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid destination '{0}': expected an IPv4 address")]
    InvalidDestination(String),

    #[error("Invalid source '{0}': expected an IPv4 address")]
    InvalidSource(String),

    #[error("Failed to read path file {path}: {source}")]
    PathFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path description: {0}")]
    PathFormat(#[from] serde_json::Error),

    #[error("Failed to build probe: {0}")]
    Probe(#[from] FieldError),

    #[error(transparent)]
    Traceroute(#[from] TracerouteError),
}
