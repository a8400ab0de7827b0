use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use waymark_core::LookupError;

/// A dependency of a state could not be produced.
///
/// Resolution is fail-fast: the first failing entry rejects the state and every
/// state below it in the transition.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown service '{service}' required by '{key}' in state '{state}'")]
    UnknownService {
        state: String,
        key: String,
        service: String,
    },

    #[error("resolving '{key}' for state '{state}' failed: {source}")]
    Factory {
        state: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("template for view '{view}' could not be loaded: {source}")]
    Template {
        view: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Why a transition did not take place. The active state is unchanged in
/// every case.
#[derive(Debug, Clone, Error)]
pub enum TransitionError {
    #[error("no such state '{0}'")]
    UnknownState(String),

    #[error("cannot transition to abstract state '{0}'")]
    AbstractState(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("transition from '{from}' to '{to}' was prevented")]
    Prevented { from: String, to: String },

    #[error("transition failed: {0}")]
    Resolve(#[source] Arc<ResolveError>),

    #[error("no state matches url '{0}'")]
    NoRoute(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid router config: {0}")]
    Parse(#[from] toml::de::Error),
}
