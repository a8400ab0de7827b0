use crate::url::MatcherError;
use thiserror::Error;

/// Errors raised while registering a state. A failed registration never
/// changes the tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("state must have a valid name, got '{0}'")]
    InvalidName(String),

    #[error("state '{0}' is already defined")]
    DuplicateState(String),

    #[error("parent state '{parent}' of '{state}' is not registered")]
    UnknownParent { state: String, parent: String },

    #[error("invalid url '{url}' in state '{state}': {source}")]
    InvalidUrl {
        state: String,
        url: String,
        #[source]
        source: MatcherError,
    },

    #[error("both params and url specified in state '{0}'")]
    InvalidParams(String),

    #[error("missing required parameter '{param}' in state '{state}'")]
    MissingParameter { state: String, param: String },
}

/// Errors raised while resolving a relative state path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no reference point given for path '{0}'")]
    NoRelativeBase(String),

    #[error("path '{path}' not valid for state '{base}'")]
    InvalidPath { path: String, base: String },
}
