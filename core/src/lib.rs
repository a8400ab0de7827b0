//! Waymark core: the state tree.
//!
//! Definitions, registration, URL patterns and the immutable records produced
//! by resolution. Nothing here is async; the transition engine lives in
//! `waymark-runtime`.

pub mod bus;
pub mod definition;
pub mod error;
pub mod locals;
pub mod node;
pub mod params;
pub mod registry;
pub mod url;

pub use bus::Bus;
pub use definition::{
    BoxFuture, Factory, Hook, ResolveContext, ResolveMap, Resolvable, StateDefinition,
    TemplateSource, ViewDefinition,
};
pub use error::{LookupError, RegistrationError};
pub use locals::{Globals, Locals, ViewLocals};
pub use node::{StateNode, ViewConfig};
pub use params::Params;
pub use registry::{StateRegistry, StateTarget};
pub use url::{MatcherError, PathMatcher, PathMatcherFactory, UrlMatcher, UrlMatcherFactory};

pub mod prelude {
    pub use crate::bus::Bus;
    pub use crate::definition::{ResolveContext, StateDefinition, ViewDefinition};
    pub use crate::locals::{Globals, Locals, ViewLocals};
    pub use crate::node::StateNode;
    pub use crate::params::Params;
    pub use crate::registry::StateTarget;
}
