pub mod config;
pub mod error;
pub mod events;
pub mod injector;
pub mod location;
pub mod resolver;
pub mod router;
pub mod template;
pub mod url_router;
pub mod view;

pub mod prelude {
    pub use crate::config::RouterConfig;
    pub use crate::error::{ResolveError, TransitionError};
    pub use crate::events::{StartDecision, TransitionEvent, TransitionListener, TransitionPhase};
    pub use crate::injector::{Injector, ServiceMap};
    pub use crate::location::{Location, MemoryLocation};
    pub use crate::router::{HrefOptions, Router, TransitionOptions, TransitionOutcome};
    pub use crate::template::{MapTemplateLoader, TemplateLoader, ViewLoad};
    pub use crate::view::{ViewPort, ViewUpdate};
}

pub use config::RouterConfig;
pub use error::{ConfigError, ResolveError, TransitionError};
pub use events::{StartDecision, TransitionEvent, TransitionListener, TransitionPhase};
pub use router::{HrefOptions, Router, RouterBuilder, TransitionOptions, TransitionOutcome};
pub use view::{ViewPort, ViewUpdate};
