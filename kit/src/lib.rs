//! Waymark facade crate.
//!
//! Re-exports the state tree (`waymark-core`) and the transition engine
//! (`waymark-runtime`) behind a single entry point.
//!
//! ```rust
//! use waymark::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let router = Router::default();
//! router.state(StateDefinition::new("home").url("/"))?;
//! router.state(StateDefinition::new("blog").url("/blog"))?;
//! router.state(StateDefinition::new("blog.post").url("/post/:post"))?;
//!
//! router
//!     .transition_to("blog.post", Params::new().with("post", 42), TransitionOptions::default())
//!     .await?;
//! assert_eq!(router.current().name, "blog.post");
//! assert_eq!(
//!     router.href("blog.post", Params::new().with("post", 42), HrefOptions::default()).as_deref(),
//!     Some("#/blog/post/42")
//! );
//! # Ok(())
//! # }
//! ```

pub use waymark_core as core;
pub use waymark_runtime as runtime;

pub use waymark_core::{Bus, Params, StateDefinition, StateNode, ViewDefinition};
pub use waymark_runtime::{Router, RouterConfig, TransitionError, TransitionOutcome};

pub mod prelude {
    pub use waymark_core::prelude::*;
    pub use waymark_runtime::prelude::*;
}
