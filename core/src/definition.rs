//! StateDefinition - User-Authored State Configuration
//!
//! Definitions are built once during setup and never mutated after
//! registration. Everything derived from them lives on
//! [`StateNode`](crate::node::StateNode).
//!
//! # Example
//! ```rust
//! use waymark_core::definition::{StateDefinition, ViewDefinition};
//! use serde_json::json;
//!
//! let post = StateDefinition::new("blog.post")
//!     .url("/post/:post")
//!     .resolve("post", |ctx| async move {
//!         Ok(json!({ "id": ctx.params.get("post") }))
//!     })
//!     .view("", ViewDefinition::new().template_url("tpl/blog.post.html"));
//! assert_eq!(post.name, "blog.post");
//! ```

use crate::bus::Bus;
use crate::locals::Globals;
use crate::params::Params;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for boxed futures returned by resolve factories.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An async dependency factory.
pub type Factory = Arc<dyn Fn(ResolveContext) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Callback run on enter/exit with the state's resolved globals.
pub type Hook = Arc<dyn Fn(&Globals) + Send + Sync>;

/// What a factory gets to see while resolving.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Name of the state being resolved.
    pub state: String,
    /// Parameters restricted to that state's parameter set.
    pub params: Params,
    /// Shared typed resources.
    pub bus: Arc<Bus>,
}

/// One entry of a `resolve` map.
#[derive(Clone)]
pub enum Resolvable {
    /// Look up a named service through the injector.
    Service(String),
    /// Invoke a factory and await its result.
    Factory(Factory),
}

impl fmt::Debug for Resolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolvable::Service(name) => f.debug_tuple("Service").field(name).finish(),
            Resolvable::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

pub type ResolveMap = BTreeMap<String, Resolvable>;

fn boxed_factory<F, Fut>(f: F) -> Resolvable
where
    F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Resolvable::Factory(Arc::new(
        move |ctx| -> BoxFuture<'static, anyhow::Result<Value>> { Box::pin(f(ctx)) },
    ))
}

/// Where a view's template comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    #[default]
    None,
    Inline(String),
    Url(String),
}

/// A named view of a state.
#[derive(Debug, Clone, Default)]
pub struct ViewDefinition {
    pub template: TemplateSource,
    pub controller: Option<String>,
    pub resolve: ResolveMap,
}

impl ViewDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = TemplateSource::Inline(template.into());
        self
    }

    pub fn template_url(mut self, url: impl Into<String>) -> Self {
        self.template = TemplateSource::Url(url.into());
        self
    }

    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn resolve<F, Fut>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.resolve.insert(key.into(), boxed_factory(f));
        self
    }

    pub fn resolve_service(mut self, key: impl Into<String>, service: impl Into<String>) -> Self {
        self.resolve
            .insert(key.into(), Resolvable::Service(service.into()));
        self
    }
}

/// A state as authored by the application.
#[derive(Clone, Default)]
pub struct StateDefinition {
    pub name: String,
    pub parent: Option<String>,
    pub url: Option<String>,
    pub is_abstract: bool,
    pub params: Option<Vec<String>>,
    pub data: Map<String, Value>,
    pub resolve: ResolveMap,
    pub views: Option<BTreeMap<String, ViewDefinition>>,
    pub template: TemplateSource,
    pub controller: Option<String>,
    pub on_enter: Option<Hook>,
    pub on_exit: Option<Hook>,
}

impl StateDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Explicit parent by name, overriding the dotted-name convention.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// URL pattern. Prefix with `^` for an absolute pattern.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn abstract_state(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Explicit parameter list for a state without a URL.
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = Some(params.into_iter().map(Into::into).collect());
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn resolve<F, Fut>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(ResolveContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.resolve.insert(key.into(), boxed_factory(f));
        self
    }

    pub fn resolve_service(mut self, key: impl Into<String>, service: impl Into<String>) -> Self {
        self.resolve
            .insert(key.into(), Resolvable::Service(service.into()));
        self
    }

    /// Add a named view. Once any view is added the top-level
    /// template/controller are ignored.
    pub fn view(mut self, name: impl Into<String>, view: ViewDefinition) -> Self {
        self.views
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), view);
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = TemplateSource::Inline(template.into());
        self
    }

    pub fn template_url(mut self, url: impl Into<String>) -> Self {
        self.template = TemplateSource::Url(url.into());
        self
    }

    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Runs after the state became active, with its resolved globals.
    /// The router is already on the new state and may be queried.
    pub fn on_enter(mut self, hook: impl Fn(&Globals) + Send + Sync + 'static) -> Self {
        self.on_enter = Some(Arc::new(hook));
        self
    }

    /// Runs once the state was left, with the globals it had while active.
    pub fn on_exit(mut self, hook: impl Fn(&Globals) + Send + Sync + 'static) -> Self {
        self.on_exit = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for StateDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDefinition")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("url", &self.url)
            .field("is_abstract", &self.is_abstract)
            .field("params", &self.params)
            .field("resolve", &self.resolve.keys().collect::<Vec<_>>())
            .field("views", &self.views.as_ref().map(|v| v.keys().collect::<Vec<_>>()))
            .finish_non_exhaustive()
    }
}
