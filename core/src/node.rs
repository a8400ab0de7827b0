//! StateNode - Derived State Tree Node
//!
//! A node wraps its [`StateDefinition`] and adds everything computed at
//! registration time. Derived properties are immutable; the only mutable part
//! is the committed `locals` cell, which the transition engine writes on commit.

use crate::definition::{ResolveMap, StateDefinition, TemplateSource};
use crate::locals::Locals;
use crate::url::UrlMatcher;
use ahash::AHashSet;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A view after name normalization.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub template: TemplateSource,
    pub controller: Option<String>,
    /// `None` when the view is the implicit default view and shares the
    /// state's own resolve map.
    pub resolve: Option<ResolveMap>,
}

pub struct StateNode {
    pub(crate) name: String,
    pub(crate) definition: Arc<StateDefinition>,
    pub(crate) parent: Option<Arc<StateNode>>,
    pub(crate) url: Option<Arc<dyn UrlMatcher>>,
    pub(crate) navigable_ancestor: Option<Arc<StateNode>>,
    pub(crate) params: Vec<String>,
    pub(crate) own_params: Vec<String>,
    pub(crate) views: BTreeMap<String, ViewConfig>,
    pub(crate) ancestors: Vec<Arc<StateNode>>,
    pub(crate) includes: AHashSet<String>,
    pub(crate) data: Map<String, Value>,
    pub(crate) locals: RwLock<Option<Arc<Locals>>>,
}

impl StateNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original definition this node was built from.
    pub fn definition(&self) -> &Arc<StateDefinition> {
        &self.definition
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_abstract(&self) -> bool {
        self.definition.is_abstract
    }

    pub fn parent(&self) -> Option<&Arc<StateNode>> {
        self.parent.as_ref()
    }

    pub fn url(&self) -> Option<&Arc<dyn UrlMatcher>> {
        self.url.as_ref()
    }

    /// Nearest ancestor-or-self with a URL. The root is never navigable.
    pub fn navigable(self: &Arc<Self>) -> Option<Arc<StateNode>> {
        if self.is_root() {
            None
        } else if self.url.is_some() {
            Some(Arc::clone(self))
        } else {
            self.navigable_ancestor.clone()
        }
    }

    /// Whether location changes can route straight into this state.
    pub fn is_routable(&self) -> bool {
        !self.is_root() && !self.is_abstract() && self.url.is_some()
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Parameters this state declares on top of its parent's.
    pub fn own_params(&self) -> &[String] {
        &self.own_params
    }

    /// Views keyed by qualified name (`view@state`).
    pub fn views(&self) -> &BTreeMap<String, ViewConfig> {
        &self.views
    }

    /// Ancestors from (excluding) the root down to and including `self`.
    pub fn path(self: &Arc<Self>) -> Vec<Arc<StateNode>> {
        if self.is_root() {
            return Vec::new();
        }
        let mut path = self.ancestors.clone();
        path.push(Arc::clone(self));
        path
    }

    /// Depth below the root; the root is 0.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.ancestors.len() + 1
        }
    }

    /// `true` if `name` is this state or one of its ancestors.
    pub fn includes(&self, name: &str) -> bool {
        self.includes.contains(name)
    }

    /// Definition data merged over the parent's.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Committed locals, `None` while the state is not active.
    pub fn locals(&self) -> Option<Arc<Locals>> {
        self.locals.read().clone()
    }

    /// Written only by the transition engine's commit step.
    /// Replace the committed locals, returning the previous ones.
    pub fn set_locals(&self, locals: Option<Arc<Locals>>) -> Option<Arc<Locals>> {
        std::mem::replace(&mut *self.locals.write(), locals)
    }
}

impl fmt::Debug for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateNode")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("url", &self.url.as_ref().map(|u| u.source().to_string()))
            .field("params", &self.params)
            .field("own_params", &self.own_params)
            .field("views", &self.views.keys().collect::<Vec<_>>())
            .field("active", &self.locals.read().is_some())
            .finish()
    }
}

impl fmt::Display for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
