//! Locals - Resolved Data Records
//!
//! A [`Locals`] record is produced once per entered state per transition. It is
//! immutable: inheritance is a shallow merge of the parent's globals performed
//! at resolve time, so a descendant never needs to walk back up the tree.

use crate::params::Params;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// State-wide resolved values, visible to every view of the state and to
/// `on_enter` / `on_exit` hooks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Globals {
    state: String,
    params: Params,
    values: BTreeMap<String, Value>,
}

impl Globals {
    pub fn new(state: impl Into<String>, params: Params) -> Self {
        Self {
            state: state.into(),
            params,
            values: BTreeMap::new(),
        }
    }

    /// Name of the state that owns these values.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Parameters restricted to the owning state's parameter set.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Fill in every key of `parent` that `self` does not define.
    pub fn inherit(&mut self, parent: &Globals) {
        for (k, v) in &parent.values {
            self.values.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

/// Everything a presentation layer needs to render one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewLocals {
    view: String,
    state: String,
    template: String,
    controller: Option<String>,
    params: Params,
    values: BTreeMap<String, Value>,
}

impl ViewLocals {
    pub fn new(
        view: impl Into<String>,
        state: impl Into<String>,
        template: String,
        controller: Option<String>,
        params: Params,
    ) -> Self {
        Self {
            view: view.into(),
            state: state.into(),
            template,
            controller,
            params,
            values: BTreeMap::new(),
        }
    }

    /// Fully qualified view name (`name@state`).
    pub fn view(&self) -> &str {
        &self.view
    }

    /// The state that filled this view.
    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Controller reference; instantiation is up to the presentation layer.
    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Merge state globals beneath the view's own values.
    pub fn inherit(&mut self, globals: &Globals) {
        for (k, v) in globals.values() {
            self.values.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

/// The resolved data of one state.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    globals: Globals,
    views: BTreeMap<String, Arc<ViewLocals>>,
}

impl Locals {
    pub fn new(globals: Globals, views: BTreeMap<String, Arc<ViewLocals>>) -> Self {
        Self { globals, views }
    }

    /// Locals of the implicit root: no values, no parameters.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn view(&self, name: &str) -> Option<&Arc<ViewLocals>> {
        self.views.get(name)
    }

    pub fn views(&self) -> &BTreeMap<String, Arc<ViewLocals>> {
        &self.views
    }
}
