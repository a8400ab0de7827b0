//! Presentation binding.
//!
//! A [`ViewPort`] stands for one placeholder in the UI. After each transition
//! it asks the router for its view's locals and reports whether the rendered
//! content has to change. Content is compared by identity: a state whose
//! locals were kept produces the same `Arc` and is not re-rendered.

use crate::router::Router;
use std::sync::Arc;
use waymark_core::ViewLocals;
use waymark_core::registry::VIEW_QUALIFIER;

#[derive(Debug, Clone)]
pub enum ViewUpdate {
    /// New content to render.
    Render(Arc<ViewLocals>),
    /// The view is no longer filled by any active state.
    Clear,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct ViewPort {
    name: String,
    current: Option<Arc<ViewLocals>>,
}

impl ViewPort {
    /// A port for the view `name`, placed inside `enclosing` (or at the top
    /// level). Unqualified names are qualified with the enclosing view's
    /// state.
    pub fn new(name: &str, enclosing: Option<&ViewLocals>) -> Self {
        let name = if name.contains(VIEW_QUALIFIER) {
            name.to_string()
        } else {
            let state = enclosing.map(|view| view.state()).unwrap_or_default();
            format!("{name}{VIEW_QUALIFIER}{state}")
        };
        Self {
            name,
            current: None,
        }
    }

    /// Qualified view name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content last rendered by this port.
    pub fn locals(&self) -> Option<&Arc<ViewLocals>> {
        self.current.as_ref()
    }

    pub fn update(&mut self, router: &Router) -> ViewUpdate {
        let next = router.view(&self.name);
        let update = match (&self.current, &next) {
            (Some(old), Some(new)) if Arc::ptr_eq(old, new) => ViewUpdate::Unchanged,
            (None, None) => ViewUpdate::Unchanged,
            (_, Some(new)) => ViewUpdate::Render(Arc::clone(new)),
            (Some(_), None) => ViewUpdate::Clear,
        };
        self.current = next;
        update
    }
}
