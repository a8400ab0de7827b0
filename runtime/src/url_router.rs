//! Location-to-state rules.
//!
//! Every concrete state with a URL gets a rule when it is registered. Rules are
//! tried in registration order and the first match wins.

use std::sync::Arc;
use waymark_core::{Params, StateNode};

#[derive(Debug, Default)]
pub struct UrlRouter {
    rules: Vec<Arc<StateNode>>,
}

impl UrlRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for `state`. States without a URL or that are abstract are
    /// ignored.
    pub fn when(&mut self, state: &Arc<StateNode>) {
        if state.is_routable() {
            tracing::debug!(state = %state, "Url rule added");
            self.rules.push(Arc::clone(state));
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first state whose pattern matches `url`, with the matched params.
    pub fn find(&self, url: &str) -> Option<(Arc<StateNode>, Params)> {
        self.rules.iter().find_map(|state| {
            let params = state.url()?.exec(url)?;
            Some((Arc::clone(state), params))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymark_core::{StateDefinition, StateRegistry};

    #[test]
    fn first_matching_rule_wins() {
        let mut reg = StateRegistry::default();
        let mut router = UrlRouter::new();
        for def in [
            StateDefinition::new("layout").url("/app").abstract_state(),
            StateDefinition::new("new").url("/post/new"),
            StateDefinition::new("post").url("/post/:id"),
            StateDefinition::new("modal"),
        ] {
            let node = reg.register(def).unwrap();
            router.when(&node);
        }
        assert_eq!(router.len(), 2);

        let (state, params) = router.find("/post/new").unwrap();
        assert_eq!(state.name(), "new");
        assert!(params.is_empty());

        let (state, params) = router.find("/post/7").unwrap();
        assert_eq!(state.name(), "post");
        assert_eq!(params.get("id"), Some("7"));

        assert!(router.find("/app").is_none());
        assert!(router.find("/nowhere").is_none());
    }
}
