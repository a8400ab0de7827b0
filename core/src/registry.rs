//! StateRegistry - Builds and Indexes the State Tree
//!
//! Registration is append-only and strictly ordered: a state's parent must be
//! registered before the state itself. Derived properties are computed in a
//! fixed order (parent, data, url, navigable, params, views, own params, path,
//! includes) because later ones read earlier ones.

use crate::definition::StateDefinition;
use crate::error::{LookupError, RegistrationError};
use crate::locals::Locals;
use crate::node::{StateNode, ViewConfig};
use crate::url::{PathMatcherFactory, UrlMatcher, UrlMatcherFactory};
use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Separator between a view name and its qualifying state.
pub const VIEW_QUALIFIER: char = '@';

/// Prefix that makes a state URL absolute instead of relative.
pub const ABSOLUTE_URL_MARKER: char = '^';

/// The ways a caller can point at a state.
#[derive(Debug, Clone)]
pub enum StateTarget {
    /// Absolute name, or a relative path such as `.child` or `^.sibling`.
    Name(String),
    /// A registered node.
    Node(Arc<StateNode>),
    /// A registered definition.
    Definition(Arc<StateDefinition>),
}

impl From<&str> for StateTarget {
    fn from(name: &str) -> Self {
        StateTarget::Name(name.to_string())
    }
}

impl From<String> for StateTarget {
    fn from(name: String) -> Self {
        StateTarget::Name(name)
    }
}

impl From<Arc<StateNode>> for StateTarget {
    fn from(node: Arc<StateNode>) -> Self {
        StateTarget::Node(node)
    }
}

impl From<&Arc<StateNode>> for StateTarget {
    fn from(node: &Arc<StateNode>) -> Self {
        StateTarget::Node(Arc::clone(node))
    }
}

impl From<Arc<StateDefinition>> for StateTarget {
    fn from(definition: Arc<StateDefinition>) -> Self {
        StateTarget::Definition(definition)
    }
}

impl From<&Arc<StateDefinition>> for StateTarget {
    fn from(definition: &Arc<StateDefinition>) -> Self {
        StateTarget::Definition(Arc::clone(definition))
    }
}

impl fmt::Display for StateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateTarget::Name(name) => f.write_str(name),
            StateTarget::Node(node) => f.write_str(node.name()),
            StateTarget::Definition(def) => f.write_str(&def.name),
        }
    }
}

/// Index of every registered state, rooted at an implicit abstract root.
pub struct StateRegistry {
    root: Arc<StateNode>,
    states: AHashMap<String, Arc<StateNode>>,
    matchers: Arc<dyn UrlMatcherFactory>,
}

impl StateRegistry {
    /// Create a registry that compiles URLs with the given factory.
    ///
    /// The root's URL is the factory's compilation of the empty pattern. A
    /// factory that rejects it leaves the root without a URL, and top-level
    /// relative URLs are then compiled as they are.
    pub fn new(matchers: Arc<dyn UrlMatcherFactory>) -> Self {
        let definition = Arc::new(StateDefinition::new("").url("^").abstract_state());
        let url = matchers.compile("").ok();

        let mut includes = AHashSet::new();
        includes.insert(String::new());

        let root = Arc::new(StateNode {
            name: String::new(),
            definition,
            parent: None,
            url,
            navigable_ancestor: None,
            params: Vec::new(),
            own_params: Vec::new(),
            views: BTreeMap::new(),
            ancestors: Vec::new(),
            includes,
            data: Default::default(),
            locals: RwLock::new(Some(Arc::new(Locals::root()))),
        });

        let mut states = AHashMap::new();
        states.insert(String::new(), Arc::clone(&root));

        Self {
            root,
            states,
            matchers,
        }
    }

    pub fn root(&self) -> &Arc<StateNode> {
        &self.root
    }

    /// Number of registered states, excluding the root.
    pub fn len(&self) -> usize {
        self.states.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered states excluding the root, in no particular order.
    pub fn states(&self) -> impl Iterator<Item = &Arc<StateNode>> {
        self.states.values().filter(|node| !node.is_root())
    }

    /// Register a definition and return its node.
    pub fn register(
        &mut self,
        definition: impl Into<Arc<StateDefinition>>,
    ) -> Result<Arc<StateNode>, RegistrationError> {
        let definition = definition.into();
        let name = definition.name.clone();

        if name.trim().is_empty() || name.contains(VIEW_QUALIFIER) {
            return Err(RegistrationError::InvalidName(name));
        }
        if self.states.contains_key(&name) {
            return Err(RegistrationError::DuplicateState(name));
        }

        let parent = self.derive_parent(&definition)?;

        let mut data = parent.data.clone();
        for (k, v) in &definition.data {
            data.insert(k.clone(), v.clone());
        }

        let url = self.derive_url(&definition, &parent)?;
        let navigable_ancestor = if url.is_some() {
            None
        } else {
            parent.navigable()
        };

        let params = match (&definition.params, &url) {
            (Some(_), Some(_)) => return Err(RegistrationError::InvalidParams(name)),
            (Some(explicit), None) => explicit.clone(),
            (None, Some(url)) => url.parameters().to_vec(),
            (None, None) => parent.params.clone(),
        };

        let views = derive_views(&definition, &parent);

        if let Some(missing) = parent.params.iter().find(|p| !params.contains(p)) {
            return Err(RegistrationError::MissingParameter {
                state: name,
                param: missing.clone(),
            });
        }
        let own_params = params
            .iter()
            .filter(|p| !parent.params.contains(p))
            .cloned()
            .collect();

        let ancestors = parent.path();

        let mut includes = parent.includes.clone();
        includes.insert(name.clone());

        let node = Arc::new(StateNode {
            name: name.clone(),
            definition,
            parent: Some(parent),
            url,
            navigable_ancestor,
            params,
            own_params,
            views,
            ancestors,
            includes,
            data,
            locals: RwLock::new(None),
        });

        tracing::debug!(
            state = %node.name(),
            url = ?node.url().map(|u| u.source()),
            params = ?node.params(),
            "State registered"
        );
        self.states.insert(name, Arc::clone(&node));
        Ok(node)
    }

    fn derive_parent(&self, definition: &StateDefinition) -> Result<Arc<StateNode>, RegistrationError> {
        let parent_name = match definition.parent.as_deref() {
            Some(explicit) if !explicit.is_empty() => Some(explicit),
            _ => definition
                .name
                .rsplit_once('.')
                .filter(|(prefix, leaf)| !prefix.is_empty() && !leaf.is_empty())
                .map(|(prefix, _)| prefix),
        };

        match parent_name {
            None => Ok(Arc::clone(&self.root)),
            Some(parent) => self.states.get(parent).cloned().ok_or_else(|| {
                RegistrationError::UnknownParent {
                    state: definition.name.clone(),
                    parent: parent.to_string(),
                }
            }),
        }
    }

    fn derive_url(
        &self,
        definition: &StateDefinition,
        parent: &Arc<StateNode>,
    ) -> Result<Option<Arc<dyn UrlMatcher>>, RegistrationError> {
        let Some(url) = definition.url.as_deref() else {
            return Ok(None);
        };
        let invalid = |source| RegistrationError::InvalidUrl {
            state: definition.name.clone(),
            url: url.to_string(),
            source,
        };

        if let Some(absolute) = url.strip_prefix(ABSOLUTE_URL_MARKER) {
            return self.matchers.compile(absolute).map(Some).map_err(invalid);
        }

        let base = parent.navigable().unwrap_or_else(|| Arc::clone(&self.root));
        match base.url() {
            Some(base_url) => base_url.concat(url).map(Some).map_err(invalid),
            None => self.matchers.compile(url).map(Some).map_err(invalid),
        }
    }

    /// Find a state by name, relative path or identity.
    ///
    /// Relative paths (`.child`, `^`, `^.sibling`) need a `base`. A name that
    /// matches nothing is `Ok(None)`; callers decide whether that is fatal.
    pub fn find(
        &self,
        target: &StateTarget,
        base: Option<&Arc<StateNode>>,
    ) -> Result<Option<Arc<StateNode>>, LookupError> {
        match target {
            StateTarget::Name(name) => {
                let absolute = self.absolute_name(name, base)?;
                Ok(self.states.get(&absolute).cloned())
            }
            StateTarget::Node(node) => Ok(self
                .states
                .get(node.name())
                .filter(|found| Arc::ptr_eq(found, node))
                .cloned()),
            StateTarget::Definition(def) => Ok(self
                .states
                .get(&def.name)
                .filter(|found| Arc::ptr_eq(found.definition(), def))
                .cloned()),
        }
    }

    fn absolute_name(&self, name: &str, base: Option<&Arc<StateNode>>) -> Result<String, LookupError> {
        if !(name.starts_with('.') || name.starts_with('^')) {
            return Ok(name.to_string());
        }
        let base = base.ok_or_else(|| LookupError::NoRelativeBase(name.to_string()))?;

        let segments: Vec<&str> = name.split('.').collect();
        let mut current = Arc::clone(base);
        let mut consumed = 0;
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() && i == 0 {
                consumed = i + 1;
                continue;
            }
            if *segment == "^" {
                current = current.parent().cloned().ok_or_else(|| LookupError::InvalidPath {
                    path: name.to_string(),
                    base: base.name().to_string(),
                })?;
                consumed = i + 1;
                continue;
            }
            break;
        }

        let rest = segments[consumed..].join(".");
        let separator = if !current.name().is_empty() && !rest.is_empty() {
            "."
        } else {
            ""
        };
        Ok(format!("{}{separator}{rest}", current.name()))
    }
}

fn derive_views(definition: &StateDefinition, parent: &StateNode) -> BTreeMap<String, ViewConfig> {
    let qualify = |name: &str| {
        if name.contains(VIEW_QUALIFIER) {
            name.to_string()
        } else {
            format!("{name}{VIEW_QUALIFIER}{}", parent.name())
        }
    };

    match &definition.views {
        Some(views) => views
            .iter()
            .map(|(name, view)| {
                (
                    qualify(name),
                    ViewConfig {
                        template: view.template.clone(),
                        controller: view.controller.clone(),
                        resolve: Some(view.resolve.clone()),
                    },
                )
            })
            .collect(),
        None => BTreeMap::from([(
            qualify(""),
            ViewConfig {
                template: definition.template.clone(),
                controller: definition.controller.clone(),
                resolve: None,
            },
        )]),
    }
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new(Arc::new(PathMatcherFactory))
    }
}

impl fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("StateRegistry").field("states", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;
    use serde_json::json;

    fn registry() -> StateRegistry {
        StateRegistry::default()
    }

    #[test]
    fn parent_is_derived_from_dotted_name() {
        let mut reg = registry();
        let blog = reg.register(StateDefinition::new("blog").url("/blog")).unwrap();
        let post = reg
            .register(StateDefinition::new("blog.post").url("/post/:post"))
            .unwrap();

        assert!(Arc::ptr_eq(post.parent().unwrap(), &blog));
        assert!(blog.parent().unwrap().is_root());
        assert_eq!(post.depth(), 2);
    }

    #[test]
    fn explicit_parent_overrides_name() {
        let mut reg = registry();
        let layout = reg.register(StateDefinition::new("layout").abstract_state()).unwrap();
        let home = reg
            .register(StateDefinition::new("home").parent("layout").url("/"))
            .unwrap();
        assert!(Arc::ptr_eq(home.parent().unwrap(), &layout));
        assert!(home.includes("layout"));
    }

    #[test]
    fn child_before_parent_fails() {
        let mut reg = registry();
        let err = reg.register(StateDefinition::new("a.b")).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::UnknownParent {
                state: "a.b".into(),
                parent: "a".into()
            }
        );
        assert!(reg.is_empty());

        reg.register(StateDefinition::new("a")).unwrap();
        let b = reg.register(StateDefinition::new("a.b")).unwrap();
        let a = reg.find(&"a".into(), None).unwrap().unwrap();
        assert!(Arc::ptr_eq(b.parent().unwrap(), &a));
    }

    #[test]
    fn rejects_invalid_and_duplicate_names() {
        let mut reg = registry();
        assert_eq!(
            reg.register(StateDefinition::new("main@home")).unwrap_err(),
            RegistrationError::InvalidName("main@home".into())
        );
        reg.register(StateDefinition::new("home")).unwrap();
        assert_eq!(
            reg.register(StateDefinition::new("home")).unwrap_err(),
            RegistrationError::DuplicateState("home".into())
        );
        assert_eq!(
            reg.register(StateDefinition::new(" ")).unwrap_err(),
            RegistrationError::InvalidName(" ".into())
        );
    }

    #[test]
    fn relative_url_composes_with_navigable_ancestor() {
        let mut reg = registry();
        reg.register(StateDefinition::new("blog").url("/blog")).unwrap();
        reg.register(StateDefinition::new("blog.section").abstract_state())
            .unwrap();
        let post = reg
            .register(StateDefinition::new("blog.section.post").url("/post/:post"))
            .unwrap();

        let url = post.url().unwrap();
        assert_eq!(url.source(), "/blog/post/:post");
        assert_eq!(url.format(&Params::new().with("post", 42)), "/blog/post/42");
    }

    #[test]
    fn absolute_url_ignores_ancestors() {
        let mut reg = registry();
        reg.register(StateDefinition::new("blog").url("/blog")).unwrap();
        let print = reg
            .register(StateDefinition::new("blog.print").url("^/print"))
            .unwrap();
        assert_eq!(print.url().unwrap().source(), "/print");
    }

    #[test]
    fn invalid_url_is_reported() {
        let mut reg = registry();
        let err = reg
            .register(StateDefinition::new("broken").url("/a/{id"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidUrl { .. }));
        assert!(reg.find(&"broken".into(), None).unwrap().is_none());
    }

    #[test]
    fn navigable_is_nearest_state_with_url() {
        let mut reg = registry();
        let blog = reg.register(StateDefinition::new("blog").url("/blog")).unwrap();
        let modal = reg.register(StateDefinition::new("blog.modal")).unwrap();
        let orphan = reg.register(StateDefinition::new("orphan")).unwrap();

        assert!(Arc::ptr_eq(&blog.navigable().unwrap(), &blog));
        assert!(Arc::ptr_eq(&modal.navigable().unwrap(), &blog));
        assert!(orphan.navigable().is_none());
        assert!(reg.root().navigable().is_none());
    }

    #[test]
    fn params_are_superset_of_parent_params() {
        let mut reg = registry();
        reg.register(StateDefinition::new("user").url("/user/:id")).unwrap();
        let posts = reg
            .register(StateDefinition::new("user.posts").url("/posts?page"))
            .unwrap();
        let details = reg.register(StateDefinition::new("user.details")).unwrap();

        assert_eq!(posts.params(), &["id", "page"]);
        assert_eq!(posts.own_params(), &["page"]);
        assert_eq!(details.params(), &["id"]);
        assert!(details.own_params().is_empty());

        for node in reg.states() {
            let parent = node.parent().unwrap();
            assert!(parent.params().iter().all(|p| node.params().contains(p)));
        }
    }

    #[test]
    fn explicit_params_conflict_with_url() {
        let mut reg = registry();
        let err = reg
            .register(StateDefinition::new("x").url("/x").params(["a"]))
            .unwrap_err();
        assert_eq!(err, RegistrationError::InvalidParams("x".into()));
    }

    #[test]
    fn dropping_a_parent_param_fails() {
        let mut reg = registry();
        reg.register(StateDefinition::new("user").url("/user/:id")).unwrap();
        let err = reg
            .register(StateDefinition::new("user.settings").params(["tab"]))
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::MissingParameter {
                state: "user.settings".into(),
                param: "id".into()
            }
        );
    }

    #[test]
    fn views_are_qualified_against_parent() {
        use crate::definition::ViewDefinition;

        let mut reg = registry();
        let home = reg
            .register(
                StateDefinition::new("home")
                    .view("main", ViewDefinition::new().template_url("tpl/home.html"))
                    .view("crumbs@", ViewDefinition::new().template_url("tpl/crumbs.html")),
            )
            .unwrap();
        let child = reg
            .register(StateDefinition::new("home.child").template("<p>child</p>"))
            .unwrap();

        let names: Vec<&String> = home.views().keys().collect();
        assert_eq!(names, ["crumbs@", "main@"]);

        let default = child.views().get("@home").unwrap();
        assert!(default.resolve.is_none());
        assert_eq!(
            default.template,
            crate::definition::TemplateSource::Inline("<p>child</p>".into())
        );
    }

    #[test]
    fn data_is_inherited_and_overridden() {
        let mut reg = registry();
        reg.register(
            StateDefinition::new("admin")
                .data("role", json!("admin"))
                .data("title", json!("Admin")),
        )
        .unwrap();
        let users = reg
            .register(StateDefinition::new("admin.users").data("title", json!("Users")))
            .unwrap();
        assert_eq!(users.data().get("role"), Some(&json!("admin")));
        assert_eq!(users.data().get("title"), Some(&json!("Users")));
    }

    #[test]
    fn path_and_includes_follow_ancestry() {
        let mut reg = registry();
        reg.register(StateDefinition::new("a")).unwrap();
        reg.register(StateDefinition::new("a.b")).unwrap();
        let c = reg.register(StateDefinition::new("a.b.c")).unwrap();

        let path = c.path();
        let names: Vec<&str> = path.iter().map(|n| n.name()).collect();
        assert_eq!(names, ["a", "a.b", "a.b.c"]);
        assert!(c.includes("a") && c.includes("a.b") && c.includes("a.b.c"));
        assert!(!c.includes("b"));
        assert!(reg.root().path().is_empty());
    }

    #[test]
    fn find_resolves_relative_paths() {
        let mut reg = registry();
        reg.register(StateDefinition::new("blog")).unwrap();
        reg.register(StateDefinition::new("blog.post")).unwrap();
        reg.register(StateDefinition::new("blog.archive")).unwrap();
        reg.register(StateDefinition::new("blog.post.comments")).unwrap();
        let post = reg.find(&"blog.post".into(), None).unwrap().unwrap();

        let name_of = |t: &str| {
            reg.find(&t.into(), Some(&post))
                .unwrap()
                .map(|n| n.name().to_string())
        };
        assert_eq!(name_of(".comments").as_deref(), Some("blog.post.comments"));
        assert_eq!(name_of("^").as_deref(), Some("blog"));
        assert_eq!(name_of("^.archive").as_deref(), Some("blog.archive"));
        assert_eq!(name_of("^.^").as_deref(), Some(""));
        assert_eq!(name_of(".missing"), None);
    }

    #[test]
    fn find_relative_errors() {
        let mut reg = registry();
        let top = reg.register(StateDefinition::new("top")).unwrap();

        assert_eq!(
            reg.find(&".child".into(), None).unwrap_err(),
            LookupError::NoRelativeBase(".child".into())
        );
        assert_eq!(
            reg.find(&"^.^.x".into(), Some(&top)).unwrap_err(),
            LookupError::InvalidPath {
                path: "^.^.x".into(),
                base: "top".into()
            }
        );
    }

    #[test]
    fn find_by_identity() {
        let mut reg = registry();
        let def = Arc::new(StateDefinition::new("home"));
        let node = reg.register(Arc::clone(&def)).unwrap();

        assert!(reg.find(&StateTarget::from(&node), None).unwrap().is_some());
        assert!(reg.find(&StateTarget::from(&def), None).unwrap().is_some());

        let stranger = Arc::new(StateDefinition::new("home"));
        assert!(reg.find(&StateTarget::from(stranger), None).unwrap().is_none());
    }
}
