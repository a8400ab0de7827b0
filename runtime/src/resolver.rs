//! Dependency Resolver
//!
//! Turns one state's `resolve` maps into a [`Locals`] record. Each state's work
//! is a shared future that also awaits its parent's, so a chain of entered
//! states resolves concurrently while each state still sees its ancestors'
//! values.

use crate::error::ResolveError;
use crate::injector::Injector;
use crate::template::{TemplateLoader, ViewLoad};
use futures_util::future::{self, Shared, try_join_all};
use futures_util::{FutureExt, TryFutureExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;
use waymark_core::{
    BoxFuture, Bus, Globals, Locals, Params, ResolveContext, ResolveMap, Resolvable, StateNode,
    ViewLocals,
};

pub type ResolveResult = Result<Arc<Locals>, Arc<ResolveError>>;

/// A state's resolution, awaitable by any number of descendants.
pub type SharedLocals = Shared<BoxFuture<'static, ResolveResult>>;

#[derive(Clone)]
pub struct Resolver {
    injector: Arc<dyn Injector>,
    templates: Arc<dyn TemplateLoader>,
    bus: Arc<Bus>,
}

impl Resolver {
    pub fn new(injector: Arc<dyn Injector>, templates: Arc<dyn TemplateLoader>, bus: Arc<Bus>) -> Self {
        Self {
            injector,
            templates,
            bus,
        }
    }

    /// An already-resolved link, used to seed a chain with committed locals.
    pub fn ready(locals: Arc<Locals>) -> SharedLocals {
        let ready: BoxFuture<'static, ResolveResult> = Box::pin(future::ready(Ok(locals)));
        ready.shared()
    }

    /// Start resolving `node` on top of `inherited`.
    ///
    /// Nothing runs until the returned future (or a descendant) is polled.
    pub fn resolve_state(&self, node: &Arc<StateNode>, params: &Params, inherited: SharedLocals) -> SharedLocals {
        let state = node.name().to_string();
        let params = params.restrict(node.params());
        let context = ResolveContext {
            state: state.clone(),
            params: params.clone(),
            bus: Arc::clone(&self.bus),
        };

        let globals_work = resolve_entries(
            Arc::clone(&self.injector),
            context.clone(),
            node.definition().resolve.clone(),
        );

        let views_work = try_join_all(node.views().iter().map(|(view, config)| {
            let load = ViewLoad {
                view: view.clone(),
                state: state.clone(),
                source: config.template.clone(),
                params: params.clone(),
            };
            let templates = Arc::clone(&self.templates);
            let template = async move {
                templates
                    .load(&load)
                    .await
                    .map_err(|source| ResolveError::Template {
                        view: load.view.clone(),
                        source,
                    })
            };
            let values = resolve_entries(
                Arc::clone(&self.injector),
                context.clone(),
                config.resolve.clone().unwrap_or_default(),
            );
            let view = view.clone();
            let controller = config.controller.clone();
            future::try_join(template, values)
                .map_ok(move |(template, values)| (view, controller, template, values))
        }));

        let span = tracing::debug_span!("Resolve", waymark.state = %state);
        let work = async move {
            let (parent, own, views) = futures_util::try_join!(
                inherited,
                globals_work.map_err(Arc::new),
                views_work.map_err(Arc::new),
            )?;

            let mut globals = Globals::new(state.clone(), params.clone());
            for (key, value) in own {
                globals.insert(key, value);
            }
            globals.inherit(parent.globals());

            let views = views
                .into_iter()
                .map(|(view, controller, template, values)| {
                    let mut locals =
                        ViewLocals::new(view.clone(), state.clone(), template, controller, params.clone());
                    for (key, value) in values {
                        locals.insert(key, value);
                    }
                    locals.inherit(&globals);
                    (view, Arc::new(locals))
                })
                .collect::<BTreeMap<_, _>>();

            tracing::debug!(views = views.len(), "State resolved");
            Ok::<_, Arc<ResolveError>>(Arc::new(Locals::new(globals, views)))
        }
        .instrument(span);

        let work: BoxFuture<'static, ResolveResult> = Box::pin(work);
        work.shared()
    }
}

/// Resolve every entry of `map` concurrently; the first failure wins.
async fn resolve_entries(
    injector: Arc<dyn Injector>,
    context: ResolveContext,
    map: ResolveMap,
) -> Result<Vec<(String, Value)>, ResolveError> {
    let entries = map.into_iter().map(|(key, resolvable)| {
        let injector = Arc::clone(&injector);
        let context = context.clone();
        async move {
            let state = context.state.clone();
            let value = match resolvable {
                Resolvable::Service(service) => {
                    let found = injector.get(&service).await;
                    found.ok_or_else(|| ResolveError::UnknownService {
                        state,
                        key: key.clone(),
                        service,
                    })?
                }
                Resolvable::Factory(factory) => {
                    factory(context)
                        .await
                        .map_err(|source| ResolveError::Factory {
                            state,
                            key: key.clone(),
                            source,
                        })?
                }
            };
            Ok((key, value))
        }
    });
    try_join_all(entries).await
}
