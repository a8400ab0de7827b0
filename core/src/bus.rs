//! Services handed to resolve factories.
//!
//! A [`Bus`] is filled once while building the router and then shared by every
//! transition through [`ResolveContext`](crate::definition::ResolveContext).
//! Services are looked up by type; string-named dependencies go through the
//! runtime's `Injector` instead.

use anyhow::anyhow;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

struct Service {
    name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct Bus {
    services: HashMap<TypeId, Service>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Send + Sync + 'static>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    /// Add a service, replacing any earlier one of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, service: T) {
        self.services.insert(
            TypeId::of::<T>(),
            Service {
                name: type_name::<T>(),
                value: Box::new(service),
            },
        );
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|service| service.value.downcast_ref())
    }

    /// Like [`Bus::get`], failing with the missing type's name so a factory
    /// can return it with `?`.
    pub fn require<T: 'static>(&self) -> anyhow::Result<&T> {
        self.get()
            .ok_or_else(|| anyhow!("{} is not on the bus", type_name::<T>()))
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.services.values().map(|service| service.name).collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}
