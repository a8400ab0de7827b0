//! Params - State Parameter Values
//!
//! Parameters are always carried as strings. A declared parameter that has no
//! value is kept as `None` so that "unset" and "absent" compare equal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A set of named parameter values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Option<String>>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a present value.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(name.into(), Some(value.to_string()));
        self
    }

    /// Builder-style insert of an explicit null.
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into(), None);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.0.insert(name.into(), value);
    }

    /// Value of `name`. Unset and absent both read as `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_deref())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Keep exactly `keys`, in declaration order; missing keys become `None`.
    pub fn restrict(&self, keys: &[String]) -> Params {
        keys.iter()
            .map(|k| (k.clone(), self.get(k).map(str::to_owned)))
            .collect()
    }

    /// Returns a copy of `self` with every entry of `over` written on top.
    pub fn merged(&self, over: &Params) -> Params {
        let mut out = self.clone();
        for (k, v) in &over.0 {
            out.0.insert(k.clone(), v.clone());
        }
        out
    }

    /// Compares the values of `keys` in both sets. With no keys given, the keys
    /// of `self` are used.
    pub fn equal_for_keys(&self, other: &Params, keys: Option<&[String]>) -> bool {
        match keys {
            Some(keys) => keys.iter().all(|k| self.get(k) == other.get(k)),
            None => self.0.keys().all(|k| self.get(k) == other.get(k)),
        }
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Params(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        )
    }
}
