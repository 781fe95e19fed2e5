//! Environment sources consulted at resolve time.
//!
//! A resolution run reads "the environment" through [`EnvSource`]. The live
//! process environment ([`ProcessEnv`]) is the default; an explicit
//! `HashMap`/`BTreeMap` of variables can stand in for it, which is how tests
//! and embedding applications pass a prepared environment.

use std::collections::{BTreeMap, HashMap};

/// Read-only view of a set of environment variables.
pub trait EnvSource: Send + Sync {
    /// Value of `key`, or `None` when it is unset or not valid unicode.
    fn var(&self, key: &str) -> Option<String>;
}

/// The live process environment, read on every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: std::hash::BuildHasher + Send + Sync> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
