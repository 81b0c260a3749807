//! In-process store used natively and in tests

use std::cell::RefCell;
use std::collections::HashSet;

use super::{Completion, CreateDotRequest, CreateDotResponse, DotStore, PersistError};

/// Lowercase, collapse non-alphanumeric runs to `-`, trim dashes; `dot` if empty
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "dot".to_string()
    } else {
        slug
    }
}

/// Resolves every call immediately with a unique slug
#[derive(Debug, Default)]
pub struct MemoryStore {
    owner: Option<String>,
    slugs: RefCell<HashSet<String>>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records created by this store are claimed by `owner`
    pub fn with_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..Self::default()
        }
    }

    /// Store whose every call fails with a network error
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.slugs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.borrow().is_empty()
    }

    fn unique_slug(&self, name: &str) -> String {
        let base = slugify(name);
        let mut slugs = self.slugs.borrow_mut();
        let mut slug = base.clone();
        let mut suffix = 2;
        while slugs.contains(&slug) {
            slug = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        slugs.insert(slug.clone());
        slug
    }
}

impl DotStore for MemoryStore {
    fn create_dot(&self, request: CreateDotRequest, done: Completion) {
        if self.offline {
            done(Err(PersistError::Network("store offline".to_string())));
            return;
        }
        if let Err(e) = request.validate() {
            done(Err(e));
            return;
        }
        let slug = self.unique_slug(&request.name);
        done(Ok(CreateDotResponse {
            id: Some(format!("mem-{}", self.len())),
            slug,
            owner_id: self.owner.clone(),
        }));
    }
}
