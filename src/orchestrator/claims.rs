//! Per-slug exclusion between workers.
//!
//! Distinct subtasks can sanitize to the same slug and therefore the same
//! workspace. A worker claims its slug before acquiring; a second worker with
//! the same slug blocks until the first releases its claim.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct SlugClaims {
    active: Mutex<HashSet<String>>,
    freed: Condvar,
}

impl SlugClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `slug` is free, then hold it until the guard is dropped.
    pub fn claim(&self, slug: &str) -> SlugClaim<'_> {
        let mut active = self.lock();
        while active.contains(slug) {
            active = self
                .freed
                .wait(active)
                .unwrap_or_else(PoisonError::into_inner);
        }
        active.insert(slug.to_string());

        SlugClaim {
            claims: self,
            slug: slug.to_string(),
        }
    }

    pub fn is_claimed(&self, slug: &str) -> bool {
        self.lock().contains(slug)
    }

    // A panicking holder cannot leave the set inconsistent, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive hold on a slug.
#[derive(Debug)]
pub struct SlugClaim<'a> {
    claims: &'a SlugClaims,
    slug: String,
}

impl Drop for SlugClaim<'_> {
    fn drop(&mut self) {
        self.claims.lock().remove(&self.slug);
        self.claims.freed.notify_all();
    }
}
