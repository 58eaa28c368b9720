//! In-memory set of leaderboard-eligible users.

use crate::domain::Address;
use std::collections::BTreeSet;
use std::sync::RwLock;

/// Process-wide registry of lowercased addresses.
///
/// Addresses arrive canonicalized by [`Address`] parsing, so membership is
/// naturally case-insensitive and duplicate-free.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<BTreeSet<Address>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user; true when the insertion was new.
    pub fn register(&self, user: &Address) -> bool {
        self.users.write().unwrap().insert(user.clone())
    }

    /// Remove a user; true when it was present.
    pub fn unregister(&self, user: &Address) -> bool {
        self.users.write().unwrap().remove(user)
    }

    pub fn contains(&self, user: &Address) -> bool {
        self.users.read().unwrap().contains(user)
    }

    /// Sorted snapshot of the registered set.
    pub fn list(&self) -> Vec<Address> {
        self.users.read().unwrap().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().unwrap().is_empty()
    }
}
