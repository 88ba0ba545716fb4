//! Scripted stand-in for the chat platform's role directory.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Result, bail};
use async_trait::async_trait;
use rolecall_core::{RoleDirectory, RoleHandle};

type Catalog = BTreeMap<String, BTreeSet<String>>;
type Memberships = BTreeMap<(String, String), BTreeSet<String>>;

/// In-memory role directory with failure switches and call counting.
#[derive(Default)]
pub struct FakeDirectory {
    catalog: Mutex<Catalog>,
    memberships: Mutex<Memberships>,
    fail_lookups: AtomicBool,
    fail_grants: AtomicBool,
    fail_revokes: AtomicBool,
    calls: AtomicUsize,
}

impl FakeDirectory {
    /// Directory with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role to a community's catalog.
    #[must_use]
    pub fn with_role(self, community: &str, role: &str) -> Self {
        lock(&self.catalog)
            .entry(community.to_string())
            .or_default()
            .insert(role.to_string());
        self
    }

    /// Make every lookup return an error.
    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    /// Make every grant return an error.
    pub fn fail_grants(&self) {
        self.fail_grants.store(true, Ordering::SeqCst);
    }

    /// Make every revoke return an error.
    pub fn fail_revokes(&self) {
        self.fail_revokes.store(true, Ordering::SeqCst);
    }

    /// Number of directory calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Roles currently attached to a member.
    #[must_use]
    pub fn roles_of(&self, community: &str, actor: &str) -> Vec<String> {
        lock(&self.memberships)
            .get(&(community.to_string(), actor.to_string()))
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoleDirectory for FakeDirectory {
    async fn resolve_role(&self, community: &str, name: &str) -> Result<Option<RoleHandle>> {
        self.record_call();
        if self.fail_lookups.load(Ordering::SeqCst) {
            bail!("role lookup unavailable");
        }
        let found = lock(&self.catalog)
            .get(community)
            .is_some_and(|roles| roles.contains(name));
        Ok(found.then(|| RoleHandle {
            id: format!("{community}/{name}"),
            name: name.to_string(),
        }))
    }

    async fn grant_role(&self, community: &str, actor: &str, role: &RoleHandle) -> Result<()> {
        self.record_call();
        if self.fail_grants.load(Ordering::SeqCst) {
            bail!("missing manage-roles permission");
        }
        lock(&self.memberships)
            .entry((community.to_string(), actor.to_string()))
            .or_default()
            .insert(role.name.clone());
        Ok(())
    }

    async fn revoke_role(&self, community: &str, actor: &str, role: &RoleHandle) -> Result<()> {
        self.record_call();
        if self.fail_revokes.load(Ordering::SeqCst) {
            bail!("missing manage-roles permission");
        }
        if let Some(roles) =
            lock(&self.memberships).get_mut(&(community.to_string(), actor.to_string()))
        {
            roles.remove(&role.name);
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_directory_tracks_memberships() -> Result<()> {
        let directory = FakeDirectory::new().with_role("g", "scout");
        assert!(directory.resolve_role("g", "pilot").await?.is_none());

        let Some(handle) = directory.resolve_role("g", "scout").await? else {
            bail!("scout should resolve");
        };
        directory.grant_role("g", "m", &handle).await?;
        assert_eq!(directory.roles_of("g", "m"), ["scout"]);

        directory.revoke_role("g", "m", &handle).await?;
        assert!(directory.roles_of("g", "m").is_empty());
        assert_eq!(directory.calls(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn failure_switches_turn_calls_into_errors() {
        let directory = FakeDirectory::new().with_role("g", "scout");
        let handle = RoleHandle {
            id: "g/scout".to_string(),
            name: "scout".to_string(),
        };
        directory.fail_lookups();
        directory.fail_grants();
        directory.fail_revokes();
        assert!(directory.resolve_role("g", "scout").await.is_err());
        assert!(directory.grant_role("g", "m", &handle).await.is_err());
        assert!(directory.revoke_role("g", "m", &handle).await.is_err());
    }
}
