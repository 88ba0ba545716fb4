//! Typed models for the persisted configuration document.
//!
//! # Design
//! - One aggregate (`ConfigDocument`) serialised as a single JSON object with
//!   camelCase keys so the file stays hand-editable.
//! - Communities live in an ordered map so rewrites produce a stable file.
//! - `CommunityConfig` keeps its role list private; every mutation goes through
//!   methods that preserve the no-duplicates invariant.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The single persisted configuration aggregate.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Opaque credential for the chat platform connection.
    pub connection_secret: String,
    /// Actors with administrative override across every community.
    #[serde(default)]
    pub overlords: Vec<String>,
    /// Per-community settings keyed by community identifier.
    #[serde(default)]
    pub communities: BTreeMap<String, CommunityConfig>,
    /// Decorative strings; carried through untouched.
    #[serde(default)]
    pub faces: Vec<String>,
}

impl ConfigDocument {
    /// Build an empty document around a connection secret.
    #[must_use]
    pub fn new(connection_secret: impl Into<String>) -> Self {
        Self {
            connection_secret: connection_secret.into(),
            overlords: Vec::new(),
            communities: BTreeMap::new(),
            faces: Vec::new(),
        }
    }

    /// Look up the settings for a community, if it has been configured.
    #[must_use]
    pub fn community(&self, community: &str) -> Option<&CommunityConfig> {
        self.communities.get(community)
    }

    /// Mutable access to an existing community entry.
    pub fn community_mut(&mut self, community: &str) -> Option<&mut CommunityConfig> {
        self.communities.get_mut(community)
    }

    /// Mutable access to a community entry, creating an empty one when absent.
    pub fn community_entry(&mut self, community: &str) -> &mut CommunityConfig {
        self.communities.entry(community.to_string()).or_default()
    }

    /// Whether the actor holds the global administrator override.
    #[must_use]
    pub fn is_overlord(&self, actor: &str) -> bool {
        self.overlords.iter().any(|overlord| overlord == actor)
    }
}

impl fmt::Debug for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDocument")
            .field("connection_secret", &"<redacted>")
            .field("overlords", &self.overlords)
            .field("communities", &self.communities)
            .field("faces", &self.faces)
            .finish()
    }
}

/// Settings for one community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityConfig {
    #[serde(default)]
    allowed_roles: Vec<String>,
}

impl CommunityConfig {
    /// Build a community entry from role names, dropping repeated names.
    #[must_use]
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        for role in roles {
            config.allow(role);
        }
        config
    }

    /// Role names in the order they were allowed.
    #[must_use]
    pub fn allowed_roles(&self) -> &[String] {
        &self.allowed_roles
    }

    /// Whether the allow-list contains the exact role name.
    #[must_use]
    pub fn is_allowed(&self, role: &str) -> bool {
        self.allowed_roles.iter().any(|allowed| allowed == role)
    }

    /// Whether no roles have been allowed yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.allowed_roles.is_empty()
    }

    /// Append a role; returns `false` when it was already present.
    pub fn allow(&mut self, role: impl Into<String>) -> bool {
        let role = role.into();
        if self.is_allowed(&role) {
            return false;
        }
        self.allowed_roles.push(role);
        true
    }

    /// Remove a role; returns `false` when it was not present.
    pub fn disallow(&mut self, role: &str) -> bool {
        let before = self.allowed_roles.len();
        self.allowed_roles.retain(|allowed| allowed != role);
        self.allowed_roles.len() != before
    }
}
