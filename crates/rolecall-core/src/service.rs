//! Allow-list business rules over the shared configuration store.
//!
//! # Design
//! - `allow`/`disallow` run their authorization check and mutation inside one
//!   `ConfigStore::update` transaction, against the revision being changed.
//! - `join`/`leave` only read a snapshot; the platform calls happen after the
//!   snapshot is taken and never inside a store transaction.
//! - Every failure ends up as a `Failure` variant; store and platform errors
//!   are logged here and never surface their internals to members.

use std::sync::Arc;

use rolecall_config::{
    CommunityConfig, ConfigDocument, ConfigError, ConfigStore, Transition, UpdateError,
};
use tracing::{error, info, instrument, warn};

use crate::directory::{RoleDirectory, RoleHandle};
use crate::outcome::{Failure, Mutation, Outcome, Success};
use crate::policy::{Actor, can_modify_allow_list};

/// Membership change requested through `join` or `leave`.
#[derive(Debug, Clone, Copy)]
enum Membership {
    Grant,
    Revoke,
}

/// List/join/leave/allow/disallow operations for one deployment.
#[derive(Clone)]
pub struct AllowListService {
    store: Arc<ConfigStore>,
    directory: Arc<dyn RoleDirectory>,
}

impl AllowListService {
    /// Build the service around a shared store and the platform directory.
    #[must_use]
    pub const fn new(store: Arc<ConfigStore>, directory: Arc<dyn RoleDirectory>) -> Self {
        Self { store, directory }
    }

    /// Shared configuration store backing this service.
    #[must_use]
    pub const fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Report the community's allow-list in the order roles were allowed.
    ///
    /// # Errors
    ///
    /// `CommunityNotConfigured`, `EmptyAllowList`, or `StoreUnavailable`.
    #[instrument(name = "allow_list.list", skip(self))]
    pub fn list(&self, community: &str) -> Outcome {
        let document = self.snapshot()?;
        let config = configured_allow_list(&document, community)?;
        Ok(Success::Listed {
            roles: config.allowed_roles().to_vec(),
        })
    }

    /// Attach an allowed role to the member.
    ///
    /// # Errors
    ///
    /// `MissingArgument` (before any platform call), `CommunityNotConfigured`,
    /// `EmptyAllowList`, `RoleNotAllowed`, `RoleLookupFailed`, `CannotGrant`,
    /// or `StoreUnavailable`.
    #[instrument(name = "allow_list.join", skip(self, actor), fields(actor = %actor.id))]
    pub async fn join(&self, community: &str, actor: &Actor, role: &str) -> Outcome {
        let role = required_role(role)?;
        self.change_membership(community, actor, role, Membership::Grant)
            .await?;
        info!(role, "role granted");
        Ok(Success::Joined {
            role: role.to_string(),
        })
    }

    /// Detach an allowed role from the member.
    ///
    /// # Errors
    ///
    /// Mirrors [`AllowListService::join`] with `CannotRevoke` for platform
    /// refusals.
    #[instrument(name = "allow_list.leave", skip(self, actor), fields(actor = %actor.id))]
    pub async fn leave(&self, community: &str, actor: &Actor, role: &str) -> Outcome {
        let role = required_role(role)?;
        self.change_membership(community, actor, role, Membership::Revoke)
            .await?;
        info!(role, "role revoked");
        Ok(Success::Left {
            role: role.to_string(),
        })
    }

    /// Add a role to the allow-list, creating the community entry on first use.
    ///
    /// # Errors
    ///
    /// `MissingArgument`, `Unauthorized`, `AlreadyAllowed`, `PersistFailed`,
    /// or `StoreUnavailable`.
    #[instrument(name = "allow_list.allow", skip(self, actor), fields(actor = %actor.id))]
    pub async fn allow(&self, community: &str, actor: &Actor, role: &str) -> Outcome {
        let role = required_role(role)?;
        let outcome = self
            .store
            .update(|document: &mut ConfigDocument| -> Result<_, Failure> {
                authorize(document, actor, Mutation::Allow)?;
                if document.community_entry(community).allow(role) {
                    Ok(Transition::Apply(Success::Allowed {
                        role: role.to_string(),
                    }))
                } else {
                    Err(Failure::AlreadyAllowed {
                        role: role.to_string(),
                    })
                }
            })
            .await
            .map_err(recover_update_error)?;
        info!(role, "role allowed");
        Ok(outcome)
    }

    /// Remove a role from the allow-list.
    ///
    /// Removing a role that is not listed succeeds without writing. An entry
    /// emptied by this call stays in the document.
    ///
    /// # Errors
    ///
    /// `MissingArgument`, `Unauthorized`, `CommunityNotConfigured`,
    /// `PersistFailed`, or `StoreUnavailable`.
    #[instrument(name = "allow_list.disallow", skip(self, actor), fields(actor = %actor.id))]
    pub async fn disallow(&self, community: &str, actor: &Actor, role: &str) -> Outcome {
        let role = required_role(role)?;
        let outcome = self
            .store
            .update(|document: &mut ConfigDocument| -> Result<_, Failure> {
                authorize(document, actor, Mutation::Disallow)?;
                let config = document
                    .community_mut(community)
                    .ok_or(Failure::CommunityNotConfigured)?;
                let was_listed = config.disallow(role);
                let success = Success::Disallowed {
                    role: role.to_string(),
                    was_listed,
                };
                Ok(if was_listed {
                    Transition::Apply(success)
                } else {
                    Transition::Noop(success)
                })
            })
            .await
            .map_err(recover_update_error)?;
        info!(role, "role disallowed");
        Ok(outcome)
    }

    async fn change_membership(
        &self,
        community: &str,
        actor: &Actor,
        role: &str,
        change: Membership,
    ) -> Result<(), Failure> {
        {
            let document = self.snapshot()?;
            let config = configured_allow_list(&document, community)?;
            if !config.is_allowed(role) {
                return Err(Failure::RoleNotAllowed {
                    role: role.to_string(),
                });
            }
        }

        let handle = self.resolve(community, role).await?;
        let result = match change {
            Membership::Grant => {
                self.directory
                    .grant_role(community, &actor.id, &handle)
                    .await
            }
            Membership::Revoke => {
                self.directory
                    .revoke_role(community, &actor.id, &handle)
                    .await
            }
        };

        result.map_err(|err| {
            warn!(error = %err, role, ?change, "platform refused membership change");
            match change {
                Membership::Grant => Failure::CannotGrant {
                    role: role.to_string(),
                },
                Membership::Revoke => Failure::CannotRevoke {
                    role: role.to_string(),
                },
            }
        })
    }

    async fn resolve(&self, community: &str, role: &str) -> Result<RoleHandle, Failure> {
        let lookup_failed = || Failure::RoleLookupFailed {
            role: role.to_string(),
        };
        match self.directory.resolve_role(community, role).await {
            Ok(Some(handle)) => Ok(handle),
            Ok(None) => Err(lookup_failed()),
            Err(err) => {
                warn!(error = %err, role, "role lookup failed");
                Err(lookup_failed())
            }
        }
    }

    fn snapshot(&self) -> Result<Arc<ConfigDocument>, Failure> {
        self.store.read().map_err(|err| {
            error!(error = %err, "configuration snapshot unavailable");
            Failure::StoreUnavailable
        })
    }
}

fn required_role(argument: &str) -> Result<&str, Failure> {
    let role = argument.trim();
    if role.is_empty() {
        return Err(Failure::MissingArgument);
    }
    Ok(role)
}

fn configured_allow_list<'a>(
    document: &'a ConfigDocument,
    community: &str,
) -> Result<&'a CommunityConfig, Failure> {
    let config = document
        .community(community)
        .ok_or(Failure::CommunityNotConfigured)?;
    if config.is_empty() {
        return Err(Failure::EmptyAllowList);
    }
    Ok(config)
}

fn authorize(document: &ConfigDocument, actor: &Actor, action: Mutation) -> Result<(), Failure> {
    if can_modify_allow_list(&actor.id, &document.overlords, actor.is_admin) {
        Ok(())
    } else {
        warn!(actor = %actor.id, ?action, "allow-list change denied");
        Err(Failure::Unauthorized { action })
    }
}

fn recover_update_error(err: UpdateError<Failure>) -> Failure {
    match err {
        UpdateError::Rejected(failure) => failure,
        UpdateError::Store(source) => store_failure(&source),
    }
}

fn store_failure(source: &ConfigError) -> Failure {
    if source.is_read_failure() {
        error!(error = %source, "configuration state unavailable during update");
        Failure::StoreUnavailable
    } else {
        error!(error = %source, path = ?persist_path(source), "configuration change not persisted");
        Failure::PersistFailed
    }
}

fn persist_path(source: &ConfigError) -> Option<&std::path::Path> {
    match source {
        ConfigError::PersistFailed { path, .. } => Some(path),
        _ => None,
    }
}
