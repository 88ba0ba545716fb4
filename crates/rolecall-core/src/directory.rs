//! Capability seam implemented by the chat-platform collaborator.

use async_trait::async_trait;

/// A role resolved inside one community's role catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHandle {
    /// Platform identifier of the role.
    pub id: String,
    /// Display name the role was resolved from.
    pub name: String,
}

/// Role lookups and membership changes performed on the chat platform.
///
/// Implementations are called outside any configuration transaction and may
/// be slow; failures are reported to the member as a permission hint.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Find a role by exact name in a community; `Ok(None)` when it does not exist.
    async fn resolve_role(
        &self,
        community: &str,
        name: &str,
    ) -> anyhow::Result<Option<RoleHandle>>;

    /// Attach a role to a member.
    async fn grant_role(
        &self,
        community: &str,
        actor: &str,
        role: &RoleHandle,
    ) -> anyhow::Result<()>;

    /// Detach a role from a member.
    async fn revoke_role(
        &self,
        community: &str,
        actor: &str,
        role: &RoleHandle,
    ) -> anyhow::Result<()>;
}
