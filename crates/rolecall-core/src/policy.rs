//! Authorization policy for allow-list mutation.

/// The member issuing a command, as described by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Platform identifier of the member.
    pub id: String,
    /// Whether the platform reports native administrator rights in the
    /// community the command came from.
    pub is_admin: bool,
}

impl Actor {
    /// Describe a member and their native administrator flag.
    #[must_use]
    pub fn new(id: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: id.into(),
            is_admin,
        }
    }
}

/// Decide whether `actor_id` may change a community's allow-list.
///
/// Overlords pass everywhere; everyone else needs the platform's native admin
/// flag, which the caller has already scoped to the community in question.
/// `overlords` must come from the document revision being transformed.
#[must_use]
pub fn can_modify_allow_list(
    actor_id: &str,
    overlords: &[String],
    has_native_admin: bool,
) -> bool {
    has_native_admin || overlords.iter().any(|overlord| overlord == actor_id)
}
