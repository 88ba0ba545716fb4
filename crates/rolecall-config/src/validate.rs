//! Load-time invariants for configuration documents.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::model::ConfigDocument;

/// Reject documents that a mutation could never have produced.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn validate_document(document: &ConfigDocument) -> ConfigResult<()> {
    for (index, overlord) in document.overlords.iter().enumerate() {
        if overlord.trim().is_empty() {
            return Err(ConfigError::invalid(
                format!("overlords.{index}"),
                "empty_identifier",
                None,
            ));
        }
    }

    for (community, config) in &document.communities {
        if community.trim().is_empty() {
            return Err(ConfigError::invalid(
                "communities",
                "empty_identifier",
                Some(community),
            ));
        }

        let field = format!("communities.{community}.allowedRoles");
        let mut seen = HashSet::new();
        for role in config.allowed_roles() {
            if role.trim().is_empty() {
                return Err(ConfigError::invalid(field, "empty_role", None));
            }
            if role.trim() != role {
                return Err(ConfigError::invalid(field, "padded_role", Some(role)));
            }
            if !seen.insert(role.as_str()) {
                return Err(ConfigError::invalid(field, "duplicate_role", Some(role)));
            }
        }
    }

    Ok(())
}
