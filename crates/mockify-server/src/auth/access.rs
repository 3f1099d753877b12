//! Ownership-based access control
//!
//! Access is strict ownership equality: the caller must be the user at the end
//! of the resource's ownership chain. There is no superuser bypass and no
//! shared or team membership, even though organizations could imply one.

use super::error::{AuthError, Result};
use crate::types::UserId;

/// Allow `user_id` to act on a resource owned by `owner_id`, or fail with
/// [`AuthError::Forbidden`] naming `resource`
pub fn check_access(user_id: UserId, owner_id: UserId, resource: &str) -> Result<()> {
    if user_id == owner_id {
        return Ok(());
    }

    tracing::warn!(user_id, owner_id, resource, "Access denied");
    Err(AuthError::Forbidden(resource.to_string()))
}
