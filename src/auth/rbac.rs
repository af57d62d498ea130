//! Role hierarchy and access-control decisions.
//!
//! Roles form a strict total order: USER < MODERATOR < ADMIN. A token's
//! role claim is an open string on the wire; it is converted into the
//! closed [`Role`] enum as soon as the token is verified, so an unknown
//! role is rejected up front instead of failing somewhere downstream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::auth::token::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    const fn rank(self) -> u8 {
        match self {
            Self::User => 1,
            Self::Moderator => 2,
            Self::Admin => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The caller is known but lacks the required privileges. Maps to 403,
/// never 401.
#[derive(Debug, Error)]
#[error("insufficient privileges")]
pub struct Forbidden;

/// Errors turning a verified claim set into an [`Identity`].
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Subject claim is not a valid account id.
    #[error("invalid subject claim")]
    InvalidSubject,

    /// Role claim is missing from the hierarchy.
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
}

/// Request-scoped identity derived from a verified token. Lives only for
/// the duration of one request, inserted as an axum request extension.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn from_claims(claims: &Claims) -> Result<Self, IdentityError> {
        let user_id: i32 = claims
            .sub
            .parse()
            .map_err(|_| IdentityError::InvalidSubject)?;
        let role = claims.role.parse()?;

        Ok(Self {
            user_id,
            email: claims.email.clone(),
            role,
        })
    }

    /// Passes when this identity's role ranks at least as high as
    /// `required` in the hierarchy.
    pub const fn require_role(&self, required: Role) -> Result<(), Forbidden> {
        if self.role.rank() >= required.rank() {
            Ok(())
        } else {
            Err(Forbidden)
        }
    }

    /// Ownership rule for resource mutation: the actor owns the resource
    /// or is an admin. Role changes must NOT rely on this check alone;
    /// they always go through `require_role(Role::Admin)` as well.
    pub const fn require_self_or_admin(&self, owner_id: i32) -> Result<(), Forbidden> {
        if self.user_id == owner_id {
            Ok(())
        } else {
            self.require_role(Role::Admin)
        }
    }
}
