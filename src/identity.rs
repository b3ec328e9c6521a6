//! The caller identity extracted from a validated token.

use std::fmt;

use crate::claims::ServiceAccountClaims;
use crate::constants::{ALL_SERVICE_ACCOUNTS_GROUP, SERVICE_ACCOUNT_USERNAME_PREFIX};

/// The service account a validated token authenticates.
///
/// Only produced after both the signature and the temporal checks pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityRecord {
    /// Namespace of the service account
    pub namespace: String,
    /// Service account name
    pub name: String,
    /// Service account UID
    pub uid: String,
}

impl IdentityRecord {
    /// Returns the authenticated user name,
    /// `system:serviceaccount:<namespace>:<name>`.
    #[must_use]
    pub fn username(&self) -> String {
        format!(
            "{SERVICE_ACCOUNT_USERNAME_PREFIX}{}:{}",
            self.namespace, self.name
        )
    }

    /// Returns the groups every service account in the namespace belongs to.
    #[must_use]
    pub fn groups(&self) -> Vec<String> {
        vec![
            ALL_SERVICE_ACCOUNTS_GROUP.to_string(),
            format!("{ALL_SERVICE_ACCOUNTS_GROUP}:{}", self.namespace),
        ]
    }
}

impl From<&ServiceAccountClaims> for IdentityRecord {
    fn from(claims: &ServiceAccountClaims) -> Self {
        Self {
            namespace: claims.namespace.clone(),
            name: claims.service_account.name.clone(),
            uid: claims.service_account.uid.clone(),
        }
    }
}

impl fmt::Display for IdentityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (uid {})", self.username(), self.uid)
    }
}
