//! Marketplace accounts as listed by the admin dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Resource;
use crate::types::{AccountId, AccountStatus, RoleId, RoleName};

/// A login account and its attached user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: AccountId,
    pub email: String,
    #[serde(rename = "role_id", default)]
    pub role: Option<RoleRef>,
    pub status: AccountStatus,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub user: Option<AccountProfile>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The user profile attached to an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Populated role reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    #[serde(rename = "_id")]
    pub id: RoleId,
    #[serde(default)]
    pub name: Option<RoleName>,
}

impl Account {
    /// Full name from the profile, if any.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.user.as_ref()?.full_name.as_deref()
    }

    /// Phone number from the profile, if any.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.user.as_ref()?.phone.as_deref()
    }

    /// Name used in confirmations: full name, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Body of `PUT /admin/updateAccount/{id}`.
///
/// Only the fields that changed are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AccountStatus>,
}

impl AccountPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub const fn status(status: AccountStatus) -> Self {
        Self {
            full_name: None,
            status: Some(status),
        }
    }

    /// Whether the patch carries no field at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.status.is_none()
    }
}

impl Resource for Account {
    type Id = AccountId;
    type Patch = AccountPatch;

    const KIND: &'static str = "account";

    fn id(&self) -> &AccountId {
        &self.id
    }

    fn apply_patch(&mut self, patch: &AccountPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(full_name) = &patch.full_name {
            self.user.get_or_insert_with(AccountProfile::default).full_name =
                Some(full_name.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Account {
        serde_json::from_value(serde_json::json!({
            "_id": "a1",
            "email": "lan@example.com",
            "role_id": {"_id": "68e44bdbd727678bb4233108", "name": "CUSTOMER"},
            "status": "ACTIVE",
            "email_verified": true,
            "user": {"full_name": "Nguyen Lan", "phone": "0901234567"},
            "createdAt": "2025-10-01T08:30:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_decodes_backend_shape() {
        let account = sample();
        assert_eq!(account.id.as_str(), "a1");
        assert_eq!(account.full_name(), Some("Nguyen Lan"));
        assert_eq!(account.phone(), Some("0901234567"));
        assert_eq!(account.role.unwrap().name, Some(RoleName::Customer));
    }

    #[test]
    fn test_status_patch_leaves_other_fields() {
        let before = sample();
        let mut after = before.clone();
        after.apply_patch(&AccountPatch::status(AccountStatus::Pending));

        assert_eq!(after.status, AccountStatus::Pending);
        assert_eq!(after.email, before.email);
        assert_eq!(after.user, before.user);
        assert_eq!(after.role, before.role);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn test_name_patch_creates_missing_profile() {
        let mut account = sample();
        account.user = None;
        account.apply_patch(&AccountPatch {
            full_name: Some("Tran Minh".to_owned()),
            status: None,
        });
        assert_eq!(account.full_name(), Some("Tran Minh"));
        assert_eq!(account.status, AccountStatus::Active);
    }

    #[test]
    fn test_patch_serializes_only_sent_fields() {
        let json = serde_json::to_value(AccountPatch::status(AccountStatus::Pending)).unwrap();
        assert_eq!(json, serde_json::json!({"status": "PENDING"}));
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut account = sample();
        account.user = None;
        assert_eq!(account.display_name(), "lan@example.com");
    }
}
