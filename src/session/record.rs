use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::{KampusError, Result};

/// Locally cached identity of the signed-in user.
///
/// Serialized as `{"uid": .., "email": .., "displayName": ..}` under the
/// session key. Writes always replace the whole record.
///
/// # Examples
///
/// ```
/// use kampus::session::SessionRecord;
///
/// let record = SessionRecord::new("u1", Some("a@x.com".to_string()), None).unwrap();
/// assert_eq!(record.uid, "u1");
/// assert!(SessionRecord::new("", None, None).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Stable identifier issued by the identity provider
    pub uid: String,
    /// Email address, when the provider reports one
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, when the provider reports one
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SessionRecord {
    /// Builds a record, rejecting an empty or whitespace-only uid.
    pub fn new(
        uid: impl Into<String>,
        email: Option<String>,
        display_name: Option<String>,
    ) -> Result<Self> {
        let record = Self {
            uid: uid.into(),
            email,
            display_name,
        };
        record.validate()?;
        Ok(record)
    }

    /// Checks the record invariants.
    pub fn validate(&self) -> Result<()> {
        if self.uid.trim().is_empty() {
            return Err(KampusError::Storage("session uid must not be empty".to_string()).into());
        }
        Ok(())
    }
}

impl From<&Identity> for SessionRecord {
    fn from(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
        }
    }
}
