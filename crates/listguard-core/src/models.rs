//! Request and result types exchanged with the coordinator.
//!
//! Requests are plain values. They name a list by spool and name but hold
//! no reference into the registry.

use crate::config::ListConfig;
use crate::error::{ListError, Result};
use crate::naming::ListRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Membership class of an address on a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberMode {
    Subscriber,
    Digest,
    Nomail,
    Moderator,
    Owner,
}

impl MemberMode {
    /// Classes an ordinary member can be subscribed to or removed from.
    pub const MEMBER_MODES: [MemberMode; 3] =
        [MemberMode::Subscriber, MemberMode::Digest, MemberMode::Nomail];

    /// Classes that control a list rather than receive from it.
    pub const CONTROLLER_MODES: [MemberMode; 2] = [MemberMode::Owner, MemberMode::Moderator];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberMode::Subscriber => "Subscriber",
            MemberMode::Digest => "Digest",
            MemberMode::Nomail => "Nomail",
            MemberMode::Moderator => "Moderator",
            MemberMode::Owner => "Owner",
        }
    }

    /// Whether the mode may be used for subscribe/unsubscribe requests.
    pub fn is_membership(&self) -> bool {
        !self.is_controller()
    }

    pub fn is_controller(&self) -> bool {
        matches!(self, MemberMode::Moderator | MemberMode::Owner)
    }
}

impl fmt::Display for MemberMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to subscribe an address to a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRequest {
    pub mail: String,
    pub name: String,
    /// Moderation token passed through to the executor; empty for none.
    #[serde(default)]
    pub moderation_string: String,
    pub spool: String,
    pub welcome_mail: bool,
    pub confirmation_mail: bool,
    pub force_subscription: bool,
    pub be_quiet: bool,
    pub mail_already_subscribed: bool,
    pub mode: MemberMode,
}

impl SubRequest {
    /// A subscription to the default spool with a welcome mail.
    pub fn new(mail: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mail: mail.into(),
            name: name.into(),
            moderation_string: String::new(),
            spool: ListConfig::DEFAULT_SPOOL.to_string(),
            welcome_mail: true,
            confirmation_mail: false,
            force_subscription: false,
            be_quiet: false,
            mail_already_subscribed: false,
            mode: MemberMode::Subscriber,
        }
    }

    pub fn with_spool(mut self, spool: impl Into<String>) -> Self {
        self.spool = spool.into();
        self
    }

    pub fn with_mode(mut self, mode: MemberMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn list(&self) -> ListRef {
        ListRef::new(&self.spool, &self.name)
    }

    /// Reject modes that cannot be subscribed to.
    pub fn validate(&self) -> Result<()> {
        if self.mode.is_controller() {
            return Err(ListError::InvalidRequest {
                operation: "subscription",
                mode: self.mode,
            });
        }
        Ok(())
    }
}

/// Request to remove an address from a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubRequest {
    pub mail: String,
    pub name: String,
    pub spool: String,
    pub goodbye: bool,
    pub confirmation_mail: bool,
    pub be_quiet: bool,
    pub mail_not_subscribed: bool,
    /// `None` removes the address from every member class.
    #[serde(default)]
    pub mode: Option<MemberMode>,
}

impl UnsubRequest {
    /// An unsubscription from all member classes of a list in the default spool.
    pub fn new(mail: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mail: mail.into(),
            name: name.into(),
            spool: ListConfig::DEFAULT_SPOOL.to_string(),
            goodbye: true,
            confirmation_mail: false,
            be_quiet: false,
            mail_not_subscribed: false,
            mode: None,
        }
    }

    pub fn with_spool(mut self, spool: impl Into<String>) -> Self {
        self.spool = spool.into();
        self
    }

    pub fn with_mode(mut self, mode: MemberMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn list(&self) -> ListRef {
        ListRef::new(&self.spool, &self.name)
    }

    /// Reject modes that cannot be unsubscribed from.
    pub fn validate(&self) -> Result<()> {
        match self.mode {
            Some(mode) if mode.is_controller() => Err(ListError::InvalidRequest {
                operation: "unsubscription",
                mode,
            }),
            _ => Ok(()),
        }
    }
}

/// A change to a list's membership, as handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipChange {
    Subscribe(SubRequest),
    Unsubscribe(UnsubRequest),
}

impl MembershipChange {
    pub fn is_unsubscribe(&self) -> bool {
        matches!(self, MembershipChange::Unsubscribe(_))
    }

    pub fn list(&self) -> ListRef {
        match self {
            MembershipChange::Subscribe(r) => r.list(),
            MembershipChange::Unsubscribe(r) => r.list(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            MembershipChange::Subscribe(r) => r.validate(),
            MembershipChange::Unsubscribe(r) => r.validate(),
        }
    }
}

/// Request to create a new list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeListRequest {
    pub spool: String,
    pub name: String,
    pub domain: String,
    pub owner: String,
    pub language: String,
}

impl MakeListRequest {
    pub fn new(
        spool: impl Into<String>,
        name: impl Into<String>,
        domain: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            spool: spool.into(),
            name: name.into(),
            domain: domain.into(),
            owner: owner.into(),
            language: ListConfig::DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn list(&self) -> ListRef {
        ListRef::new(&self.spool, &self.name)
    }
}

/// Data gathered by a fan-out read together with the first error hit.
///
/// Categories whose query failed are `None` in `data`; the others keep
/// their results even when `error` is set.
#[derive(Debug)]
pub struct Partial<T> {
    pub data: T,
    pub error: Option<ListError>,
}

impl<T> Partial<T> {
    /// True if every category query succeeded.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Discard partial data if any query failed.
    pub fn into_result(self) -> Result<T> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }
}

/// The three member classes of a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLists {
    pub subscribers: Option<Vec<String>>,
    pub digest: Option<Vec<String>>,
    pub nomail: Option<Vec<String>>,
}

/// The two controller classes of a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerLists {
    pub owners: Option<Vec<String>>,
    pub moderators: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_request_defaults() {
        let r = SubRequest::new("a@example.com", "alpha");
        assert_eq!(r.spool, "/var/spool/mlmmj");
        assert!(r.welcome_mail);
        assert!(!r.confirmation_mail);
        assert!(!r.mail_already_subscribed);
        assert_eq!(r.mode, MemberMode::Subscriber);
        assert_eq!(r.list().key(), "/var/spool/mlmmj/alpha");
    }

    #[test]
    fn test_sub_request_rejects_controller_modes() {
        for mode in MemberMode::CONTROLLER_MODES {
            let err = SubRequest::new("a@example.com", "alpha")
                .with_mode(mode)
                .validate()
                .unwrap_err();
            assert!(matches!(err, ListError::InvalidRequest { operation: "subscription", .. }));
        }
        for mode in MemberMode::MEMBER_MODES {
            assert!(SubRequest::new("a@example.com", "alpha")
                .with_mode(mode)
                .validate()
                .is_ok());
        }
    }

    #[test]
    fn test_unsub_request_modes() {
        let r = UnsubRequest::new("a@example.com", "alpha");
        assert!(r.goodbye);
        assert_eq!(r.mode, None);
        assert!(r.validate().is_ok());

        let err = r.clone().with_mode(MemberMode::Owner).validate().unwrap_err();
        assert!(matches!(
            err,
            ListError::InvalidRequest {
                operation: "unsubscription",
                mode: MemberMode::Owner
            }
        ));
        assert!(r.with_mode(MemberMode::Digest).validate().is_ok());
    }

    #[test]
    fn test_membership_change() {
        let change = MembershipChange::Unsubscribe(UnsubRequest::new("a@example.com", "alpha"));
        assert!(change.is_unsubscribe());
        assert_eq!(change.list(), ListRef::new("/var/spool/mlmmj", "alpha"));
        assert!(!MembershipChange::Subscribe(SubRequest::new("a@example.com", "alpha"))
            .is_unsubscribe());
    }

    #[test]
    fn test_member_mode_serde() {
        assert_eq!(serde_json::to_string(&MemberMode::Nomail).unwrap(), "\"nomail\"");
        let mode: MemberMode = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(mode, MemberMode::Owner);
        assert_eq!(MemberMode::Digest.to_string(), "Digest");
    }

    #[test]
    fn test_partial_into_result() {
        let ok = Partial {
            data: 3,
            error: None,
        };
        assert!(ok.is_complete());
        assert_eq!(ok.into_result().unwrap(), 3);

        let failed = Partial {
            data: 3,
            error: Some(ListError::Cancelled),
        };
        assert!(!failed.is_complete());
        assert!(matches!(failed.into_result(), Err(ListError::Cancelled)));
    }
}
