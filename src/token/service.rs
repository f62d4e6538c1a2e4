//! Service grants packed into a token
//!
//! Each service kind has its own field order, fixed by the verifier:
//! - channel join: `[type][channel_name][account][privileges]`
//! - messaging login: `[type][privileges][user_id]`

use crate::error::{Result, TokenError};
use crate::token::pack::Packer;
use crate::token::privileges::{ChannelPrivilege, MessagingPrivilege, PrivilegeMap};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

pub const SERVICE_TYPE_CHANNEL_JOIN: u16 = 1;
pub const SERVICE_TYPE_MESSAGING_LOGIN: u16 = 2;

/// One field of a packed service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutField {
    ServiceType,
    ChannelName,
    Account,
    Privileges,
    UserId,
}

/// Wire order of a packed `Service::ChannelJoin`
pub const CHANNEL_JOIN_LAYOUT: [LayoutField; 4] = [
    LayoutField::ServiceType,
    LayoutField::ChannelName,
    LayoutField::Account,
    LayoutField::Privileges,
];

/// Wire order of a packed `Service::MessagingLogin`
pub const MESSAGING_LOGIN_LAYOUT: [LayoutField; 3] = [
    LayoutField::ServiceType,
    LayoutField::Privileges,
    LayoutField::UserId,
];

/// Publisher or subscriber in a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Join plus publish audio, video and data
    Publisher,
    /// Join only
    Subscriber,
}

impl Role {
    pub fn privileges(self) -> &'static [ChannelPrivilege] {
        match self {
            Role::Publisher => &ChannelPrivilege::ALL,
            Role::Subscriber => &[ChannelPrivilege::JoinChannel],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Publisher => write!(f, "publisher"),
            Role::Subscriber => write!(f, "subscriber"),
        }
    }
}

impl FromStr for Role {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "publisher" => Ok(Role::Publisher),
            "subscriber" => Ok(Role::Subscriber),
            _ => Err(TokenError::invalid(format!(
                "unknown role '{}': must be publisher or subscriber",
                s
            ))),
        }
    }
}

/// How a client is identified inside a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Account {
    /// Numeric user id; 0 means "any", packed as an empty string
    Uid(u32),
    /// String user account
    Name(String),
}

impl Account {
    pub fn as_wire_str(&self) -> Cow<'_, str> {
        match self {
            Account::Uid(0) => Cow::Borrowed(""),
            Account::Uid(uid) => Cow::Owned(uid.to_string()),
            Account::Name(name) => Cow::Borrowed(name),
        }
    }
}

impl From<u32> for Account {
    fn from(uid: u32) -> Self {
        Account::Uid(uid)
    }
}

impl From<&str> for Account {
    fn from(name: &str) -> Self {
        Account::Name(name.to_string())
    }
}

impl From<String> for Account {
    fn from(name: String) -> Self {
        Account::Name(name)
    }
}

/// A capability grant scoped to one sub-protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Service {
    ChannelJoin {
        channel_name: String,
        account: String,
        privileges: PrivilegeMap,
    },
    MessagingLogin {
        user_id: String,
        privileges: PrivilegeMap,
    },
}

impl Service {
    pub fn channel_join(
        channel_name: impl Into<String>,
        account: impl Into<Account>,
        privileges: PrivilegeMap,
    ) -> Self {
        Service::ChannelJoin {
            channel_name: channel_name.into(),
            account: account.into().as_wire_str().into_owned(),
            privileges,
        }
    }

    /// Channel join carrying every privilege of `role`, all expiring at `expiry`
    pub fn channel_join_for_role(
        channel_name: impl Into<String>,
        account: impl Into<Account>,
        role: Role,
        expiry: u32,
    ) -> Self {
        let privileges = role
            .privileges()
            .iter()
            .fold(PrivilegeMap::new(), |map, p| map.with_channel(*p, expiry));
        Self::channel_join(channel_name, account, privileges)
    }

    pub fn messaging_login(user_id: impl Into<Account>, expiry: u32) -> Self {
        Service::MessagingLogin {
            user_id: user_id.into().as_wire_str().into_owned(),
            privileges: PrivilegeMap::new().with_messaging(MessagingPrivilege::Login, expiry),
        }
    }

    pub fn service_type(&self) -> u16 {
        match self {
            Service::ChannelJoin { .. } => SERVICE_TYPE_CHANNEL_JOIN,
            Service::MessagingLogin { .. } => SERVICE_TYPE_MESSAGING_LOGIN,
        }
    }

    pub fn layout(&self) -> &'static [LayoutField] {
        match self {
            Service::ChannelJoin { .. } => &CHANNEL_JOIN_LAYOUT,
            Service::MessagingLogin { .. } => &MESSAGING_LOGIN_LAYOUT,
        }
    }

    pub fn privileges(&self) -> &PrivilegeMap {
        match self {
            Service::ChannelJoin { privileges, .. } => privileges,
            Service::MessagingLogin { privileges, .. } => privileges,
        }
    }

    pub fn pack_into(&self, packer: &mut Packer) -> Result<()> {
        packer.put_u16(self.service_type());
        match self {
            Service::ChannelJoin {
                channel_name,
                account,
                privileges,
            } => {
                packer.put_str(channel_name)?;
                packer.put_str(account)?;
                privileges.pack_into(packer)?;
            }
            Service::MessagingLogin {
                user_id,
                privileges,
            } => {
                privileges.pack_into(packer)?;
                packer.put_str(user_id)?;
            }
        }
        Ok(())
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut packer = Packer::new();
        self.pack_into(&mut packer)?;
        Ok(packer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::pack::{pack_string, pack_u16};

    /// Encode a service field by field, following its layout constant
    fn pack_by_layout(service: &Service) -> Vec<u8> {
        let mut out = Vec::new();
        for field in service.layout() {
            let bytes = match (field, service) {
                (LayoutField::ServiceType, s) => pack_u16(s.service_type()).to_vec(),
                (LayoutField::Privileges, s) => s.privileges().pack().unwrap(),
                (LayoutField::ChannelName, Service::ChannelJoin { channel_name, .. }) => {
                    pack_string(channel_name).unwrap()
                }
                (LayoutField::Account, Service::ChannelJoin { account, .. }) => {
                    pack_string(account).unwrap()
                }
                (LayoutField::UserId, Service::MessagingLogin { user_id, .. }) => {
                    pack_string(user_id).unwrap()
                }
                (field, s) => panic!("{:?} is not a field of {:?}", field, s),
            };
            out.extend(bytes);
        }
        out
    }

    #[test]
    fn test_channel_join_layout() {
        let service = Service::channel_join_for_role("room1", "42", Role::Subscriber, 1000);
        let packed = service.pack().unwrap();

        assert_eq!(packed, pack_by_layout(&service));
        assert_eq!(
            packed,
            vec![
                1, 0, // type
                5, 0, b'r', b'o', b'o', b'm', b'1', // channel
                2, 0, b'4', b'2', // account
                1, 0, 1, 0, 0xe8, 0x03, 0, 0, // privileges
            ]
        );
    }

    #[test]
    fn test_messaging_login_layout() {
        let service = Service::messaging_login("bob", 1000);
        let packed = service.pack().unwrap();

        assert_eq!(packed, pack_by_layout(&service));
        assert_eq!(
            packed,
            vec![
                2, 0, // type
                1, 0, 1, 0, 0xe8, 0x03, 0, 0, // privileges
                3, 0, b'b', b'o', b'b', // user id
            ]
        );
    }

    #[test]
    fn test_layout_constants() {
        assert_eq!(
            CHANNEL_JOIN_LAYOUT,
            [
                LayoutField::ServiceType,
                LayoutField::ChannelName,
                LayoutField::Account,
                LayoutField::Privileges
            ]
        );
        assert_eq!(
            MESSAGING_LOGIN_LAYOUT,
            [
                LayoutField::ServiceType,
                LayoutField::Privileges,
                LayoutField::UserId
            ]
        );
    }

    #[test]
    fn test_service_types() {
        assert_eq!(Service::messaging_login("u", 0).service_type(), 2);
        assert_eq!(
            Service::channel_join("c", 0u32, PrivilegeMap::new()).service_type(),
            1
        );
    }

    #[test]
    fn test_role_privileges() {
        let publisher = Service::channel_join_for_role("c", "a", Role::Publisher, 9);
        assert_eq!(
            publisher.privileges().sorted(),
            vec![(1, 9), (2, 9), (3, 9), (4, 9)]
        );

        let subscriber = Service::channel_join_for_role("c", "a", Role::Subscriber, 9);
        assert_eq!(subscriber.privileges().sorted(), vec![(1, 9)]);
    }

    #[test]
    fn test_account_wire_string() {
        assert_eq!(Account::Uid(0).as_wire_str(), "");
        assert_eq!(Account::Uid(42).as_wire_str(), "42");
        assert_eq!(Account::from("alice").as_wire_str(), "alice");

        let service = Service::channel_join("c", 0u32, PrivilegeMap::new());
        assert!(matches!(service, Service::ChannelJoin { ref account, .. } if account.is_empty()));
    }

    #[test]
    fn test_messaging_login_uid_zero_is_empty_user() {
        let by_uid = Service::messaging_login(0u32, 5);
        assert!(matches!(by_uid, Service::MessagingLogin { ref user_id, .. } if user_id.is_empty()));
        assert_eq!(by_uid.pack().unwrap(), Service::messaging_login("", 5).pack().unwrap());

        let numbered = Service::messaging_login(42u32, 5);
        assert_eq!(numbered, Service::messaging_login("42", 5));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Subscriber).unwrap(), "\"subscriber\"");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Publisher".parse::<Role>().unwrap(), Role::Publisher);
        assert_eq!("subscriber".parse::<Role>().unwrap(), Role::Subscriber);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Publisher.to_string(), "publisher");
    }
}
