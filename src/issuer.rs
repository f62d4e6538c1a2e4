//! Convenience entry points for the two service kinds
//!
//! Privilege lifetimes are given in seconds relative to the issue time and
//! stored as absolute expiries. A relative lifetime of 0 is stored as 0,
//! which the verifier reads as "no privilege expiry".

use crate::error::Result;
use crate::token::{
    AccessToken, Account, ChannelPrivilege, Clock, PrivilegeMap, Role, SaltSource, Service,
    TokenBuilder,
};

/// Per-privilege lifetimes for a channel join, in seconds from issue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelPrivilegeExpiry {
    pub join_channel: u32,
    pub publish_audio: u32,
    pub publish_video: u32,
    pub publish_data: u32,
}

impl ChannelPrivilegeExpiry {
    /// Every privilege of `role` with the same lifetime
    pub fn for_role(role: Role, expire: u32) -> Self {
        match role {
            Role::Publisher => Self {
                join_channel: expire,
                publish_audio: expire,
                publish_video: expire,
                publish_data: expire,
            },
            Role::Subscriber => Self {
                join_channel: expire,
                ..Self::default()
            },
        }
    }

    fn entries(&self) -> [(ChannelPrivilege, u32); 4] {
        [
            (ChannelPrivilege::JoinChannel, self.join_channel),
            (ChannelPrivilege::PublishAudio, self.publish_audio),
            (ChannelPrivilege::PublishVideo, self.publish_video),
            (ChannelPrivilege::PublishData, self.publish_data),
        ]
    }
}

fn absolute_expiry(issue_ts: u32, relative: u32) -> u32 {
    if relative == 0 {
        0
    } else {
        issue_ts.saturating_add(relative)
    }
}

impl<C: Clock, S: SaltSource> TokenBuilder<C, S> {
    /// Token to join `channel_name` as `role`
    pub fn channel_join_token(
        &self,
        channel_name: &str,
        account: impl Into<Account>,
        role: Role,
        token_expire: u32,
        privilege_expire: u32,
    ) -> Result<AccessToken> {
        let issue_ts = self.now();
        let service = Service::channel_join_for_role(
            channel_name,
            account,
            role,
            absolute_expiry(issue_ts, privilege_expire),
        );
        self.build_at(issue_ts, &[service], token_expire)
    }

    /// Token to join `channel_name` with an individual lifetime per privilege
    ///
    /// Join is always granted. Publish privileges with a lifetime of 0 are
    /// left out of the token rather than granted without expiry.
    pub fn channel_join_token_with_privileges(
        &self,
        channel_name: &str,
        account: impl Into<Account>,
        expiry: ChannelPrivilegeExpiry,
        token_expire: u32,
    ) -> Result<AccessToken> {
        let issue_ts = self.now();
        let privileges = expiry
            .entries()
            .into_iter()
            .filter(|(p, relative)| *p == ChannelPrivilege::JoinChannel || *relative > 0)
            .fold(PrivilegeMap::new(), |map, (p, relative)| {
                map.with_channel(p, absolute_expiry(issue_ts, relative))
            });
        let service = Service::channel_join(channel_name, account, privileges);
        self.build_at(issue_ts, &[service], token_expire)
    }

    /// Token to log in to messaging as `user_id`
    pub fn messaging_login_token(
        &self,
        user_id: impl Into<Account>,
        expire: u32,
    ) -> Result<AccessToken> {
        let issue_ts = self.now();
        let service = Service::messaging_login(user_id, absolute_expiry(issue_ts, expire));
        self.build_at(issue_ts, &[service], expire)
    }
}

/// Channel join token using the wall clock and a random salt
pub fn build_channel_join_token(
    app_id: &str,
    app_certificate: &str,
    channel_name: &str,
    account: impl Into<Account>,
    role: Role,
    token_expire: u32,
    privilege_expire: u32,
) -> Result<AccessToken> {
    TokenBuilder::new(app_id, app_certificate)?.channel_join_token(
        channel_name,
        account,
        role,
        token_expire,
        privilege_expire,
    )
}

/// Channel join token with per-privilege lifetimes
pub fn build_channel_join_token_with_privileges(
    app_id: &str,
    app_certificate: &str,
    channel_name: &str,
    account: impl Into<Account>,
    expiry: ChannelPrivilegeExpiry,
    token_expire: u32,
) -> Result<AccessToken> {
    TokenBuilder::new(app_id, app_certificate)?.channel_join_token_with_privileges(
        channel_name,
        account,
        expiry,
        token_expire,
    )
}

/// Messaging login token using the wall clock and a random salt
pub fn build_messaging_login_token(
    app_id: &str,
    app_certificate: &str,
    user_id: impl Into<Account>,
    expire: u32,
) -> Result<AccessToken> {
    TokenBuilder::new(app_id, app_certificate)?.messaging_login_token(user_id, expire)
}
