//! Version 007 access token
//!
//! Wire layout, outermost first:
//! - `"007"` version prefix
//! - base64 of raw deflate of:
//!   - `[sig_len:u16][signature:32]`
//!   - signing info: `[app_id:str][issue_ts:u32][expire:u32][salt:u32][count:u16][services...]`
//!
//! Service kinds:
//! - `ChannelJoin` (type 1): audio/video channel access
//! - `MessagingLogin` (type 2): messaging session login

mod builder;
mod pack;
mod privileges;
mod service;
mod signing;

pub use builder::{
    AccessToken, Clock, FixedClock, FixedSalt, RandomSalt, SaltSource, SystemClock, TokenBuilder,
    MAX_SALT, MIN_SALT, VERSION_PREFIX,
};
pub use pack::{concat, pack_string, pack_u16, pack_u32, Packer};
pub use privileges::{ChannelPrivilege, MessagingPrivilege, PrivilegeMap};
pub use service::{
    Account, LayoutField, Role, Service, CHANNEL_JOIN_LAYOUT, MESSAGING_LOGIN_LAYOUT,
    SERVICE_TYPE_CHANNEL_JOIN, SERVICE_TYPE_MESSAGING_LOGIN,
};
pub use signing::{derive_signing_key, sign, AppCertificate, SIGNATURE_LEN};
