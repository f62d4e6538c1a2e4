//! rtctoken - signed capability tokens for real-time channels
//!
//! Builds the version `007` access token a communication provider verifies
//! before letting a client join an audio/video channel or log in to messaging.
//! Tokens are issued, never parsed: verification happens on the provider side.

pub mod config;
pub mod error;
pub mod issuer;
pub mod token;

pub use config::IssuerConfig;
pub use error::{Result, TokenError};
pub use issuer::{
    build_channel_join_token, build_channel_join_token_with_privileges,
    build_messaging_login_token, ChannelPrivilegeExpiry,
};
pub use token::{
    AccessToken, Account, AppCertificate, ChannelPrivilege, Clock, MessagingPrivilege,
    PrivilegeMap, RandomSalt, Role, SaltSource, Service, SystemClock, TokenBuilder,
};
