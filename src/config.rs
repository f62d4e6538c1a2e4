//! Issuer configuration
//!
//! App credentials come from the embedding application's secret storage.
//! Environment variables:
//! - `RTC_APP_ID`
//! - `RTC_APP_CERTIFICATE` (hex)
//! - `RTC_TOKEN_EXPIRE` (seconds, default 3600)
//! - `RTC_PRIVILEGE_EXPIRE` (seconds, default 3600)

use crate::error::{Result, TokenError};
use crate::token::{AccessToken, Account, Role, TokenBuilder};
use std::fmt;

pub const DEFAULT_TOKEN_EXPIRE: u32 = 3600;
pub const DEFAULT_PRIVILEGE_EXPIRE: u32 = 3600;

/// Credentials and default lifetimes for issuing tokens
#[derive(Clone)]
pub struct IssuerConfig {
    pub app_id: String,
    pub app_certificate: String,
    pub token_expire: u32,
    pub privilege_expire: u32,
}

impl IssuerConfig {
    pub fn new(app_id: impl Into<String>, app_certificate: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_certificate: app_certificate.into(),
            token_expire: DEFAULT_TOKEN_EXPIRE,
            privilege_expire: DEFAULT_PRIVILEGE_EXPIRE,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`
    ///
    /// Missing credentials and lifetimes that are not whole seconds are
    /// errors; absent lifetimes take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| TokenError::invalid(format!("{} is not set", key)))
        };
        let secs = |key: &str, default: u32| match lookup(key) {
            Some(v) => v.trim().parse::<u32>().map_err(|_| {
                TokenError::invalid(format!("{} must be a number of seconds, got '{}'", key, v))
            }),
            None => Ok(default),
        };

        Ok(Self {
            app_id: required("RTC_APP_ID")?,
            app_certificate: required("RTC_APP_CERTIFICATE")?,
            token_expire: secs("RTC_TOKEN_EXPIRE", DEFAULT_TOKEN_EXPIRE)?,
            privilege_expire: secs("RTC_PRIVILEGE_EXPIRE", DEFAULT_PRIVILEGE_EXPIRE)?,
        })
    }

    pub fn token_expire(mut self, secs: u32) -> Self {
        self.token_expire = secs;
        self
    }

    pub fn privilege_expire(mut self, secs: u32) -> Self {
        self.privilege_expire = secs;
        self
    }

    /// Validated builder on the wall clock and a random salt
    pub fn builder(&self) -> Result<TokenBuilder> {
        TokenBuilder::new(&self.app_id, &self.app_certificate)
    }

    /// Channel join token with the configured lifetimes
    pub fn channel_join_token(
        &self,
        channel_name: &str,
        account: impl Into<Account>,
        role: Role,
    ) -> Result<AccessToken> {
        self.builder()?.channel_join_token(
            channel_name,
            account,
            role,
            self.token_expire,
            self.privilege_expire,
        )
    }

    /// Messaging login token valid for the configured token lifetime
    pub fn messaging_login_token(&self, user_id: impl Into<Account>) -> Result<AccessToken> {
        self.builder()?.messaging_login_token(user_id, self.token_expire)
    }
}

impl fmt::Debug for IssuerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerConfig")
            .field("app_id", &self.app_id)
            .field("app_certificate", &"[REDACTED]")
            .field("token_expire", &self.token_expire)
            .field("privilege_expire", &self.privilege_expire)
            .finish()
    }
}
