//! Token assembly: sign, compress, encode

use crate::error::{Result, TokenError};
use crate::token::pack::Packer;
use crate::token::service::Service;
use crate::token::signing::{derive_signing_key, sign, AppCertificate, SIGNATURE_LEN};
use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Wire-format revision expected by the verifier
pub const VERSION_PREFIX: &str = "007";

/// Salt bounds, inclusive
pub const MIN_SALT: u32 = 1;
pub const MAX_SALT: u32 = 99_999_999;

/// Source of the token issue time
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch
    fn now_secs(&self) -> u32;
}

/// Source of the per-token salt
pub trait SaltSource: Send + Sync {
    /// A salt in `MIN_SALT..=MAX_SALT`
    fn next_salt(&self) -> u32;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_secs(&self) -> u32 {
        (**self).now_secs()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_secs(&self) -> u32 {
        (**self).now_secs()
    }
}

impl<T: SaltSource + ?Sized> SaltSource for &T {
    fn next_salt(&self) -> u32 {
        (**self).next_salt()
    }
}

impl<T: SaltSource + ?Sized> SaltSource for Arc<T> {
    fn next_salt(&self) -> u32 {
        (**self).next_salt()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u32 {
        unix_secs(SystemTime::now())
    }
}

/// Seconds since the epoch, clamped to the u32 timestamp range
fn unix_secs(now: SystemTime) -> u32 {
    let secs = match now.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs(),
        Err(e) => {
            warn!(behind_epoch = ?e.duration(), "System clock is before the Unix epoch");
            0
        }
    };
    u32::try_from(secs).unwrap_or_else(|_| {
        warn!(secs = secs, "System clock is past the u32 timestamp range");
        u32::MAX
    })
}

/// Salt drawn from the thread-local CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSalt;

impl SaltSource for RandomSalt {
    fn next_salt(&self) -> u32 {
        rand::rng().random_range(MIN_SALT..=MAX_SALT)
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn now_secs(&self) -> u32 {
        self.0
    }
}

/// Salt pinned to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSalt(pub u32);

impl SaltSource for FixedSalt {
    fn next_salt(&self) -> u32 {
        self.0
    }
}

/// A built token: `"007"` followed by base64 of the compressed content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<AccessToken> for String {
    fn from(token: AccessToken) -> Self {
        token.0
    }
}

/// Issues tokens for one app
///
/// Holds no mutable state, so a single builder can be shared across threads.
/// Clock and salt source are injectable to pin output in tests.
#[derive(Debug, Clone)]
pub struct TokenBuilder<C = SystemClock, S = RandomSalt> {
    app_id: String,
    certificate: AppCertificate,
    clock: C,
    salt: S,
}

impl TokenBuilder {
    /// Builder using the wall clock and a random salt
    pub fn new(app_id: &str, app_certificate_hex: &str) -> Result<Self> {
        Self::with_sources(app_id, app_certificate_hex, SystemClock, RandomSalt)
    }
}

impl<C: Clock, S: SaltSource> TokenBuilder<C, S> {
    /// Builder with explicit clock and salt source
    ///
    /// Credentials are validated here, before either source is touched.
    pub fn with_sources(app_id: &str, app_certificate_hex: &str, clock: C, salt: S) -> Result<Self> {
        if app_id.is_empty() {
            return Err(TokenError::invalid("app id is empty"));
        }
        let certificate = AppCertificate::from_hex(app_certificate_hex)?;

        Ok(Self {
            app_id: app_id.to_string(),
            certificate,
            clock,
            salt,
        })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Current time according to this builder's clock
    pub fn now(&self) -> u32 {
        self.clock.now_secs()
    }

    /// Build a token for `services`, valid `expire` seconds from now
    pub fn build_token(&self, services: &[Service], expire: u32) -> Result<AccessToken> {
        let issue_ts = self.clock.now_secs();
        self.build_at(issue_ts, services, expire)
    }

    /// Build with an issue time already read from this builder's clock
    pub(crate) fn build_at(
        &self,
        issue_ts: u32,
        services: &[Service],
        expire: u32,
    ) -> Result<AccessToken> {
        let salt = self.salt.next_salt();
        let info = self.signing_info(issue_ts, expire, salt, services)?;

        let signing_key = derive_signing_key(&self.certificate, issue_ts, salt)?;
        let signature = sign(&signing_key, &info)?;

        let mut content = Packer::with_capacity(2 + SIGNATURE_LEN + info.len());
        content.put_bytes(&signature)?;
        content.put_raw(&info);

        let compressed = deflate(&content.finish())?;
        let token = format!("{}{}", VERSION_PREFIX, STANDARD.encode(compressed));

        debug!(
            app_id = %self.app_id,
            services = services.len(),
            issue_ts = issue_ts,
            expire = expire,
            "Built access token"
        );

        Ok(AccessToken(token))
    }

    fn signing_info(
        &self,
        issue_ts: u32,
        expire: u32,
        salt: u32,
        services: &[Service],
    ) -> Result<Vec<u8>> {
        let mut info = Packer::new();
        info.put_str(&self.app_id)?;
        info.put_u32(issue_ts).put_u32(expire).put_u32(salt);
        info.put_len(services.len(), "service list")?;
        for service in services {
            service.pack_into(&mut info)?;
        }
        Ok(info.finish())
    }
}

/// Raw deflate: no zlib header, trailer or checksum
fn deflate(content: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::service::Role;
    use flate2::read::DeflateDecoder;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const APP_ID: &str = "970CA35de60c44645bbae8a215061b33";
    const CERT: &str = "5CFd2fd1755d40ecb72977518be15d3b";

    fn pinned() -> TokenBuilder<FixedClock, FixedSalt> {
        TokenBuilder::with_sources(APP_ID, CERT, FixedClock(1_700_000_000), FixedSalt(12345)).unwrap()
    }

    fn inflate(token: &AccessToken) -> Vec<u8> {
        let b64 = token.as_str().strip_prefix(VERSION_PREFIX).unwrap();
        let compressed = STANDARD.decode(b64).unwrap();
        let mut out = Vec::new();
        DeflateDecoder::new(&compressed[..]).read_to_end(&mut out).unwrap();
        out
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl Clock for Counting {
        fn now_secs(&self) -> u32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            1
        }
    }

    impl SaltSource for Counting {
        fn next_salt(&self) -> u32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            1
        }
    }

    #[test]
    fn test_token_has_version_prefix() {
        let token = pinned().build_token(&[], 600).unwrap();
        assert!(token.as_str().starts_with("007"));
        assert!(STANDARD.decode(&token.as_str()[3..]).is_ok());
    }

    #[test]
    fn test_content_starts_with_signature() {
        let service = Service::channel_join_for_role("ch", "u", Role::Publisher, 0);
        let token = pinned().build_token(&[service], 600).unwrap();
        let content = inflate(&token);

        assert_eq!(&content[..2], &[32, 0]);
        let info = &content[2 + SIGNATURE_LEN..];
        assert_eq!(&info[..2], &[32, 0]);
        assert_eq!(&info[2..34], APP_ID.as_bytes());
    }

    #[test]
    fn test_signature_matches_recomputed_hmac() {
        let builder = pinned();
        let content = inflate(&builder.build_token(&[], 600).unwrap());
        let info = &content[2 + SIGNATURE_LEN..];

        let key = derive_signing_key(&AppCertificate::from_hex(CERT).unwrap(), 1_700_000_000, 12345)
            .unwrap();
        assert_eq!(&content[2..2 + SIGNATURE_LEN], &sign(&key, info).unwrap());
    }

    #[test]
    fn test_output_is_raw_deflate() {
        let token = pinned().build_token(&[], 600).unwrap();
        let compressed = STANDARD.decode(&token.as_str()[3..]).unwrap();

        // A zlib stream would open with 0x78
        assert_ne!(compressed[0], 0x78);
        let mut out = Vec::new();
        assert!(flate2::read::ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut out)
            .is_err());
    }

    #[test]
    fn test_deterministic_with_pinned_sources() {
        let services = [Service::messaging_login("alice", 1_700_003_600)];
        let a = pinned().build_token(&services, 3600).unwrap();
        let b = pinned().build_token(&services, 3600).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_salt_changes_signature() {
        let services = [Service::messaging_login("alice", 0)];
        let other = TokenBuilder::with_sources(APP_ID, CERT, FixedClock(1_700_000_000), FixedSalt(12346))
            .unwrap();

        let a = inflate(&pinned().build_token(&services, 3600).unwrap());
        let b = inflate(&other.build_token(&services, 3600).unwrap());
        assert_ne!(&a[2..34], &b[2..34]);
    }

    #[test]
    fn test_invalid_credentials_touch_no_source() {
        let counting = Counting::default();

        let odd = TokenBuilder::with_sources(APP_ID, "abc", &counting, &counting);
        assert!(matches!(odd, Err(TokenError::InvalidInput(_))));

        let empty_id = TokenBuilder::with_sources("", CERT, &counting, &counting);
        assert!(matches!(empty_id, Err(TokenError::InvalidInput(_))));

        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_oversize_field_rejected() {
        let long = "c".repeat(u16::MAX as usize + 1);
        let service = Service::channel_join_for_role(long, "u", Role::Subscriber, 0);
        let result = pinned().build_token(&[service], 600);
        assert!(matches!(result, Err(TokenError::InvalidInput(_))));
    }

    #[test]
    fn test_too_many_services_rejected_before_signing() {
        let services = vec![Service::messaging_login("u", 0); u16::MAX as usize + 1];
        let result = pinned().build_token(&services, 600);
        assert!(matches!(result, Err(TokenError::InvalidInput(ref m)) if m.contains("service list")));
    }

    #[test]
    fn test_random_salt_in_range() {
        for _ in 0..1000 {
            let salt = RandomSalt.next_salt();
            assert!((MIN_SALT..=MAX_SALT).contains(&salt));
        }
    }

    #[test]
    fn test_unix_secs_clamps_out_of_range_clocks() {
        use std::time::Duration;

        assert_eq!(unix_secs(UNIX_EPOCH - Duration::from_secs(5)), 0);
        assert_eq!(unix_secs(UNIX_EPOCH + Duration::from_secs(42)), 42);
        assert_eq!(
            unix_secs(UNIX_EPOCH + Duration::from_secs(u32::MAX as u64 + 1)),
            u32::MAX
        );
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2023-11-14
        assert!(SystemClock.now_secs() > 1_700_000_000);
    }

    #[test]
    fn test_access_token_serializes_as_string() {
        let token = pinned().build_token(&[], 60).unwrap();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, format!("\"{}\"", token));
    }
}
