//! Signing key derivation and HMAC signatures

use crate::error::{Result, TokenError};
use crate::token::pack::pack_u32;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 output
pub const SIGNATURE_LEN: usize = 32;

/// Decoded app certificate
///
/// Parsed from its hex form up front, so signing only ever sees raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCertificate {
    bytes: Vec<u8>,
}

impl AppCertificate {
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.is_empty() {
            return Err(TokenError::invalid("app certificate is empty"));
        }
        if hex_str.len() % 2 != 0 {
            return Err(TokenError::invalid(format!(
                "app certificate has odd length {}",
                hex_str.len()
            )));
        }
        let bytes = hex::decode(hex_str)
            .map_err(|e| TokenError::invalid(format!("app certificate is not hex: {}", e)))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl FromStr for AppCertificate {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for AppCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppCertificate([REDACTED])")
    }
}

/// HMAC-SHA256 of `message` under `key`
pub fn sign(key: &[u8], message: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| TokenError::Crypto(e.to_string()))?;
    mac.update(message);

    let mut out = [0u8; SIGNATURE_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Per-token signing key
///
/// `HMAC(HMAC(cert, issue_ts), salt)`, both rounds keyed by raw bytes.
pub fn derive_signing_key(
    cert: &AppCertificate,
    issue_ts: u32,
    salt: u32,
) -> Result<[u8; SIGNATURE_LEN]> {
    let stage_one = sign(cert.as_bytes(), &pack_u32(issue_ts))?;
    sign(&stage_one, &pack_u32(salt))
}
