use super::Error;
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const ALG_HS256: &str = "HS256";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: ALG_HS256.to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Credential payload. `id` is the enrolled identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn mac(key: &[u8], signing_input: &str) -> Result<HmacSha256, Error> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| Error::Key)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

/// Create an HS256 signed token (JWT compact form).
///
/// # Errors
///
/// Returns an error if the header/claims cannot be encoded or the key is rejected.
pub fn sign_hs256(key: &[u8], claims: &Claims) -> Result<String, Error> {
    let header_b64 = b64e_json(&TokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let tag = mac(key, &signing_input)?.finalize().into_bytes();
    let signature_b64 = Base64UrlUnpadded::encode_string(&tag);

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verify an HS256 token and return its claims.
///
/// Checks run in order: structure, header, signature, claims, expiry. A token
/// whose `exp` is at or before `now_unix_seconds` is expired.
///
/// # Errors
///
/// Returns an error if:
/// - the token is not three dot-separated segments, or header/claims are not base64url json,
/// - the header names an algorithm other than HS256,
/// - the signature does not decode or does not match,
/// - the token has expired.
pub fn verify_hs256(token: &str, key: &[u8], now_unix_seconds: i64) -> Result<Claims, Error> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let sig_b64 = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() {
        return Err(Error::TokenFormat);
    }

    let header: TokenHeader = b64d_json(header_b64)?;
    if header.alg != ALG_HS256 {
        return Err(Error::UnsupportedAlg(header.alg));
    }

    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::InvalidSignature)?;
    mac(key, &signing_input)?
        .verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)?;

    let claims: Claims = b64d_json(claims_b64)?;
    if claims.exp <= now_unix_seconds {
        return Err(Error::Expired);
    }

    Ok(claims)
}
