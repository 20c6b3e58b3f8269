//! Password scrambles for the MySQL authentication plugins
//!
//! The server sends a random nonce in its greeting; the client proves knowledge of
//! the password by answering with a one-way scramble of password and nonce.

use crate::protocol::constants::auth_plugins;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Compute the auth response bytes for `plugin`
///
/// Unknown plugins fall back to `mysql_native_password`; the server answers with an
/// auth switch request if it disagrees.
pub fn scramble_for_plugin(plugin: &str, password: &str, nonce: &[u8]) -> Vec<u8> {
    match plugin {
        auth_plugins::CACHING_SHA2_PASSWORD => caching_sha2_password(password, nonce),
        auth_plugins::MYSQL_CLEAR_PASSWORD => clear_password(password),
        _ => mysql_native_password(password, nonce),
    }
}

/// `mysql_native_password`
///
/// `SHA1(password) XOR SHA1(nonce + SHA1(SHA1(password)))`, empty for an empty password.
pub fn mysql_native_password(password: &str, nonce: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }

    let stage1 = Sha1::digest(password.as_bytes());
    let stage2 = Sha1::digest(stage1);

    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(stage2);
    let mask = hasher.finalize();

    xor(&stage1, &mask)
}

/// `caching_sha2_password` fast-auth scramble
///
/// `SHA256(password) XOR SHA256(SHA256(SHA256(password)) + nonce)`, empty for an empty password.
pub fn caching_sha2_password(password: &str, nonce: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }

    let stage1 = Sha256::digest(password.as_bytes());
    let stage2 = Sha256::digest(stage1);

    let mut hasher = Sha256::new();
    hasher.update(stage2);
    hasher.update(nonce);
    let mask = hasher.finalize();

    xor(&stage1, &mask)
}

/// `mysql_clear_password`: the password itself, NUL-terminated
pub fn clear_password(password: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(password.len() + 1);
    out.extend_from_slice(password.as_bytes());
    out.push(0);
    out
}

fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}
