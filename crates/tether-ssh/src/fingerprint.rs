// ABOUTME: Fingerprints for host-auth signatures and enclave public keys.
// ABOUTME: Base-62 short fingerprints for display, SHA256 digests of SSH wire-format keys.

use crate::error::{Result, SshError};
use sha2::{Digest, Sha256};
use ssh_key::{HashAlg, PublicKey};

/// Alphabet for base-62 output: digits, then upper case, then lower case.
pub const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode bytes as a fixed-width base-62 string.
///
/// The input is read as one big-endian integer and written most significant
/// digit first, left-padded with `0` to `ceil(8 * len / log2(62))` characters,
/// so every input of a given length produces output of the same length
/// (32 bytes -> 43 characters).
pub fn base62_encode(bytes: &[u8]) -> String {
    let width = ((bytes.len() * 8) as f64 / 62f64.log2()).ceil() as usize;

    // Repeated division of the big-endian number by 62.
    let mut number = bytes.to_vec();
    let mut digits = Vec::with_capacity(width);
    while number.iter().any(|&b| b != 0) {
        let mut remainder = 0u32;
        for byte in number.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / 62) as u8;
            remainder = acc % 62;
        }
        digits.push(BASE62_ALPHABET[remainder as usize]);
    }
    while digits.len() < width {
        digits.push(b'0');
    }

    digits.iter().rev().map(|&d| d as char).collect()
}

/// Short, bracket-delimited fingerprint of a key-exchange signature.
///
/// `"[" + base62(sha256(signature)) + "]"`, always 45 characters. Shown to the
/// user so they can match it against what the phone displays for the same
/// host authentication.
pub fn signature_fingerprint(signature: &[u8]) -> String {
    let digest = Sha256::digest(signature);
    format!("[{}]", base62_encode(&digest))
}

/// SHA256 of a public key in SSH wire format.
///
/// The enclave identifies keys by this digest in sign requests.
pub fn wire_key_digest(wire_public_key: &[u8]) -> Vec<u8> {
    Sha256::digest(wire_public_key).to_vec()
}

/// OpenSSH-style `SHA256:...` fingerprint of a public key in SSH wire format.
///
/// # Errors
/// Returns `SshError::ParseKey` if the bytes are not a supported public key.
pub fn openssh_fingerprint(wire_public_key: &[u8]) -> Result<String> {
    let key = PublicKey::from_bytes(wire_public_key).map_err(SshError::ParseKey)?;
    Ok(key.fingerprint(HashAlg::Sha256).to_string())
}
