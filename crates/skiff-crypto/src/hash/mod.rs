//! Hash utilities

use base64::{engine::general_purpose::STANDARD, Engine};
use digest::Digest;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Base64 MD5 digest, the form the `Content-MD5` header carries.
pub fn md5_base64(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}

pub fn hmac_sha1(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Base64 HMAC-SHA1, as used by the `AWS` authorization scheme.
pub fn hmac_sha1_base64(key: &[u8], data: &[u8]) -> String {
    STANDARD.encode(hmac_sha1(key, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_base64() {
        assert_eq!(md5_base64(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
        assert_eq!(md5_base64(b"hello world"), "XrY7u+Ae7tCTyyK7j1rNww==");
    }

    #[test]
    fn test_hmac_sha1_base64() {
        let sig = hmac_sha1_base64(b"key", b"The quick brown fox jumps over the lazy dog");
        assert_eq!(sig, "3nybhbi3iqa8ino29wqQcBydtNk=");
        assert_eq!(hmac_sha1(b"key", b"").len(), 20);
    }
}
