// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Hash related utils.

use crate::Error;
use hmac::Hmac;
use hmac::Mac;
use sha2::Digest;
use sha2::Sha256;

/// Hex encoded SHA256 hash.
///
/// Use this function instead of `hex::encode(sha256(content))` can reduce
/// extra copy.
pub fn hex_sha256(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content).as_slice())
}

/// HMAC with SHA256 hash.
pub fn hmac_sha256(key: &[u8], content: &[u8]) -> crate::Result<Vec<u8>> {
    let mut h = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| Error::hashing_failed("hmac-sha256 rejected the signing key").with_source(e))?;
    h.update(content);

    Ok(h.finalize().into_bytes().to_vec())
}

/// Hex encoded HMAC with SHA256 hash.
///
/// Use this function instead of `hex::encode(hmac_sha256(key, content))` can
/// reduce extra copy.
pub fn hex_hmac_sha256(key: &[u8], content: &[u8]) -> crate::Result<String> {
    let mut h = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| Error::hashing_failed("hmac-sha256 rejected the signing key").with_source(e))?;
    h.update(content);

    Ok(hex::encode(h.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hex_sha256_empty() {
        assert_eq!(
            hex_sha256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hex_hmac_sha256() {
        // RFC 4231 test case 2.
        let actual = hex_hmac_sha256(b"Jefe", b"what do ya want for nothing?")
            .expect("hmac must succeed");
        assert_eq!(
            actual,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_sha256_matches_hex_variant() {
        let raw = hmac_sha256(b"key", b"content").expect("hmac must succeed");
        let hexed = hex_hmac_sha256(b"key", b"content").expect("hmac must succeed");
        assert_eq!(hex::encode(raw), hexed);
    }
}
