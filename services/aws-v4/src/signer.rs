use std::fmt::Write;

use http::header;
use http::HeaderMap;
use http::HeaderValue;
use log::debug;
use objsign_core::hash::hex_hmac_sha256;
use objsign_core::hash::hex_sha256;
use objsign_core::hash::hmac_sha256;
use objsign_core::time::format_date;
use objsign_core::time::format_iso8601;
use objsign_core::time::Clock;
use objsign_core::time::DateTime;
use objsign_core::Error;
use objsign_core::Result;
use objsign_core::SigningRequest;

use crate::canonical::CanonicalRequest;
use crate::constants::AWS4_HMAC_SHA256;
use crate::constants::AWS4_REQUEST;
use crate::constants::X_AMZ_CONTENT_SHA_256;
use crate::constants::X_AMZ_DATE;
use crate::constants::X_AMZ_SECURITY_TOKEN;
use crate::credential::Credential;
use crate::payload::payload_hash;

/// Signer that implements AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
#[derive(Debug, Clone)]
pub struct RequestSigner {
    service: String,
    region: String,
}

impl RequestSigner {
    /// Create a new signer for the given service and region.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.to_string(),
            region: region.to_string(),
        }
    }

    /// Sign the request at the instant supplied by `clock`.
    ///
    /// The request is only read; everything the transport needs to merge into
    /// the outgoing request comes back in the [`SignatureResult`]. The same
    /// request, credential and instant always produce byte-identical output.
    pub fn sign(
        &self,
        req: &SigningRequest,
        cred: &Credential,
        clock: &dyn Clock,
    ) -> Result<SignatureResult> {
        let now = clock.now();
        let creq = self.canonicalize(req, cred, now)?;
        self.calculate(&creq, cred, now)
    }

    fn canonicalize(
        &self,
        req: &SigningRequest,
        cred: &Credential,
        now: DateTime,
    ) -> Result<CanonicalRequest> {
        let (headers, payload_hash) = build_signing_headers(req, cred, now)?;
        let creq = CanonicalRequest::build(
            req.method.clone(),
            &req.path,
            &req.query,
            headers,
            payload_hash,
        )?;
        debug!("calculated canonical request: {creq}");

        Ok(creq)
    }

    fn calculate(
        &self,
        creq: &CanonicalRequest,
        cred: &Credential,
        now: DateTime,
    ) -> Result<SignatureResult> {
        if cred.access_key_id.is_empty() {
            return Err(Error::credential_invalid("access key id is empty"));
        }

        let encoded_req = hex_sha256(creq.to_string().as_bytes());

        // Scope: "20220313/<region>/<service>/aws4_request"
        let scope = credential_scope(now, &self.region, &self.service);
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20220313T072004Z
        // 20220313/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = {
            let mut f = String::new();
            writeln!(f, "{AWS4_HMAC_SHA256}")?;
            writeln!(f, "{}", format_iso8601(now))?;
            writeln!(f, "{}", &scope)?;
            write!(f, "{}", &encoded_req)?;
            f
        };
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key =
            generate_signing_key(&cred.secret_access_key, now, &self.region, &self.service)?;
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes())?;

        let signed_headers = creq.signed_headers().to_vec();
        let authorization = format!(
            "{AWS4_HMAC_SHA256} Credential={}/{}, SignedHeaders={}, Signature={}",
            cred.access_key_id,
            scope,
            signed_headers.join(";"),
            signature
        );

        let mut headers = HeaderMap::new();
        for name in [X_AMZ_DATE, X_AMZ_CONTENT_SHA_256, X_AMZ_SECURITY_TOKEN] {
            if let Some(value) = creq.headers.get(name) {
                headers.insert(name, value.clone());
            }
        }
        let mut auth_value = HeaderValue::from_str(&authorization)?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        Ok(SignatureResult {
            signature,
            signed_headers,
            authorization,
            headers,
        })
    }
}

/// Outcome of signing a single request.
#[derive(Debug, Clone)]
pub struct SignatureResult {
    signature: String,
    signed_headers: Vec<String>,
    authorization: String,
    headers: HeaderMap,
}

impl SignatureResult {
    /// Hex-encoded request signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Sorted lower-cased names of the headers covered by the signature.
    pub fn signed_headers(&self) -> &[String] {
        &self.signed_headers
    }

    /// Complete `Authorization` header value.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// The full header set to merge into the outgoing request:
    /// `authorization`, `x-amz-date`, `x-amz-content-sha256` and, when a
    /// session token was supplied, `x-amz-security-token`.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Merge the produced header set into request parts.
    pub fn apply(&self, parts: &mut http::request::Parts) {
        for (name, value) in self.headers.iter() {
            parts.headers.insert(name.clone(), value.clone());
        }
    }
}

/// Assemble the headers that participate in the signature.
///
/// `host`, `x-amz-date` and `x-amz-content-sha256` must be present before
/// canonicalization, so they are filled in here when the caller didn't set
/// them. A session token rides along as `x-amz-security-token` so that it is
/// covered by the signature too.
fn build_signing_headers(
    req: &SigningRequest,
    cred: &Credential,
    now: DateTime,
) -> Result<(HeaderMap, String)> {
    let mut headers = req.headers.clone();

    // Header values need to be normalized according to Step 4 of https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html
    for (_, value) in headers.iter_mut() {
        SigningRequest::header_value_normalize(value)
    }

    // Insert HOST header if not present.
    if headers.get(header::HOST).is_none() {
        headers.insert(header::HOST, req.authority.parse()?);
    }

    // Insert DATE header if not present.
    if headers.get(X_AMZ_DATE).is_none() {
        headers.insert(X_AMZ_DATE, HeaderValue::try_from(format_iso8601(now))?);
    }

    // Insert X_AMZ_CONTENT_SHA_256 header if not present, otherwise respect
    // the digest the caller already computed.
    let payload_hash = match headers.get(X_AMZ_CONTENT_SHA_256) {
        Some(value) => value.to_str()?.to_string(),
        None => {
            let hash = payload_hash(&req.payload);
            headers.insert(X_AMZ_CONTENT_SHA_256, HeaderValue::try_from(hash.as_str())?);
            hash
        }
    };

    // Insert X_AMZ_SECURITY_TOKEN header if security token exists.
    if let Some(token) = &cred.session_token {
        let mut value = HeaderValue::from_str(token)?;
        // Set token value sensitive to avoid leaking.
        value.set_sensitive(true);

        headers.insert(X_AMZ_SECURITY_TOKEN, value);
    }

    Ok((headers, payload_hash))
}

/// Credential scope: "20220313/<region>/<service>/aws4_request".
fn credential_scope(now: DateTime, region: &str, service: &str) -> String {
    format!("{}/{region}/{service}/{AWS4_REQUEST}", format_date(now))
}

fn generate_signing_key(
    secret: &str,
    time: DateTime,
    region: &str,
    service: &str,
) -> Result<Vec<u8>> {
    if secret.is_empty() {
        return Err(Error::credential_invalid("secret access key is empty"));
    }

    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes())?;
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes())?;
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes())?;
    // Sign request
    hmac_sha256(sign_service.as_slice(), AWS4_REQUEST.as_bytes())
}
