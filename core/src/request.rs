use bytes::Bytes;
use http::uri::PathAndQuery;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;

use crate::Error;
use crate::Result;

/// The request body as seen by a signer.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// No body.
    #[default]
    Empty,
    /// A fully buffered body.
    Bytes(Bytes),
    /// A body that will be streamed and is intentionally left out of the
    /// signature.
    UnsignedStreaming,
}

/// Description of the request to sign.
///
/// Built once per signing call and treated as immutable afterwards: signers
/// take it by shared reference and never write back into it.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// Host (and optional port) the request is addressed to.
    pub authority: String,
    /// HTTP path, as it will appear on the request line.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: String,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// Request body.
    pub payload: Payload,
}

impl SigningRequest {
    /// Create a request description for the given method, authority and path.
    pub fn new(method: Method, authority: &str, path: &str) -> Self {
        SigningRequest {
            method,
            authority: authority.to_string(),
            path: path.to_string(),
            query: String::new(),
            headers: HeaderMap::new(),
            payload: Payload::Empty,
        }
    }

    /// Attach a raw query string (no leading `?`).
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    /// Attach the request body.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Build a request description from [`http::request::Parts`].
    ///
    /// The parts are only read; merging the signing output back is the
    /// caller's job.
    pub fn from_parts(parts: &http::request::Parts, payload: Payload) -> Result<Self> {
        let uri = parts.uri.clone().into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            authority: uri
                .authority
                .ok_or_else(|| {
                    Error::request_invalid("request without authority is invalid for signing")
                })?
                .to_string(),
            path: paq.path().to_string(),
            query: paq.query().unwrap_or_default().to_string(),
            headers: parts.headers.clone(),
            payload,
        })
    }

    /// Normalize header value: trim surrounding whitespace and collapse
    /// internal runs into a single space.
    pub fn header_value_normalize(v: &mut HeaderValue) {
        let bs = v.as_bytes();

        let mut normalized = Vec::with_capacity(bs.len());
        let mut in_run = false;
        for &b in bs {
            if b == b' ' || b == b'\t' {
                in_run = true;
                continue;
            }
            if in_run && !normalized.is_empty() {
                normalized.push(b' ');
            }
            in_run = false;
            normalized.push(b);
        }

        // This can't fail because we started with a valid HeaderValue and then only removed whitespace
        *v = HeaderValue::from_bytes(&normalized).expect("invalid header value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    fn normalized(input: &str) -> String {
        let mut v = HeaderValue::from_str(input).expect("must be valid");
        SigningRequest::header_value_normalize(&mut v);
        v.to_str().expect("must be valid").to_string()
    }

    #[test]
    fn test_header_value_normalize() {
        assert_eq!(normalized("  hello  "), "hello");
        assert_eq!(normalized("a   b"), "a b");
        assert_eq!(normalized("  a \t b\tc  "), "a b c");
        assert_eq!(normalized(""), "");
        assert_eq!(normalized("   "), "");
        assert_eq!(normalized("already-clean"), "already-clean");
    }

    #[test]
    fn test_from_parts() {
        let req = http::Request::get("http://example.amazonaws.com/hello?list-type=2&max-keys=3")
            .body(())
            .expect("must be valid");
        let (parts, _) = req.into_parts();

        let signing = SigningRequest::from_parts(&parts, Payload::Empty).expect("must build");
        assert_eq!(signing.method, Method::GET);
        assert_eq!(signing.authority, "example.amazonaws.com");
        assert_eq!(signing.path, "/hello");
        assert_eq!(signing.query, "list-type=2&max-keys=3");
    }

    #[test]
    fn test_from_parts_without_path() {
        let req = http::Request::get("http://example.amazonaws.com")
            .body(())
            .expect("must be valid");
        let (parts, _) = req.into_parts();

        let signing = SigningRequest::from_parts(&parts, Payload::Empty).expect("must build");
        assert_eq!(signing.path, "/");
        assert_eq!(signing.query, "");
    }

    #[test]
    fn test_from_parts_without_authority() {
        let req = http::Request::get("/relative-only")
            .body(())
            .expect("must be valid");
        let (parts, _) = req.into_parts();

        let err = SigningRequest::from_parts(&parts, Payload::Empty)
            .expect_err("must not build without authority");
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    }
}
