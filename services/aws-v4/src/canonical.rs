//! Canonical request assembly.

use std::fmt::Display;
use std::fmt::Formatter;

use http::HeaderMap;
use http::Method;
use objsign_core::Error;
use objsign_core::Result;
use percent_encoding::percent_decode_str;

use crate::encode::percent_encode;
use crate::encode::EncodeContext;

/// The normalized request representation that gets hashed into the signature.
///
/// Fully determined by its inputs: building it twice from the same request
/// yields byte-identical output.
pub(crate) struct CanonicalRequest {
    pub(crate) method: Method,
    pub(crate) uri: String,
    pub(crate) query: String,
    /// Finalized signing headers, including the ones the signer injected.
    pub(crate) headers: HeaderMap,

    signed_headers: Vec<String>,
    header_block: String,
    payload_hash: String,
}

impl CanonicalRequest {
    /// Canonicalize the given request fields.
    ///
    /// `headers` must already carry `host`, `x-amz-date` and
    /// `x-amz-content-sha256`; injecting them is the signing pipeline's job,
    /// not canonicalization's.
    pub(crate) fn build(
        method: Method,
        path: &str,
        raw_query: &str,
        headers: HeaderMap,
        payload_hash: String,
    ) -> Result<Self> {
        check_method(&method)?;

        let (signed_headers, header_block) = canonical_headers(&headers)?;

        Ok(CanonicalRequest {
            method,
            uri: canonical_uri(path)?,
            query: canonical_query_string(raw_query),
            headers,
            signed_headers,
            header_block,
            payload_hash,
        })
    }

    /// Sorted lower-cased names of every header participating in the
    /// signature.
    pub(crate) fn signed_headers(&self) -> &[String] {
        &self.signed_headers
    }
}

impl Display for CanonicalRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.method)?;
        writeln!(f, "{}", self.uri)?;
        writeln!(f, "{}", self.query)?;
        write!(f, "{}", self.header_block)?;
        writeln!(f)?;
        writeln!(f, "{}", self.signed_headers.join(";"))?;
        write!(f, "{}", self.payload_hash)
    }
}

/// Verbs that can be signed. Anything else is rejected up front instead of
/// producing a signature the service would refuse.
fn check_method(method: &Method) -> Result<()> {
    match method.as_str() {
        "GET" | "HEAD" | "POST" | "PUT" | "DELETE" | "OPTIONS" | "PATCH" => Ok(()),
        v => Err(Error::method_unsupported(format!(
            "`{v}` is not a signable http method"
        ))),
    }
}

/// Canonical URI: the percent-encoded path, one segment at a time.
///
/// The path is decoded first so that input arriving already percent-encoded
/// (as `http::Uri` paths do) is not encoded twice.
fn canonical_uri(path: &str) -> Result<String> {
    if path.is_empty() {
        return Ok("/".to_string());
    }

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|e| Error::encoding_invalid("path is not valid utf-8").with_source(e))?;

    Ok(percent_encode(&decoded, EncodeContext::Path))
}

/// Canonical query string: split on `&`, encode key and value of each pair,
/// sort by encoded key then encoded value.
///
/// Keys and values are encoded as the raw bytes they arrive as; a pair whose
/// raw form carries no `=` is rendered without one.
fn canonical_query_string(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut pairs: Vec<(String, Option<String>)> = raw
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (
                percent_encode(k, EncodeContext::QueryComponent),
                Some(percent_encode(v, EncodeContext::QueryComponent)),
            ),
            None => (percent_encode(pair, EncodeContext::QueryComponent), None),
        })
        .collect();
    pairs.sort();

    let mut s = String::with_capacity(raw.len() + 8);
    for (idx, (k, v)) in pairs.iter().enumerate() {
        if idx != 0 {
            s.push('&');
        }

        s.push_str(k);
        if let Some(v) = v {
            s.push('=');
            s.push_str(v);
        }
    }

    s
}

/// Canonical header block and signed-header list.
///
/// Names come out lower-cased and sorted; headers sharing a name fold into a
/// single entry with their values joined by `,` in original order.
fn canonical_headers(headers: &HeaderMap) -> Result<(Vec<String>, String)> {
    let mut names = headers
        .keys()
        .map(|k| k.as_str().to_string())
        .collect::<Vec<String>>();
    names.sort_unstable();

    let mut block = String::with_capacity(64);
    for name in names.iter() {
        let value = headers
            .get_all(name.as_str())
            .iter()
            .map(|v| {
                v.to_str().map_err(|e| {
                    Error::request_invalid(format!("header `{name}` is not valid utf-8"))
                        .with_source(e)
                })
            })
            .collect::<Result<Vec<&str>>>()?
            .join(",");

        block.push_str(name);
        block.push(':');
        block.push_str(&value);
        block.push('\n');
    }

    Ok((names, block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use objsign_core::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_uri() {
        assert_eq!(canonical_uri("").expect("must encode"), "/");
        assert_eq!(canonical_uri("/").expect("must encode"), "/");
        assert_eq!(canonical_uri("/hello/world").expect("must encode"), "/hello/world");
        assert_eq!(canonical_uri("/\u{1234}").expect("must encode"), "/%E1%88%B4");
        assert_eq!(canonical_uri("/a b").expect("must encode"), "/a%20b");
        // Already-encoded input must come out unchanged, not double-encoded.
        assert_eq!(canonical_uri("/%E1%88%B4").expect("must encode"), "/%E1%88%B4");
    }

    #[test]
    fn test_canonical_uri_rejects_invalid_utf8() {
        let err = canonical_uri("/%FF").expect_err("lone 0xff is not utf-8");
        assert_eq!(err.kind(), ErrorKind::EncodingInvalid);
    }

    #[test]
    fn test_canonical_query_string_sorts_by_key() {
        assert_eq!(canonical_query_string("b=2&a=1"), "a=1&b=2");
    }

    #[test]
    fn test_canonical_query_string_sorts_by_value_on_tie() {
        assert_eq!(canonical_query_string("a=2&a=1"), "a=1&a=2");
    }

    #[test]
    fn test_canonical_query_string_empty() {
        assert_eq!(canonical_query_string(""), "");
    }

    #[test]
    fn test_canonical_query_string_single_pair() {
        assert_eq!(canonical_query_string("Param1=value1"), "Param1=value1");
    }

    #[test]
    fn test_canonical_query_string_pair_without_equals() {
        assert_eq!(canonical_query_string("key"), "key");
        assert_eq!(canonical_query_string("key="), "key=");
    }

    #[test]
    fn test_canonical_query_string_encodes_raw_bytes() {
        // A raw `+` is a literal plus sign here, never a space.
        assert_eq!(canonical_query_string("+=a"), "%2B=a");
        assert_eq!(canonical_query_string("\u{1234}=bar"), "%E1%88%B4=bar");
    }

    #[test]
    fn test_canonical_headers_sorted_and_lowercased() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Amz-Date", HeaderValue::from_static("20150830T123600Z"));
        headers.insert("Host", HeaderValue::from_static("example.amazonaws.com"));

        let (names, block) = canonical_headers(&headers).expect("must canonicalize");
        assert_eq!(names, vec!["host", "x-amz-date"]);
        assert_eq!(
            block,
            "host:example.amazonaws.com\nx-amz-date:20150830T123600Z\n"
        );
    }

    #[test]
    fn test_canonical_headers_fold_duplicates_in_order() {
        let mut headers = HeaderMap::new();
        headers.append("x-amz-meta-tag", HeaderValue::from_static("a"));
        headers.append("x-amz-meta-tag", HeaderValue::from_static("b"));
        headers.insert("host", HeaderValue::from_static("example.amazonaws.com"));

        let (names, block) = canonical_headers(&headers).expect("must canonicalize");
        assert_eq!(names, vec!["host", "x-amz-meta-tag"]);
        assert_eq!(
            block,
            "host:example.amazonaws.com\nx-amz-meta-tag:a,b\n"
        );
    }

    #[test]
    fn test_check_method_rejects_unrecognized_verbs() {
        let err = check_method(&Method::CONNECT).expect_err("connect cannot be signed");
        assert_eq!(err.kind(), ErrorKind::MethodUnsupported);
        assert!(check_method(&Method::GET).is_ok());
        assert!(check_method(&Method::PATCH).is_ok());
    }
}
