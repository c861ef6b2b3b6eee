//! Percent-encoding for canonical URIs and query strings.

use percent_encoding::utf8_percent_encode;

use crate::constants::AWS_QUERY_ENCODE_SET;
use crate::constants::AWS_URI_ENCODE_SET;

/// Where an encoded string will be placed in the canonical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeContext {
    /// A URI path: `/` separates segments and passes through unescaped, so
    /// each segment is encoded in place.
    Path,
    /// A query key or value: `/` is encoded like any other reserved byte.
    QueryComponent,
}

/// Percent-encode `input` for the given context.
///
/// Every byte outside the unreserved set `A-Z a-z 0-9 - . _ ~` becomes `%XX`
/// with uppercase hex digits. Multi-byte characters are encoded byte by byte,
/// so a 3-byte UTF-8 sequence yields three `%XX` groups.
pub fn percent_encode(input: &str, context: EncodeContext) -> String {
    let set = match context {
        EncodeContext::Path => &AWS_URI_ENCODE_SET,
        EncodeContext::QueryComponent => &AWS_QUERY_ENCODE_SET,
    };

    utf8_percent_encode(input, set).to_string()
}
