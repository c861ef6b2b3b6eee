//! Core components for signing object storage API requests.
//!
//! This crate provides the service-agnostic pieces of the objsign ecosystem:
//! the request description handed to a signer, hashing and time helpers, and
//! the structured error type every signer returns.
//!
//! ## Overview
//!
//! - [`SigningRequest`]: An immutable description of the request to sign,
//!   built from plain fields or from [`http::request::Parts`].
//! - [`Payload`]: The request body as the signer sees it, fully buffered,
//!   absent, or intentionally unsigned.
//! - [`time::Clock`]: The capability that supplies the signing instant, so
//!   tests can pin a fixed timestamp instead of reaching for the system time.
//!
//! ## Example
//!
//! ```
//! use objsign_core::{Payload, SigningRequest};
//!
//! let req = SigningRequest::new(http::Method::PUT, "example.com", "/data.bin")
//!     .with_query("partNumber=1")
//!     .with_payload(Payload::Bytes("hello".into()));
//! assert_eq!(req.path, "/data.bin");
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;

mod request;
pub use request::Payload;
pub use request::SigningRequest;
