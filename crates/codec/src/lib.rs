#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Hive Codec
//!
//! Decoding of the AWS Query wire form (flat, dotted-index, percent-encoded
//! `key=value` pairs) into statically typed inputs, and encoding of typed
//! outputs into AWS-shaped XML.
//!
//! ## Architectural Role
//!
//! Every action shape in `hive-types` is declared through the [`aws_shape!`]
//! macro, which derives a [`query::FromQuery`] impl (structured decode from a
//! [`query::QueryMap`]) and a [`xml::ToXml`] impl (XML rendering) for the
//! shape. The dispatcher in `hive-gateway` only ever goes through the typed
//! entry point [`query::decode_args`]; there is no runtime reflection.

/// Decoding of the flat dotted-index query form into typed values.
pub mod query;
/// Rendering of typed output values as AWS-shaped XML.
pub mod xml;

mod macros;
