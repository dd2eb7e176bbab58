#![forbid(unsafe_code)]

//! # Hive IAM
//!
//! The identity side of the control plane: account, user, access-key and
//! policy storage over an opaque key-value mapping, secret encryption
//! under the process master key, the policy evaluator, and first-start
//! bootstrap.
//!
//! The KV mapping is abstracted behind [`kv::KeyValue`]; production runs
//! on JetStream KV riding the control-bus connection, tests run on the
//! in-memory implementation.

pub mod bootstrap;
pub mod crypto;
pub mod kv;
pub mod policy;
pub mod store;

pub use store::IamStore;
