//! Credential and token models owned by the proxy.

pub mod credentials;
pub mod token;

pub use credentials::*;
pub use token::{record::*, secret::*};
