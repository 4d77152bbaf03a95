//! Upstream-facing descriptor data.
//!
//! `descriptor` exposes validated metadata (`UpstreamDescriptor`) naming the OAuth token
//! endpoint, the catalog resource endpoint, and how a region code is attached to resource
//! requests. The defaults describe the KKBOX Open API.

pub mod descriptor;

pub use descriptor::*;
