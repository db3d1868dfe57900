//! Outbound network guard for linktitle.
//!
//! Every request the resolvers make on behalf of a user-supplied URL goes
//! through [`SafeTransport`], which only ever connects to an address that was
//! vetted against [`ip_policy`] at dial time.

pub mod ip_policy;
pub mod safe_transport;

pub use ip_policy::{blocked_range, is_blocked_ip};
pub use safe_transport::{
    select_address, split_host_port, RedirectMode, SafeResolver, SafeTransport, TransportError,
};
