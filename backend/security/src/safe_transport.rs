//! SSRF-safe transport.
//!
//! Hostnames are resolved immediately before a connection is opened and the
//! address actually dialed is the one that passed [`is_blocked_ip`]. Because
//! the check happens on the dialed address rather than on an earlier lookup,
//! a DNS answer that flips to a private address between validation and
//! connect is never reachable.
//!
//! TLS still runs against the original hostname: reqwest keeps the URL host
//! for SNI and certificate checks while connecting to the vetted address.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::redirect::Policy;
use thiserror::Error;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, warn};
use url::{Host, Url};

use crate::ip_policy::{blocked_range, is_blocked_ip};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_FOLLOWED_REDIRECTS: usize = 10;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("blocked: {host} resolves only to private or reserved addresses")]
    Blocked { host: String },

    #[error("blocked: access to {ip} ({range}) is not allowed")]
    BlockedAddress { ip: IpAddr, range: &'static str },

    #[error("dns lookup failed for {host}: {source}")]
    Lookup {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no addresses found for {0}")]
    NoAddresses(String),

    #[error("invalid address {0:?}, expected host:port")]
    InvalidAddress(String),

    #[error("unsupported url scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("url has no host: {0}")]
    MissingHost(String),

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("connect to {0} timed out")]
    ConnectTimeout(SocketAddr),

    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Whether a client built by [`SafeTransport::client`] follows redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// Return 3xx responses to the caller untouched.
    Manual,
    /// Follow redirects, re-checking every hop.
    Follow,
}

/// Resolve `host` and pick the first candidate outside the reserved ranges.
///
/// With `allow_private` set every candidate qualifies; that switch exists for
/// tests that talk to servers on loopback and has no configuration knob.
pub async fn select_address(
    host: &str,
    port: u16,
    allow_private: bool,
) -> Result<SocketAddr, TransportError> {
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    let candidates: Vec<SocketAddr> = lookup_host((bare, port))
        .await
        .map_err(|source| TransportError::Lookup {
            host: host.to_string(),
            source,
        })?
        .collect();

    if candidates.is_empty() {
        return Err(TransportError::NoAddresses(host.to_string()));
    }

    for candidate in &candidates {
        if allow_private || !is_blocked_ip(candidate.ip()) {
            debug!(host, addr = %candidate, "selected outbound address");
            return Ok(*candidate);
        }
        debug!(host, addr = %candidate, "skipping reserved address");
    }

    warn!(host, candidates = candidates.len(), "all resolved addresses are blocked");
    Err(TransportError::Blocked {
        host: host.to_string(),
    })
}

/// Split `"host:port"` (or `"[v6]:port"`) into its parts.
pub fn split_host_port(addr: &str) -> Result<(String, u16), TransportError> {
    let invalid = || TransportError::InvalidAddress(addr.to_string());
    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        (host, tail.strip_prefix(':').ok_or_else(invalid)?)
    } else {
        let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
        if host.contains(':') {
            return Err(invalid());
        }
        (host, port)
    };
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse().map_err(|_| invalid())?;
    Ok((host.to_string(), port))
}

/// DNS resolver plugged into reqwest so that connection establishment only
/// ever sees a vetted address.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeResolver {
    allow_private: bool,
}

impl SafeResolver {
    pub fn new(allow_private: bool) -> Self {
        Self { allow_private }
    }
}

impl Resolve for SafeResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let allow_private = self.allow_private;
        Box::pin(async move {
            // reqwest fills in the port after resolution.
            let addr = select_address(name.as_str(), 0, allow_private).await?;
            let addrs: Addrs = Box::new(std::iter::once(addr));
            Ok(addrs)
        })
    }
}

/// Factory for guarded connections and HTTP clients.
#[derive(Debug, Clone)]
pub struct SafeTransport {
    allow_private: bool,
    connect_timeout: Duration,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for SafeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SafeTransport {
    pub fn new() -> Self {
        Self {
            allow_private: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: concat!("linktitle/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Permit loopback and private destinations. Test servers only.
    pub fn allow_private_networks(mut self, allow: bool) -> Self {
        if allow {
            warn!("private network destinations are allowed for outbound requests");
        }
        self.allow_private = allow;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn allows_private(&self) -> bool {
        self.allow_private
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Open a TCP connection to `"host:port"` through a vetted address.
    pub async fn dial(&self, addr: &str) -> Result<TcpStream, TransportError> {
        let (host, port) = split_host_port(addr)?;
        let target = select_address(&host, port, self.allow_private).await?;
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(TransportError::Connect {
                addr: target,
                source,
            }),
            Err(_) => Err(TransportError::ConnectTimeout(target)),
        }
    }

    /// Reject URLs that can never be fetched safely before any I/O happens.
    ///
    /// IP-literal hosts bypass DNS entirely, so they are checked here instead
    /// of in [`SafeResolver`].
    pub fn check_url(&self, url: &Url) -> Result<(), TransportError> {
        check_url(url, self.allow_private)
    }

    /// Build a reqwest client whose every connection goes through
    /// [`SafeResolver`].
    pub fn client(&self, redirects: RedirectMode) -> Result<reqwest::Client, TransportError> {
        let allow_private = self.allow_private;
        let policy = match redirects {
            RedirectMode::Manual => Policy::none(),
            RedirectMode::Follow => Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_FOLLOWED_REDIRECTS {
                    return attempt.error(TransportError::TooManyRedirects(MAX_FOLLOWED_REDIRECTS));
                }
                match check_url(attempt.url(), allow_private) {
                    Ok(()) => attempt.follow(),
                    Err(err) => attempt.error(err),
                }
            }),
        };

        let client = reqwest::Client::builder()
            .dns_resolver(Arc::new(SafeResolver::new(allow_private)))
            .redirect(policy)
            .no_proxy()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(&self.user_agent)
            .build()?;
        Ok(client)
    }
}

fn check_url(url: &Url, allow_private: bool) -> Result<(), TransportError> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(TransportError::UnsupportedScheme(other.to_string())),
    }
    let ip = match url.host() {
        None => return Err(TransportError::MissingHost(url.to_string())),
        Some(Host::Domain(_)) => return Ok(()),
        Some(Host::Ipv4(v4)) => IpAddr::V4(v4),
        Some(Host::Ipv6(v6)) => IpAddr::V6(v6),
    };
    if allow_private {
        return Ok(());
    }
    match blocked_range(ip) {
        Some(range) => Err(TransportError::BlockedAddress { ip, range }),
        None => Ok(()),
    }
}
