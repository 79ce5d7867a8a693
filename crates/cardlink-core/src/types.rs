use crate::{
    Result,
    constants::{DEFAULT_HOST, DEFAULT_PORT, READ_CARD_PATH, WS_SCHEME},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;

/// Reader service WebSocket endpoint (`ws://host[:port]/path`).
///
/// Only plain `ws://` endpoints are accepted: the reader service runs on the
/// operator workstation or its local network and does not offer TLS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    /// Build an endpoint from its parts.
    ///
    /// IPv6 hosts may be given with or without brackets.
    ///
    /// # Errors
    /// Returns `Error::InvalidEndpoint` if the host is empty, contains
    /// URL delimiters, or contains `:` without being an IPv6 address.
    pub fn new(host: &str, port: u16, path: &str) -> Result<Self> {
        let host = host.trim();
        let host = host
            .strip_prefix('[')
            .and_then(|inner| inner.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(Error::InvalidEndpoint("host must not be empty".to_string()));
        }
        if host.contains(['/', '?', '#', ' ', '[', ']']) {
            return Err(Error::InvalidEndpoint(format!("invalid host: {host}")));
        }
        if host.contains(':') && host.parse::<Ipv6Addr>().is_err() {
            return Err(Error::InvalidEndpoint(format!("invalid host: {host}")));
        }

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Ok(Self {
            host: host.to_string(),
            port,
            path,
        })
    }

    /// Endpoint of the decoded read service on `host:port`.
    pub fn read_card(host: &str, port: u16) -> Result<Self> {
        Self::new(host, port, READ_CARD_PATH)
    }

    /// Same host and port, different path.
    #[must_use]
    pub fn with_path(&self, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            host: self.host.clone(),
            port: self.port,
            path,
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full URL as passed to the WebSocket handshake.
    #[must_use]
    pub fn url(&self) -> String {
        if self.host.contains(':') {
            format!("{WS_SCHEME}[{}]:{}{}", self.host, self.port, self.path)
        } else {
            format!("{WS_SCHEME}{}:{}{}", self.host, self.port, self.path)
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: READ_CARD_PATH.to_string(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.url())
    }
}

impl std::str::FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let rest = match s.strip_prefix(WS_SCHEME) {
            Some(rest) => rest,
            None => {
                let scheme = s.split("://").next().unwrap_or_default();
                return Err(if s.contains("://") {
                    Error::UnsupportedScheme(scheme.to_string())
                } else {
                    Error::InvalidEndpoint(format!("missing ws:// scheme: {s}"))
                });
            }
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        // Bracketed IPv6 literals carry colons of their own.
        let (host, port) = match authority.rfind(']') {
            Some(end) => match &authority[end + 1..] {
                "" => (&authority[..=end], None),
                tail => {
                    let port = tail.strip_prefix(':').ok_or_else(|| {
                        Error::InvalidEndpoint(format!("invalid authority: {authority}"))
                    })?;
                    (&authority[..=end], Some(port))
                }
            },
            None => match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            },
        };
        let port = match port {
            Some(port) => port
                .parse()
                .map_err(|_| Error::InvalidEndpoint(format!("invalid port: {port}")))?,
            None => DEFAULT_PORT,
        };

        Endpoint::new(host, port, path)
    }
}

impl TryFrom<String> for Endpoint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(value: Endpoint) -> Self {
        value.url()
    }
}

/// Identifier of one read request.
///
/// Ids increase monotonically for the lifetime of a reader so that any
/// message can be attributed to the request that opened its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReadId(u64);

impl ReadId {
    /// Id of the first read issued by a reader.
    pub const FIRST: ReadId = ReadId(1);

    #[must_use]
    pub fn new(id: u64) -> Self {
        ReadId(id)
    }

    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Id of the read issued after this one.
    #[must_use]
    pub fn next(&self) -> Self {
        ReadId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for ReadId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
