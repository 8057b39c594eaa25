//! # Client Identification
//!
//! Resolves the caller's address and, when a `User-Agent` header is present,
//! tags the request with a [`ClientDevice`] in its extensions. Requests
//! without the header pass through untouched.
//!
//! Forwarding headers are client-writable, so they are only read when the
//! service is configured to sit behind a known number of proxies. Each proxy
//! appends the address it received the connection from to `X-Forwarded-For`;
//! with `n` trusted hops the client is the `n`-th entry from the right.
//! Without trusted hops the socket peer recorded by
//! `into_make_service_with_connect_info` is the only source.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::headers::{HeaderMapExt, UserAgent};

/// Key used when no address can be resolved.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// How many reverse proxies in front of the service may be believed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyTrust {
    hops: usize,
}

impl ProxyTrust {
    /// Trust no forwarding headers; key on the socket peer.
    pub const fn none() -> Self {
        Self { hops: 0 }
    }

    pub const fn hops(hops: usize) -> Self {
        Self { hops }
    }

    /// Client address for `request`, or `None` when nothing can be resolved.
    pub fn client_ip<B>(&self, request: &axum::http::Request<B>) -> Option<IpAddr> {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());
        if self.hops == 0 {
            return peer;
        }
        self.forwarded_client(request.headers())
            .or_else(|| real_ip(request.headers()))
            .or(peer)
    }

    /// Rate-limit key for a request: the client address, or [`UNKNOWN_CLIENT`].
    pub fn client_key<B>(&self, request: &axum::http::Request<B>) -> String {
        self.client_ip(request)
            .map_or_else(|| UNKNOWN_CLIENT.to_string(), |ip| ip.to_string())
    }

    // Entries left of the trusted ones were written by the client and are ignored.
    fn forwarded_client(&self, headers: &HeaderMap) -> Option<IpAddr> {
        let hops: Vec<&str> = headers
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let index = hops.len().checked_sub(self.hops)?;
        hops.get(index)?.parse().ok()
    }
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Coarse device class derived from a `User-Agent` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceFamily {
    Iphone,
    Ipad,
    AndroidPhone,
    AndroidTablet,
    Desktop,
    Bot,
    Other,
}

impl DeviceFamily {
    /// Classify a `User-Agent` value. Matching is case-insensitive.
    pub fn classify(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ["bot", "crawler", "spider", "curl/", "wget/"]
            .iter()
            .any(|m| ua.contains(m))
        {
            Self::Bot
        } else if ua.contains("ipad") {
            Self::Ipad
        } else if ua.contains("iphone") || ua.contains("ipod") {
            Self::Iphone
        } else if ua.contains("android") {
            // Android tablets omit the "mobile" token.
            if ua.contains("mobile") {
                Self::AndroidPhone
            } else {
                Self::AndroidTablet
            }
        } else if ["windows nt", "macintosh", "x11", "cros"]
            .iter()
            .any(|m| ua.contains(m))
        {
            Self::Desktop
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iphone => "iphone",
            Self::Ipad => "ipad",
            Self::AndroidPhone => "android_phone",
            Self::AndroidTablet => "android_tablet",
            Self::Desktop => "desktop",
            Self::Bot => "bot",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device context attached to requests that carry a `User-Agent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDevice {
    pub ip: Option<IpAddr>,
    pub family: DeviceFamily,
    pub user_agent: String,
}

impl ClientDevice {
    /// `"<ip>:<family>"`, with `unknown` standing in for a missing address.
    pub fn key(&self) -> String {
        match self.ip {
            Some(ip) => format!("{ip}:{}", self.family),
            None => format!("{UNKNOWN_CLIENT}:{}", self.family),
        }
    }
}

/// Inserts [`ClientDevice`] into request extensions when `User-Agent` is set.
pub async fn client_middleware(
    State(proxies): State<ProxyTrust>,
    mut request: Request,
    next: Next,
) -> Response {
    let agent = request
        .headers()
        .typed_get::<UserAgent>()
        .filter(|ua| !ua.as_str().trim().is_empty());

    if let Some(agent) = agent {
        let device = ClientDevice {
            ip: proxies.client_ip(&request),
            family: DeviceFamily::classify(agent.as_str()),
            user_agent: agent.as_str().to_owned(),
        };
        tracing::trace!(device = %device.key(), "client identified");
        request.extensions_mut().insert(device);
    }

    next.run(request).await
}
