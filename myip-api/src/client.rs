//! Who is asking, and what they want back.

use std::net::{IpAddr, SocketAddr};

use axum::http::{header, HeaderMap, Uri};

/// Address reported when nothing identifies the client.
pub const UNKNOWN_CLIENT: &str = "unknown";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Determines the client address.
///
/// Precedence: the `ip` query parameter, the first parseable
/// `X-Forwarded-For` entry, `X-Real-IP`, then the peer address. Unparseable
/// values are skipped; with nothing left the result is [`UNKNOWN_CLIENT`].
pub fn client_address(query_ip: Option<&str>, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    query_ip
        .and_then(parse_ip)
        .or_else(|| {
            header_str(headers, X_FORWARDED_FOR)
                .and_then(|list| list.split(',').find_map(parse_ip))
        })
        .or_else(|| header_str(headers, X_REAL_IP).and_then(parse_ip))
        .or_else(|| peer.map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Host name without its port.
fn host_name(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    host.split(':').next().unwrap_or(host)
}

/// Returns true if the request should be answered with JSON.
///
/// JSON is chosen for paths under `/api`, for hosts whose first or last
/// label is `api` (`api.example.com`, `myip.api`), and for requests that
/// declare a JSON content type. The host comes from the `Host` header, or
/// from the request URI authority when there is none (HTTP/2 `:authority`).
pub fn wants_json(uri: &Uri, headers: &HeaderMap) -> bool {
    if uri.path().starts_with("/api") {
        return true;
    }

    let host = header_str(headers, header::HOST.as_str())
        .or_else(|| uri.authority().map(|authority| authority.as_str()));
    if let Some(host) = host {
        let name = host_name(host);
        let first = name.split('.').next();
        let last = name.rsplit('.').next();
        if [first, last]
            .into_iter()
            .flatten()
            .any(|label| label.eq_ignore_ascii_case("api"))
        {
            return true;
        }
    }

    header_str(headers, header::CONTENT_TYPE.as_str())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
}
