use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::*;
use regex::Regex;

/// The client's IP address, for logging. In decreasing order of preference:
/// 1. The `X-Forwarded-For` header (its first entry), if `use_x_forwarded_for` is set.
/// 2. The `for=` field of the `Forwarded` header, if `use_forwarded` is set.
/// 3. The peer address of the connection.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            trace!("💻️ Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        result = req.headers().get("Forwarded").and_then(|v| v.to_str().ok()).and_then(forwarded_for);
        if let Some(ip) = result {
            trace!("💻️ Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer = req.peer_addr().map(|a| a.ip());
        trace!("💻️ Using peer address for remote address: {peer:?}");
        peer
    })
}

fn forwarded_for(header: &str) -> Option<IpAddr> {
    let re = Regex::new(r#"for="?(?P<ip>[^;,"]+)"?"#).ok()?;
    let ip = re.captures(header)?.name("ip")?.as_str();
    IpAddr::from_str(ip).ok()
}
