//! HTTP execution boundary. Workers build a [`TransportCall`] from a request
//! and block on [`Transport::execute`] for the full round trip.

use std::time::Duration;

use reqwest::{
    blocking::Client,
    header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
};
use url::Url;

use crate::{error::TransportError, request::RequestKind};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const OCTET_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallBody<'a> {
    Empty,
    Text {
        content: &'a str,
        content_type: &'static str,
    },
    Bytes {
        content: &'a [u8],
        content_type: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TransportCall<'a> {
    pub kind: RequestKind,
    pub host: &'a str,
    pub path: &'a str,
    pub user_agent: &'a str,
    pub authorization: Option<&'a str>,
    pub body: CallBody<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

pub trait Transport: Send + Sync {
    fn execute(&self, call: &TransportCall<'_>) -> Result<TransportResponse, TransportError>;
}

/// Host and path halves of a request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    pub host: &'a str,
    pub path: &'a str,
}

/// Split `scheme://host[:port]/path` at the first `/` after `://`, or a
/// schemeless target at its first `/`. A bare `/path` resolves against
/// `default_host`.
pub fn split_target<'a>(
    url: &'a str,
    default_host: Option<&'a str>,
) -> Result<Target<'a>, TransportError> {
    let invalid = |reason: &str| TransportError::InvalidTarget {
        target: url.to_string(),
        reason: reason.to_string(),
    };

    let split_at = match url.find("://") {
        Some(scheme_end) => url[scheme_end + 3..]
            .find('/')
            .map(|offset| scheme_end + 3 + offset),
        None => url.find('/'),
    };
    let Some(split_at) = split_at else {
        return Err(invalid("missing path"));
    };

    let (host, path) = url.split_at(split_at);
    if !host.is_empty() && !host.ends_with("://") {
        return Ok(Target { host, path });
    }
    if !host.is_empty() {
        return Err(invalid("missing host"));
    }
    match default_host {
        Some(host) if !host.is_empty() => Ok(Target {
            host: host.trim_end_matches('/'),
            path,
        }),
        _ => Err(invalid("relative path without a default host")),
    }
}

/// Schemeless hosts are plain HTTP.
fn compose_url(host: &str, path: &str) -> Result<Url, TransportError> {
    let raw = if host.contains("://") {
        format!("{host}{path}")
    } else {
        format!("http://{host}{path}")
    };
    Url::parse(&raw).map_err(|err| TransportError::InvalidTarget {
        target: raw.clone(),
        reason: err.to_string(),
    })
}

/// Blocking `reqwest` transport shared by every worker thread.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(
        request_timeout: Option<Duration>,
        accept_invalid_certs: bool,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder().danger_accept_invalid_certs(accept_invalid_certs);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, call: &TransportCall<'_>) -> Result<TransportResponse, TransportError> {
        let url = compose_url(call.host, call.path)?;
        let builder = match call.kind {
            RequestKind::Get => self.http.get(url),
            RequestKind::Post | RequestKind::PostJson => self.http.post(url),
            RequestKind::Put | RequestKind::PutOctets => self.http.put(url),
            RequestKind::Patch => self.http.patch(url),
            RequestKind::Delete => self.http.delete(url),
            RequestKind::Nothing | RequestKind::Quit => {
                return Err(TransportError::UnsupportedKind(call.kind))
            }
        };

        let mut builder = builder.header(USER_AGENT, call.user_agent);
        if let Some(authorization) = call.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        builder = match call.body {
            CallBody::Empty => builder,
            CallBody::Text {
                content,
                content_type,
            } => builder
                .header(CONTENT_TYPE, content_type)
                .body(content.to_string()),
            CallBody::Bytes {
                content,
                content_type,
            } => builder
                .header(CONTENT_TYPE, content_type)
                .body(content.to_vec()),
        };

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(TransportResponse { status, body })
    }
}
