//! The request record handed from submitters to networker threads.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared::domain::{Classification, RequestKey};

use crate::completion::ResponseHandler;
use crate::error::{NetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Nothing,
    Quit,
    Get,
    Post,
    Put,
    Patch,
    PostJson,
    Delete,
    PutOctets,
}

impl RequestKind {
    /// Kinds a caller may submit. `Nothing` and `Quit` are internal.
    pub fn is_submittable(self) -> bool {
        !matches!(self, Self::Nothing | Self::Quit)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nothing => "nothing",
            Self::Quit => "quit",
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::PostJson => "POST(json)",
            Self::Delete => "DELETE",
            Self::PutOctets => "PUT(octets)",
        }
    }
}

/// Request payload. Text and raw bytes are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

/// One outbound call and, once a networker thread has run it, its result.
///
/// Only the thread that dequeues a request writes the result fields; callers
/// see the record again only through the completion handler.
pub struct NetRequest {
    kind: RequestKind,
    url: String,
    classification: Classification,
    key: RequestKey,
    body: RequestBody,
    authorization: Option<String>,
    additional_data: String,
    handler: Option<ResponseHandler>,
    status: i32,
    response: String,
}

impl NetRequest {
    pub(crate) fn quit() -> Self {
        Self {
            kind: RequestKind::Quit,
            url: String::new(),
            classification: Classification::DEFAULT,
            key: RequestKey::default(),
            body: RequestBody::Empty,
            authorization: None,
            additional_data: String::new(),
            handler: None,
            status: 0,
            response: String::new(),
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn key(&self) -> RequestKey {
        self.key
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn additional_data(&self) -> &str {
        &self.additional_data
    }

    /// HTTP status, or [`shared::status::TRANSPORT_FAILURE`] when no response
    /// was received. Zero until the request has run.
    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn priority(&self) -> i32 {
        crate::priority::priority(self)
    }

    pub(crate) fn handler(&self) -> Option<&ResponseHandler> {
        self.handler.as_ref()
    }

    pub(crate) fn set_handler_if_missing(&mut self, fallback: Option<&ResponseHandler>) {
        if self.handler.is_none() {
            self.handler = fallback.cloned();
        }
    }

    pub(crate) fn complete(&mut self, status: i32, response: String) {
        self.status = status;
        self.response = response;
    }
}

impl fmt::Debug for NetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.body {
            RequestBody::Empty => "empty".to_string(),
            RequestBody::Text(text) => format!("{} text bytes", text.len()),
            RequestBody::Bytes(bytes) => format!("{} raw bytes", bytes.len()),
        };
        f.debug_struct("NetRequest")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("classification", &self.classification)
            .field("key", &self.key)
            .field("body", &body)
            .field("authorized", &self.authorization.is_some())
            .field("additional_data", &self.additional_data)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Everything a caller supplies when submitting a request.
pub struct RequestParams {
    kind: RequestKind,
    url: String,
    classification: Classification,
    key: RequestKey,
    body: RequestBody,
    authorization: Option<String>,
    additional_data: String,
    handler: Option<ResponseHandler>,
}

impl RequestParams {
    pub fn new(kind: RequestKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            classification: Classification::DEFAULT,
            key: RequestKey::default(),
            body: RequestBody::Empty,
            authorization: None,
            additional_data: String::new(),
            handler: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(RequestKind::Get, url)
    }

    pub fn post_json(url: impl Into<String>, json: impl Into<String>) -> Self {
        Self::new(RequestKind::PostJson, url).with_text(json)
    }

    /// Upload a raw byte buffer. The buffer moves into the request and is
    /// dropped with it.
    pub fn put_octets(url: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(RequestKind::PutOctets, url).with_bytes(bytes)
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    pub fn with_key(mut self, key: impl Into<RequestKey>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body = RequestBody::Text(text.into());
        self
    }

    pub fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = RequestBody::Bytes(bytes);
        self
    }

    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        let authorization = authorization.into();
        self.authorization = (!authorization.is_empty()).then_some(authorization);
        self
    }

    pub fn with_additional_data(mut self, data: impl Into<String>) -> Self {
        self.additional_data = data.into();
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&NetRequest) + Send + Sync + 'static,
    {
        self.handler = Some(std::sync::Arc::new(handler));
        self
    }

    pub fn with_shared_handler(mut self, handler: ResponseHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Validate and freeze into a [`NetRequest`].
    pub fn build(self) -> Result<NetRequest> {
        if !self.kind.is_submittable() {
            return Err(NetError::UnsupportedKind(self.kind));
        }
        match (&self.body, self.kind) {
            (RequestBody::Bytes(_), RequestKind::PutOctets) => {}
            (_, RequestKind::PutOctets) => {
                return Err(NetError::BodyMismatch {
                    kind: self.kind,
                    reason: "octet uploads need a byte body",
                })
            }
            (RequestBody::Bytes(_), kind) => {
                return Err(NetError::BodyMismatch {
                    kind,
                    reason: "only octet uploads carry a byte body",
                })
            }
            (RequestBody::Text(_), RequestKind::Get) => {
                return Err(NetError::BodyMismatch {
                    kind: RequestKind::Get,
                    reason: "GET requests carry no body",
                })
            }
            _ => {}
        }

        Ok(NetRequest {
            kind: self.kind,
            url: self.url,
            classification: self.classification,
            key: self.key,
            body: self.body,
            authorization: self.authorization,
            additional_data: self.additional_data,
            handler: self.handler,
            status: 0,
            response: String::new(),
        })
    }
}
