//! Status codes the networker hands back through completion callbacks.

/// Sentinel used when the request never produced an HTTP response.
pub const TRANSPORT_FAILURE: i32 = -1;

pub const OK: i32 = 200;
pub const CREATED: i32 = 201;
pub const ACCEPTED: i32 = 202;
pub const NO_CONTENT: i32 = 204;

pub const BAD_REQUEST: i32 = 400;
pub const UNAUTHORIZED: i32 = 401;
pub const FORBIDDEN: i32 = 403;
pub const NOT_FOUND: i32 = 404;
pub const TOO_MANY_REQUESTS: i32 = 429;

pub fn is_success(code: i32) -> bool {
    (200..300).contains(&code)
}

pub fn is_transport_failure(code: i32) -> bool {
    code < 0
}
