//! The two envelope shapes the transport carries: `Request` (a verb and a
//! path, with an optional JSON body) and `Response` (a status line, with an
//! optional JSON body). Grounded on spec.md §3's "a pair of half-HTTP
//! envelopes" and §4.4's handshake sequence.

use scribble_base::CompileError;

/// A status line. Reuses the HTTP code space and adds one domain code,
/// `Hello`, for the worker's initial greeting — spec.md §3: "Status codes
/// reuse the HTTP code space plus one domain code `HELLO`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Hello,
    Ok,
    BadRequest,
    NotFound,
    InternalServerError,
}

impl StatusCode {
    pub fn is_success(self) -> bool {
        matches!(self, StatusCode::Hello | StatusCode::Ok)
    }

    pub(crate) fn as_line(self) -> &'static str {
        match self {
            StatusCode::Hello => "HELLO",
            StatusCode::Ok => "200 OK",
            StatusCode::BadRequest => "400 Bad Request",
            StatusCode::NotFound => "404 Not Found",
            StatusCode::InternalServerError => "500 Internal Server Error",
        }
    }

    pub(crate) fn parse(line: &str) -> Result<Self, CompileError> {
        match line {
            "HELLO" => Ok(StatusCode::Hello),
            "200 OK" => Ok(StatusCode::Ok),
            "400 Bad Request" => Ok(StatusCode::BadRequest),
            "404 Not Found" => Ok(StatusCode::NotFound),
            "500 Internal Server Error" => Ok(StatusCode::InternalServerError),
            other => Err(http_error(format!("unrecognised status line '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Request { method: "GET".to_string(), path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Request { method: "POST".to_string(), path: path.into(), body: None }
    }

    /// A `POST` whose body is `value` serialised as JSON.
    pub fn post_json(path: impl Into<String>, value: &serde_json::Value) -> Result<Self, CompileError> {
        let body = serde_json::to_vec(value).map_err(|e| http_error(format!("failed to serialise request body: {e}")))?;
        Ok(Request { method: "POST".to_string(), path: path.into(), body: Some(body) })
    }

    pub fn json_body(&self) -> Result<Option<serde_json::Value>, CompileError> {
        match &self.body {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| CompileError::Json { offset: e.column(), message: e.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Option<Vec<u8>>,
}

impl Response {
    pub fn empty(status: StatusCode) -> Self {
        Response { status, body: None }
    }

    pub fn json(status: StatusCode, value: &serde_json::Value) -> Result<Self, CompileError> {
        let body = serde_json::to_vec(value).map_err(|e| http_error(format!("failed to serialise response body: {e}")))?;
        Ok(Response { status, body: Some(body) })
    }

    pub fn json_body(&self) -> Result<Option<serde_json::Value>, CompileError> {
        match &self.body {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Some)
                .map_err(|e| CompileError::Json { offset: e.column(), message: e.to_string() }),
        }
    }
}

pub(crate) fn http_error(message: impl Into<String>) -> CompileError {
    CompileError::Http(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_round_trips_through_its_line() {
        for status in [StatusCode::Hello, StatusCode::Ok, StatusCode::BadRequest, StatusCode::NotFound, StatusCode::InternalServerError] {
            assert_eq!(StatusCode::parse(status.as_line()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_line_is_an_http_error() {
        assert!(StatusCode::parse("999 Bogus").is_err());
    }

    #[test]
    fn request_json_body_round_trips() {
        let value = serde_json::json!({"a": 1});
        let req = Request::post_json("/bootstrap/config", &value).unwrap();
        assert_eq!(req.json_body().unwrap(), Some(value));
    }

    #[test]
    fn hello_and_ok_are_success_statuses() {
        assert!(StatusCode::Hello.is_success());
        assert!(StatusCode::Ok.is_success());
        assert!(!StatusCode::BadRequest.is_success());
    }
}
