//! Reads and writes [`Request`]/[`Response`] envelopes using HTTP/1.1's own
//! line syntax: a start-line, `Content-Length`-bounded headers, a blank
//! line, then the body. Generic over any `Read`/`Write` so the same code
//! frames a `UnixStream` in production and an in-memory buffer in tests.

use std::io::{BufRead, BufReader, Read, Write};

use scribble_base::CompileError;

use crate::message::{http_error, Request, Response, StatusCode};

const CONTENT_LENGTH: &str = "Content-Length:";

fn io_error(e: std::io::Error) -> CompileError {
    CompileError::Io(e.to_string())
}

/// Reads headers up to the blank line that terminates them, returning the
/// `Content-Length` value if one was present.
fn read_headers(reader: &mut impl BufRead) -> Result<Option<usize>, CompileError> {
    let mut content_length = None;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).map_err(io_error)?;
        if n == 0 {
            return Err(http_error("connection closed while reading headers"));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Ok(content_length);
        }
        if let Some(rest) = line.strip_prefix(CONTENT_LENGTH) {
            let value: usize = rest.trim().parse().map_err(|_| http_error(format!("malformed Content-Length '{rest}'")))?;
            content_length = Some(value);
        }
    }
}

fn read_body(reader: &mut impl Read, content_length: Option<usize>) -> Result<Option<Vec<u8>>, CompileError> {
    match content_length {
        None => Ok(None),
        Some(0) => Ok(None),
        Some(len) => {
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).map_err(io_error)?;
            Ok(Some(buf))
        }
    }
}

fn write_body(writer: &mut impl Write, body: &Option<Vec<u8>>) -> Result<(), CompileError> {
    let mut out = String::new();
    if let Some(body) = body {
        out.push_str(&format!("{CONTENT_LENGTH} {}\r\n", body.len()));
    }
    out.push_str("\r\n");
    writer.write_all(out.as_bytes()).map_err(io_error)?;
    if let Some(body) = body {
        writer.write_all(body).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)
}

pub fn write_request(writer: &mut impl Write, request: &Request) -> Result<(), CompileError> {
    let start_line = format!("{} {} HTTP/1.1\r\n", request.method, request.path);
    writer.write_all(start_line.as_bytes()).map_err(io_error)?;
    write_body(writer, &request.body)
}

pub fn read_request(reader: &mut impl Read) -> Result<Request, CompileError> {
    let mut buffered = BufReader::new(reader);
    let mut start_line = String::new();
    let n = buffered.read_line(&mut start_line).map_err(io_error)?;
    if n == 0 {
        return Err(http_error("connection closed before a request line arrived"));
    }
    let start_line = start_line.trim_end_matches(['\r', '\n']);
    let mut parts = start_line.split(' ');
    let method = parts.next().ok_or_else(|| http_error(format!("malformed request line '{start_line}'")))?.to_string();
    let path = parts.next().ok_or_else(|| http_error(format!("malformed request line '{start_line}'")))?.to_string();

    let content_length = read_headers(&mut buffered)?;
    let body = read_body(&mut buffered, content_length)?;
    Ok(Request { method, path, body })
}

pub fn write_response(writer: &mut impl Write, response: &Response) -> Result<(), CompileError> {
    let start_line = format!("HTTP/1.1 {}\r\n", response.status.as_line());
    writer.write_all(start_line.as_bytes()).map_err(io_error)?;
    write_body(writer, &response.body)
}

pub fn read_response(reader: &mut impl Read) -> Result<Response, CompileError> {
    let mut buffered = BufReader::new(reader);
    let mut start_line = String::new();
    let n = buffered.read_line(&mut start_line).map_err(io_error)?;
    if n == 0 {
        return Err(http_error("connection closed before a status line arrived"));
    }
    let start_line = start_line.trim_end_matches(['\r', '\n']);
    let status_text = start_line.strip_prefix("HTTP/1.1 ").ok_or_else(|| http_error(format!("malformed status line '{start_line}'")))?;
    let status = StatusCode::parse(status_text)?;

    let content_length = read_headers(&mut buffered)?;
    let body = read_body(&mut buffered, content_length)?;
    Ok(Response { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_round_trips_with_no_body() {
        let req = Request::get("/hello");
        let mut buf = Vec::new();
        write_request(&mut buf, &req).unwrap();
        let mut cursor = Cursor::new(buf);
        let read_back = read_request(&mut cursor).unwrap();
        assert_eq!(read_back, req);
    }

    #[test]
    fn request_round_trips_with_json_body() {
        let req = Request::post_json("/bootstrap/config", &serde_json::json!({"stages": ["lex"]})).unwrap();
        let mut buf = Vec::new();
        write_request(&mut buf, &req).unwrap();
        let mut cursor = Cursor::new(buf);
        let read_back = read_request(&mut cursor).unwrap();
        assert_eq!(read_back, req);
    }

    #[test]
    fn response_round_trips_with_hello_status() {
        let resp = Response::empty(StatusCode::Hello);
        let mut buf = Vec::new();
        write_response(&mut buf, &resp).unwrap();
        let mut cursor = Cursor::new(buf);
        let read_back = read_response(&mut cursor).unwrap();
        assert_eq!(read_back, resp);
    }

    #[test]
    fn response_round_trips_with_json_body() {
        let resp = Response::json(StatusCode::Ok, &serde_json::json!({"ok": true})).unwrap();
        let mut buf = Vec::new();
        write_response(&mut buf, &resp).unwrap();
        let mut cursor = Cursor::new(buf);
        let read_back = read_response(&mut cursor).unwrap();
        assert_eq!(read_back.json_body().unwrap(), Some(serde_json::json!({"ok": true})));
    }

    #[test]
    fn truncated_connection_is_an_http_error() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(read_request(&mut cursor).is_err());
    }

    #[test]
    fn malformed_content_length_is_an_http_error() {
        let raw = b"GET /hello HTTP/1.1\r\nContent-Length: nope\r\n\r\n".to_vec();
        let mut cursor = Cursor::new(raw);
        assert!(read_request(&mut cursor).is_err());
    }
}
