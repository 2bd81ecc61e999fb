//! `Content-Length`-framed message transport — LSP's own base protocol.
//! Distinct from `scribble-ipc::wire`'s half-HTTP framing: no start line,
//! just a `Content-Length` header, a blank line, then a UTF-8 JSON body.

use std::io::{BufRead, BufReader, Read, Write};

use scribble_base::CompileError;

const CONTENT_LENGTH: &str = "Content-Length:";

fn io_error(e: std::io::Error) -> CompileError {
    CompileError::Io(e.to_string())
}

fn json_error(e: serde_json::Error) -> CompileError {
    CompileError::Json { offset: e.column(), message: e.to_string() }
}

pub fn write_message(writer: &mut impl Write, value: &serde_json::Value) -> Result<(), CompileError> {
    let body = serde_json::to_vec(value).map_err(json_error)?;
    write!(writer, "{CONTENT_LENGTH} {}\r\n\r\n", body.len()).map_err(io_error)?;
    writer.write_all(&body).map_err(io_error)?;
    writer.flush().map_err(io_error)
}

pub fn read_message(reader: &mut impl Read) -> Result<serde_json::Value, CompileError> {
    let mut buffered = BufReader::new(reader);
    let mut content_length = None;
    loop {
        let mut line = String::new();
        let n = buffered.read_line(&mut line).map_err(io_error)?;
        if n == 0 {
            return Err(CompileError::Io("connection closed while reading LSP headers".to_string()));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some(rest) = line.strip_prefix(CONTENT_LENGTH) {
            let value: usize =
                rest.trim().parse().map_err(|_| CompileError::Io(format!("malformed Content-Length '{rest}'")))?;
            content_length = Some(value);
        }
    }

    let len = content_length.ok_or_else(|| CompileError::Io("LSP message had no Content-Length header".to_string()))?;
    let mut body = vec![0u8; len];
    buffered.read_exact(&mut body).map_err(io_error)?;
    serde_json::from_slice(&body).map_err(json_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn message_round_trips_through_the_wire_format() {
        let value = serde_json::json!({"jsonrpc": "2.0", "method": "initialize", "id": 1});
        let mut buf = Vec::new();
        write_message(&mut buf, &value).unwrap();
        assert!(buf.starts_with(b"Content-Length: "));
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_message(&mut cursor).unwrap(), value);
    }

    #[test]
    fn missing_content_length_is_an_error() {
        let raw = b"X-Custom: 1\r\n\r\n{}".to_vec();
        let mut cursor = Cursor::new(raw);
        assert!(read_message(&mut cursor).is_err());
    }

    #[test]
    fn truncated_body_is_an_error() {
        let raw = b"Content-Length: 100\r\n\r\n{}".to_vec();
        let mut cursor = Cursor::new(raw);
        assert!(read_message(&mut cursor).is_err());
    }
}
