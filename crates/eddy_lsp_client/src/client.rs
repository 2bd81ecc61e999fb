//! A synchronous JSON-RPC 2.0 client over any `Read + Write` transport,
//! framed per [`crate::transport`]'s `Content-Length` convention. One
//! stream, one client: `eddy` dials a language server child process's
//! stdio pipes (`scribble-process::ManagedProcess`) and hands the pipe
//! ends here.

use std::io::{Read, Write};

use jsonrpc_core::types::id::Id;
use jsonrpc_core::types::params::Params;
use jsonrpc_core::types::request::{MethodCall, Notification as RpcNotification};
use jsonrpc_core::types::response::Output;
use jsonrpc_core::types::version::Version;
use scribble_base::CompileError;

use crate::transport::{read_message, write_message};

fn json_error(e: serde_json::Error) -> CompileError {
    CompileError::Json { offset: e.column(), message: e.to_string() }
}

/// An object becomes `Params::Map`; an array becomes `Params::Array`;
/// anything else (including absent params) becomes `Params::None`.
fn to_params(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => Params::Map(map),
        serde_json::Value::Array(items) => Params::Array(items),
        _ => Params::None,
    }
}

pub struct LspClient<S> {
    stream: S,
    next_id: u64,
}

impl<S: Read + Write> LspClient<S> {
    pub fn new(stream: S) -> Self {
        LspClient { stream, next_id: 1 }
    }

    /// Sends `method` as a request and blocks for its response, returning
    /// the decoded `result` field. A server error response becomes a
    /// `CompileError::Runtime` carrying its message.
    pub fn request(&mut self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, CompileError> {
        let id = Id::Num(self.next_id);
        self.next_id += 1;

        let call = MethodCall { jsonrpc: Some(Version::V2), method: method.to_string(), params: to_params(params), id };
        let envelope = serde_json::to_value(&call).map_err(json_error)?;
        write_message(&mut self.stream, &envelope)?;

        let response = read_message(&mut self.stream)?;
        let output: Output = serde_json::from_value(response).map_err(json_error)?;
        match output {
            Output::Success(success) => Ok(success.result),
            Output::Failure(failure) => Err(CompileError::Runtime(format!("{method}: {}", failure.error.message))),
        }
    }

    /// Sends `method` as a notification: no id is assigned and no reply
    /// is read.
    pub fn notify(&mut self, method: &str, params: serde_json::Value) -> Result<(), CompileError> {
        let notification = RpcNotification { jsonrpc: Some(Version::V2), method: method.to_string(), params: to_params(params) };
        let envelope = serde_json::to_value(&notification).map_err(json_error)?;
        write_message(&mut self.stream, &envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Position, Range, TextDocumentIdentifier, TextDocumentPositionParams};
    use crate::transport::{read_message, write_message};
    use std::os::unix::net::UnixStream;

    #[test]
    fn request_returns_the_servers_result_field() {
        let (mut server, client_stream) = UnixStream::pair().unwrap();
        let server_thread = std::thread::spawn(move || {
            let request = read_message(&mut server).unwrap();
            assert_eq!(request["method"], "textDocument/hover");
            let response = serde_json::json!({"jsonrpc": "2.0", "id": request["id"], "result": {"contents": "hi"}});
            write_message(&mut server, &response).unwrap();
        });

        let mut client = LspClient::new(client_stream);
        let params = TextDocumentPositionParams {
            textDocument: TextDocumentIdentifier { uri: "file:///x.scribble".to_string() },
            position: Position { line: 0, character: 4 },
        };
        let result = client.request("textDocument/hover", params.encode()).unwrap();
        assert_eq!(result["contents"], "hi");
        server_thread.join().unwrap();
    }

    #[test]
    fn request_surfaces_a_server_error_as_a_runtime_error() {
        let (mut server, client_stream) = UnixStream::pair().unwrap();
        let server_thread = std::thread::spawn(move || {
            let request = read_message(&mut server).unwrap();
            let response = serde_json::json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": {"code": -32601, "message": "method not found"}
            });
            write_message(&mut server, &response).unwrap();
        });

        let mut client = LspClient::new(client_stream);
        let err = client.request("bogus/method", serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, CompileError::Runtime(ref m) if m.contains("method not found")));
        server_thread.join().unwrap();
    }

    #[test]
    fn notify_sends_no_id_and_expects_no_reply() {
        let (mut server, client_stream) = UnixStream::pair().unwrap();
        let server_thread = std::thread::spawn(move || {
            let message = read_message(&mut server).unwrap();
            assert_eq!(message["method"], "textDocument/didOpen");
            assert!(message.get("id").is_none());
        });

        let mut client = LspClient::new(client_stream);
        let range = Range { start: Position { line: 0, character: 0 }, end: Position { line: 0, character: 0 } };
        client.notify("textDocument/didOpen", serde_json::json!({"range": range.encode()})).unwrap();
        server_thread.join().unwrap();
    }
}
