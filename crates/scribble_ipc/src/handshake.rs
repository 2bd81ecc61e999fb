//! The worker-side state machine spec.md §4.4 describes: `hello` →
//! `fetch_config` → per-stage `start`/`done` (or `errors`/`panic`) →
//! `goodbye`. One thin wrapper, `WorkerChannel`, issues each step as a
//! request and checks the response status; callers drive stage order.

use std::io::{Read, Write};

use scribble_base::CompileError;

use crate::message::{Request, Response, StatusCode};
use crate::wire::{read_response, write_request};

pub struct WorkerChannel<S> {
    stream: S,
}

impl<S: Read + Write> WorkerChannel<S> {
    pub fn new(stream: S) -> Self {
        WorkerChannel { stream }
    }

    fn roundtrip(&mut self, request: Request) -> Result<Response, CompileError> {
        write_request(&mut self.stream, &request)?;
        read_response(&mut self.stream)
    }

    fn expect_status(&mut self, request: Request, expected: StatusCode) -> Result<Response, CompileError> {
        let response = self.roundtrip(request)?;
        if response.status != expected {
            return Err(crate::message::http_error(format!("expected status {:?}, got {:?}", expected, response.status)));
        }
        Ok(response)
    }

    /// Step 1: `GET /hello` → `HELLO`.
    pub fn hello(&mut self) -> Result<(), CompileError> {
        self.expect_status(Request::get("/hello"), StatusCode::Hello)?;
        Ok(())
    }

    /// Step 2: `GET /bootstrap/config` → the backend configuration JSON.
    pub fn fetch_config(&mut self) -> Result<serde_json::Value, CompileError> {
        let response = self.expect_status(Request::get("/bootstrap/config"), StatusCode::Ok)?;
        response.json_body()?.ok_or_else(|| crate::message::http_error("/bootstrap/config returned no body"))
    }

    /// `GET /<stage>/start`, posted only when that stage's `debug` flag is set.
    pub fn stage_start(&mut self, stage: &str) -> Result<(), CompileError> {
        self.expect_status(Request::get(format!("/{stage}/start")), StatusCode::Ok)?;
        Ok(())
    }

    /// `GET /<stage>/done`, posted only when that stage's `debug` flag is set.
    pub fn stage_done(&mut self, stage: &str) -> Result<(), CompileError> {
        self.expect_status(Request::get(format!("/{stage}/done")), StatusCode::Ok)?;
        Ok(())
    }

    /// `POST /<stage>/errors` with the stage's collected errors as JSON.
    pub fn stage_errors(&mut self, stage: &str, errors: &serde_json::Value) -> Result<(), CompileError> {
        let request = Request::post_json(format!("/{stage}/errors"), errors)?;
        self.expect_status(request, StatusCode::Ok)?;
        Ok(())
    }

    /// `POST /panic` with a short failure summary — always the last message
    /// a failing worker sends.
    pub fn panic(&mut self, message: &str) -> Result<(), CompileError> {
        let request = Request::post_json("/panic", &serde_json::json!({"message": message}))?;
        self.expect_status(request, StatusCode::Ok)?;
        Ok(())
    }

    /// `GET /goodbye` — the last message a successful worker sends.
    pub fn goodbye(&mut self) -> Result<(), CompileError> {
        self.expect_status(Request::get("/goodbye"), StatusCode::Ok)?;
        Ok(())
    }
}
