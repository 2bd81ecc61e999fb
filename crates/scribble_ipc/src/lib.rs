//! Frontend/backend IPC: an abstract framed request/response protocol that
//! reuses HTTP's start-line/status-line/header/body syntax over a
//! UNIX-domain stream socket, per spec.md §4.4.

pub mod handshake;
pub mod listener;
pub mod message;
pub mod wire;

pub use handshake::WorkerChannel;
pub use listener::Listener;
pub use message::{Request, Response, StatusCode};
pub use wire::{read_request, read_response, write_request, write_response};
