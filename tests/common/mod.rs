#![allow(dead_code)]

mod test_server;

pub use test_server::{SERVICE, TestResponse, TestServer, decode_claims};
