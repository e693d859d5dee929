//! HTTP chat API.

pub mod chat_http;

pub use chat_http::{ChatHttpConfig, ChatHttpServer, ChatRequest, ChatResponse, ErrorResponse};
