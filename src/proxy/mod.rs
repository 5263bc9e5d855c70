//! The request pipeline: read body, parse, build the Gemini payload, call
//! upstream, map the reply.

pub mod body;
pub mod handler;
pub mod payload;
pub mod request;
pub mod response;

pub use handler::{HandlerOutcome, InboundRequest, ProxyHandler};
pub use payload::build_payload;
pub use request::parse_generation_request;
pub use response::map_upstream_reply;
