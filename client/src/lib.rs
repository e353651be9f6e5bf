//! Thin, generic plumbing for HTTP round-trips: build a URL, encode a
//! request, execute it through a shared transport, parse the response into
//! a typed result. Each piece is a small trait with interchangeable
//! variants; applications compose them linearly per request.

pub use crate::builder::*;
pub use crate::encoder::*;
pub use crate::http::*;
pub use crate::parser::*;
pub use crate::result::*;
pub use crate::session::*;

pub mod builder;
pub mod encoder;
pub mod http;
pub mod parser;
pub mod result;
pub mod session;
