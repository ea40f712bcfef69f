//! Document codecs for the materialized-view cache.
//!
//! Atom payloads are opaque bytes to every storage layer. Only this crate
//! knows how to turn a logical document (a JSON value) into those bytes and
//! back. Implementations must round-trip exactly and be free of side
//! effects.
//!
//! - [`JsonCodec`] -- plain UTF-8 JSON
//! - [`ZstdJsonCodec`] -- JSON compressed with zstd

pub mod codec;
pub mod error;

pub use codec::{DocumentCodec, JsonCodec, ZstdJsonCodec};
pub use error::{CodecError, CodecResult};
