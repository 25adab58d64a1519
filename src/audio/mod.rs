//! Soundtrack decoding and shaping.

pub mod media;
pub mod mix;
