//! Delimiter-separated text plumbing: tokenizing, row/column cursors,
//! typed cell conversion and header detection.

pub mod convert;
pub mod cursor;
pub mod emitter;
pub mod header;
pub mod patterns;
pub mod tokenizer;
