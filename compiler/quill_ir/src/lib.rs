//! Quill IR - shared identifier and storage types
//!
//! This crate contains the small data structures every other Quill crate
//! leans on:
//! - `Word` interned token texts and the session-owned `Vocabulary`
//! - `Internalizer` for refcounted structural deduplication
//! - `MultiMap` for the parser's position indices
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: token texts are `Word(u32)`, compared in O(1)
//! - **Handles, not pointers**: stored values are addressed by small `Copy` ids
//! - **Single owner**: all tables are owned by one session and passed by reference

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod internalizer;
mod multimap;
mod vocabulary;
mod word;

pub use internalizer::{Acquired, Internalizer};
pub use multimap::MultiMap;
pub use vocabulary::Vocabulary;
pub use word::Word;
