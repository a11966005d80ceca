//! Digest helpers for Skiff request signing

pub mod hash;

pub use hash::*;
