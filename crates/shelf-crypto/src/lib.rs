//! Cryptographic primitives for the Shelf catalog.
//!
//! Provides BLAKE3 content hashing for cover deduplication and salted argon2
//! password credentials.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;
pub mod password;

pub use hasher::ContentHasher;
pub use password::{PasswordCredential, PasswordError};
