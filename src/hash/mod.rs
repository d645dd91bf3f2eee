// Hash Core Library
// Content identity for the synchronizer

pub mod digest;

pub use digest::{ContentDigest, DigestComputer, HashAlgorithm};
