#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod events;
pub mod transitions;
pub mod invariants;
pub mod hashing;
pub mod engine;
