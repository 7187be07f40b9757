// src/nn/mod.rs
// Network capability consumed by the derivative engines.

pub mod network;

pub use network::{FnNetwork, Network};
