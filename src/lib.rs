// src/lib.rs

// Nested-array ("tensor") shape, path and layout operations, plus the
// host boundary and CLI built on top of them.

pub mod tensor_ops;
pub mod host;
pub mod blocks;
pub mod config;
pub mod runtime_interface;

pub use blocks::TensorBlocks;
pub use host::{Host, HostValue, JsonHost};
pub use tensor_ops::{Tensor, TensorError};
