#![doc = include_str!("../README.md")]

mod alias;
mod allocator;
mod capacity;
mod cipher;
mod config;
mod error;
mod rand;
mod selector;
mod store;
mod words;

pub use crate::alias::*;
pub use crate::allocator::*;
pub use crate::capacity::*;
pub use crate::cipher::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::rand::*;
pub use crate::selector::*;
pub use crate::store::*;
pub use crate::words::*;
