#![doc = include_str!("../README.md")]

mod error;
mod parse;
mod serialize;

pub mod patch;
pub mod pointer;
pub mod value;

pub use crate::error::Error;
pub use crate::patch::Patch;
pub use crate::patch::PatchKind;
pub use crate::patch::PatchOp;
pub use crate::pointer::Pointer;
pub use crate::serialize::Serialize;
pub use crate::value::KeyRef;
pub use crate::value::Value;

pub type Result<T, E = Error> = std::result::Result<T, E>;
