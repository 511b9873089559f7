#![forbid(unsafe_op_in_unsafe_fn)]

mod catalog;
mod events;
mod id;
mod source;
mod store;
mod types;

pub use catalog::*;
pub use events::*;
pub use id::*;
pub use source::*;
pub use store::*;
pub use types::*;
