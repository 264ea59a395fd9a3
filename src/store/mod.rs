mod kv;
mod token_store;

pub use kv::*;
pub use token_store::*;
