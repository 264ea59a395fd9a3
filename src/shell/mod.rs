mod args;
mod commands;

pub use args::*;
pub use commands::*;
