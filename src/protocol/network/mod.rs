mod client;
mod config;
mod error;
mod pager;
mod refresh;
mod shortener;

pub use client::*;
pub use config::*;
pub use error::*;
pub use pager::*;
pub use shortener::*;
