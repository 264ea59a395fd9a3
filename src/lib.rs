pub mod domain;
pub mod protocol;
pub mod shell;
pub mod store;
