mod auth;
mod page;
mod short_url;

pub use auth::*;
pub use page::*;
pub use short_url::*;
