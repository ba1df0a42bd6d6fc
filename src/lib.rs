pub mod blog;
pub mod config;
pub mod content;
pub mod content_cache;
pub mod dates;
pub mod error;
pub mod gateway;
pub mod logger;
pub mod paginator;
pub mod post;
pub mod post_cache;
pub mod post_list;
pub mod query_string;
pub mod server;
pub mod session;
pub mod store;
pub mod text_utils;
pub mod util;
pub mod validation;
pub mod view;
mod test_data;
