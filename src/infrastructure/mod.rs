pub mod http;
pub mod mock;
