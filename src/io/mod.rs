pub mod api;
pub mod config_io;
pub mod http;
pub mod memory;
pub mod session;

pub use api::{ApiError, Backend};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
