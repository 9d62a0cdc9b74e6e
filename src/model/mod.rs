pub mod id;
pub mod comment;
pub mod task;
pub mod user;
pub mod project;
pub mod config;

pub use id::*;
pub use comment::*;
pub use task::*;
pub use user::*;
pub use project::*;
pub use config::*;
