pub mod account;
pub mod board;
pub mod comment_tree;
pub mod dashboard;
pub mod project_ops;
pub mod project_view;
pub mod search;
pub mod task_ops;
pub mod users;

pub use comment_tree::{add_reply, build_forest};
pub use project_view::ProjectView;
pub use task_ops::request_transition;
