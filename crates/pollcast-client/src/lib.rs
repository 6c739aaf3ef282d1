pub mod api;
pub mod display;
pub mod identity;
pub mod watch;

pub use api::{ClientError, PollClient};
