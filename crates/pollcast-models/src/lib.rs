pub mod poll;

pub use poll::{Poll, PollOption, VoteRecord, VoteStatus};
