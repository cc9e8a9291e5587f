pub mod feed;
pub mod follow;
pub mod post;
pub mod user;

pub use feed::Feed;
pub use follow::{FeedFollow, FollowSummary};
pub use post::Post;
pub use user::User;
