//! Domain entities - the core business objects.

mod post;
mod user;

pub use post::{NewPost, Post, PostPatch, PostState, reading_time};
pub use user::User;
