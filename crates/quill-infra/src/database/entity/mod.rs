//! SeaORM entities for the on-disk record layout.

pub mod post;
pub mod user;
