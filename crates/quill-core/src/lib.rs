//! # Quill Core
//!
//! The domain layer of the Quill blogging backend.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, the listing query builder, the authorization guard, and the post
//! lifecycle service.

pub mod domain;
pub mod error;
pub mod guard;
pub mod ports;
pub mod query;
pub mod service;
pub mod validate;

pub use error::DomainError;
pub use service::BlogService;
