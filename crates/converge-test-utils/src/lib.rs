//! Shared test utilities for the converge workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`api`]: [`FakeApi`], an in-memory remote configuration API
//! - [`project`]: [`TestProject`] builder for declaration directories on disk

pub mod api;
pub mod project;

pub use api::FakeApi;
pub use project::TestProject;
