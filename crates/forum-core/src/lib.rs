//! Core types and authorization logic for the forum.
//!
//! This crate is free of HTTP and database dependencies. Storage
//! is reached only through the [`store::ForumStore`] trait; every operation in
//! here is a short sequence of calls against it.

// Native `async fn` in trait impls (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod authoring;
pub mod bootstrap;
pub mod capability;
pub mod community;
pub mod content;
pub mod deletion;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod principal;
pub mod rank;
pub mod store;
pub mod tree;

pub use error::{Error, Result};
