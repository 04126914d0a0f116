//! An abstraction layer over chat-completion models.
//!
//! This crate establishes a unified protocol for the dialogue driver to
//! talk to various chat-completion backends, so that the backend can be
//! swapped (a remote server, a scripted fake for tests) without touching
//! the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
