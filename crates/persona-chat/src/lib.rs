//! A command-line demo where two personas text each other through one chat
//! model: persona A tries to talk a coworker into buying a new gadget, and
//! persona B answers.
//!
//! The crate includes the `persona-chat` binary. The argument parsing,
//! persona file loading, and rendering live here so they can be reused.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod cli;
pub mod config;
pub mod display;
