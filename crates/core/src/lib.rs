//! Core domain logic for the Scout account-intelligence agent.
//!
//! This crate holds everything that is pure or near-pure:
//! - configuration loading and validation (`config`)
//! - the closed account-alias table (`aliases`)
//! - query rewriting: quoting, alias expansion, temporal extraction (`rewrite`)
//! - facet-filter wire shapes and composition (`filters`)
//! - the agent instruction preamble, carried as data (`instructions`)
//!
//! Nothing in this crate performs network I/O. The search and model clients
//! live in their own crates and consume these types.

pub mod aliases;
pub mod config;
pub mod filters;
pub mod instructions;
pub mod rewrite;
