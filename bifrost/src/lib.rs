//! Bifrost: a read-only GraphQL gateway over the PsychonautWiki
//! Semantic MediaWiki API.
//!
//! Queries about substances, effects and their relationships are answered
//! by composing cached upstream API calls through
//! [`bifrost_mediawiki::Gateway`] and projecting the parsed records into
//! the GraphQL schema defined in [`schema`].

pub mod cli;
pub mod config;
pub mod schema;
pub mod server;

#[cfg(feature = "plebiscite")]
pub mod plebiscite;
