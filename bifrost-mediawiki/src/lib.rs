//! Upstream MediaWiki plumbing for the Bifrost gateway.
//!
//! This crate owns everything between the GraphQL resolvers and the wiki:
//! the retried HTTP connector and its SWR cache delegation, the `ask` query
//! composer and result projector, the `browsebysubject` transformer, the
//! property/wikitext parser that produces structured substance records, and
//! the abstract/image derivation over `action=parse` payloads.
//!
//! The crate deals in three layers of data:
//!
//! 1. raw `serde_json::Value` payloads as returned by `api.php`,
//! 2. the weakly-typed [`smw::SmwSubject`] property list,
//! 3. the structured [`substance::SubstanceRecord`] the resolvers consume.

pub mod ask;
pub mod client;
pub mod error;
pub mod gateway;
pub mod page;
pub mod params;
pub mod parser;
pub mod smw;
pub mod substance;
pub mod wikitext;

pub use ask::{PageRef, Pagination};
pub use client::{ApiClient, ApiClientBuilder, Transport};
pub use error::Error;
pub use gateway::{Gateway, ResolvedInteraction, SubstanceData, SubstanceSelector};
pub use page::SubstanceImage;
pub use params::ApiParams;
pub use substance::{Roa, SubstanceRecord};
