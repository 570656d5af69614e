//! High-level wiki operations consumed by the GraphQL resolvers.
//!
//! Every operation composes the ask/parse builders with the cached
//! connector and projects the payload into typed values. The gateway holds
//! no per-request state; pagination and selectors are threaded through
//! explicitly.

use futures::future::join_all;
use serde_json::Value;
use tracing::warn;

use crate::ask::{self, PageRef, Pagination};
use crate::client::ApiClient;
use crate::error::Error;
use crate::page::{self, DEFAULT_CDN_URL, DEFAULT_THUMB_SIZE, SubstanceImage};
use crate::params::ApiParams;
use crate::parser;
use crate::smw;
use crate::substance::SubstanceRecord;

/// Which substance listing a `substances` query asked for.
///
/// The four selectors are mutually exclusive at the schema boundary; the
/// gateway only ever sees one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstanceSelector {
    /// Title search with common/systematic-name fallback and enrichment.
    Query(String),
    /// Substances carrying every listed effect.
    Effects(Vec<String>),
    /// Substances in a chemical class.
    ChemicalClass(String),
    /// Substances in a psychoactive class.
    PsychoactiveClass(String),
    /// The default category listing.
    Listing,
}

/// A substance as the resolvers see it: a page reference plus, when the
/// lookup was enriched, its parsed semantic record.
///
/// Interaction stubs have a name only.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstanceData {
    /// Page title.
    pub name: String,
    /// Canonical page URL; absent on stubs.
    pub url: Option<String>,
    /// Parsed semantic record; absent on projection-only lookups.
    pub record: Option<SubstanceRecord>,
}

impl SubstanceData {
    /// A bare page reference without semantic data.
    pub fn from_page(page: PageRef) -> Self {
        Self {
            name: page.name,
            url: Some(page.url),
            record: None,
        }
    }

    /// A name-only stub for an unresolvable interaction entry.
    pub fn stub(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            record: None,
        }
    }
}

/// Outcome of resolving one interaction name.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedInteraction {
    /// Exactly one substance matched; it carries its semantic record.
    Match(Box<SubstanceData>),
    /// Zero or ambiguous matches; only the raw name survives.
    Stub(String),
}

impl ResolvedInteraction {
    /// Flattens the outcome into resolver data.
    pub fn into_data(self) -> SubstanceData {
        match self {
            ResolvedInteraction::Match(data) => *data,
            ResolvedInteraction::Stub(name) => SubstanceData::stub(name),
        }
    }
}

/// The gateway over the upstream wiki.
#[derive(Clone)]
pub struct Gateway {
    client: ApiClient,
    cdn_url: String,
    thumb_size: u32,
}

impl Gateway {
    /// Wraps a connector with the default CDN settings.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            cdn_url: DEFAULT_CDN_URL.to_owned(),
            thumb_size: DEFAULT_THUMB_SIZE,
        }
    }

    /// Overrides the CDN base used for image derivation.
    pub fn with_cdn_url(mut self, cdn_url: impl Into<String>) -> Self {
        self.cdn_url = cdn_url.into();
        self
    }

    async fn ask(&self, query: String) -> Result<Value, Error> {
        self.client.fetch(ApiParams::ask(query)).await
    }

    /// Lists substances for a non-`Query` selector, projection only.
    pub async fn substances(
        &self,
        selector: &SubstanceSelector,
        page: Pagination,
    ) -> Result<Vec<PageRef>, Error> {
        let query = match selector {
            SubstanceSelector::Query(query) => return self.search_substances(query, page).await,
            SubstanceSelector::Effects(effects) => ask::substances_by_effects(effects, page),
            SubstanceSelector::ChemicalClass(class) => {
                ask::substances_by_chemical_class(class, page)
            }
            SubstanceSelector::PsychoactiveClass(class) => {
                ask::substances_by_psychoactive_class(class, page)
            }
            SubstanceSelector::Listing => ask::substance_listing(page),
        };
        ask::project_results(&self.ask(query).await?)
    }

    /// Title search with the common-name and systematic-name fallbacks.
    pub async fn search_substances(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<PageRef>, Error> {
        let pages =
            ask::project_results(&self.ask(ask::substance_by_title(query, page)).await?)?;
        if !pages.is_empty() {
            return Ok(pages);
        }
        let pages =
            ask::project_results(&self.ask(ask::substance_by_common_name(query, page)).await?)?;
        if !pages.is_empty() {
            return Ok(pages);
        }
        ask::project_results(&self.ask(ask::substance_by_systematic_name(query, page)).await?)
    }

    /// Title search where every hit is enriched with its semantic record.
    ///
    /// Enrichment fans out concurrently; the result keeps search order.
    pub async fn enriched_substances(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<SubstanceData>, Error> {
        let pages = self.search_substances(query, page).await?;
        let records = join_all(
            pages
                .iter()
                .map(|page| self.semantic_record(&page.name)),
        )
        .await;

        pages
            .into_iter()
            .zip(records)
            .map(|(page, record)| {
                Ok(SubstanceData {
                    name: page.name,
                    url: Some(page.url),
                    record: Some(record?),
                })
            })
            .collect()
    }

    /// Fetches and parses the semantic properties of one page.
    pub async fn semantic_record(&self, name: &str) -> Result<SubstanceRecord, Error> {
        let payload = self
            .client
            .fetch(ApiParams::browse_by_subject(name))
            .await?;
        let subject = smw::transform(&payload)?;
        Ok(parser::parse_substance(&subject))
    }

    /// Two-paragraph page abstract; `None` on any upstream or parse issue.
    pub async fn summary(&self, name: &str) -> Option<String> {
        let params = ApiParams::parse_page(name, "text").with("section", "0");
        match self.client.fetch(params).await {
            Ok(payload) => page::extract_summary(&payload),
            Err(error) => {
                warn!(page = name, %error, "abstract fetch failed");
                None
            }
        }
    }

    /// Derived image URLs; `None` on failure or when the page has none.
    pub async fn images(&self, name: &str) -> Option<Vec<SubstanceImage>> {
        let params = ApiParams::parse_page(name, "images");
        match self.client.fetch(params).await {
            Ok(payload) => page::derive_images(&payload, &self.cdn_url, self.thumb_size),
            Err(error) => {
                warn!(page = name, %error, "image fetch failed");
                None
            }
        }
    }

    /// The effects attached to one substance.
    pub async fn effects_by_substance(
        &self,
        substance: &str,
        page: Pagination,
    ) -> Result<Vec<PageRef>, Error> {
        let payload = self.ask(ask::effects_of_substance(substance, page)).await?;
        ask::project_effect_printouts(&payload, substance)
    }

    /// Substances carrying every listed effect, projection only.
    pub async fn substances_by_effect<S: AsRef<str>>(
        &self,
        effects: &[S],
        page: Pagination,
    ) -> Result<Vec<PageRef>, Error> {
        ask::project_results(&self.ask(ask::substances_by_effects(effects, page)).await?)
    }

    /// Effect listing, or an effect search when a term is given.
    pub async fn effects(
        &self,
        search: Option<&str>,
        page: Pagination,
    ) -> Result<Vec<PageRef>, Error> {
        let query = match search {
            Some(effect) => ask::effect_search(effect, page),
            None => ask::effect_listing(page),
        };
        ask::project_results(&self.ask(query).await?)
    }

    /// Resolves one raw interaction name to a substance or a stub.
    ///
    /// Only an unambiguous single match is enriched; zero or several
    /// matches collapse to a name-only stub.
    pub async fn resolve_interaction(&self, name: &str) -> Result<ResolvedInteraction, Error> {
        let page = Pagination {
            limit: Some(1),
            offset: None,
        };
        let mut matches = self.enriched_substances(name, page).await?;
        if matches.len() == 1 {
            Ok(ResolvedInteraction::Match(Box::new(
                matches.remove(0),
            )))
        } else {
            Ok(ResolvedInteraction::Stub(name.to_owned()))
        }
    }
}
