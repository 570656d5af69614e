//! SMW `ask` query composition and result projection.
//!
//! The wiki supports a small, closed family of selectors; each builder
//! returns the `query` parameter value for one of them. Projection maps the
//! `query.results` dictionary into `{name, url}` pairs, relying on the JSON
//! decoder preserving key order so upstream ranking survives.

use serde_json::Value;

use crate::error::Error;

/// Category selector shared by all substance listings.
const SUBSTANCE_CATEGORY: &str = "[[Category:Psychoactive substance]]";

/// `limit`/`offset` pagination for ask queries.
///
/// Either value is appended only when present and non-zero, matching the
/// upstream convention that `limit=0` means "unset".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Number of results to skip.
    pub offset: Option<u32>,
}

impl Pagination {
    /// A pagination with both values set.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    fn append_to(&self, query: &mut String) {
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            query.push_str(&format!("|limit={limit}"));
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            query.push_str(&format!("|offset={offset}"));
        }
    }
}

fn paginated(base: String, page: Pagination) -> String {
    let mut query = base;
    page.append_to(&mut query);
    query
}

/// Look up one substance page by exact title.
pub fn substance_by_title(title: &str, page: Pagination) -> String {
    paginated(format!("[[:{title}]]"), page)
}

/// Fallback lookup by the `common_name` property.
pub fn substance_by_common_name(name: &str, page: Pagination) -> String {
    paginated(
        format!("[[common_name::{name}]]|[[Category:psychoactive_substance]]"),
        page,
    )
}

/// Fallback lookup by the `systematic_name` property.
pub fn substance_by_systematic_name(name: &str, page: Pagination) -> String {
    paginated(
        format!("[[systematic_name::{name}]]|[[Category:psychoactive_substance]]"),
        page,
    )
}

/// Plain listing of every substance page.
pub fn substance_listing(page: Pagination) -> String {
    paginated(SUBSTANCE_CATEGORY.to_owned(), page)
}

/// Substances in a chemical class.
pub fn substances_by_chemical_class(class: &str, page: Pagination) -> String {
    paginated(
        format!("[[Chemical class::{class}]]|{SUBSTANCE_CATEGORY}"),
        page,
    )
}

/// Substances in a psychoactive class.
pub fn substances_by_psychoactive_class(class: &str, page: Pagination) -> String {
    paginated(
        format!("[[Psychoactive class::{class}]]|{SUBSTANCE_CATEGORY}"),
        page,
    )
}

/// Substances carrying every listed effect.
pub fn substances_by_effects<S: AsRef<str>>(effects: &[S], page: Pagination) -> String {
    let mut query = String::new();
    for effect in effects {
        query.push_str(&format!("[[Effect::{}]]|", effect.as_ref()));
    }
    query.push_str(SUBSTANCE_CATEGORY);
    paginated(query, page)
}

/// The effects attached to one substance, as a printout.
pub fn effects_of_substance(substance: &str, page: Pagination) -> String {
    paginated(format!("[[:{substance}]]|?Effect"), page)
}

/// Plain listing of every effect page.
pub fn effect_listing(page: Pagination) -> String {
    paginated("[[Category:Effect]]".to_owned(), page)
}

/// Effect search by name.
pub fn effect_search(effect: &str, page: Pagination) -> String {
    paginated(format!("[[Effect::{effect}]]"), page)
}

/// A projected `ask` result: one wiki page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    /// Page title.
    pub name: String,
    /// Canonical page URL.
    pub url: String,
}

/// Projects `query.results` into pages, preserving upstream order.
///
/// An empty result set is serialized by SMW as an empty array instead of
/// an object; both shapes yield an empty list.
pub fn project_results(payload: &Value) -> Result<Vec<PageRef>, Error> {
    let results = payload
        .get("query")
        .and_then(|query| query.get("results"))
        .ok_or_else(|| Error::payload("ask response has no `query.results`"))?;

    match results {
        Value::Object(map) => Ok(map.values().filter_map(page_ref).collect()),
        Value::Array(_) => Ok(Vec::new()),
        _ => Err(Error::payload("`query.results` is neither object nor array")),
    }
}

/// Projects the `?Effect` printout of an effects-of-substance query.
pub fn project_effect_printouts(payload: &Value, substance: &str) -> Result<Vec<PageRef>, Error> {
    let results = payload
        .get("query")
        .and_then(|query| query.get("results"))
        .ok_or_else(|| Error::payload("ask response has no `query.results`"))?;

    let Some(printouts) = results
        .get(substance)
        .and_then(|page| page.get("printouts"))
        .and_then(|printouts| printouts.get("Effect"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    Ok(printouts.iter().filter_map(page_ref).collect())
}

fn page_ref(value: &Value) -> Option<PageRef> {
    let name = value.get("fulltext").and_then(Value::as_str)?;
    let url = value.get("fullurl").and_then(Value::as_str)?;
    Some(PageRef {
        name: name.to_owned(),
        url: url.to_owned(),
    })
}
