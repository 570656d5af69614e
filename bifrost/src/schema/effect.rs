//! The `Effect` object and the vestigial `Experience` stub.

use async_graphql::{Context, Object, Result, SimpleObject};

use bifrost_mediawiki::{Gateway, PageRef, SubstanceData};

use super::pagination;
use super::substance::Substance;

/// An effect page.
pub struct Effect {
    name: String,
    url: Option<String>,
}

impl Effect {
    /// Wraps a projected effect page.
    pub fn from_page(page: PageRef) -> Self {
        Self {
            name: page.name,
            url: Some(page.url),
        }
    }
}

#[Object]
impl Effect {
    /// Effect page title.
    async fn name(&self) -> &str {
        &self.name
    }

    /// Canonical page URL.
    async fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Substances known to produce this effect.
    async fn substances(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Substance>> {
        let gateway = ctx.data::<Gateway>()?;
        let pages = gateway
            .substances_by_effect(&[self.name.as_str()], pagination(limit, offset))
            .await
            .map_err(super::upstream_error)?;
        Ok(pages
            .into_iter()
            .map(|page| Substance::new(SubstanceData::from_page(page)))
            .collect())
    }
}

/// Placeholder for the deprecated `experiences` query.
#[derive(Debug, Clone, SimpleObject)]
pub struct Experience {
    /// Substance the report is about.
    pub substance: Option<String>,
    /// Report title.
    pub title: Option<String>,
}
