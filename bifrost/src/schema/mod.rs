//! GraphQL schema and root resolvers.
//!
//! The root queries mirror the small family of upstream lookups; nested
//! fields on [`substance::Substance`] and [`effect::Effect`] trigger their
//! own cached fetches, so the depth of an incoming query bounds the number
//! of upstream calls, never the data itself.

pub mod effect;
pub mod substance;

#[cfg(feature = "plebiscite")]
pub mod erowid;

use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Result, Schema};

use bifrost_mediawiki::{Gateway, Pagination, SubstanceData, SubstanceSelector};

use effect::{Effect, Experience};
use substance::Substance;

/// Converts a connector error into a GraphQL error.
pub(crate) fn upstream_error(error: bifrost_mediawiki::Error) -> async_graphql::Error {
    async_graphql::Error::new(error.to_string())
}

/// Builds an ask pagination from GraphQL integer arguments.
///
/// Zero and negative values are treated as unset, matching the upstream
/// convention.
pub(crate) fn pagination(limit: i32, offset: i32) -> Pagination {
    Pagination {
        limit: (limit > 0).then_some(limit as u32),
        offset: (offset > 0).then_some(offset as u32),
    }
}

/// The core query root.
#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Substances by search term, effect, class, or the default listing.
    ///
    /// The four selectors are mutually exclusive. Only the `query` branch
    /// enriches results with the full semantic record; the others return
    /// page references whose fields resolve lazily.
    async fn substances(
        &self,
        ctx: &Context<'_>,
        effect: Option<String>,
        query: Option<String>,
        chemical_class: Option<String>,
        psychoactive_class: Option<String>,
        #[graphql(default = 10)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Substance>> {
        let selectors = [
            effect.is_some(),
            query.is_some(),
            chemical_class.is_some(),
            psychoactive_class.is_some(),
        ];
        if selectors.iter().filter(|set| **set).count() > 1 {
            return Err(async_graphql::Error::new(
                "substances accepts at most one of `query`, `effect`, `chemicalClass` and `psychoactiveClass`",
            ));
        }

        let gateway = ctx.data::<Gateway>()?;
        let page = pagination(limit, offset);

        if let Some(query) = query {
            let substances = gateway
                .enriched_substances(&query, page)
                .await
                .map_err(upstream_error)?;
            return Ok(substances.into_iter().map(Substance::new).collect());
        }

        let selector = if let Some(effect) = effect {
            SubstanceSelector::Effects(vec![effect])
        } else if let Some(class) = chemical_class {
            SubstanceSelector::ChemicalClass(class)
        } else if let Some(class) = psychoactive_class {
            SubstanceSelector::PsychoactiveClass(class)
        } else {
            SubstanceSelector::Listing
        };

        let pages = gateway
            .substances(&selector, page)
            .await
            .map_err(upstream_error)?;
        Ok(pages
            .into_iter()
            .map(|page| Substance::new(SubstanceData::from_page(page)))
            .collect())
    }

    /// Substances carrying every listed effect.
    #[graphql(name = "substances_by_effect")]
    async fn substances_by_effect(
        &self,
        ctx: &Context<'_>,
        effect: Option<Vec<String>>,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Substance>> {
        list_substances_by_effect(ctx, effect, limit, offset).await
    }

    /// Camel-case alias of `substances_by_effect`.
    #[graphql(name = "substancesByEffect")]
    async fn substances_by_effect_alias(
        &self,
        ctx: &Context<'_>,
        effect: Option<Vec<String>>,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Substance>> {
        list_substances_by_effect(ctx, effect, limit, offset).await
    }

    /// The effects attached to one substance.
    #[graphql(name = "effects_by_substance")]
    async fn effects_by_substance(
        &self,
        ctx: &Context<'_>,
        substance: String,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Effect>> {
        list_effects_by_substance(ctx, substance, limit, offset).await
    }

    /// Camel-case alias of `effects_by_substance`.
    #[graphql(name = "effectsBySubstance")]
    async fn effects_by_substance_alias(
        &self,
        ctx: &Context<'_>,
        substance: String,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Effect>> {
        list_effects_by_substance(ctx, substance, limit, offset).await
    }

    /// Effect listing, or an effect search when a term is given.
    async fn effects(
        &self,
        ctx: &Context<'_>,
        effect: Option<String>,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Effect>> {
        let gateway = ctx.data::<Gateway>()?;
        let pages = gateway
            .effects(effect.as_deref(), pagination(limit, offset))
            .await
            .map_err(upstream_error)?;
        Ok(pages.into_iter().map(Effect::from_page).collect())
    }

    /// Deprecated; kept addressable and always empty.
    async fn experiences(
        &self,
        substance: Option<String>,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Vec<Experience> {
        let _ = (substance, limit, offset);
        Vec::new()
    }
}

async fn list_substances_by_effect(
    ctx: &Context<'_>,
    effect: Option<Vec<String>>,
    limit: i32,
    offset: i32,
) -> Result<Vec<Substance>> {
    let gateway = ctx.data::<Gateway>()?;
    let effects = effect.unwrap_or_default();
    let pages = gateway
        .substances_by_effect(&effects, pagination(limit, offset))
        .await
        .map_err(upstream_error)?;
    Ok(pages
        .into_iter()
        .map(|page| Substance::new(SubstanceData::from_page(page)))
        .collect())
}

async fn list_effects_by_substance(
    ctx: &Context<'_>,
    substance: String,
    limit: i32,
    offset: i32,
) -> Result<Vec<Effect>> {
    let gateway = ctx.data::<Gateway>()?;
    let pages = gateway
        .effects_by_substance(&substance, pagination(limit, offset))
        .await
        .map_err(upstream_error)?;
    Ok(pages.into_iter().map(Effect::from_page).collect())
}

/// Schema without the optional erowid query.
pub type CoreSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

#[cfg(feature = "plebiscite")]
/// Query root with the erowid query merged in.
#[derive(async_graphql::MergedObject, Default)]
pub struct PlebisciteQueryRoot(QueryRoot, erowid::ErowidQueryRoot);

#[cfg(feature = "plebiscite")]
/// Schema with the erowid query present.
pub type PlebisciteSchema = Schema<PlebisciteQueryRoot, EmptyMutation, EmptySubscription>;

/// The gateway schema; the erowid query only exists in the schema when
/// the plebiscite datasource is configured, so querying it without the
/// feature fails GraphQL validation rather than at runtime.
#[derive(Clone)]
pub enum AppSchema {
    /// Wiki-only schema.
    Core(CoreSchema),
    /// Wiki plus erowid experience reports.
    #[cfg(feature = "plebiscite")]
    Plebiscite(PlebisciteSchema),
}

impl AppSchema {
    /// Executes one GraphQL request.
    pub async fn execute(&self, request: async_graphql::Request) -> async_graphql::Response {
        match self {
            AppSchema::Core(schema) => schema.execute(request).await,
            #[cfg(feature = "plebiscite")]
            AppSchema::Plebiscite(schema) => schema.execute(request).await,
        }
    }

    /// The schema in SDL form.
    pub fn sdl(&self) -> String {
        match self {
            AppSchema::Core(schema) => schema.sdl(),
            #[cfg(feature = "plebiscite")]
            AppSchema::Plebiscite(schema) => schema.sdl(),
        }
    }
}

/// Builds the wiki-only schema.
pub fn build_schema(gateway: Gateway) -> AppSchema {
    AppSchema::Core(
        Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
            .data(gateway)
            .finish(),
    )
}

/// Builds the schema with the erowid query enabled.
#[cfg(feature = "plebiscite")]
pub fn build_schema_with_plebiscite(
    gateway: Gateway,
    plebiscite: crate::plebiscite::Plebiscite,
) -> AppSchema {
    AppSchema::Plebiscite(
        Schema::build(
            PlebisciteQueryRoot::default(),
            EmptyMutation,
            EmptySubscription,
        )
        .data(gateway)
        .data(plebiscite)
        .finish(),
    )
}
