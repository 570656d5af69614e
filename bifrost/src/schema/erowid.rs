//! The `erowid` query over the Plebiscite datasource.

use async_graphql::{Context, Object, Result};

use crate::plebiscite::{Erowid, Plebiscite};

/// Root carrying the erowid query; merged into the schema only when the
/// datasource is configured.
#[derive(Default)]
pub struct ErowidQueryRoot;

#[Object]
impl ErowidQueryRoot {
    /// Erowid experience reports, newest first.
    ///
    /// When `substance` is given, only reports about that substance are
    /// returned.
    async fn erowid(
        &self,
        ctx: &Context<'_>,
        substance: Option<String>,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<Vec<Erowid>> {
        let plebiscite = ctx.data::<Plebiscite>()?;
        plebiscite
            .experiences(substance.as_deref(), limit, offset)
            .await
            .map_err(|error| async_graphql::Error::new(error.to_string()))
    }
}
