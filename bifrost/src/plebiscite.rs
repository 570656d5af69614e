//! Read-only access to the Erowid experience reports collection.
//!
//! The collection is maintained elsewhere; Bifrost only pages through it.
//! The Mongo client is created lazily on the first query so a gateway with
//! the feature enabled still boots when the database is briefly away.

use std::sync::Arc;

use async_graphql::SimpleObject;
use futures::TryStreamExt;
use mongodb::Client;
use mongodb::bson::doc;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::PlebisciteConfig;

/// Datasource failures surfaced to the erowid resolver.
#[derive(Debug, thiserror::Error)]
pub enum PlebisciteError {
    /// Anything the Mongo driver reports.
    #[error("plebiscite datasource error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// One experience report document.
#[derive(Debug, Clone, Default, Deserialize, SimpleObject)]
#[serde(default)]
pub struct Erowid {
    /// Report title.
    pub title: Option<String>,
    /// Report author.
    pub author: Option<String>,
    /// Report body.
    pub story: Option<String>,
    /// Publication metadata.
    pub meta: Option<ErowidMeta>,
    /// What was taken.
    #[serde(rename = "substanceInfo")]
    pub substance_info: Option<ErowidSubstanceInfo>,
}

/// Publication metadata of a report.
#[derive(Debug, Clone, Default, Deserialize, SimpleObject)]
#[serde(default)]
pub struct ErowidMeta {
    /// Publication time in epoch milliseconds.
    pub published: Option<f64>,
    /// Author gender as reported.
    pub gender: Option<String>,
    /// Author age as reported.
    pub age: Option<f64>,
    /// View counter.
    pub views: Option<f64>,
}

/// Substance details of a report.
#[derive(Debug, Clone, Default, Deserialize, SimpleObject)]
#[serde(default)]
pub struct ErowidSubstanceInfo {
    /// Substance name.
    pub substance: Option<String>,
    /// Reported dose.
    pub dose: Option<String>,
    /// Route of administration as reported.
    pub method: Option<String>,
}

/// The Plebiscite datasource handle.
#[derive(Clone)]
pub struct Plebiscite {
    config: PlebisciteConfig,
    client: Arc<OnceCell<Client>>,
}

impl Plebiscite {
    /// Wraps the configuration; no connection is made yet.
    pub fn new(config: PlebisciteConfig) -> Self {
        Self {
            config,
            client: Arc::new(OnceCell::new()),
        }
    }

    async fn collection(&self) -> Result<mongodb::Collection<Erowid>, PlebisciteError> {
        let client = self
            .client
            .get_or_try_init(|| async {
                debug!(db = %self.config.database, "connecting plebiscite datasource");
                Client::with_uri_str(&self.config.mongo_url).await
            })
            .await?;
        Ok(client
            .database(&self.config.database)
            .collection(&self.config.collection))
    }

    /// Pages through reports, newest first, optionally filtered by
    /// substance name.
    pub async fn experiences(
        &self,
        substance: Option<&str>,
        limit: i32,
        offset: i32,
    ) -> Result<Vec<Erowid>, PlebisciteError> {
        let filter = match substance {
            Some(substance) => doc! { "substanceInfo.substance": substance },
            None => doc! {},
        };

        let cursor = self
            .collection()
            .await?
            .find(filter)
            .sort(doc! { "meta.published": -1 })
            .skip(offset.max(0) as u64)
            .limit(i64::from(limit.max(0)))
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
