//! `/rest/v1` row store endpoints: collection documents and share aliases.

use async_trait::async_trait;
use dinodex_core::collection::Dino;
use serde::{Deserialize, Serialize};

use super::SupabaseClient;
use crate::backend::{AliasStore, DocumentStore};
use crate::error::RemoteError;

/// Upsert that merges into the row matching the conflict key.
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";

#[derive(Debug, Deserialize)]
struct CollectionRow {
    #[serde(default)]
    data: Option<Vec<Dino>>,
}

#[derive(Debug, Serialize)]
struct CollectionUpsert<'a> {
    user_id: &'a str,
    data: &'a [Dino],
}

#[derive(Debug, Deserialize)]
struct UserIdRow {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct DomainRow {
    domain: String,
}

#[derive(Debug, Serialize)]
struct DomainUpsert<'a> {
    user_id: &'a str,
    domain: &'a str,
}

impl SupabaseClient {
    fn table(&self, table: &str) -> String {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    /// `GET` rows from `table` filtered by PostgREST query pairs.
    async fn select_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, RemoteError> {
        let request = self.client.get(self.table(table)).query(query);
        let response = self.authorized(request).await.send().await?;
        Self::parse_response(response).await
    }

    /// `POST` a single row with upsert semantics on `conflict_key`.
    async fn upsert_row<T: Serialize + ?Sized>(
        &self,
        table: &str,
        conflict_key: &str,
        row: &T,
    ) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.table(table))
            .query(&[("on_conflict", conflict_key)])
            .header("Prefer", PREFER_UPSERT)
            .json(row);
        let response = self.authorized(request).await.send().await?;
        Self::ensure_success(response).await.map(|_| ())
    }
}

#[async_trait]
impl DocumentStore for SupabaseClient {
    async fn fetch_collection(&self, user_id: &str) -> Result<Option<Vec<Dino>>, RemoteError> {
        let rows: Vec<CollectionRow> = self
            .select_rows(
                &self.config.collections_table,
                &[
                    ("select", "data".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().and_then(|row| row.data))
    }

    async fn upsert_collection(&self, user_id: &str, dinos: &[Dino]) -> Result<(), RemoteError> {
        self.upsert_row(
            &self.config.collections_table,
            "user_id",
            &CollectionUpsert {
                user_id,
                data: dinos,
            },
        )
        .await?;
        tracing::debug!(user_id, dinos = dinos.len(), "Collection document upserted");
        Ok(())
    }
}

#[async_trait]
impl AliasStore for SupabaseClient {
    async fn resolve_alias(&self, domain: &str) -> Result<Option<String>, RemoteError> {
        let rows: Vec<UserIdRow> = self
            .select_rows(
                &self.config.domains_table,
                &[
                    ("select", "user_id".to_string()),
                    ("domain", format!("eq.{domain}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.user_id))
    }

    async fn alias_for_user(&self, user_id: &str) -> Result<Option<String>, RemoteError> {
        let rows: Vec<DomainRow> = self
            .select_rows(
                &self.config.domains_table,
                &[
                    ("select", "domain".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.domain))
    }

    async fn alias_taken_by_other(&self, domain: &str, user_id: &str) -> Result<bool, RemoteError> {
        let rows: Vec<UserIdRow> = self
            .select_rows(
                &self.config.domains_table,
                &[
                    ("select", "user_id".to_string()),
                    ("domain", format!("eq.{domain}")),
                    ("user_id", format!("neq.{user_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn upsert_alias(&self, user_id: &str, domain: &str) -> Result<(), RemoteError> {
        self.upsert_row(
            &self.config.domains_table,
            "user_id",
            &DomainUpsert { user_id, domain },
        )
        .await
    }
}
