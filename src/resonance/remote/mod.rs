// src/resonance/remote/mod.rs
//! Remote dataset boundary: PostgREST-style reads and per-row updates,
//! plus the bespoke bulk save endpoint. All HTTP in the crate lives here
//! (enforced by `tests/no_direct_remote_writes.rs`).

pub mod error;
pub mod validation;

use serde::Serialize;
use serde_json::json;

use super::definitions::{ResonanceKey, ResonancePatch, ResonanceRow, SemanticsRow};
use super::events::LoadedDatasets;
pub use error::{RemoteError, RemoteResult};
use validation::{coerce_resonance, coerce_semantics, RawResonanceRow, RawSemanticsRow};

const RESONANCE_TABLE: &str = "resonance";
const SEMANTICS_TABLE: &str = "media_semantics";

/// Connection settings for the remote dataset service.
#[derive(Debug, Clone, Default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Per-row update payload for the bulk save endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RowUpdate {
    pub tag: String,
    pub media_path: String,
    pub role: String,
    pub intensity: u8,
    pub enabled: bool,
}

impl RowUpdate {
    pub fn from_patch(key: &ResonanceKey, patch: &ResonancePatch) -> Self {
        Self {
            tag: key.tag.clone(),
            media_path: key.media_path.clone(),
            role: key.role.clone(),
            intensity: patch.intensity,
            enabled: patch.enabled,
        }
    }
}

/// Write half of the remote boundary. The save pipeline is generic over
/// this so its sequencing can be exercised against an in-memory store.
pub trait ResonanceWriter {
    fn update_row(
        &self,
        key: &ResonanceKey,
        patch: &ResonancePatch,
    ) -> impl std::future::Future<Output = RemoteResult<()>> + Send;
}

pub struct RemoteClient {
    http: reqwest::Client,
    config: RemoteConfig,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    fn bulk_save_url(&self) -> String {
        format!(
            "{}/admin/resonance/save",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn check(resp: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(RemoteError::Status {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            })
        }
    }

    /// Fetches all resonance wire rows, ordered by tag ascending.
    pub async fn fetch_resonance(&self) -> RemoteResult<Vec<RawResonanceRow>> {
        let resp = self
            .authed(self.http.get(self.table_url(RESONANCE_TABLE)))
            .query(&[
                ("select", "tag,media_path,role,intensity,enabled,created_at"),
                ("order", "tag.asc"),
            ])
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn fetch_semantics(&self) -> RemoteResult<Vec<RawSemanticsRow>> {
        let resp = self
            .authed(self.http.get(self.table_url(SEMANTICS_TABLE)))
            .query(&[
                (
                    "select",
                    "path,category,climate,energy,role,tags,enabled,created_at",
                ),
                ("order", "path.asc"),
            ])
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Single bulk save call: one request for the whole patch list.
    pub async fn save_batch(&self, rows: &[RowUpdate]) -> RemoteResult<()> {
        let resp = self
            .authed(self.http.post(self.bulk_save_url()))
            .json(&json!({ "rows": rows }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

impl ResonanceWriter for RemoteClient {
    /// Updates the mutable fields of one row, addressed by composite key.
    async fn update_row(&self, key: &ResonanceKey, patch: &ResonancePatch) -> RemoteResult<()> {
        let resp = self
            .authed(self.http.patch(self.table_url(RESONANCE_TABLE)))
            .query(&[
                ("tag", format!("eq.{}", key.tag)),
                ("media_path", format!("eq.{}", key.media_path)),
                ("role", format!("eq.{}", key.role)),
            ])
            .header("Prefer", "return=minimal")
            .json(&json!({
                "intensity": patch.intensity,
                "enabled": patch.enabled,
            }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

/// Fetches and validates both collections. Any failure here leaves the
/// caller's previous in-memory rows untouched; there is no partial merge.
pub async fn load_datasets(client: &RemoteClient) -> RemoteResult<LoadedDatasets> {
    let raw_resonance = client.fetch_resonance().await?;
    let raw_semantics = client.fetch_semantics().await?;

    let total = raw_resonance.len();
    let resonance: Vec<ResonanceRow> = raw_resonance
        .into_iter()
        .filter_map(coerce_resonance)
        .collect();
    let semantics: Vec<SemanticsRow> = raw_semantics
        .into_iter()
        .filter_map(coerce_semantics)
        .collect();

    Ok(LoadedDatasets {
        dropped: total - resonance.len(),
        resonance,
        semantics,
    })
}
