use crate::catalog::protocol::{
    self, CreateGroupRequest, CreatedRecord, DeleteRequest, ListRequest, ListResponse,
};
use crate::catalog::{CatalogApi, CatalogItem, Group, ItemUpdate};
use crate::config::CatalogConfig;
use crate::errors::CatalogError;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::retry::RetryPolicy;
use std::time::Duration;

const COMPANY_ID_HEADER: HeaderName = HeaderName::from_static("x-company-id");

/// Catalog service client. Every call is a JSON `POST` retried under the configured policy.
#[derive(Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig, retry: RetryPolicy) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();

        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
            .map_err(|_| CatalogError::InvalidConfig("API key is not a valid header".into()))?;
        headers.insert(AUTHORIZATION, bearer);

        if let Some(company_id) = config.company_id.as_deref().filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(company_id).map_err(|_| {
                CatalogError::InvalidConfig("company id is not a valid header".into())
            })?;
            headers.insert(COMPANY_ID_HEADER, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpCatalog {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            retry,
        })
    }

    async fn post<P, R>(&self, path: &'static str, payload: &P) -> Result<R, CatalogError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .retry
            .send(|| self.client.post(&url).json(payload).send())
            .await
            .map_err(|source| CatalogError::Upstream { path, source })?;

        let body = response.text().await?;
        // Update and delete may answer with an empty body.
        let body = if body.trim().is_empty() { "null" } else { &body };

        serde_json::from_str(body)
            .map_err(|source| CatalogError::MalformedResponse { path, source })
    }
}

#[async_trait]
impl CatalogApi for HttpCatalog {
    async fn groups_named_like(
        &self,
        needle: &str,
        page: u32,
        rows: u32,
    ) -> Result<Vec<Group>, CatalogError> {
        let request = ListRequest::groups_named_like(needle, page, rows);
        let response: Option<ListResponse<Group>> =
            self.post(protocol::GROUPS_LIST, &request).await?;
        Ok(response.map(|r| r.rows).unwrap_or_default())
    }

    async fn items_in_group(
        &self,
        group_id: i64,
        page: u32,
        rows: u32,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let request = ListRequest::items_in_group(group_id, page, rows);
        let response: Option<ListResponse<CatalogItem>> =
            self.post(protocol::ITEMS_LIST, &request).await?;
        Ok(response.map(|r| r.rows).unwrap_or_default())
    }

    async fn update_item(&self, item_id: i64, update: ItemUpdate) -> Result<(), CatalogError> {
        let request = update.into_request(item_id);
        let _: serde_json::Value = self.post(protocol::ITEM_UPDATE, &request).await?;
        Ok(())
    }

    async fn create_group(&self, name: &str) -> Result<Group, CatalogError> {
        let created: CreatedRecord = self
            .post(protocol::GROUP_CREATE, &CreateGroupRequest { name })
            .await?;
        Ok(Group::new(created.id, name))
    }

    async fn delete_group(&self, group_id: i64) -> Result<(), CatalogError> {
        match self
            .post::<_, serde_json::Value>(protocol::GROUP_DELETE, &DeleteRequest { id: group_id })
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
                tracing::debug!(group_id, "Group already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
