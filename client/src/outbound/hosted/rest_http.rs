//! Reqwest-backed table API adapter for `users` and `vendors`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url, header};
use serde::Serialize;
use tracing::debug;

use super::HostedHttp;
use super::error_mapping::{HttpFailure, decode, is_no_rows, map_status_error, map_transport_error};
use super::session_store::SessionStore;
use crate::domain::ports::{
    NewUserRecord, NewVendorRecord, ProfileRepository, ProfileRepositoryError,
};
use crate::domain::{ProfileUpdate, RawUserRecord, UserId};

const USERS_PATH: &str = "rest/v1/users";
const VENDORS_PATH: &str = "rest/v1/vendors";
/// Every user read joins the vendor row under the canonical `shopname`
/// column.
const USER_SELECT: &str = "*,vendors(id,shopname,status)";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Table API adapter.
pub struct HostedProfileRepository {
    http: HostedHttp,
    store: Arc<SessionStore>,
}

impl HostedProfileRepository {
    pub(super) fn new(http: HostedHttp, store: Arc<SessionStore>) -> Self {
        Self { http, store }
    }

    fn user_url(&self, id: &UserId) -> Result<Url, HttpFailure> {
        let mut url = self.http.endpoint(USERS_PATH)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("select", USER_SELECT);
        Ok(url)
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        prefer: Option<&str>,
    ) -> Result<(StatusCode, Vec<u8>), HttpFailure> {
        let token = self.store.access_token();
        let mut request = self
            .http
            .request(method, url, token.as_deref().map(String::as_str))
            .header(header::ACCEPT, SINGLE_OBJECT);
        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        Ok((status, bytes.to_vec()))
    }

    /// One row or `None`; other failures are errors.
    async fn single_row<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        prefer: Option<&str>,
    ) -> Result<Option<RawUserRecord>, HttpFailure> {
        let (status, bytes) = self.send(method, url, body, prefer).await?;
        if is_no_rows(status, &bytes) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }
        decode(&bytes, "users row").map(Some)
    }

    async fn insert<B: Serialize + Sync>(&self, path: &str, row: &B) -> Result<(), HttpFailure> {
        let url = self.http.endpoint(path)?;
        let (status, bytes) = self
            .send(Method::POST, url, Some(row), Some("return=minimal"))
            .await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(map_status_error(status, &bytes))
        }
    }
}

#[async_trait]
impl ProfileRepository for HostedProfileRepository {
    async fn find_user(
        &self,
        id: &UserId,
    ) -> Result<Option<RawUserRecord>, ProfileRepositoryError> {
        let url = self.user_url(id)?;
        let row = self.single_row::<()>(Method::GET, url, None, None).await?;
        if row.is_none() {
            debug!(user_id = %id, "no users row");
        }
        Ok(row)
    }

    async fn insert_user(&self, record: &NewUserRecord) -> Result<(), ProfileRepositoryError> {
        self.insert(USERS_PATH, record).await?;
        debug!(user_id = %record.id, role = %record.role, "inserted users row");
        Ok(())
    }

    async fn update_user(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<RawUserRecord>, ProfileRepositoryError> {
        let url = self.user_url(id)?;
        let row = self
            .single_row(
                Method::PATCH,
                url,
                Some(update),
                Some("return=representation"),
            )
            .await?;
        Ok(row)
    }

    async fn insert_vendor(&self, record: &NewVendorRecord) -> Result<(), ProfileRepositoryError> {
        self.insert(VENDORS_PATH, record).await?;
        debug!(user_id = %record.user_id, "inserted vendors row");
        Ok(())
    }
}
