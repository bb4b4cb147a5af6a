//! Client for the internal VDC REST API.

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{config::AdapterConfig, Error, Result};

pub mod records;

pub use records::{ImageRecord, InstanceRecord, Ipv4, Vif};
use records::Page;

/// Header carrying the account on whose behalf a call is made.
pub const ACCOUNT_HEADER: &str = "X_VDC_ACCOUNT_UUID";

/// A form field value: a scalar, or a list sent as repeated `key[]` pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Scalar(String),
    List(Vec<String>),
}

/// Flatten form fields into url-encodable pairs.
pub fn encode_form(fields: &[(&str, FormValue)]) -> Vec<(String, String)> {
    let mut pairs = vec![];
    for (key, value) in fields {
        match value {
            FormValue::Scalar(value) => pairs.push((key.to_string(), value.clone())),
            FormValue::List(values) => {
                pairs.extend(values.iter().map(|v| (format!("{key}[]"), v.clone())))
            }
        }
    }
    pairs
}

/// Fields of a VDC instance creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateInstance {
    pub image_id: Option<String>,
    pub instance_spec_id: Option<String>,
    pub security_groups: Vec<String>,
    pub user_data: Option<String>,
    pub ssh_key: Option<String>,
    pub host_id: Option<String>,
    pub host_pool_id: Option<String>,
    pub network_id: Option<String>,
}

impl CreateInstance {
    pub fn form_fields(&self) -> Vec<(&'static str, FormValue)> {
        let scalars = [
            ("image_id", &self.image_id),
            ("instance_spec_id", &self.instance_spec_id),
            ("user_data", &self.user_data),
            ("ssh_key", &self.ssh_key),
            ("host_id", &self.host_id),
            ("host_pool_id", &self.host_pool_id),
            ("network_id", &self.network_id),
        ];
        let mut fields: Vec<_> = scalars
            .into_iter()
            .filter_map(|(key, value)| Some((key, FormValue::Scalar(value.clone()?))))
            .collect();
        fields.push(("nf_group", FormValue::List(self.security_groups.clone())));
        fields
    }
}

/// The VDC operations the EC2 actions are built from.
#[async_trait]
pub trait VdcApi: Send + Sync {
    async fn create_instance(
        &self,
        account_id: &str,
        create: &CreateInstance,
    ) -> Result<InstanceRecord>;

    async fn terminate_instance(&self, account_id: &str, instance_id: &str) -> Result<()>;

    async fn list_instances(&self, account_id: &str) -> Result<Vec<InstanceRecord>>;

    async fn list_images(&self, account_id: &str) -> Result<Vec<ImageRecord>>;
}

#[derive(Debug, Clone)]
pub struct VdcClient {
    http: reqwest::Client,
    base_url: Url,
}

impl VdcClient {
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        let base = config.base_url();
        let base_url = Url::parse(&base).map_err(|_| Error::BaseUrl(base.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::BaseUrl(base));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|source| Error::Transport { url: base, source })?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send one request and return the status and raw body.
    ///
    /// Non-2xx statuses are returned like any other; only a call that does
    /// not complete is an error.
    pub async fn request(
        &self,
        method: Method,
        segments: &[&str],
        account_id: &str,
        form: Option<&[(&str, FormValue)]>,
    ) -> Result<(StatusCode, String)> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, account_id, "VDC request");

        let mut request = self
            .http
            .request(method, url.clone())
            .header(ACCOUNT_HEADER, account_id);
        if let Some(fields) = form {
            request = request.form(&encode_form(fields));
        }

        let transport = |source: reqwest::Error| Error::Transport {
            url: url.to_string(),
            source,
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "VDC returned an error status");
        }
        Ok((status, body))
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        account_id: &str,
        form: Option<&[(&str, FormValue)]>,
    ) -> Result<T> {
        let (_, body) = self.request(method, segments, account_id, form).await?;
        serde_json::from_str(&body).map_err(|source| Error::Decode {
            url: self.endpoint(segments).map(String::from).unwrap_or_default(),
            source,
        })
    }

    async fn first_page<T: DeserializeOwned>(
        &self,
        account_id: &str,
        resource: &str,
    ) -> Result<Vec<T>> {
        let pages: Vec<Page<T>> = self
            .request_json(Method::GET, &[resource], account_id, None)
            .await?;
        Ok(pages.into_iter().next().map(|p| p.results).unwrap_or_default())
    }
}

#[async_trait]
impl VdcApi for VdcClient {
    async fn create_instance(
        &self,
        account_id: &str,
        create: &CreateInstance,
    ) -> Result<InstanceRecord> {
        let fields = create.form_fields();
        self.request_json(Method::POST, &["instances"], account_id, Some(fields.as_slice()))
            .await
    }

    async fn terminate_instance(&self, account_id: &str, instance_id: &str) -> Result<()> {
        self.request(Method::DELETE, &["instances", instance_id], account_id, None)
            .await?;
        Ok(())
    }

    async fn list_instances(&self, account_id: &str) -> Result<Vec<InstanceRecord>> {
        self.first_page(account_id, "instances").await
    }

    async fn list_images(&self, account_id: &str) -> Result<Vec<ImageRecord>> {
        self.first_page(account_id, "images").await
    }
}
