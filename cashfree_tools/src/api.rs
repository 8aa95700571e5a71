use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::CashfreeConfig,
    data_objects::{CreateOrderRequest, CreateOrderResponse},
    helpers::validate_phone,
    CashfreeApiError,
};

#[derive(Clone)]
pub struct CashfreeApi {
    config: CashfreeConfig,
    client: Arc<Client>,
}

impl CashfreeApi {
    pub fn new(config: CashfreeConfig) -> Result<Self, CashfreeApiError> {
        let header = |v: &str| HeaderValue::from_str(v).map_err(|e| CashfreeApiError::Initialization(e.to_string()));
        let mut headers = HeaderMap::with_capacity(4);
        headers.insert("x-api-version", header(&config.api_version)?);
        headers.insert("x-client-id", header(&config.app_id)?);
        let mut secret = header(config.secret_key.reveal())?;
        secret.set_sensitive(true);
        headers.insert("x-client-secret", secret);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| CashfreeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &CashfreeConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, CashfreeApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                CashfreeApiError::Timeout
            } else {
                CashfreeApiError::RestResponseError(e.to_string())
            }
        })?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| CashfreeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| CashfreeApiError::RestResponseError(e.to_string()))?;
            Err(CashfreeApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Creates a gateway order, which opens a payment session for it. Requests with an unusable phone number are
    /// rejected before anything is sent.
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<CreateOrderResponse, CashfreeApiError> {
        validate_phone(&request.customer_details.customer_phone)?;
        debug!("💳️ Creating Cashfree order {} for {:.2}", request.order_id, request.order_amount);
        let result = self.rest_query::<CreateOrderResponse, _>(Method::POST, "/pg/orders", Some(request)).await?;
        info!("💳️ Created Cashfree order {}", request.order_id);
        Ok(result)
    }
}
