//! API client for communicating with the botdash REST API.
//!
//! This module provides the `ApiClient` struct, the single chokepoint for
//! backend traffic. It owns the credential slot: login and register write
//! it, logout clears it, every other call only reads it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::auth::{Credential, TokenStore};
use crate::models::{
    Bot, Broadcast, BroadcastReceipt, NewProduct, Product, ProductReceipt, StockReceipt,
    Transaction, TransactionReport, TransactionStats, User,
};

use super::{ApiError, ApiResult};

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when neither config nor environment names one
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
/// Every request resolves to success or error within this bound.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Identity and credential returned by login and register
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    #[serde(alias = "access_token", deserialize_with = "credential_from_str")]
    pub token: Credential,
}

fn credential_from_str<'de, D>(deserializer: D) -> Result<Credential, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let token = String::deserialize(deserializer)?;
    if token.is_empty() {
        return Err(serde::de::Error::custom("empty token"));
    }
    Ok(Credential::new(token))
}

/// API client for the dashboard backend.
/// Clone is cheap - clones share the connection pool and the token store.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a new API client against `base_url` using `store` for the credential
    pub fn new(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ===== Credential =====

    /// Read the stored credential without side effects.
    /// An unreadable slot reads as "no credential"; see `stored_token`.
    pub fn get_token(&self) -> Option<Credential> {
        match self.stored_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        }
    }

    /// Read the stored credential, reporting an unreadable slot
    pub fn stored_token(&self) -> ApiResult<Option<Credential>> {
        self.store.load().map_err(storage_error)
    }

    /// Forget the stored credential. The backend is not contacted.
    pub fn logout(&self) -> ApiResult<()> {
        self.store.clear().map_err(storage_error)?;
        debug!("Stored credential cleared");
        Ok(())
    }

    fn persist(&self, payload: AuthPayload) -> ApiResult<AuthPayload> {
        self.store
            .save(&payload.token)
            .map_err(storage_error)?;
        Ok(payload)
    }

    // ===== Authentication =====

    /// Authenticate and store the returned credential
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthPayload> {
        let body = json!({ "email": email, "password": password });
        let payload: AuthPayload = self.send(Method::POST, "/auth/login", Some(&body)).await?;
        info!(user_id = payload.user.id, "Login accepted");
        self.persist(payload)
    }

    /// Create an account and store the returned credential
    pub async fn register(&self, email: &str, password: &str, name: &str) -> ApiResult<AuthPayload> {
        let body = json!({ "email": email, "password": password, "name": name });
        let payload: AuthPayload = self.send(Method::POST, "/auth/register", Some(&body)).await?;
        info!(user_id = payload.user.id, "Registration accepted");
        self.persist(payload)
    }

    /// Fetch the identity bound to the stored credential
    pub async fn get_me(&self) -> ApiResult<User> {
        let response: MeResponse = self.get("/auth/me").await?;
        Ok(response.user)
    }

    // ===== Request plumbing =====

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header(header::ACCEPT, "application/json");
        match self.get_token() {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send::<T, Value>(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// Send a request and normalize every outcome into `ApiResult`.
    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "Request failed");
            ApiError::NetworkError(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        debug!(%method, path, status = status.as_u16(), "Response received");

        if !status.is_success() {
            return Err(ApiError::from_status(status, &text));
        }
        Self::parse_body(&text)
    }

    /// Parse a 2xx body, honouring an `{"error": ...}` envelope
    fn parse_body<T: DeserializeOwned>(text: &str) -> ApiResult<T> {
        if let Some(message) = ApiError::backend_message(text) {
            return Err(ApiError::Rejected {
                status: 200,
                message,
            });
        }
        serde_json::from_str(text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    // ===== Bots =====

    /// Fetch all bots owned by the current user
    pub async fn get_bots(&self) -> ApiResult<Vec<Bot>> {
        let response: BotsResponse = self.get("/bots").await?;
        Ok(response.bots)
    }

    /// Register a bot by its Telegram bot token
    pub async fn create_bot(&self, bot_token: &str) -> ApiResult<Bot> {
        let response: BotResponse = self.post("/bots", &json!({ "token": bot_token })).await?;
        Ok(response.bot)
    }

    // ===== Broadcasts =====

    pub async fn get_broadcasts(&self, bot_id: i64) -> ApiResult<Vec<Broadcast>> {
        let response: BroadcastsResponse =
            self.get(&format!("/bots/{}/broadcasts", bot_id)).await?;
        Ok(response.broadcasts)
    }

    /// Send `message` to every user of the bot
    pub async fn send_broadcast(&self, bot_id: i64, message: &str) -> ApiResult<BroadcastReceipt> {
        self.post(
            &format!("/bots/{}/broadcasts", bot_id),
            &json!({ "message": message }),
        )
        .await
    }

    // ===== Transactions =====

    /// Fetch a bot's transactions and summary stats
    pub async fn get_transactions(&self, bot_id: i64) -> ApiResult<TransactionReport> {
        let response: TransactionsResponse =
            self.get(&format!("/bots/{}/transactions", bot_id)).await?;
        let stats = response
            .stats
            .unwrap_or_else(|| TransactionStats::from_transactions(&response.transactions));
        Ok(TransactionReport {
            transactions: response.transactions,
            stats,
        })
    }

    // ===== Products =====

    pub async fn get_products(&self, bot_id: i64) -> ApiResult<Vec<Product>> {
        let response: ProductsResponse = self.get(&format!("/bots/{}/products", bot_id)).await?;
        Ok(response.products)
    }

    pub async fn create_product(&self, bot_id: i64, product: &NewProduct) -> ApiResult<ProductReceipt> {
        self.post(&format!("/bots/{}/products", bot_id), product).await
    }

    /// Append stock items to an existing product
    pub async fn add_stock(&self, product_id: i64, items: &[String]) -> ApiResult<StockReceipt> {
        self.post(
            &format!("/products/{}/stock", product_id),
            &json!({ "stock_items": items }),
        )
        .await
    }
}

fn storage_error(e: anyhow::Error) -> ApiError {
    ApiError::Storage(format!("{:#}", e))
}

// Internal API response types for parsing

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct BotsResponse {
    bots: Vec<Bot>,
}

#[derive(Debug, Deserialize)]
struct BotResponse {
    bot: Bot,
}

#[derive(Debug, Deserialize)]
struct BroadcastsResponse {
    broadcasts: Vec<Broadcast>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<Transaction>,
    #[serde(default)]
    stats: Option<TransactionStats>,
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    products: Vec<Product>,
}
