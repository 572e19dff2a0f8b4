//! Brightique REST API client implementation.
//!
//! Uses `reqwest` for HTTP with bearer-token auth taken from the [`Session`].
//! Caches the unfiltered catalog and product details using `moka`.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use brightique_core::{
    CartLine, CartLinePayload, LineId, Product, ProductFilter, ProductId, ProductPayload,
    QuantityChange, WishlistEntry, WishlistPayload, WishlistToggle,
};

use super::cache::{CacheKey, CacheValue};
use super::conversions::{ProductListPayload, convert_cart, convert_products, convert_wishlist};
use super::{ApiError, CartApi, CatalogApi, WishlistApi};
use crate::config::ApiConfig;
use crate::models::Session;

/// Longest response excerpt kept in logs and error messages.
const BODY_EXCERPT: usize = 200;

// =============================================================================
// BrightiqueClient
// =============================================================================

/// Client for the Brightique backend REST API.
///
/// Cheap to clone; clones share the connection pool and catalog cache.
#[derive(Clone)]
pub struct BrightiqueClient {
    inner: Arc<BrightiqueClientInner>,
}

struct BrightiqueClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

#[derive(Serialize)]
struct ProductRef {
    product_id: ProductId,
}

/// PATCH body for a quantity change: absolute or action-tagged.
#[derive(Serialize)]
#[serde(untagged)]
enum QuantityUpdateBody {
    Absolute { quantity: u32 },
    Action { action: &'static str },
}

impl From<QuantityChange> for QuantityUpdateBody {
    fn from(change: QuantityChange) -> Self {
        match change {
            QuantityChange::Increase => Self::Action { action: "increase" },
            QuantityChange::Decrease => Self::Action { action: "decrease" },
            QuantityChange::SetTo(quantity) => Self::Absolute { quantity },
        }
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT).collect()
}

impl BrightiqueClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built
    /// (e.g. TLS backend initialization fails).
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BrightiqueClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// The base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.inner.base_url.join(path)?;
        let request = self.inner.client.request(method, url);
        Ok(match session {
            Some(session) => request.bearer_auth(session.bearer_token()),
            None => request,
        })
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let path = response.url().path().to_string();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::Unauthorized(excerpt(&body)))
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path)),
            _ => {
                tracing::error!(
                    status = %status,
                    path = %path,
                    body = %excerpt(&body),
                    "Backend returned non-success status"
                );
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message: excerpt(&body),
                })
            }
        }
    }

    /// Send a request and parse the JSON response.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Invalidate a cached product detail.
    pub async fn invalidate_product(&self, product_id: ProductId) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(product_id))
            .await;
    }
}

// =============================================================================
// Cart Methods (not cached - mutable state)
// =============================================================================

#[async_trait]
impl CartApi for BrightiqueClient {
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn load_cart(&self, session: &Session) -> Result<Vec<CartLine>, ApiError> {
        let request = self.request(Method::GET, "cart/", Some(session))?;
        let lines: Vec<CartLinePayload> = self.execute(request).await?;
        Ok(convert_cart(lines))
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn cart_add(
        &self,
        session: &Session,
        product_id: ProductId,
    ) -> Result<CartLine, ApiError> {
        let request = self
            .request(Method::POST, "cart/add/", Some(session))?
            .json(&ProductRef { product_id });
        let line: CartLinePayload = self.execute(request).await?;
        Ok(CartLine::try_from(line)?)
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn cart_update_quantity(
        &self,
        session: &Session,
        line_id: LineId,
        change: QuantityChange,
    ) -> Result<(), ApiError> {
        let request = self
            .request(Method::PATCH, &format!("cart/{line_id}/"), Some(session))?
            .json(&QuantityUpdateBody::from(change));
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn cart_remove(&self, session: &Session, line_id: LineId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("cart/{line_id}/"), Some(session))?;
        self.send(request).await?;
        Ok(())
    }
}

// =============================================================================
// Wishlist Methods
// =============================================================================

#[async_trait]
impl WishlistApi for BrightiqueClient {
    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn load_wishlist(&self, session: &Session) -> Result<Vec<WishlistEntry>, ApiError> {
        let request = self.request(Method::GET, "wishlist/", Some(session))?;
        let entries: Vec<WishlistPayload> = self.execute(request).await?;
        Ok(convert_wishlist(entries))
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn wishlist_toggle(
        &self,
        session: &Session,
        product_id: ProductId,
    ) -> Result<WishlistToggle, ApiError> {
        let request = self
            .request(Method::POST, "wishlist/toggle/", Some(session))?
            .json(&ProductRef { product_id });
        self.execute(request).await
    }
}

// =============================================================================
// Catalog Methods
// =============================================================================

#[async_trait]
impl CatalogApi for BrightiqueClient {
    #[instrument(skip(self))]
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        // Only the plain listing is cached; searches always hit the backend
        let cacheable = filter.is_unfiltered();
        if cacheable
            && let Some(CacheValue::Catalog(products)) =
                self.inner.cache.get(&CacheKey::Catalog).await
        {
            debug!("Cache hit for catalog");
            return Ok(products);
        }

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(search) = &filter.search {
            params.push(("search", search.clone()));
        }
        if let Some(category) = &filter.category {
            params.push(("category", category.clone()));
        }
        if let Some(ordering) = filter.ordering {
            params.push(("ordering", ordering.as_query().to_string()));
        }

        let request = self
            .request(Method::GET, "products/", None)?
            .query(&params);
        let listing: ProductListPayload = self.execute(request).await?;
        let products = convert_products(listing);

        if cacheable {
            self.inner
                .cache
                .insert(CacheKey::Catalog, CacheValue::Catalog(products.clone()))
                .await;
        }

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn get_product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(product_id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = self.request(Method::GET, &format!("products/{product_id}/"), None)?;
        let payload: ProductPayload = self.execute(request).await?;
        let product = Product::try_from(payload)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    async fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
