use anyhow::{Context, Result};

use matlog_core::models::Food;
use matlog_core::service::FoodLookupProvider;
use matlog_core::usda::{FoodSearchResponse, PAGE_SIZE, SEARCH_URL, foods_from_response};

/// FoodData Central search client.
///
/// The blocking [`FoodLookupProvider`] entry point must be called off the
/// async worker threads, e.g. from `spawn_blocking`.
pub struct UsdaClient {
    client: reqwest::Client,
    api_key: String,
    rt: tokio::runtime::Handle,
}

impl UsdaClient {
    /// Must be called inside a tokio runtime.
    pub fn new(api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "matlog-cli/{} (fitness log)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            rt: tokio::runtime::Handle::current(),
        })
    }

    pub async fn search_async(&self, query: &str) -> Result<Vec<Food>> {
        let page_size = PAGE_SIZE.to_string();
        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("query", query),
                ("api_key", self.api_key.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach FoodData Central API")?
            .error_for_status()
            .context("FoodData Central rejected the search")?;

        let data: FoodSearchResponse = resp
            .json()
            .await
            .context("Failed to parse FoodData Central search response")?;

        tracing::debug!(query, hits = data.total_hits, "food search finished");
        Ok(foods_from_response(data))
    }
}

impl FoodLookupProvider for UsdaClient {
    fn search(&self, query: &str) -> Result<Vec<Food>> {
        self.rt.block_on(self.search_async(query))
    }
}
