use serde::Deserialize;
use serde_json::{Value, json};

use super::identifier;
use super::token::TokenManager;
use crate::config::SyncSettings;
use crate::error::SyncError;
use crate::models::InventoryItem;
use crate::upstream::Edge;

const WAREHOUSE_PRODUCTS_QUERY: &str = r#"
query WarehouseProducts($warehouse_id: String, $first: Int, $after: String, $locations: Int) {
  warehouse_products(warehouse_id: $warehouse_id) {
    request_id
    complexity
    data(first: $first, after: $after) {
      edges {
        node {
          product {
            sku
          }
          locations(first: $locations) {
            edges {
              node {
                location {
                  name
                }
                quantity
              }
            }
          }
        }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct WarehouseProductsData {
    warehouse_products: Option<WarehouseProducts>,
}

#[derive(Debug, Deserialize)]
struct WarehouseProducts {
    data: Option<ProductConnection>,
}

#[derive(Debug, Deserialize)]
struct ProductConnection {
    edges: Option<Vec<Edge<ProductNode>>>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductNode {
    pub product: Option<Product>,
    pub locations: Option<LocationConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub sku: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConnection {
    pub edges: Option<Vec<Edge<LocationNode>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationNode {
    pub location: Option<Location>,
    /// Kept raw so non-numeric values can be skipped instead of failing the page
    pub quantity: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub name: Option<Value>,
}

/// One decoded page of the listing
#[derive(Debug)]
pub struct ProductPage {
    pub products: Vec<ProductNode>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Items gathered by a traversal, with the number of pages requested
#[derive(Debug)]
pub struct QueryFetch {
    pub items: Vec<InventoryItem>,
    pub pages: u32,
    /// True when traversal stopped at the page cap rather than the last page
    pub truncated: bool,
}

/// Cursor-paginated traversal of the warehouse product listing
pub struct QueryPipeline<'a> {
    tokens: &'a TokenManager,
    settings: &'a SyncSettings,
}

impl<'a> QueryPipeline<'a> {
    pub fn new(tokens: &'a TokenManager, settings: &'a SyncSettings) -> Self {
        Self { tokens, settings }
    }

    /// Walk every page for the warehouse and flatten the results
    pub async fn fetch_all(&self, warehouse_id: &str) -> Result<QueryFetch, SyncError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;
        let mut has_next_page = true;

        while has_next_page && pages < self.settings.max_pages {
            pages += 1;
            tracing::debug!("Fetching page {}...", pages);

            let page = self.fetch_page(warehouse_id, cursor.as_deref()).await?;
            let page_items = flatten_products(&page.products, self.settings.locations_page_size);

            tracing::info!(
                "Page {}: {} products, {} location records. Total: {}",
                pages,
                page.products.len(),
                page_items.len(),
                items.len() + page_items.len()
            );
            items.extend(page_items);

            has_next_page = page.has_next_page;
            cursor = page.end_cursor;

            if has_next_page && !self.settings.page_delay.is_zero() {
                tokio::time::sleep(self.settings.page_delay).await;
            }
        }

        let truncated = has_next_page;
        if truncated {
            tracing::warn!(
                "Reached max page limit ({}), continuing with {} records",
                self.settings.max_pages,
                items.len()
            );
        }

        Ok(QueryFetch {
            items,
            pages,
            truncated,
        })
    }

    async fn fetch_page(
        &self,
        warehouse_id: &str,
        cursor: Option<&str>,
    ) -> Result<ProductPage, SyncError> {
        let variables = json!({
            "warehouse_id": warehouse_id,
            "first": self.settings.page_size,
            "after": cursor,
            "locations": self.settings.locations_page_size,
        });

        let response = self
            .tokens
            .graphql::<WarehouseProductsData>(WAREHOUSE_PRODUCTS_QUERY, &variables)
            .await?;

        if let Some(errors) = response.error_summary() {
            return Err(SyncError::Upstream(format!("GraphQL errors: {}", errors)));
        }

        let connection = response
            .data
            .and_then(|d| d.warehouse_products)
            .and_then(|p| p.data)
            .ok_or_else(|| {
                SyncError::Upstream(
                    "Invalid response structure from warehouse_products query".to_string(),
                )
            })?;

        Ok(ProductPage {
            products: connection
                .edges
                .unwrap_or_default()
                .into_iter()
                .filter_map(|e| e.node)
                .collect(),
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
        })
    }
}

/// Flatten product nodes into one item per (sku, location)
///
/// At most `location_cap` locations are read per product. Entries without a
/// sku, a string location name or a numeric quantity are skipped.
pub fn flatten_products(products: &[ProductNode], location_cap: u32) -> Vec<InventoryItem> {
    let mut items = Vec::new();

    for product in products {
        let Some(sku) = product
            .product
            .as_ref()
            .and_then(|p| p.sku.as_ref())
            .and_then(identifier)
        else {
            continue;
        };

        let Some(edges) = product.locations.as_ref().and_then(|l| l.edges.as_ref()) else {
            continue;
        };

        for node in edges
            .iter()
            .take(location_cap as usize)
            .filter_map(|e| e.node.as_ref())
        {
            let name = node
                .location
                .as_ref()
                .and_then(|l| l.name.as_ref())
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty());
            let quantity = node.quantity.as_ref().and_then(numeric_quantity);

            if let (Some(name), Some(quantity)) = (name, quantity) {
                items.push(InventoryItem {
                    sku: sku.clone(),
                    bin: name.to_string(),
                    quantity,
                });
            }
        }
    }

    items
}

fn numeric_quantity(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f.trunc() as i64))
}
