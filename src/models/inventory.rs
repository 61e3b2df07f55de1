use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Which upstream interaction pattern fills a cache table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestMethod {
    /// Direct cursor-paginated product/location listing
    Query,
    /// Asynchronously generated snapshot, polled then downloaded
    Snapshot,
}

impl IngestMethod {
    pub const ALL: [IngestMethod; 2] = [IngestMethod::Query, IngestMethod::Snapshot];

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestMethod::Query => "query",
            IngestMethod::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for IngestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(IngestMethod::Query),
            "snapshot" => Ok(IngestMethod::Snapshot),
            other => Err(AppError::InvalidMethod(other.to_string())),
        }
    }
}

/// A flattened (sku, bin, quantity) fact produced by an ingestion run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryItem {
    pub sku: String,
    pub bin: String,
    pub quantity: i64,
}

/// Cache row stored in redb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub sku: String,
    pub bin: String,
    pub quantity: i64,
    /// When the row was written (Unix timestamp)
    pub inserted_at: i64,
}

impl InventoryRecord {
    pub fn from_item(item: InventoryItem, inserted_at: i64) -> Self {
        Self {
            sku: item.sku,
            bin: item.bin,
            quantity: item.quantity,
            inserted_at,
        }
    }
}
