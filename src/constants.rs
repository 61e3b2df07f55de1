use std::time::Duration;

// =============================================================================
// Upstream
// =============================================================================

/// Default GraphQL endpoint of the logistics API
pub const DEFAULT_API_URL: &str = "https://public-api.shiphero.com/graphql";

/// Refresh the access token this long before upstream says it expires
pub const TOKEN_REFRESH_BUFFER_SECS: i64 = 5 * 60;

// =============================================================================
// Query pipeline
// =============================================================================

/// Products requested per page
pub const PAGE_SIZE: u32 = 100;

/// Locations requested per product (items with more are truncated)
pub const LOCATIONS_PAGE_SIZE: u32 = 50;

/// Safety limit on pages fetched in a single run
pub const MAX_PAGES: u32 = 1000;

/// Pause between page requests to stay under the upstream rate limit
pub const PAGE_DELAY: Duration = Duration::from_millis(100);

// =============================================================================
// Snapshot pipeline
// =============================================================================

/// Time between snapshot status checks
pub const POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Status checks before giving up (30 x 20s = 10 minutes)
pub const MAX_POLL_ATTEMPTS: u32 = 30;

// =============================================================================
// Storage
// =============================================================================

/// Maximum rows written per insert transaction
pub const INSERT_BATCH_SIZE: usize = 1000;

/// Execution ceiling applied to triggered runs (5 minutes)
pub const DEFAULT_TRIGGER_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// Error Messages
// =============================================================================

/// Returned by the sync pipelines when no credentials are stored
pub const ERR_NOT_CONFIGURED: &str =
    "ShipHero credentials not configured. Please enter your refresh token and warehouse ID in Settings.";

pub const ERR_MISSING_REFRESH_TOKEN: &str = "Missing or invalid refresh_token";

pub const ERR_MISSING_WAREHOUSE_ID: &str = "Missing or invalid warehouse_id";

pub const ERR_MISSING_PREFIX: &str = "Missing required query parameter: prefix";
