use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source tag for entries the user added by hand.
pub const MANUAL_SOURCE: &str = "manual";

/// A symbol the user follows. Membership only, no valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub user_id: String,
    pub symbol: String,
    pub exchange: String,
    pub added_at: DateTime<Utc>,
    pub source: String,
}
