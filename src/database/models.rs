use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A person who clocks in. `login_handle` is the Discord user id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub login_handle: String,
    pub display_name: String,
    // Password hashes belong to an external auth transport; Discord identity
    // leaves this empty.
    pub credential: Option<String>,
    pub created_at: DateTime<Utc>,
}
