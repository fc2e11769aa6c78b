use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Deepest level of the organization tree. Level 3 units own positions.
pub const MAX_LEVEL: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "name": "Platform Team",
        "level": 3,
        "parent_id": 4,
        "manager_id": 1001
    })
)]
pub struct Organization {
    pub id: u64,
    pub name: String,
    pub level: u8,
    #[schema(nullable = true)]
    pub parent_id: Option<u64>,
    /// Employee managing this unit
    #[schema(nullable = true)]
    pub manager_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub level: u8,
    pub parent_id: Option<u64>,
}
