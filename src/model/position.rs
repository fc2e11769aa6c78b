use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Position {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = "Engineer")]
    pub name: String,
    /// Owning unit, always level 3
    #[schema(example = 7)]
    pub organization_id: u64,
    #[schema(example = "Backend services", nullable = true)]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPosition {
    pub name: String,
    pub organization_id: u64,
    pub description: Option<String>,
}
