use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayItem {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Base Pay")]
    pub name: String,
    #[schema(example = true)]
    pub active: bool,
}
