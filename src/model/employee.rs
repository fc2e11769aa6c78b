use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Organizational placement of an employee. Identity and credentials live in
/// the identity provider; only what the hierarchy needs is kept here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1001,
        "employee_code": "EMP-001",
        "first_name": "John",
        "last_name": "Doe",
        "phone": "+8801712345678",
        "position_id": 12
    })
)]
pub struct Employee {
    pub id: u64,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(nullable = true)]
    pub phone: Option<String>,
    #[schema(nullable = true)]
    pub position_id: Option<u64>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
