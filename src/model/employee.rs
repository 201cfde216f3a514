use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Display fields of a staff member, as read from the employee directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": 7,
        "first_name": "Asha",
        "last_name": "Rai",
        "role": "Nurse",
        "department": "Emergency",
        "ward": "Ward B"
    })
)]
pub struct EmployeeRef {
    #[schema(example = 7)]
    pub employee_id: u64,

    #[schema(example = "Asha")]
    pub first_name: String,

    #[schema(example = "Rai")]
    pub last_name: String,

    #[schema(example = "Nurse")]
    pub role: String,

    #[schema(example = "Emergency", nullable = true)]
    pub department: Option<String>,

    #[schema(example = "Ward B", nullable = true)]
    pub ward: Option<String>,
}

impl EmployeeRef {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
