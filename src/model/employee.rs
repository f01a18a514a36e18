use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 1,
        "name": "Jane Doe",
        "email": "jane.doe@clinic.example",
        "clinic": "clinic1",
        "department": "dept1",
        "annualVacationDays": 20,
        "usedVacationDays": 4
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(example = "jane.doe@clinic.example")]
    pub email: String,

    #[schema(example = "clinic1")]
    pub clinic: String,

    #[schema(example = "dept1")]
    pub department: String,

    #[schema(example = 20)]
    pub annual_vacation_days: u32,

    #[schema(example = 4)]
    pub used_vacation_days: u32,
}

impl Employee {
    /// `allotment - used`, evaluated against the record as loaded.
    pub fn remaining_days(&self) -> u32 {
        self.annual_vacation_days
            .saturating_sub(self.used_vacation_days)
    }
}

/// Employee record as delivered by provisioning, before an id is assigned.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub clinic: String,
    pub department: String,
    pub annual_vacation_days: u32,
    #[serde(default)]
    pub used_vacation_days: u32,
}
