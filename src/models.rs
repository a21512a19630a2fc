// Entity types mapped to the relational schema in migrations/.
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Closed set of employee roles. Unknown role strings are rejected at the
/// payload boundary, not at authorization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Receptionist,
    Coach,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Manager, Role::Receptionist, Role::Coach];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Receptionist => "receptionist",
            Role::Coach => "coach",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manager" => Ok(Role::Manager),
            "receptionist" => Ok(Role::Receptionist),
            "coach" => Ok(Role::Coach),
            other => Err(format!("Unknown role: '{}'", other)),
        }
    }
}

// Lets FromRow decode the TEXT role column straight into the enum.
impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Employee {
    pub employee_id: i64,
    pub gym_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    // Bcrypt hash. Never leaves the server.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub customer_id: i64,
    pub subscription_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub sub_purchase_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Subscription {
    pub subscription_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub price: Decimal,
    /// Length of the subscription in days.
    pub period: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Gym {
    pub gym_id: i64,
    pub name: String,
    pub address: String,
}

/// A scheduled class at a gym. `signed_people` is the denormalized occupancy
/// counter mirroring the enrollment table; only the enroll/unenroll handlers
/// may write it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GymClass {
    pub gymclass_id: i64,
    /// Coach running the class; a class may be temporarily unstaffed.
    pub employee_id: Option<i64>,
    pub gym_id: i64,
    pub name: String,
    pub max_people: i32,
    pub time: NaiveTime,
    pub day_otw: String,
    pub signed_people: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Enrollment {
    pub customer_id: i64,
    pub gymclass_id: i64,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Schedule {
    pub schedule_id: i64,
    pub gymclass_id: Option<i64>,
    pub gym_id: i64,
    pub employee_id: Option<i64>,
    /// "class" or "shift" entry.
    pub entry_type: String,
    pub day_otw: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub product_id: i64,
    pub gym_id: i64,
    pub name: String,
    pub quantity_in_stock: i32,
    pub quantity_sold: i32,
    pub price: Decimal,
    pub total_revenue: Decimal,
}
