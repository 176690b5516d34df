use serde::{Deserialize, Serialize};

/// Identifier of a user row (students and advisors share the table).
pub type UserId = i64;

/// Role stored alongside each identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Advisor,
    HeadAdvisor,
}

impl Role {
    /// Map the stored role code (0 student, 1 advisor, 2 head advisor).
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Role::Student),
            1 => Some(Role::Advisor),
            2 => Some(Role::HeadAdvisor),
            _ => None,
        }
    }

    pub fn code(self) -> i16 {
        match self {
            Role::Student => 0,
            Role::Advisor => 1,
            Role::HeadAdvisor => 2,
        }
    }
}

/// Identity record as returned by the identity lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl User {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}
