//! Caller identity and capability checks.
//!
//! Call sites ask `is_admin()`, `owns()` or `scope()` instead of comparing
//! role strings or user ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::order::Order;
use super::status::UnknownValue;

/// Role assigned to a user account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            other => Err(UnknownValue {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// A user account as seen by the order workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

/// Which orders a caller may see or act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    OwnedBy(Identity),
}

impl OrderScope {
    /// Scope limited to the orders of one customer account.
    pub fn owned_by(user_id: i64) -> Self {
        Self::OwnedBy(Identity::customer(user_id))
    }

    pub fn admits(&self, order: &Order) -> bool {
        match self {
            Self::All => true,
            Self::OwnedBy(caller) => caller.can_view(order),
        }
    }

    pub fn owner(&self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::OwnedBy(caller) => Some(caller.user_id),
        }
    }
}

impl Identity {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn admin(user_id: i64) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn customer(user_id: i64) -> Self {
        Self::new(user_id, Role::Customer)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn owns(&self, order: &Order) -> bool {
        self.user_id == order.user_id
    }

    pub fn can_view(&self, order: &Order) -> bool {
        self.is_admin() || self.owns(order)
    }

    /// Admins act on every order; everyone else only on their own.
    pub fn scope(&self) -> OrderScope {
        if self.is_admin() {
            OrderScope::All
        } else {
            OrderScope::OwnedBy(*self)
        }
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}
