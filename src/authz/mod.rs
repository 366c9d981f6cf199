//! Authorization module - static permission table and request guard
//!
//! Roles form a closed set and each role owns an explicit, fixed permission
//! set (see `evaluator`). Permission ownership is not derived from a rank:
//! the role hierarchy only constrains which roles a principal may assign.

mod evaluator;
mod principal;

pub use evaluator::{
    can_access_section, has_all_permissions, has_any_permission, has_permission,
    roles_with_permission,
};
pub use principal::{require_permission, Principal};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fixed role catalog. Not user-extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    #[serde(rename = "CEO")]
    Ceo,
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "MANAGER")]
    Manager,
    #[serde(rename = "VENDEDOR")]
    Vendedor,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Ceo, Role::Admin, Role::Manager, Role::Vendedor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Ceo => "CEO",
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Vendedor => "VENDEDOR",
        }
    }

    /// Roles this role may assign to other users. Strict containment
    /// CEO > ADMIN > MANAGER > VENDEDOR, used for assignment only.
    pub fn assignable_roles(&self) -> &'static [Role] {
        match self {
            Role::Ceo => &[Role::Ceo, Role::Admin, Role::Manager, Role::Vendedor],
            Role::Admin => &[Role::Admin, Role::Manager, Role::Vendedor],
            Role::Manager => &[Role::Manager, Role::Vendedor],
            Role::Vendedor => &[],
        }
    }

    pub fn may_assign(&self, target: Role) -> bool {
        self.assignable_roles().contains(&target)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CEO" => Ok(Role::Ceo),
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "VENDEDOR" => Ok(Role::Vendedor),
            _ => Err(()),
        }
    }
}

/// Closed permission catalog. Every permission string used anywhere in the
/// system appears here; anything else evaluates to deny.
pub mod permissions {
    pub const PRODUCTS_VIEW: &str = "products.view";
    pub const PRODUCTS_CREATE: &str = "products.create";
    pub const PRODUCTS_EDIT: &str = "products.edit";
    pub const PRODUCTS_DELETE: &str = "products.delete";
    pub const PRODUCTS_EXPORT: &str = "products.export";

    pub const CATEGORIES_VIEW: &str = "categories.view";
    pub const CATEGORIES_CREATE: &str = "categories.create";
    pub const CATEGORIES_EDIT: &str = "categories.edit";
    pub const CATEGORIES_DELETE: &str = "categories.delete";
    pub const CATEGORIES_EXPORT: &str = "categories.export";

    pub const MOVEMENTS_VIEW: &str = "movements.view";
    pub const MOVEMENTS_CREATE: &str = "movements.create";
    pub const MOVEMENTS_CREATE_IN: &str = "movements.create_in";
    pub const MOVEMENTS_CREATE_OUT: &str = "movements.create_out";
    pub const MOVEMENTS_EXPORT: &str = "movements.export";

    pub const ALERTS_VIEW: &str = "alerts.view";
    pub const ALERTS_MANAGE: &str = "alerts.manage";
    pub const ALERTS_RESOLVE: &str = "alerts.resolve";

    pub const REPORTS_VIEW: &str = "reports.view";
    pub const REPORTS_EXPORT: &str = "reports.export";
    pub const REPORTS_ADVANCED: &str = "reports.advanced";

    pub const USERS_VIEW: &str = "users.view";
    pub const USERS_CREATE: &str = "users.create";
    pub const USERS_EDIT: &str = "users.edit";
    pub const USERS_DELETE: &str = "users.delete";
    pub const USERS_MANAGE_PERMISSIONS: &str = "users.manage_permissions";
    pub const USERS_EXPORT: &str = "users.export";

    pub const SETTINGS_VIEW: &str = "settings.view";
    pub const SETTINGS_EDIT: &str = "settings.edit";
    pub const SETTINGS_SYSTEM: &str = "settings.system";

    pub const DASHBOARD_VIEW: &str = "dashboard.view";
    pub const DASHBOARD_STATS: &str = "dashboard.stats";

    pub const NOTIFICATIONS_VIEW: &str = "notifications.view";
    pub const NOTIFICATIONS_CREATE: &str = "notifications.create";
    pub const NOTIFICATIONS_MANAGE: &str = "notifications.manage";
}
