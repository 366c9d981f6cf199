use super::{permissions as p, Role};

/// Full catalog, granted to CEO verbatim.
const FULL_CATALOG: &[&str] = &[
    p::PRODUCTS_VIEW,
    p::PRODUCTS_CREATE,
    p::PRODUCTS_EDIT,
    p::PRODUCTS_DELETE,
    p::PRODUCTS_EXPORT,
    p::CATEGORIES_VIEW,
    p::CATEGORIES_CREATE,
    p::CATEGORIES_EDIT,
    p::CATEGORIES_DELETE,
    p::CATEGORIES_EXPORT,
    p::MOVEMENTS_VIEW,
    p::MOVEMENTS_CREATE,
    p::MOVEMENTS_CREATE_IN,
    p::MOVEMENTS_CREATE_OUT,
    p::MOVEMENTS_EXPORT,
    p::ALERTS_VIEW,
    p::ALERTS_MANAGE,
    p::ALERTS_RESOLVE,
    p::REPORTS_VIEW,
    p::REPORTS_EXPORT,
    p::REPORTS_ADVANCED,
    p::USERS_VIEW,
    p::USERS_CREATE,
    p::USERS_EDIT,
    p::USERS_DELETE,
    p::USERS_MANAGE_PERMISSIONS,
    p::USERS_EXPORT,
    p::SETTINGS_VIEW,
    p::SETTINGS_EDIT,
    p::SETTINGS_SYSTEM,
    p::DASHBOARD_VIEW,
    p::DASHBOARD_STATS,
    p::NOTIFICATIONS_VIEW,
    p::NOTIFICATIONS_CREATE,
    p::NOTIFICATIONS_MANAGE,
];

/// ADMIN holds the catalog minus the CEO-only grants.
const ADMIN_SET: &[&str] = &[
    p::PRODUCTS_VIEW,
    p::PRODUCTS_CREATE,
    p::PRODUCTS_EDIT,
    p::PRODUCTS_DELETE,
    p::PRODUCTS_EXPORT,
    p::CATEGORIES_VIEW,
    p::CATEGORIES_CREATE,
    p::CATEGORIES_EDIT,
    p::CATEGORIES_DELETE,
    p::CATEGORIES_EXPORT,
    p::MOVEMENTS_VIEW,
    p::MOVEMENTS_CREATE,
    p::MOVEMENTS_CREATE_IN,
    p::MOVEMENTS_CREATE_OUT,
    p::MOVEMENTS_EXPORT,
    p::ALERTS_VIEW,
    p::ALERTS_MANAGE,
    p::ALERTS_RESOLVE,
    p::REPORTS_VIEW,
    p::REPORTS_EXPORT,
    p::REPORTS_ADVANCED,
    p::USERS_VIEW,
    p::USERS_CREATE,
    p::USERS_EDIT,
    p::USERS_DELETE,
    p::USERS_EXPORT,
    p::SETTINGS_VIEW,
    p::SETTINGS_EDIT,
    p::DASHBOARD_VIEW,
    p::DASHBOARD_STATS,
    p::NOTIFICATIONS_VIEW,
    p::NOTIFICATIONS_CREATE,
    p::NOTIFICATIONS_MANAGE,
];

/// Inventory, movement, alert and report duty; no user or settings management.
const MANAGER_SET: &[&str] = &[
    p::PRODUCTS_VIEW,
    p::PRODUCTS_CREATE,
    p::PRODUCTS_EDIT,
    p::PRODUCTS_EXPORT,
    p::CATEGORIES_VIEW,
    p::CATEGORIES_CREATE,
    p::CATEGORIES_EDIT,
    p::CATEGORIES_EXPORT,
    p::MOVEMENTS_VIEW,
    p::MOVEMENTS_CREATE,
    p::MOVEMENTS_CREATE_IN,
    p::MOVEMENTS_CREATE_OUT,
    p::MOVEMENTS_EXPORT,
    p::ALERTS_VIEW,
    p::ALERTS_MANAGE,
    p::ALERTS_RESOLVE,
    p::REPORTS_VIEW,
    p::REPORTS_EXPORT,
    p::DASHBOARD_VIEW,
    p::DASHBOARD_STATS,
    p::NOTIFICATIONS_VIEW,
];

/// Narrowest subset: day-to-day sales. No exports, no reports.
const VENDEDOR_SET: &[&str] = &[
    p::PRODUCTS_VIEW,
    p::CATEGORIES_VIEW,
    p::MOVEMENTS_VIEW,
    p::MOVEMENTS_CREATE,
    p::MOVEMENTS_CREATE_OUT,
    p::ALERTS_VIEW,
    p::DASHBOARD_VIEW,
    p::NOTIFICATIONS_VIEW,
];

fn granted_set(role: Role) -> &'static [&'static str] {
    match role {
        Role::Ceo => FULL_CATALOG,
        Role::Admin => ADMIN_SET,
        Role::Manager => MANAGER_SET,
        Role::Vendedor => VENDEDOR_SET,
    }
}

/// Single gate for role-based checks. Unknown permission strings deny.
pub fn has_permission(role: Role, permission: &str) -> bool {
    granted_set(role).contains(&permission)
}

/// Logical AND over the given permissions. Vacuously true when empty.
pub fn has_all_permissions(role: Role, permissions: &[&str]) -> bool {
    permissions.iter().all(|perm| has_permission(role, perm))
}

/// Logical OR over the given permissions. False when empty.
pub fn has_any_permission(role: Role, permissions: &[&str]) -> bool {
    permissions.iter().any(|perm| has_permission(role, perm))
}

/// Maps a navigation section to its candidate permissions; access requires
/// at least one of them.
pub fn can_access_section(role: Role, section: &str) -> bool {
    let candidates: &[&str] = match section {
        "dashboard" => &[super::permissions::DASHBOARD_VIEW],
        "products" => &[super::permissions::PRODUCTS_VIEW],
        "categories" => &[super::permissions::CATEGORIES_VIEW],
        "movements" => &[super::permissions::MOVEMENTS_VIEW],
        "alerts" => &[super::permissions::ALERTS_VIEW],
        "reports" => &[
            super::permissions::REPORTS_VIEW,
            super::permissions::REPORTS_ADVANCED,
        ],
        "users" => &[super::permissions::USERS_VIEW],
        "settings" => &[
            super::permissions::SETTINGS_VIEW,
            super::permissions::SETTINGS_EDIT,
        ],
        "notifications" => &[super::permissions::NOTIFICATIONS_VIEW],
        _ => return false,
    };

    has_any_permission(role, candidates)
}

/// Roles whose grant set includes the given permission. Used by the alert
/// dispatcher to pick notification recipients.
pub fn roles_with_permission(permission: &str) -> Vec<Role> {
    Role::ALL
        .into_iter()
        .filter(|role| has_permission(*role, permission))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::permissions;

    #[test]
    fn ceo_holds_full_catalog() {
        for perm in FULL_CATALOG {
            assert!(has_permission(Role::Ceo, perm), "CEO missing {perm}");
        }
    }

    #[test]
    fn admin_lacks_ceo_only_grants() {
        assert!(!has_permission(Role::Admin, permissions::USERS_MANAGE_PERMISSIONS));
        assert!(!has_permission(Role::Admin, permissions::SETTINGS_SYSTEM));
        assert!(has_permission(Role::Admin, permissions::USERS_DELETE));
    }

    #[test]
    fn absence_is_explicit_deny() {
        for role in Role::ALL {
            for perm in FULL_CATALOG {
                if !granted_set(role).contains(perm) {
                    assert!(!has_permission(role, perm), "{role} unexpectedly holds {perm}");
                }
            }
        }
    }

    #[test]
    fn unknown_permission_denies_instead_of_erroring() {
        for role in Role::ALL {
            assert!(!has_permission(role, "warehouse.teleport"));
        }
    }

    #[test]
    fn all_permissions_is_vacuously_true_on_empty() {
        for role in Role::ALL {
            assert!(has_all_permissions(role, &[]));
        }
    }

    #[test]
    fn any_permission_is_false_on_empty() {
        for role in Role::ALL {
            assert!(!has_any_permission(role, &[]));
        }
    }

    #[test]
    fn vendedor_cannot_export_or_report() {
        assert!(!has_permission(Role::Vendedor, permissions::PRODUCTS_EXPORT));
        assert!(!has_permission(Role::Vendedor, permissions::MOVEMENTS_EXPORT));
        assert!(!has_permission(Role::Vendedor, permissions::REPORTS_VIEW));
        assert!(!has_permission(Role::Vendedor, permissions::REPORTS_ADVANCED));
        assert!(has_permission(Role::Vendedor, permissions::MOVEMENTS_CREATE_OUT));
    }

    #[test]
    fn section_access_requires_any_candidate() {
        assert!(can_access_section(Role::Vendedor, "products"));
        assert!(!can_access_section(Role::Vendedor, "users"));
        assert!(!can_access_section(Role::Vendedor, "reports"));
        assert!(can_access_section(Role::Manager, "reports"));
        assert!(!can_access_section(Role::Ceo, "nonexistent-section"));
    }

    #[test]
    fn assignment_hierarchy_is_strictly_nested() {
        assert!(Role::Ceo.may_assign(Role::Ceo));
        assert!(Role::Admin.may_assign(Role::Vendedor));
        assert!(!Role::Admin.may_assign(Role::Ceo));
        assert!(!Role::Manager.may_assign(Role::Admin));
        assert!(Role::Vendedor.assignable_roles().is_empty());
    }

    #[test]
    fn alert_viewers_cover_every_role() {
        let viewers = roles_with_permission(permissions::ALERTS_VIEW);
        assert_eq!(viewers.len(), 4);
    }
}
