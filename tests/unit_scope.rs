//! Property-style checks of the tenant-scope policy.

use axum::http::StatusCode;
use uuid::Uuid;

use civicpulse::middleware::auth::Identity;
use civicpulse::middleware::scope::{
    ScopeDecision, decide, ensure_municipality_scope, ensure_record_mutation,
};
use civicpulse::modules::users::model::UserRole;

fn identity(role: UserRole, municipality_id: Option<Uuid>) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        role,
        municipality_id,
    }
}

/// ADMIN ⊇ MUNICIPALITY_ADMIN(own) ⊇ USER(own): whenever a lower role is
/// allowed, every higher role with the same tenant is allowed too —
/// checked over the full membership × target grid.
#[test]
fn scope_is_monotonic_over_the_full_grid() {
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();

    for own in [None, Some(tenant_a), Some(tenant_b)] {
        for target in [tenant_a, tenant_b] {
            let user = decide(UserRole::User, own, target);
            let muni_admin = decide(UserRole::MunicipalityAdmin, own, target);
            let admin = decide(UserRole::Admin, own, target);

            assert_eq!(admin, ScopeDecision::Allow);
            if user == ScopeDecision::Allow {
                assert_eq!(
                    muni_admin,
                    ScopeDecision::Allow,
                    "municipality admin must cover user scope (own={:?}, target={})",
                    own,
                    target
                );
            }
        }
    }
}

#[test]
fn non_members_are_denied_everywhere() {
    let target = Uuid::new_v4();
    assert_eq!(decide(UserRole::User, None, target), ScopeDecision::Deny);
    assert_eq!(
        decide(UserRole::MunicipalityAdmin, None, target),
        ScopeDecision::Deny
    );
    assert_eq!(
        decide(UserRole::User, Some(Uuid::new_v4()), target),
        ScopeDecision::Deny
    );
}

#[test]
fn scope_errors_carry_the_http_contract() {
    let tenant = Uuid::new_v4();

    // Missing target: 400 for everyone below ADMIN.
    for role in [UserRole::MunicipalityAdmin, UserRole::User] {
        let err = ensure_municipality_scope(&identity(role, Some(tenant)), None).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "Municipality ID is required");
    }

    // Cross-tenant: 403.
    let err = ensure_municipality_scope(
        &identity(UserRole::User, Some(tenant)),
        Some(Uuid::new_v4()),
    )
    .unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
}

/// The ownership rule sits strictly inside tenant scope: it can only
/// tighten a USER's access, never widen it.
#[test]
fn ownership_never_widens_tenant_scope() {
    let tenant = Uuid::new_v4();
    let foreign = Uuid::new_v4();
    let caller = identity(UserRole::User, Some(tenant));

    // Even the caller's own record is unreachable in a foreign tenant.
    let err = ensure_record_mutation(&caller, foreign, caller.id).unwrap_err();
    assert_eq!(err.status, StatusCode::FORBIDDEN);
}

#[test]
fn admins_mutate_anything_users_only_their_own() {
    let tenant = Uuid::new_v4();
    let author = Uuid::new_v4();

    assert!(ensure_record_mutation(&identity(UserRole::Admin, None), tenant, author).is_ok());
    assert!(
        ensure_record_mutation(
            &identity(UserRole::MunicipalityAdmin, Some(tenant)),
            tenant,
            author
        )
        .is_ok()
    );

    let user = identity(UserRole::User, Some(tenant));
    assert!(ensure_record_mutation(&user, tenant, user.id).is_ok());
    assert!(ensure_record_mutation(&user, tenant, author).is_err());
}
