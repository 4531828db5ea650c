//! Tenant-scope access policy.
//!
//! Every protected resource belongs to exactly one municipality, and the
//! whole authorization model reduces to one decision: may this identity act
//! within that municipality? [`decide`] answers it; the `ensure_*` helpers
//! wrap the answer in the HTTP error contract. A second, narrower ownership
//! rule applies to mutating individual feedback records and comments:
//! beyond tenant scope, a plain USER may only touch records they authored.

use uuid::Uuid;

use civicpulse_core::AppError;

use crate::middleware::auth::Identity;
use crate::modules::users::model::UserRole;

/// Outcome of a scope decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeDecision {
    Allow,
    Deny,
}

/// The single tenant-scope decision function.
///
/// - ADMIN: system-wide scope, always allowed.
/// - MUNICIPALITY_ADMIN: allowed exactly within their own municipality.
/// - USER: allowed exactly within their own municipality; a user without a
///   municipality assignment is denied everywhere.
pub fn decide(role: UserRole, own_municipality: Option<Uuid>, target: Uuid) -> ScopeDecision {
    match role {
        UserRole::Admin => ScopeDecision::Allow,
        UserRole::MunicipalityAdmin | UserRole::User => {
            if own_municipality == Some(target) {
                ScopeDecision::Allow
            } else {
                ScopeDecision::Deny
            }
        }
    }
}

/// Enforces tenant scope for a request targeting `target` (resolved by the
/// caller from the path parameter first, body field second).
///
/// `None` targets are rejected with 400 for non-admins: without a
/// municipality there is nothing to scope the request to. Denied requests
/// get 403.
pub fn ensure_municipality_scope(
    identity: &Identity,
    target: Option<Uuid>,
) -> Result<(), AppError> {
    if identity.role == UserRole::Admin {
        return Ok(());
    }

    let target = target
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Municipality ID is required")))?;

    match decide(identity.role, identity.municipality_id, target) {
        ScopeDecision::Allow => Ok(()),
        ScopeDecision::Deny => Err(AppError::forbidden(anyhow::anyhow!(
            "Insufficient permissions for this municipality"
        ))),
    }
}

/// Enforces the mutation rule for an individual record: tenant scope, plus
/// ownership for plain users. Staff (ADMIN, or the municipality's own
/// MUNICIPALITY_ADMIN) may mutate any record in scope.
pub fn ensure_record_mutation(
    identity: &Identity,
    record_municipality_id: Uuid,
    author_id: Uuid,
) -> Result<(), AppError> {
    ensure_municipality_scope(identity, Some(record_municipality_id))?;

    if identity.role == UserRole::User && identity.id != author_id {
        return Err(AppError::forbidden(anyhow::anyhow!(
            "You can only modify your own feedback"
        )));
    }

    Ok(())
}

/// True when the identity is municipal staff for the given municipality:
/// a system ADMIN, or that municipality's MUNICIPALITY_ADMIN.
pub fn is_staff_for(identity: &Identity, municipality_id: Uuid) -> bool {
    match identity.role {
        UserRole::Admin => true,
        UserRole::MunicipalityAdmin => identity.municipality_id == Some(municipality_id),
        UserRole::User => false,
    }
}

/// Enforces that the identity is municipal staff for the municipality.
pub fn ensure_staff(identity: &Identity, municipality_id: Uuid) -> Result<(), AppError> {
    if is_staff_for(identity, municipality_id) {
        Ok(())
    } else {
        Err(AppError::forbidden(anyhow::anyhow!(
            "Only municipal staff can perform this action"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn identity(role: UserRole, municipality_id: Option<Uuid>) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            role,
            municipality_id,
        }
    }

    #[test]
    fn admin_is_allowed_everywhere() {
        let target = Uuid::new_v4();
        assert_eq!(
            decide(UserRole::Admin, None, target),
            ScopeDecision::Allow
        );
        assert_eq!(
            decide(UserRole::Admin, Some(Uuid::new_v4()), target),
            ScopeDecision::Allow
        );
    }

    #[test]
    fn municipality_admin_is_scoped_to_own_tenant() {
        let own = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert_eq!(
            decide(UserRole::MunicipalityAdmin, Some(own), own),
            ScopeDecision::Allow
        );
        assert_eq!(
            decide(UserRole::MunicipalityAdmin, Some(own), other),
            ScopeDecision::Deny
        );
        assert_eq!(
            decide(UserRole::MunicipalityAdmin, None, other),
            ScopeDecision::Deny
        );
    }

    #[test]
    fn user_without_municipality_is_denied() {
        let target = Uuid::new_v4();
        assert_eq!(decide(UserRole::User, None, target), ScopeDecision::Deny);
    }

    #[test]
    fn scope_is_monotonic_across_roles() {
        // Everything a USER may do in their municipality, a
        // MUNICIPALITY_ADMIN of that municipality may do, and an ADMIN may
        // do anywhere.
        let tenant = Uuid::new_v4();
        for target in [tenant, Uuid::new_v4()] {
            let user = decide(UserRole::User, Some(tenant), target);
            let muni_admin = decide(UserRole::MunicipalityAdmin, Some(tenant), target);
            let admin = decide(UserRole::Admin, Some(tenant), target);

            if user == ScopeDecision::Allow {
                assert_eq!(muni_admin, ScopeDecision::Allow);
            }
            if muni_admin == ScopeDecision::Allow {
                assert_eq!(admin, ScopeDecision::Allow);
            }
        }
    }

    #[test]
    fn missing_target_is_bad_request_for_non_admins() {
        let err = ensure_municipality_scope(&identity(UserRole::User, Some(Uuid::new_v4())), None)
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        // An admin does not need a target at all.
        assert!(ensure_municipality_scope(&identity(UserRole::Admin, None), None).is_ok());
    }

    #[test]
    fn cross_tenant_access_is_forbidden() {
        let err = ensure_municipality_scope(
            &identity(UserRole::MunicipalityAdmin, Some(Uuid::new_v4())),
            Some(Uuid::new_v4()),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn user_may_only_mutate_own_records() {
        let tenant = Uuid::new_v4();
        let caller = identity(UserRole::User, Some(tenant));

        assert!(ensure_record_mutation(&caller, tenant, caller.id).is_ok());

        let err = ensure_record_mutation(&caller, tenant, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn staff_may_mutate_any_record_in_scope() {
        let tenant = Uuid::new_v4();
        let author = Uuid::new_v4();

        let muni_admin = identity(UserRole::MunicipalityAdmin, Some(tenant));
        assert!(ensure_record_mutation(&muni_admin, tenant, author).is_ok());

        let admin = identity(UserRole::Admin, None);
        assert!(ensure_record_mutation(&admin, tenant, author).is_ok());
    }

    #[test]
    fn staff_check_matches_roles() {
        let tenant = Uuid::new_v4();
        assert!(is_staff_for(&identity(UserRole::Admin, None), tenant));
        assert!(is_staff_for(
            &identity(UserRole::MunicipalityAdmin, Some(tenant)),
            tenant
        ));
        assert!(!is_staff_for(
            &identity(UserRole::MunicipalityAdmin, Some(Uuid::new_v4())),
            tenant
        ));
        assert!(!is_staff_for(&identity(UserRole::User, Some(tenant)), tenant));
    }
}
