//! Identity middleware for the trusted-gateway deployment model.
//!
//! The service sits behind a gateway that authenticates employees and
//! forwards their identity in headers. The middleware only parses and
//! validates those headers; it never sees credentials.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const EMPLOYEE_ID_HEADER: &str = "x-employee-id";
pub const EMPLOYEE_ROLES_HEADER: &str = "x-employee-roles";

/// Caller identity extracted by [`auth`], available to handlers via
/// `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub employee_id: Uuid,
    pub is_admin: bool,
}

fn parse_identity(headers: &HeaderMap) -> Result<AuthContext, StatusCode> {
    let employee_id = headers
        .get(EMPLOYEE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let is_admin = headers
        .get(EMPLOYEE_ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|roles| {
            roles
                .split(',')
                .any(|role| role.trim().eq_ignore_ascii_case("hr_admin"))
        })
        .unwrap_or(false);

    Ok(AuthContext {
        employee_id,
        is_admin,
    })
}

pub async fn auth(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let context = parse_identity(request.headers())?;
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

// Auth + require the hr_admin role for admin-only routes
pub async fn auth_admin(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let context = parse_identity(request.headers())?;
    if !context.is_admin {
        return Err(StatusCode::FORBIDDEN);
    }
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: Option<&str>, roles: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(id) = id {
            map.insert(EMPLOYEE_ID_HEADER, HeaderValue::from_str(id).unwrap());
        }
        if let Some(roles) = roles {
            map.insert(EMPLOYEE_ROLES_HEADER, HeaderValue::from_str(roles).unwrap());
        }
        map
    }

    #[test]
    fn missing_identity_header_is_unauthorized() {
        assert_eq!(
            parse_identity(&headers(None, None)).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn malformed_identity_header_is_unauthorized() {
        assert_eq!(
            parse_identity(&headers(Some("not-a-uuid"), None)).unwrap_err(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn roles_header_grants_admin() {
        let id = Uuid::new_v4();
        let context =
            parse_identity(&headers(Some(&id.to_string()), Some("employee, HR_Admin"))).unwrap();
        assert_eq!(context.employee_id, id);
        assert!(context.is_admin);
    }

    #[test]
    fn absent_roles_header_means_no_admin() {
        let id = Uuid::new_v4();
        let context = parse_identity(&headers(Some(&id.to_string()), None)).unwrap();
        assert!(!context.is_admin);
    }
}
