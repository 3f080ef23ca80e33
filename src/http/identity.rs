// Caller identity
//
// Authentication happens upstream. The authenticating proxy forwards the
// verified user id and role in trusted headers; this module only reads them.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Role allowed to use operator routes
pub const ADMIN_ROLE: &str = "admin";

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: Option<String>,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| role.eq_ignore_ascii_case(ADMIN_ROLE))
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_value(parts, USER_ID_HEADER).ok_or(ApiError::Unauthorized)?;
        let role = header_value(parts, USER_ROLE_HEADER);
        Ok(Caller { id, role })
    }
}

/// Caller holding the admin role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCaller(pub Caller);

impl<S> FromRequestParts<S> for AdminCaller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if !caller.is_admin() {
            tracing::warn!(user = %caller.id, "Operator route denied: admin role required");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminCaller(caller))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_caller_from_headers() {
        let mut parts = parts(&[(USER_ID_HEADER, "user-1"), (USER_ROLE_HEADER, "user")]);
        let caller = Caller::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(caller.id, "user-1");
        assert!(!caller.is_admin());
    }

    #[tokio::test]
    async fn test_missing_or_blank_id_is_unauthorized() {
        let mut missing = parts(&[]);
        assert!(matches!(
            Caller::from_request_parts(&mut missing, &()).await,
            Err(ApiError::Unauthorized)
        ));

        let mut blank = parts(&[(USER_ID_HEADER, "  ")]);
        assert!(matches!(
            Caller::from_request_parts(&mut blank, &()).await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_admin_caller_requires_role() {
        let mut user = parts(&[(USER_ID_HEADER, "user-1")]);
        assert!(matches!(
            AdminCaller::from_request_parts(&mut user, &()).await,
            Err(ApiError::Forbidden)
        ));

        let mut admin = parts(&[(USER_ID_HEADER, "opA"), (USER_ROLE_HEADER, "Admin")]);
        let AdminCaller(caller) = AdminCaller::from_request_parts(&mut admin, &())
            .await
            .unwrap();
        assert_eq!(caller.id, "opA");
    }
}
