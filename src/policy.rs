//! Path-based authorization.
//!
//! An ordered rule table evaluated top to bottom, first match wins. The policy
//! holds no per-connection state, so every request is judged from its path and
//! the principal the authentication gate attached.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{auth::Principal, error::AppError, models::Role};

/// PathPattern
///
/// `"/api/auth/**"` matches `/api/auth` and everything below it; any other
/// pattern matches the path exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(base) => PathPattern::Prefix(base.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(base) => {
                path == base
                    || path
                        .strip_prefix(base.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: PathPattern,
    pub access: Access,
}

impl Rule {
    pub fn new(pattern: &str, access: Access) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            access,
        }
    }
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// No principal on a protected path (401).
    Unauthorized,
    /// Principal present but lacking the role (403).
    Forbidden,
}

#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: Vec<Rule>,
    fallback: Access,
}

pub type PolicyState = Arc<AuthorizationPolicy>;

impl AuthorizationPolicy {
    pub fn new(rules: Vec<Rule>, fallback: Access) -> Self {
        Self { rules, fallback }
    }

    /// The service's rule table.
    pub fn standard() -> Self {
        Self::new(
            vec![
                Rule::new("/", Access::Public),
                Rule::new("/index.html", Access::Public),
                Rule::new("/favicon.ico", Access::Public),
                Rule::new("/health", Access::Public),
                Rule::new("/static/**", Access::Public),
                Rule::new("/api/auth/**", Access::Public),
                Rule::new("/swagger-ui/**", Access::Public),
                Rule::new("/api-docs/**", Access::Public),
                Rule::new("/api/admin/**", Access::Role(Role::Admin)),
                Rule::new("/admin/**", Access::Role(Role::Admin)),
            ],
            Access::Authenticated,
        )
    }

    /// The access level of the first rule matching `path`, or the fallback.
    pub fn required_access(&self, path: &str) -> Access {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map_or(self.fallback, |rule| rule.access)
    }

    pub fn evaluate(&self, path: &str, principal: Option<&Principal>) -> Decision {
        match (self.required_access(path), principal) {
            (Access::Public, _) => Decision::Allow,
            (_, None) => Decision::Unauthorized,
            (Access::Authenticated, Some(_)) => Decision::Allow,
            (Access::Role(required), Some(p)) if p.role == required => Decision::Allow,
            (Access::Role(_), Some(_)) => Decision::Forbidden,
        }
    }
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// enforce_policy
///
/// Middleware run after the authentication gate. Produces the 401/403 responses;
/// allowed requests continue to the router untouched.
pub async fn enforce_policy(
    State(policy): State<PolicyState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let principal = request.extensions().get::<Principal>();

    match policy.evaluate(&path, principal) {
        Decision::Allow => next.run(request).await,
        Decision::Unauthorized => {
            tracing::debug!(%path, "rejected: no authenticated principal");
            AppError::unauthorized().into_response()
        }
        Decision::Forbidden => {
            tracing::info!(
                %path,
                username = principal.map(|p| p.username.as_str()).unwrap_or_default(),
                "rejected: insufficient role"
            );
            AppError::Forbidden.into_response()
        }
    }
}
