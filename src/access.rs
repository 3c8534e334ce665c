use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use uuid::Uuid;

use crate::{AppState, auth, repository::RepositoryState};

/// The only role value that grants access to the admin area. Every other
/// value, including an absent or unreadable role, is treated as non-admin.
pub const ROLE_ADMIN: &str = "admin";

/// Session
///
/// Evidence that the current request carries valid authenticated-user
/// credentials. Established by the auth collaborator (JWT or local bypass)
/// at request time; the access router only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
}

/// Decision
///
/// The access router's verdict for one request. Consumed uniformly by the
/// middleware adapter: `Proceed` hands the request to the inner service,
/// `Redirect` short-circuits with a 307 pointing at the target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Redirect(String),
}

/// SessionSource
///
/// Capability handed to `decide` for the session lookup. The anonymous case
/// is a normal outcome, which is why this returns `Option` and not `Result`.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn current(&self) -> Option<Session>;
}

/// RoleSource
///
/// Capability handed to `decide` for the role lookup, keyed by user ID.
/// `Ok(None)` means the user has no role assignment; `Err` means the
/// collaborator itself failed. The two are handled differently: see `decide`.
#[async_trait]
pub trait RoleSource: Send + Sync {
    async fn role_for(&self, user_id: Uuid) -> Result<Option<String>, String>;
}

/// AccessPolicy
///
/// The page-routing policy: which path prefixes require a session, where each
/// class of user is sent when they land in the wrong area, and which
/// infrastructure prefixes bypass evaluation entirely.
///
/// Prefix matching is a literal `starts_with` test, not segment-aware:
/// `/admindummy` matches the `/admin` prefix. Kept as-is; pinned by a test.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    /// Where anonymous requests for protected paths are sent.
    pub login_path: String,
    /// Admin area prefix, and the landing page admins are redirected to.
    pub admin_home: String,
    /// User dashboard prefix, and the landing page non-admins are sent to.
    pub dashboard_home: String,
    /// Prefixes the router never evaluates: static assets, API routes,
    /// generated docs, the favicon. Always allowed through.
    pub exempt_prefixes: Vec<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            admin_home: "/admin".to_string(),
            dashboard_home: "/dashboard".to_string(),
            exempt_prefixes: vec![
                "/api".to_string(),
                "/assets".to_string(),
                "/swagger-ui".to_string(),
                "/api-docs".to_string(),
                "/favicon.ico".to_string(),
            ],
        }
    }
}

impl AccessPolicy {
    /// Paths that bypass the router entirely. Checked by the middleware
    /// before `decide` is ever invoked.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    fn in_admin_area(&self, path: &str) -> bool {
        path.starts_with(&self.admin_home)
    }

    fn in_user_area(&self, path: &str) -> bool {
        path.starts_with(&self.dashboard_home)
    }

    /// A protected path is anything under either area prefix.
    fn is_protected(&self, path: &str) -> bool {
        self.in_user_area(path) || self.in_admin_area(path)
    }

    /// decide
    ///
    /// The core routing decision for one inbound page request. A pure
    /// function of (path, session, role): it performs at most two sequential
    /// reads through the injected capabilities and mutates nothing.
    ///
    /// Rules are evaluated in order and the first match wins:
    /// 1. anonymous + protected path  -> redirect to the login page
    /// 2. anonymous                   -> proceed
    /// 3. resolve the role; a lookup failure is logged and the role treated
    ///    as unknown (non-admin) rather than failing the request
    /// 4. admin on the user dashboard -> redirect to the admin home
    /// 5. non-admin in the admin area -> redirect to the user dashboard
    /// 6. otherwise                   -> proceed
    ///
    /// Rule 1 runs before any role lookup: an anonymous request has no user
    /// to look up, and must never cost a roundtrip to the role store.
    pub async fn decide(
        &self,
        path: &str,
        sessions: &dyn SessionSource,
        roles: &dyn RoleSource,
    ) -> Decision {
        let session = match sessions.current().await {
            Some(session) => session,
            None => {
                if self.is_protected(path) {
                    return Decision::Redirect(self.login_path.clone());
                }
                return Decision::Proceed;
            }
        };

        let role = match roles.role_for(session.user_id).await {
            Ok(role) => role,
            Err(reason) => {
                // Fail-open: the lookup error is reported and the request
                // continues with the role unknown, which lands in the
                // non-admin branches below. It is never surfaced as a
                // request failure.
                tracing::warn!(
                    user_id = %session.user_id,
                    %reason,
                    "role lookup failed, continuing as non-admin"
                );
                None
            }
        };

        let is_admin = role.as_deref() == Some(ROLE_ADMIN);

        if is_admin && self.in_user_area(path) {
            return Decision::Redirect(self.admin_home.clone());
        }
        if !is_admin && self.in_admin_area(path) {
            return Decision::Redirect(self.dashboard_home.clone());
        }

        Decision::Proceed
    }
}

// --- Request-facing capability implementations ---

/// ResolvedSession
///
/// `SessionSource` over a session already extracted from the request headers.
/// The extraction itself (JWT decode, cookie parse) happens once in the
/// middleware; `decide` only observes the result.
pub struct ResolvedSession(pub Option<Session>);

#[async_trait]
impl SessionSource for ResolvedSession {
    async fn current(&self) -> Option<Session> {
        self.0
    }
}

/// RepoRoleSource
///
/// `RoleSource` backed by the `profiles` table. Database errors pass through
/// as `Err` so the fail-open rule in `decide` stays observable, unlike the
/// rest of the repository surface which degrades to defaults.
pub struct RepoRoleSource {
    pub repo: RepositoryState,
}

#[async_trait]
impl RoleSource for RepoRoleSource {
    async fn role_for(&self, user_id: Uuid) -> Result<Option<String>, String> {
        self.repo.get_user_role(user_id).await
    }
}

/// access_router_middleware
///
/// Applies the `AccessPolicy` to the page routes. Exempt prefixes skip the
/// policy entirely; everything else flows through `decide`, with the session
/// resolved from the request headers and the role resolved from the
/// repository. A `Redirect` decision becomes a 307 so clients preserve the
/// original method.
pub async fn access_router_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let policy = &state.config.access;

    if policy.is_exempt(&path) {
        return next.run(request).await;
    }

    let sessions = ResolvedSession(auth::resolve_session(request.headers(), &state.config));
    let roles = RepoRoleSource {
        repo: state.repo.clone(),
    };

    match policy.decide(&path, &sessions, &roles).await {
        Decision::Proceed => next.run(request).await,
        Decision::Redirect(target) => Redirect::temporary(&target).into_response(),
    }
}
