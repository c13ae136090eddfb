// src/session/mod.rs — Login session scope and command gating
//
// The session (bearer token + user) lives in <config_dir>/session.json and
// is loaded once at startup into a SessionScope. Login, signup and logout
// replace the scope wholesale; nothing reads ambient global state.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{AuthApi, Credentials, User};
use crate::infra::errors::Result;
use crate::infra::paths;

/// Sessions are discarded this many days after login.
pub const SESSION_LIFETIME_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
            created_at: Utc::now(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::days(SESSION_LIFETIME_DAYS)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// The current session, if any, and where it is persisted.
#[derive(Debug, Clone)]
pub struct SessionScope {
    current: Option<Session>,
    path: PathBuf,
}

impl SessionScope {
    /// Load from the default location.
    pub fn load_default() -> Result<Self> {
        Self::load(paths::session_file_path())
    }

    /// Load a session file. A missing or expired session yields an
    /// unauthenticated scope; an expired file is removed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::anonymous(path));
        }

        let content = std::fs::read_to_string(&path)?;
        let session: Session = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Ignoring unreadable session file {}: {e}", path.display());
                return Ok(Self::anonymous(path));
            }
        };

        if session.is_expired() {
            tracing::info!("Session for {} expired; logging out", session.user.email);
            let _ = std::fs::remove_file(&path);
            return Ok(Self::anonymous(path));
        }

        Ok(Self {
            current: Some(session),
            path,
        })
    }

    pub fn anonymous(path: impl Into<PathBuf>) -> Self {
        Self {
            current: None,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub async fn login(&mut self, api: &dyn AuthApi, credentials: &Credentials) -> Result<&User> {
        let response = api.login(credentials).await?;
        tracing::info!("Logged in as {}", response.user.email);
        self.replace(Session::new(response.token, response.user))
    }

    pub async fn signup(&mut self, api: &dyn AuthApi, credentials: &Credentials) -> Result<&User> {
        let response = api.signup(credentials).await?;
        tracing::info!("Signed up as {}", response.user.email);
        self.replace(Session::new(response.token, response.user))
    }

    /// Forget the session locally. There is no server-side logout.
    pub fn logout(&mut self) -> Result<()> {
        self.current = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn replace(&mut self, session: Session) -> Result<&User> {
        save(&self.path, &session)?;
        Ok(&self.current.insert(session).user)
    }
}

/// Write the session atomically (write to .tmp then rename, chmod 600).
fn save(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(session)?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &json)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

// ─── Gating ─────────────────────────────────────────────────────────────────

/// Access rule attached to each command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Needs a session (task and stats commands, dashboard).
    Protected,
    /// Only meaningful without a session (login, signup).
    GuestOnly,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RequireLogin,
    AlreadyAuthenticated,
}

pub fn check_gate(gate: Gate, authenticated: bool) -> GateDecision {
    match (gate, authenticated) {
        (Gate::Protected, false) => GateDecision::RequireLogin,
        (Gate::GuestOnly, true) => GateDecision::AlreadyAuthenticated,
        _ => GateDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthResponse;
    use crate::infra::errors::TaskMasterError;
    use async_trait::async_trait;

    struct MockAuth {
        accept: bool,
    }

    #[async_trait]
    impl AuthApi for MockAuth {
        async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
            if !self.accept {
                return Err(TaskMasterError::Remote {
                    status: 401,
                    message: "Invalid credentials".into(),
                });
            }
            Ok(AuthResponse {
                token: "tok-123".into(),
                user: User {
                    id: "u1".into(),
                    email: credentials.email.clone(),
                },
            })
        }

        async fn signup(&self, credentials: &Credentials) -> Result<AuthResponse> {
            self.login(credentials).await
        }
    }

    fn creds() -> Credentials {
        Credentials {
            email: "ada@example.com".into(),
            password: "hunter2".into(),
        }
    }

    #[tokio::test]
    async fn test_login_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut scope = SessionScope::anonymous(&path);
        let user = scope.login(&MockAuth { accept: true }, &creds()).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(scope.is_authenticated());

        let reloaded = SessionScope::load(&path).unwrap();
        assert_eq!(reloaded.token(), Some("tok-123"));
        assert_eq!(reloaded.user().map(|u| u.id.as_str()), Some("u1"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut scope = SessionScope::anonymous(&path);
        scope.signup(&MockAuth { accept: true }, &creds()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_scope_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut scope = SessionScope::anonymous(&path);
        let err = scope.login(&MockAuth { accept: false }, &creds()).await.unwrap_err();
        assert_eq!(err.detail(), "Invalid credentials");
        assert!(!scope.is_authenticated());
        assert!(!path.exists());
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = Session::new(
            "old",
            User {
                id: "u1".into(),
                email: "ada@example.com".into(),
            },
        );
        session.created_at = Utc::now() - Duration::days(SESSION_LIFETIME_DAYS + 1);
        save(&path, &session).unwrap();

        let scope = SessionScope::load(&path).unwrap();
        assert!(!scope.is_authenticated());
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_or_corrupt_file_is_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        assert!(!SessionScope::load(&path).unwrap().is_authenticated());

        std::fs::write(&path, "not json").unwrap();
        assert!(!SessionScope::load(&path).unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut scope = SessionScope::anonymous(&path);
        scope.login(&MockAuth { accept: true }, &creds()).await.unwrap();
        scope.logout().unwrap();
        assert!(!scope.is_authenticated());
        assert!(!path.exists());
        // Idempotent
        scope.logout().unwrap();
    }

    #[test]
    fn test_gate_decisions() {
        assert_eq!(check_gate(Gate::Protected, false), GateDecision::RequireLogin);
        assert_eq!(check_gate(Gate::Protected, true), GateDecision::Allow);
        assert_eq!(check_gate(Gate::GuestOnly, true), GateDecision::AlreadyAuthenticated);
        assert_eq!(check_gate(Gate::GuestOnly, false), GateDecision::Allow);
        assert_eq!(check_gate(Gate::Open, false), GateDecision::Allow);
        assert_eq!(check_gate(Gate::Open, true), GateDecision::Allow);
    }
}
