//! Request classification policy

use serde::{Deserialize, Serialize};

/// Outcome of the access gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateDecision {
    Allow,
    RedirectLogin,
    Unauthorized,
}

/// The response format a request declares it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Html,
}

impl ResponseFormat {
    /// Derive from an `Accept` header value: anything listing
    /// `application/json` is a machine client.
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(value) if value.to_ascii_lowercase().contains("application/json") => {
                ResponseFormat::Json
            }
            _ => ResponseFormat::Html,
        }
    }
}

/// Pure allow / redirect / deny policy over path and authentication state.
#[derive(Debug, Clone)]
pub struct AccessGate {
    /// Authentication flow routes, always reachable
    public_paths: Vec<String>,
    /// Static assets and API-prefixed routes, always reachable
    public_prefixes: Vec<String>,
    /// Browser entry points that redirect to the login page
    home_paths: Vec<String>,
}

impl Default for AccessGate {
    fn default() -> Self {
        Self {
            public_paths: ["/login", "/do-login", "/logout"]
                .map(String::from)
                .to_vec(),
            public_prefixes: ["/public/", "/assets/", "/static/", "/api/"]
                .map(String::from)
                .to_vec(),
            home_paths: ["/", "/index.html"].map(String::from).to_vec(),
        }
    }
}

impl AccessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what happens to a request for `path`.
    ///
    /// Rules, first match wins:
    /// 1. auth-flow paths and public prefixes are allowed;
    /// 2. home paths redirect to login when unauthenticated;
    /// 3. other unauthenticated requests get 401 when they want JSON, a
    ///    redirect otherwise;
    /// 4. everything else is allowed.
    pub fn classify(
        &self,
        path: &str,
        authenticated: bool,
        format: ResponseFormat,
    ) -> GateDecision {
        if self.is_public(path) {
            return GateDecision::Allow;
        }

        if authenticated {
            return GateDecision::Allow;
        }

        if self.home_paths.iter().any(|p| p == path) {
            return GateDecision::RedirectLogin;
        }

        match format {
            ResponseFormat::Json => GateDecision::Unauthorized,
            ResponseFormat::Html => GateDecision::RedirectLogin,
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
            || self
                .public_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTECTED: &[&str] = &[
        "/upload",
        "/files",
        "/download/1700000000000-a.txt",
        "/delete/1700000000000-a.txt",
        "/anything/else",
    ];

    #[test]
    fn test_auth_flow_and_assets_always_allowed() {
        let gate = AccessGate::new();
        for path in [
            "/login",
            "/do-login",
            "/logout",
            "/static/app.js",
            "/assets/logo.png",
            "/public/login.css",
            "/api/health",
        ] {
            for format in [ResponseFormat::Json, ResponseFormat::Html] {
                assert_eq!(gate.classify(path, false, format), GateDecision::Allow, "{path}");
            }
        }
    }

    #[test]
    fn test_home_redirects_when_unauthenticated() {
        let gate = AccessGate::new();
        for format in [ResponseFormat::Json, ResponseFormat::Html] {
            assert_eq!(gate.classify("/", false, format), GateDecision::RedirectLogin);
            assert_eq!(
                gate.classify("/index.html", false, format),
                GateDecision::RedirectLogin
            );
        }
    }

    #[test]
    fn test_protected_paths_json_get_401() {
        let gate = AccessGate::new();
        for path in PROTECTED {
            assert_eq!(
                gate.classify(path, false, ResponseFormat::Json),
                GateDecision::Unauthorized,
                "{path}"
            );
        }
    }

    #[test]
    fn test_protected_paths_html_redirect() {
        let gate = AccessGate::new();
        for path in PROTECTED {
            assert_eq!(
                gate.classify(path, false, ResponseFormat::Html),
                GateDecision::RedirectLogin,
                "{path}"
            );
        }
    }

    #[test]
    fn test_authenticated_requests_pass() {
        let gate = AccessGate::new();
        for path in PROTECTED.iter().chain(&["/", "/index.html"]) {
            assert_eq!(
                gate.classify(path, true, ResponseFormat::Json),
                GateDecision::Allow
            );
        }
    }

    #[test]
    fn test_prefix_match_is_not_substring_match() {
        let gate = AccessGate::new();
        assert!(!gate.is_public("/apiary"));
        assert!(!gate.is_public("/login/extra"));
        assert!(!gate.is_public("/files/api/x"));
    }

    #[test]
    fn test_accept_header_detection() {
        assert_eq!(
            ResponseFormat::from_accept(Some("application/json")),
            ResponseFormat::Json
        );
        assert_eq!(
            ResponseFormat::from_accept(Some("text/plain, Application/JSON;q=0.9")),
            ResponseFormat::Json
        );
        assert_eq!(
            ResponseFormat::from_accept(Some("text/html,application/xhtml+xml")),
            ResponseFormat::Html
        );
        assert_eq!(ResponseFormat::from_accept(None), ResponseFormat::Html);
    }
}
