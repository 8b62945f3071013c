/// Common constants used across the console gate.
///
/// These defaults are used for command line arguments and
/// configuration when explicit values are not provided.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "console-gate/0.1.0";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Token verification endpoint, relative to the backend base URL.
pub const VERIFY_TOKEN_PATH: &str = "/auth/verify-token";
/// Permission listing endpoint, relative to the backend base URL.
pub const PERMISSIONS_PATH: &str = "/roles-permissions/permissions";

/// Environment variable overriding `backend.base_url`.
pub const BASE_URL_ENV: &str = "CONSOLE_GATE_BASE_URL";
