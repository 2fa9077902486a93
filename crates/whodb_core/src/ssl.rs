use crate::{CoreError, Credentials, DatabaseType, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

/// Unified SSL/TLS mode set across all engines.
///
/// Individual dialects support different subsets; the registry below says
/// which, and the alias table canonicalizes native dialect spellings into
/// this set before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disabled,
    Preferred,
    Required,
    VerifyCa,
    VerifyIdentity,
    Enabled,
    Insecure,
}

impl SslMode {
    pub fn label(&self) -> &'static str {
        match self {
            SslMode::Disabled => "disabled",
            SslMode::Preferred => "preferred",
            SslMode::Required => "required",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyIdentity => "verify-identity",
            SslMode::Enabled => "enabled",
            SslMode::Insecure => "insecure",
        }
    }

    /// Whether the mode turns TLS on at all.
    pub fn uses_tls(&self) -> bool {
        !matches!(self, SslMode::Disabled)
    }

    /// Whether the peer certificate chain is verified.
    pub fn verifies_chain(&self) -> bool {
        matches!(
            self,
            SslMode::VerifyCa | SslMode::VerifyIdentity | SslMode::Enabled
        )
    }

    /// Whether the server hostname is matched against the certificate.
    pub fn verifies_hostname(&self) -> bool {
        matches!(self, SslMode::VerifyIdentity | SslMode::Enabled)
    }
}

impl std::fmt::Display for SslMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Registry entry describing one mode an engine supports.
#[derive(Debug, Clone, Serialize)]
pub struct SslModeInfo {
    pub mode: SslMode,
    pub label: &'static str,
    pub description: &'static str,
}

impl SslModeInfo {
    const fn new(mode: SslMode, label: &'static str, description: &'static str) -> Self {
        Self {
            mode,
            label,
            description,
        }
    }
}

struct SslRegistry {
    modes: HashMap<DatabaseType, Vec<SslModeInfo>>,
}

static REGISTRY: LazyLock<RwLock<SslRegistry>> = LazyLock::new(|| {
    RwLock::new(SslRegistry {
        modes: built_in_modes(),
    })
});

fn built_in_modes() -> HashMap<DatabaseType, Vec<SslModeInfo>> {
    let mut map = HashMap::new();

    map.insert(
        DatabaseType::Postgres,
        vec![
            SslModeInfo::new(SslMode::Disabled, "Disabled", "No TLS"),
            SslModeInfo::new(SslMode::Preferred, "Preferred", "TLS when the server offers it"),
            SslModeInfo::new(SslMode::Required, "Required", "TLS without certificate checks"),
            SslModeInfo::new(SslMode::VerifyCa, "Verify CA", "Verify the certificate chain"),
            SslModeInfo::new(
                SslMode::VerifyIdentity,
                "Verify Identity",
                "Verify the chain and the server hostname",
            ),
        ],
    );

    let mysql_family = vec![
        SslModeInfo::new(SslMode::Disabled, "Disabled", "No TLS"),
        SslModeInfo::new(SslMode::Preferred, "Preferred", "TLS when the server offers it"),
        SslModeInfo::new(SslMode::Required, "Required", "TLS without certificate checks"),
        SslModeInfo::new(SslMode::VerifyCa, "Verify CA", "Verify the certificate chain"),
        SslModeInfo::new(
            SslMode::VerifyIdentity,
            "Verify Identity",
            "Verify the chain and the server hostname",
        ),
    ];
    map.insert(DatabaseType::MySql, mysql_family.clone());
    map.insert(DatabaseType::MariaDb, mysql_family);

    let http_family = vec![
        SslModeInfo::new(SslMode::Disabled, "Disabled", "Plain HTTP"),
        SslModeInfo::new(SslMode::Enabled, "Enabled", "HTTPS with full verification"),
        SslModeInfo::new(
            SslMode::Insecure,
            "Insecure",
            "HTTPS without certificate checks",
        ),
    ];
    map.insert(DatabaseType::ClickHouse, http_family.clone());
    map.insert(DatabaseType::ElasticSearch, http_family);

    let tcp_family = vec![
        SslModeInfo::new(SslMode::Disabled, "Disabled", "No TLS"),
        SslModeInfo::new(SslMode::Enabled, "Enabled", "TLS with full verification"),
        SslModeInfo::new(
            SslMode::Insecure,
            "Insecure",
            "TLS without certificate checks",
        ),
    ];
    map.insert(DatabaseType::MongoDb, tcp_family.clone());
    map.insert(DatabaseType::Redis, tcp_family);

    // Sqlite is file-based: no modes at all.
    map
}

/// Adds or replaces the mode list for a database type. Extension editions
/// call this after boot; lookups merge on every call, so late registration
/// is visible immediately.
pub fn register_database_ssl_modes(database_type: DatabaseType, modes: Vec<SslModeInfo>) {
    REGISTRY
        .write()
        .expect("ssl registry poisoned")
        .modes
        .insert(database_type, modes);
}

/// Ordered mode list for a database type. Empty when the engine has no TLS
/// surface (SQLite).
pub fn get_ssl_modes(database_type: DatabaseType) -> Vec<SslModeInfo> {
    REGISTRY
        .read()
        .expect("ssl registry poisoned")
        .modes
        .get(&database_type)
        .cloned()
        .unwrap_or_default()
}

/// Canonicalizes native dialect spellings (`disable`, `REQUIRED`,
/// `verify-full`, ...) to the unified mode set. Unknown strings yield
/// `None`.
pub fn canonicalize_ssl_mode(raw: &str) -> Option<SslMode> {
    let lowered = raw.trim().to_ascii_lowercase().replace('_', "-");
    let mode = match lowered.as_str() {
        "disabled" | "disable" | "off" | "false" | "none" => SslMode::Disabled,
        "preferred" | "prefer" | "allow" => SslMode::Preferred,
        "required" | "require" | "on" => SslMode::Required,
        "verify-ca" => SslMode::VerifyCa,
        "verify-identity" | "verify-full" => SslMode::VerifyIdentity,
        "enabled" | "true" => SslMode::Enabled,
        "insecure" | "skip-verify" => SslMode::Insecure,
        _ => return None,
    };
    Some(mode)
}

/// A mode is valid for an engine when its canonical form appears in the
/// engine's registered mode list.
pub fn validate_ssl_mode(database_type: DatabaseType, raw: &str) -> bool {
    let Some(mode) = canonicalize_ssl_mode(raw) else {
        return false;
    };
    get_ssl_modes(database_type).iter().any(|m| m.mode == mode)
}

/// Certificate material: inline PEM content, or a filesystem path.
///
/// Paths are only honored for profile-sourced connections; requests that
/// originate from a remote frontend can supply inline content only, which
/// closes the path-traversal channel.
#[derive(Debug, Clone, Default)]
pub struct CertSource {
    pub content: Option<String>,
    pub path: Option<String>,
}

impl CertSource {
    fn from_advanced(
        credentials: &Credentials,
        content_key: &str,
        path_key: &str,
    ) -> Result<Option<CertSource>> {
        let content = credentials.advanced.get(content_key).map(str::to_string);
        let path = credentials.advanced.get(path_key).map(str::to_string);
        if path.is_some() && !credentials.is_profile {
            return Err(CoreError::bad_request(
                "certificate paths are only allowed for profile connections",
            ));
        }
        if content.is_none() && path.is_none() {
            return Ok(None);
        }
        Ok(Some(CertSource { content, path }))
    }

    /// Resolves to PEM bytes, reading from disk only when permitted.
    pub fn load(&self) -> Result<Vec<u8>> {
        if let Some(content) = &self.content {
            return Ok(content.as_bytes().to_vec());
        }
        if let Some(path) = &self.path {
            return std::fs::read(path).map_err(|e| {
                log::error!("[SSL] failed to read certificate {path}: {e}");
                CoreError::internal("failed to read certificate")
            });
        }
        Err(CoreError::bad_request("certificate source is empty"))
    }
}

/// Parsed TLS configuration descriptor, ready for `build_tls_connector`.
#[derive(Debug, Clone)]
pub struct SslConfig {
    pub mode: SslMode,
    pub ca_cert: Option<CertSource>,
    pub client_cert: Option<CertSource>,
    pub client_key: Option<CertSource>,
    pub server_name: Option<String>,
}

pub const SSL_MODE_KEY: &str = "SSL Mode";
pub const SSL_CA_CERT_KEY: &str = "SSL CA Certificate";
pub const SSL_CA_CERT_PATH_KEY: &str = "SSL CA Certificate Path";
pub const SSL_CLIENT_CERT_KEY: &str = "SSL Client Certificate";
pub const SSL_CLIENT_CERT_PATH_KEY: &str = "SSL Client Certificate Path";
pub const SSL_CLIENT_KEY_KEY: &str = "SSL Client Key";
pub const SSL_CLIENT_KEY_PATH_KEY: &str = "SSL Client Key Path";
pub const SSL_SERVER_NAME_KEY: &str = "SSL Server Name";

/// Reads the advanced-options bag into an `SslConfig`.
///
/// Returns `Ok(None)` when the mode is absent, `disabled`, or the engine
/// has no TLS surface. An unknown or unsupported mode string is a
/// `BadRequest`.
pub fn parse_ssl_config(credentials: &Credentials) -> Result<Option<SslConfig>> {
    let Some(raw_mode) = credentials.advanced.get(SSL_MODE_KEY) else {
        return Ok(None);
    };

    let Some(mode) = canonicalize_ssl_mode(raw_mode) else {
        return Err(CoreError::bad_request(format!(
            "unknown SSL mode: {raw_mode}"
        )));
    };

    if mode == SslMode::Disabled {
        return Ok(None);
    }

    if !get_ssl_modes(credentials.database_type)
        .iter()
        .any(|m| m.mode == mode)
    {
        return Err(CoreError::bad_request(format!(
            "SSL mode {mode} is not supported for this database type"
        )));
    }

    Ok(Some(SslConfig {
        mode,
        ca_cert: CertSource::from_advanced(credentials, SSL_CA_CERT_KEY, SSL_CA_CERT_PATH_KEY)?,
        client_cert: CertSource::from_advanced(
            credentials,
            SSL_CLIENT_CERT_KEY,
            SSL_CLIENT_CERT_PATH_KEY,
        )?,
        client_key: CertSource::from_advanced(
            credentials,
            SSL_CLIENT_KEY_KEY,
            SSL_CLIENT_KEY_PATH_KEY,
        )?,
        server_name: credentials
            .advanced
            .get(SSL_SERVER_NAME_KEY)
            .map(str::to_string),
    }))
}

/// Builds a `native_tls::TlsConnector` from a parsed descriptor.
///
/// - `required` / `insecure`: TLS on, all verification off.
/// - `verify-ca`: chain verified (explicit CA when provided, OS trust store
///   otherwise), hostname matching off.
/// - `verify-identity` / `enabled`: chain and hostname verified.
/// - `preferred` is a dial-time policy; the connector itself verifies
///   nothing so the driver can fall back to plaintext.
///
/// Client certificate and key yield a mutual-TLS identity when both are
/// present (PKCS#8 PEM).
pub fn build_tls_connector(config: &SslConfig) -> Result<native_tls::TlsConnector> {
    let mut builder = native_tls::TlsConnector::builder();

    match config.mode {
        SslMode::Required | SslMode::Insecure | SslMode::Preferred => {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        SslMode::VerifyCa => {
            builder.danger_accept_invalid_hostnames(true);
        }
        SslMode::VerifyIdentity | SslMode::Enabled => {}
        SslMode::Disabled => {
            return Err(CoreError::bad_request(
                "cannot build a TLS connector for the disabled mode",
            ));
        }
    }

    if let Some(ca) = &config.ca_cert {
        let pem = ca.load()?;
        let cert = native_tls::Certificate::from_pem(&pem).map_err(|e| {
            log::error!("[SSL] invalid CA certificate: {e}");
            CoreError::bad_request("invalid CA certificate")
        })?;
        builder.add_root_certificate(cert);
    }

    if let (Some(cert), Some(key)) = (&config.client_cert, &config.client_key) {
        let cert_pem = cert.load()?;
        let key_pem = key.load()?;
        let identity = native_tls::Identity::from_pkcs8(&cert_pem, &key_pem).map_err(|e| {
            log::error!("[SSL] invalid client certificate/key pair: {e}");
            CoreError::bad_request("invalid client certificate or key")
        })?;
        builder.identity(identity);
    }

    builder.build().map_err(|e| {
        log::error!("[SSL] TLS connector build failed: {e}");
        CoreError::internal("failed to initialize TLS")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdvancedOptions;

    fn creds(database_type: DatabaseType, advanced: AdvancedOptions, is_profile: bool) -> Credentials {
        Credentials {
            database_type,
            hostname: "localhost".to_string(),
            username: "user".to_string(),
            password: "pw".to_string(),
            database: "db".to_string(),
            is_profile,
            advanced,
        }
    }

    #[test]
    fn postgres_native_spellings_canonicalize() {
        assert_eq!(canonicalize_ssl_mode("disable"), Some(SslMode::Disabled));
        assert_eq!(canonicalize_ssl_mode("require"), Some(SslMode::Required));
        assert_eq!(
            canonicalize_ssl_mode("verify-full"),
            Some(SslMode::VerifyIdentity)
        );
    }

    #[test]
    fn mysql_native_spellings_canonicalize() {
        assert_eq!(canonicalize_ssl_mode("DISABLED"), Some(SslMode::Disabled));
        assert_eq!(canonicalize_ssl_mode("REQUIRED"), Some(SslMode::Required));
        assert_eq!(
            canonicalize_ssl_mode("VERIFY_IDENTITY"),
            Some(SslMode::VerifyIdentity)
        );
    }

    #[test]
    fn validity_matches_registry_membership() {
        assert!(validate_ssl_mode(DatabaseType::Postgres, "verify-ca"));
        assert!(validate_ssl_mode(DatabaseType::Postgres, "require"));
        assert!(!validate_ssl_mode(DatabaseType::Postgres, "insecure"));
        assert!(validate_ssl_mode(DatabaseType::ClickHouse, "insecure"));
        assert!(!validate_ssl_mode(DatabaseType::Sqlite, "required"));
        assert!(!validate_ssl_mode(DatabaseType::Postgres, "bogus"));
    }

    #[test]
    fn parse_returns_none_for_disabled_or_absent() {
        let bag = AdvancedOptions::new();
        assert!(parse_ssl_config(&creds(DatabaseType::Postgres, bag, false))
            .unwrap()
            .is_none());

        let mut bag = AdvancedOptions::new();
        bag.set(SSL_MODE_KEY, "disable").unwrap();
        assert!(parse_ssl_config(&creds(DatabaseType::Postgres, bag, false))
            .unwrap()
            .is_none());
    }

    #[test]
    fn postgres_require_maps_to_required_without_hostname_checks() {
        let mut bag = AdvancedOptions::new();
        bag.set(SSL_MODE_KEY, "require").unwrap();
        let config = parse_ssl_config(&creds(DatabaseType::Postgres, bag, false))
            .unwrap()
            .unwrap();
        assert_eq!(config.mode, SslMode::Required);
        assert!(config.mode.uses_tls());
        assert!(!config.mode.verifies_hostname());
    }

    #[test]
    fn cert_paths_require_profile_connections() {
        let mut bag = AdvancedOptions::new();
        bag.set(SSL_MODE_KEY, "verify-ca").unwrap();
        bag.set(SSL_CA_CERT_PATH_KEY, "/etc/ssl/ca.pem").unwrap();
        let err = parse_ssl_config(&creds(DatabaseType::Postgres, bag.clone(), false)).unwrap_err();
        assert!(matches!(err, CoreError::BadRequest(_)));

        // The same bag is fine for a profile connection.
        assert!(parse_ssl_config(&creds(DatabaseType::Postgres, bag, true)).is_ok());
    }

    #[test]
    fn inline_content_is_always_accepted() {
        let mut bag = AdvancedOptions::new();
        bag.set(SSL_MODE_KEY, "verify-ca").unwrap();
        bag.set(SSL_CA_CERT_KEY, "-----BEGIN CERTIFICATE-----").unwrap();
        let config = parse_ssl_config(&creds(DatabaseType::Postgres, bag, false))
            .unwrap()
            .unwrap();
        assert!(config.ca_cert.is_some());
    }

    #[test]
    fn late_registration_is_visible_at_lookup() {
        register_database_ssl_modes(
            DatabaseType::Sqlite,
            vec![SslModeInfo::new(SslMode::Disabled, "Disabled", "No TLS")],
        );
        assert_eq!(get_ssl_modes(DatabaseType::Sqlite).len(), 1);
        // Restore the built-in (empty) state for other tests.
        register_database_ssl_modes(DatabaseType::Sqlite, Vec::new());
    }
}
