//! Configuration for the directory client.

use corpdir_core::{Error, Result, ServiceCredentials};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Default connection timeout (seconds).
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 10;

/// Placeholder substituted with the queried username in filter templates.
const FILTER_PLACEHOLDER: &str = "{username}";

/// PKCS#12 client identity presented during the TLS handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsIdentity {
    /// Path to the PKCS#12 archive holding the certificate and key.
    pub pkcs12_path: PathBuf,
    /// Password protecting the archive.
    #[serde(skip_serializing)]
    pub password: SecretString,
}

/// Configuration for connecting to an LDAP-compatible directory.
///
/// A value object set once before use. Filter templates must contain the
/// `{username}` placeholder exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DirectoryConfig {
    #[validate(length(min = 1))]
    host: String,
    #[validate(range(min = 1))]
    port: u16,
    #[validate(length(min = 1))]
    base_dn: String,
    #[serde(default)]
    credentials: Option<ServiceCredentials>,
    #[serde(default)]
    attributes: Vec<String>,
    #[validate(custom(function = validate_filter_template))]
    user_filter: String,
    #[validate(custom(function = validate_filter_template))]
    group_filter: String,
    #[serde(default)]
    use_tls: bool,
    #[serde(default)]
    no_starttls: bool,
    #[serde(default = "default_tls_verify")]
    tls_verify: bool,
    #[serde(default)]
    tls_server_name: Option<String>,
    #[serde(default)]
    tls_ca_cert: Option<PathBuf>,
    #[serde(default)]
    tls_identity: Option<TlsIdentity>,
    #[serde(default = "default_connection_timeout_secs")]
    connection_timeout_secs: u64,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

fn validate_filter_template(template: &str) -> std::result::Result<(), ValidationError> {
    if template.matches(FILTER_PLACEHOLDER).count() == 1 {
        return Ok(());
    }
    let mut err = ValidationError::new("filter_placeholder");
    err.message = Some("filter template must contain `{username}` exactly once".into());
    Err(err)
}

impl DirectoryConfig {
    /// Creates a configuration for the given directory endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the host, port, or base DN fail validation.
    pub fn new(host: impl Into<String>, port: u16, base_dn: impl Into<String>) -> Result<Self> {
        let config = Self {
            host: host.into(),
            port,
            base_dn: base_dn.into(),
            credentials: None,
            attributes: Vec::new(),
            user_filter: "(uid={username})".to_string(),
            group_filter: "(memberUid={username})".to_string(),
            use_tls: false,
            no_starttls: false,
            tls_verify: default_tls_verify(),
            tls_server_name: None,
            tls_ca_cert: None,
            tls_identity: None,
            connection_timeout_secs: default_connection_timeout_secs(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Revalidates the configuration, catching builder-introduced mistakes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] describing every failing field.
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(Error::from)
    }

    /// Returns the directory host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the directory port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the search base distinguished name.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.base_dn
    }

    /// Returns the service-account credentials, if configured.
    #[must_use]
    pub const fn credentials(&self) -> Option<&ServiceCredentials> {
        self.credentials.as_ref()
    }

    /// Returns the configured attribute list (not yet normalized).
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Returns the user-filter template.
    #[must_use]
    pub fn user_filter(&self) -> &str {
        &self.user_filter
    }

    /// Returns the group-filter template.
    #[must_use]
    pub fn group_filter(&self) -> &str {
        &self.group_filter
    }

    /// Returns whether to dial with TLS directly.
    #[must_use]
    pub const fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// Returns whether the opportunistic StartTLS upgrade is skipped on
    /// plain connections.
    #[must_use]
    pub const fn no_starttls(&self) -> bool {
        self.no_starttls
    }

    /// Returns whether TLS certificate verification is enabled.
    #[must_use]
    pub const fn tls_verify(&self) -> bool {
        self.tls_verify
    }

    /// Optional hostname used for dialing TLS and certificate validation in
    /// place of [`host`](Self::host).
    #[must_use]
    pub fn tls_server_name(&self) -> Option<&str> {
        self.tls_server_name.as_deref()
    }

    /// Optional custom CA certificate path.
    #[must_use]
    pub fn tls_ca_cert(&self) -> Option<&PathBuf> {
        self.tls_ca_cert.as_ref()
    }

    /// Optional client identity presented during the TLS handshake.
    #[must_use]
    pub const fn tls_identity(&self) -> Option<&TlsIdentity> {
        self.tls_identity.as_ref()
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Returns the URL the protocol library dials, derived from the TLS mode.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_tls { "ldaps" } else { "ldap" };
        let host = if self.use_tls {
            self.tls_server_name().unwrap_or(&self.host)
        } else {
            &self.host
        };
        format!("{scheme}://{host}:{port}", port = self.port)
    }

    /// Substitutes `value` into the user-filter template.
    #[must_use]
    pub(crate) fn user_search_filter(&self, value: &str) -> String {
        self.user_filter.replace(FILTER_PLACEHOLDER, value)
    }

    /// Substitutes `value` into the group-filter template.
    #[must_use]
    pub(crate) fn group_search_filter(&self, value: &str) -> String {
        self.group_filter.replace(FILTER_PLACEHOLDER, value)
    }

    /// Sets the service-account credentials used for lookups.
    #[must_use]
    pub fn with_credentials(mut self, credentials: ServiceCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replaces the configured attribute list.
    #[must_use]
    pub fn with_attributes<I>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.attributes = attributes.into_iter().collect();
        self
    }

    /// Overrides the user-filter template.
    #[must_use]
    pub fn with_user_filter(mut self, template: impl Into<String>) -> Self {
        self.user_filter = template.into();
        self
    }

    /// Overrides the group-filter template.
    #[must_use]
    pub fn with_group_filter(mut self, template: impl Into<String>) -> Self {
        self.group_filter = template.into();
        self
    }

    /// Enables or disables dialing with TLS directly.
    #[must_use]
    pub const fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Skips the opportunistic StartTLS upgrade on plain connections.
    #[must_use]
    pub const fn with_no_starttls(mut self, skip: bool) -> Self {
        self.no_starttls = skip;
        self
    }

    /// Enables or disables TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Sets the hostname used for dialing TLS and certificate validation.
    #[must_use]
    pub fn with_tls_server_name(mut self, name: impl Into<String>) -> Self {
        self.tls_server_name = Some(name.into());
        self
    }

    /// Sets the custom CA certificate path for TLS verification.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Sets the client identity presented during the TLS handshake.
    #[must_use]
    pub fn with_tls_identity(mut self, identity: TlsIdentity) -> Self {
        self.tls_identity = Some(identity);
        self
    }

    /// Overrides the connection timeout in seconds.
    #[must_use]
    pub const fn with_connection_timeout_secs(mut self, seconds: u64) -> Self {
        self.connection_timeout_secs = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides() {
        let config = DirectoryConfig::new("ldap.example.com", 636, "dc=example,dc=com")
            .unwrap()
            .with_credentials(ServiceCredentials::new(
                "cn=reader,dc=example,dc=com",
                "secret",
            ))
            .with_attributes(vec!["sAMAccountName".to_string()])
            .with_user_filter("(sAMAccountName={username})")
            .with_group_filter("(member={username})")
            .with_tls(true)
            .with_tls_verification(false)
            .with_connection_timeout_secs(20);

        assert_eq!(config.host(), "ldap.example.com");
        assert_eq!(config.port(), 636);
        assert_eq!(config.base_dn(), "dc=example,dc=com");
        assert_eq!(
            config.credentials().unwrap().bind_dn(),
            "cn=reader,dc=example,dc=com"
        );
        assert_eq!(config.attributes(), ["sAMAccountName".to_string()]);
        assert_eq!(config.user_filter(), "(sAMAccountName={username})");
        assert!(config.use_tls());
        assert!(!config.tls_verify());
        assert_eq!(config.connection_timeout(), Duration::from_secs(20));
        config.check().unwrap();
    }

    #[test]
    fn rejects_empty_host() {
        let err = DirectoryConfig::new("", 389, "dc=example,dc=com").unwrap_err();
        assert!(matches!(err, corpdir_core::Error::ValidationError(_)));
    }

    #[test]
    fn rejects_filter_without_placeholder() {
        let config = DirectoryConfig::new("ldap.example.com", 389, "dc=example,dc=com")
            .unwrap()
            .with_user_filter("(uid=jdoe)");
        let err = config.check().unwrap_err();
        assert!(matches!(err, corpdir_core::Error::ValidationError(_)));
    }

    #[test]
    fn rejects_filter_with_two_placeholders() {
        let config = DirectoryConfig::new("ldap.example.com", 389, "dc=example,dc=com")
            .unwrap()
            .with_group_filter("(|(memberUid={username})(member={username}))");
        assert!(config.check().is_err());
    }

    #[test]
    fn filter_substitution() {
        let config = DirectoryConfig::new("ldap.example.com", 389, "dc=example,dc=com").unwrap();
        assert_eq!(config.user_search_filter("jdoe"), "(uid=jdoe)");
        assert_eq!(config.group_search_filter("jdoe"), "(memberUid=jdoe)");
    }

    #[test]
    fn endpoint_url_follows_tls_mode() {
        let plain = DirectoryConfig::new("ldap.example.com", 389, "dc=example,dc=com").unwrap();
        assert_eq!(plain.endpoint_url(), "ldap://ldap.example.com:389");

        let tls = DirectoryConfig::new("10.0.0.5", 636, "dc=example,dc=com")
            .unwrap()
            .with_tls(true)
            .with_tls_server_name("ldap.example.com");
        assert_eq!(tls.endpoint_url(), "ldaps://ldap.example.com:636");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DirectoryConfig = serde_json::from_str(
            r#"{
                "host": "ldap.example.com",
                "port": 389,
                "base_dn": "dc=example,dc=com",
                "user_filter": "(uid={username})",
                "group_filter": "(memberUid={username})"
            }"#,
        )
        .unwrap();
        assert!(config.tls_verify());
        assert!(!config.use_tls());
        assert_eq!(config.connection_timeout(), Duration::from_secs(10));
        config.check().unwrap();
    }
}
