//! Directory client implementation.

use crate::{attrs, config::DirectoryConfig, person::Person, Result};
use async_trait::async_trait;
use corpdir_core::Error;
use ldap3::{
    adapters::PagedResults, DerefAliases, LdapConnAsync, LdapConnSettings, Scope, SearchEntry,
    SearchOptions,
};
use native_tls::{Certificate, Identity, TlsConnector};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::fs;
use tracing::{debug, warn};

/// Attributes requested when enumerating a user's groups.
const GROUP_ATTRIBUTES: &[&str] = &["cn"];

/// LDAP entry representation used by the client.
#[derive(Debug, Clone)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute map (values preserve server order).
    pub attributes: HashMap<String, Vec<String>>,
}

impl LdapEntry {
    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .get(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }
}

/// Outcome of an authentication attempt where the user entry was resolved.
///
/// The [`Person`] is available in both variants: the identity is looked up
/// before the credential check, so a rejected password still identifies who
/// was rejected. Do not treat a populated person as proof of authentication.
#[derive(Debug)]
pub enum AuthOutcome {
    /// The password bind succeeded.
    Accepted {
        /// The authenticated user's directory snapshot.
        person: Person,
        /// Set when the follow-up service-account rebind failed; the
        /// authentication itself already succeeded.
        rebind_error: Option<Error>,
    },
    /// The user entry was found but the password bind was rejected.
    Rejected {
        /// The resolved user's directory snapshot.
        person: Person,
        /// The bind error reported by the directory.
        error: Error,
    },
}

impl AuthOutcome {
    /// Returns true if the credentials were accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Returns the resolved person regardless of outcome.
    #[must_use]
    pub const fn person(&self) -> &Person {
        match self {
            Self::Accepted { person, .. } | Self::Rejected { person, .. } => person,
        }
    }

    /// Consumes the outcome and returns the resolved person.
    #[must_use]
    pub fn into_person(self) -> Person {
        match self {
            Self::Accepted { person, .. } | Self::Rejected { person, .. } => person,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapSession: Send {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;
    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<LdapEntry>>;
    async fn search_paged(
        &mut self,
        base_dn: &str,
        filter: &str,
        attributes: &[String],
        page_size: u32,
    ) -> Result<Vec<LdapEntry>>;
    async fn unbind(&mut self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub(crate) trait LdapConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn LdapSession>>;
}

/// Directory client owning a single lazily-created connection.
///
/// The client assumes sequential use; concurrent calls must be serialized by
/// the caller. The connection is created on first use, reused across calls,
/// and released via [`close`](Self::close).
pub struct DirectoryClient {
    config: DirectoryConfig,
    connector: Box<dyn LdapConnector>,
    session: Option<Box<dyn LdapSession>>,
    attributes: Option<Vec<String>>,
}

impl DirectoryClient {
    /// Creates a client that uses the real LDAP connector.
    #[must_use]
    pub fn new(config: DirectoryConfig) -> Self {
        let connector: Box<dyn LdapConnector> = Box::new(RealLdapConnector {
            config: config.clone(),
        });
        Self {
            config,
            connector,
            session: None,
            attributes: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_connector(config: DirectoryConfig, connector: Box<dyn LdapConnector>) -> Self {
        Self {
            config,
            connector,
            session: None,
            attributes: None,
        }
    }

    /// Establishes the connection to the directory.
    ///
    /// A no-op when already connected. The configured attribute list is
    /// normalized exactly once, on the first connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if dialing or the TLS negotiation
    /// fails, or a validation error for a misconfigured client.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        self.config.check()?;
        if self.attributes.is_none() {
            self.attributes = Some(attrs::normalize_attributes(self.config.attributes()));
        }
        debug!(url = %self.config.endpoint_url(), "connecting to directory");
        let session = self.connector.connect().await?;
        self.session = Some(session);
        Ok(())
    }

    /// Releases the underlying connection.
    ///
    /// Safe to call when already disconnected. Unbind failures are logged
    /// and not surfaced; the session is dropped either way.
    pub async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(err) = session.unbind().await {
                warn!(error = %err, "unbind failed while closing directory connection");
            }
        }
    }

    /// Authenticates a user against the directory.
    ///
    /// Performs the two-phase bind conversation on the cached connection:
    /// bind as the service account (when configured), look the user up by the
    /// substituted user filter, bind as the user's own DN with the supplied
    /// password, then rebind as the service account so later calls on this
    /// client keep their privileged session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no entry matches the username and
    /// [`Error::AmbiguousResult`] when more than one does. A rejected
    /// password is not an `Err`: it comes back as [`AuthOutcome::Rejected`]
    /// with the resolved person attached.
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<AuthOutcome> {
        self.connect().await?;
        let filter = self
            .config
            .user_search_filter(&ldap3::ldap_escape(username));
        let attributes = attrs::with_extra(self.normalized_attributes(), &["dn"]);
        let base_dn = self.config.base_dn().to_string();

        let session = self.session.as_mut().ok_or_else(not_connected)?;
        if let Some(creds) = self.config.credentials() {
            session
                .simple_bind(creds.bind_dn(), creds.bind_password())
                .await?;
        }

        let entries = session.search(&base_dn, &filter, &attributes).await?;
        let entry = match entries.as_slice() {
            [] => return Err(Error::NotFound(format!("no user matches `{username}`"))),
            [entry] => entry,
            _ => {
                return Err(Error::AmbiguousResult(format!(
                    "{} entries match `{username}`",
                    entries.len()
                )))
            }
        };

        let person = Person::from_entry(entry, &attributes);
        let user_dn = entry.dn.clone();

        if let Err(error) = session.simple_bind(&user_dn, password).await {
            debug!(user_dn = %user_dn, "user bind rejected");
            return Ok(AuthOutcome::Rejected { person, error });
        }

        let mut rebind_error = None;
        if let Some(creds) = self.config.credentials() {
            if let Err(err) = session
                .simple_bind(creds.bind_dn(), creds.bind_password())
                .await
            {
                warn!(error = %err, "service-account rebind failed after user bind");
                rebind_error = Some(err);
            }
        }

        Ok(AuthOutcome::Accepted {
            person,
            rebind_error,
        })
    }

    /// Searches for users matching `pattern` using a paged search.
    ///
    /// The pattern is substituted into the user-filter template verbatim, so
    /// callers may use LDAP wildcards. Results come back in the order the
    /// directory returned them; the protocol library fetches subsequent
    /// pages of `page_size` entries transparently.
    ///
    /// # Errors
    ///
    /// Propagates service-bind and search failures.
    pub async fn search_users(&mut self, pattern: &str, page_size: u32) -> Result<Vec<Person>> {
        self.connect().await?;
        let filter = self.config.user_search_filter(pattern);
        let attributes = attrs::with_extra(self.normalized_attributes(), &["dn", "manager"]);
        let base_dn = self.config.base_dn().to_string();

        let session = self.session.as_mut().ok_or_else(not_connected)?;
        if let Some(creds) = self.config.credentials() {
            session
                .simple_bind(creds.bind_dn(), creds.bind_password())
                .await?;
        }

        let entries = session
            .search_paged(&base_dn, &filter, &attributes, page_size)
            .await?;
        debug!(count = entries.len(), "user search returned");
        Ok(entries
            .iter()
            .map(|entry| Person::from_entry(entry, &attributes))
            .collect())
    }

    /// Returns the common names of the groups the user belongs to.
    ///
    /// One name per matching entry, in server order, without deduplication.
    ///
    /// # Errors
    ///
    /// Propagates connection and search failures.
    pub async fn groups_of_user(&mut self, username: &str) -> Result<Vec<String>> {
        self.connect().await?;
        let filter = self
            .config
            .group_search_filter(&ldap3::ldap_escape(username));
        let attributes: Vec<String> = GROUP_ATTRIBUTES.iter().map(ToString::to_string).collect();
        let base_dn = self.config.base_dn().to_string();

        let session = self.session.as_mut().ok_or_else(not_connected)?;
        let entries = session.search(&base_dn, &filter, &attributes).await?;
        Ok(entries
            .iter()
            .map(|entry| entry.first("cn").unwrap_or_default().to_string())
            .collect())
    }

    fn normalized_attributes(&self) -> &[String] {
        self.attributes.as_deref().unwrap_or_default()
    }
}

fn not_connected() -> Error {
    Error::Connection("client is not connected".to_string())
}

/// Real LDAP connector backed by `ldap3`.
struct RealLdapConnector {
    config: DirectoryConfig,
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(&self) -> Result<Box<dyn LdapSession>> {
        let settings = build_ldap_settings(&self.config)?;
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.config.endpoint_url())
            .await
            .map_err(connection_error)?;
        ldap3::drive!(conn);
        Ok(Box::new(RealLdapSession { inner: ldap }))
    }
}

struct RealLdapSession {
    inner: ldap3::Ldap,
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()> {
        self.inner
            .simple_bind(dn, password)
            .await
            .map_err(bind_error)?
            .success()
            .map_err(bind_error)?;
        Ok(())
    }

    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
        attributes: &[String],
    ) -> Result<Vec<LdapEntry>> {
        let result = self
            .inner
            .with_search_options(search_options())
            .search(base_dn, Scope::Subtree, filter, attributes.to_vec())
            .await
            .map_err(search_error)?;
        let (entries, _) = result.success().map_err(search_error)?;
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| LdapEntry {
                dn: entry.dn,
                attributes: entry.attrs,
            })
            .collect())
    }

    async fn search_paged(
        &mut self,
        base_dn: &str,
        filter: &str,
        attributes: &[String],
        page_size: u32,
    ) -> Result<Vec<LdapEntry>> {
        let adapter: PagedResults<String, Vec<String>> =
            PagedResults::new(i32::try_from(page_size).unwrap_or(i32::MAX));
        let mut stream = self
            .inner
            .with_search_options(search_options())
            .streaming_search_with(adapter, base_dn, Scope::Subtree, filter, attributes.to_vec())
            .await
            .map_err(search_error)?;

        let mut entries = Vec::new();
        while let Some(result_entry) = stream.next().await.map_err(search_error)? {
            let entry = SearchEntry::construct(result_entry);
            entries.push(LdapEntry {
                dn: entry.dn,
                attributes: entry.attrs,
            });
        }
        stream.finish().await.success().map_err(search_error)?;
        Ok(entries)
    }

    async fn unbind(&mut self) -> Result<()> {
        self.inner.unbind().await.map_err(connection_error)?;
        Ok(())
    }
}

fn search_options() -> SearchOptions {
    // Whole-subtree scope is set per call; size and time limits stay at the
    // server defaults.
    SearchOptions::new().deref(DerefAliases::Never)
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.connection_timeout());

    // A plain connection is upgraded in place unless the caller opted out;
    // an upgrade failure fails the connect rather than staying unencrypted.
    if !config.use_tls() && !config.no_starttls() {
        settings = settings.set_starttls(true);
    }

    let tls_in_play = config.use_tls() || !config.no_starttls();
    if tls_in_play {
        let mut builder = TlsConnector::builder();
        if !config.tls_verify() {
            builder.danger_accept_invalid_certs(true);
            settings = settings.set_no_tls_verify(true);
        }
        if let Some(cert_path) = config.tls_ca_cert() {
            let pem = fs::read(cert_path).map_err(|err| {
                Error::ConfigError(format!(
                    "failed to read CA certificate {}: {err}",
                    cert_path.display()
                ))
            })?;
            let certificate = Certificate::from_pem(&pem)
                .map_err(|err| Error::ConfigError(format!("invalid CA certificate: {err}")))?;
            builder.add_root_certificate(certificate);
        }
        if let Some(identity) = config.tls_identity() {
            let archive = fs::read(&identity.pkcs12_path).map_err(|err| {
                Error::ConfigError(format!(
                    "failed to read client identity {}: {err}",
                    identity.pkcs12_path.display()
                ))
            })?;
            let identity = Identity::from_pkcs12(&archive, identity.password.expose_secret())
                .map_err(|err| Error::ConfigError(format!("invalid client identity: {err}")))?;
            builder.identity(identity);
        }
        let connector = builder.build().map_err(|err| {
            Error::ConfigError(format!("failed to construct TLS connector: {err}"))
        })?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}

fn connection_error(err: ldap3::LdapError) -> Error {
    Error::Connection(err.to_string())
}

fn bind_error(err: ldap3::LdapError) -> Error {
    Error::Bind(err.to_string())
}

fn search_error(err: ldap3::LdapError) -> Error {
    Error::Search(err.to_string())
}
