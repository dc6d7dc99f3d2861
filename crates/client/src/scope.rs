//! The origin the agent is installed for, and the URL facts classification needs.

use rostercache_core::{AppConfig, Error};
use url::{Origin, Url};

use crate::fetch::resolve;

/// Installation scope: base URL, shell document and routing rules.
#[derive(Debug, Clone)]
pub struct Scope {
    base: Url,
    origin: Origin,
    shell_document: Url,
    manifest_suffix: String,
    image_hosts: Vec<String>,
}

impl Scope {
    pub fn new(
        base: &str, shell_document: &str, manifest_suffix: impl Into<String>, image_hosts: Vec<String>,
    ) -> Result<Self, Error> {
        let base = crate::fetch::canonicalize(base)?;
        let shell_document = resolve(&base, shell_document)?;
        let image_hosts = image_hosts.into_iter().map(|h| h.trim().to_ascii_lowercase()).collect();
        Ok(Self { origin: base.origin(), base, shell_document, manifest_suffix: manifest_suffix.into(), image_hosts })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(&config.scope, &config.shell_document, config.manifest_suffix.clone(), config.image_hosts.clone())
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of the last-resort fallback document.
    pub fn shell_document(&self) -> &Url {
        &self.shell_document
    }

    /// Resolve a page-relative or absolute URL against the scope base.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        Ok(resolve(&self.base, input)?)
    }

    /// Resolve every entry, failing on the first invalid one.
    pub fn resolve_all<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Vec<Url>, Error> {
        inputs.iter().map(|i| self.resolve(i.as_ref())).collect()
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }

    /// Same-origin request for the catalog manifest.
    pub fn is_manifest(&self, url: &Url) -> bool {
        self.is_same_origin(url) && url.path().ends_with(&self.manifest_suffix)
    }

    /// Host is a configured image host or one of its subdomains.
    pub fn is_image_host(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        self.image_hosts
            .iter()
            .any(|h| host == h || host.strip_suffix(h.as_str()).is_some_and(|rest| rest.ends_with('.')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new("http://127.0.0.1:8080/", "index.html", "/rooster.json", vec!["images.start.gg".into()]).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_shell_document_resolved() {
        assert_eq!(scope().shell_document().as_str(), "http://127.0.0.1:8080/index.html");
    }

    #[test]
    fn test_same_origin_requires_port_match() {
        let scope = scope();
        assert!(scope.is_same_origin(&url("http://127.0.0.1:8080/styles.css")));
        assert!(!scope.is_same_origin(&url("http://127.0.0.1:9090/styles.css")));
        assert!(!scope.is_same_origin(&url("https://127.0.0.1:8080/styles.css")));
    }

    #[test]
    fn test_is_manifest() {
        let scope = scope();
        assert!(scope.is_manifest(&url("http://127.0.0.1:8080/rooster.json")));
        assert!(scope.is_manifest(&url("http://127.0.0.1:8080/data/rooster.json?v=3")));
        assert!(!scope.is_manifest(&url("https://cdn.example.com/rooster.json")));
        assert!(!scope.is_manifest(&url("http://127.0.0.1:8080/rooster.json.bak")));
    }

    #[test]
    fn test_is_image_host() {
        let scope = scope();
        assert!(scope.is_image_host(&url("https://images.start.gg/images/user/1/a.png")));
        assert!(scope.is_image_host(&url("https://cdn.images.start.gg/a.png")));
        assert!(!scope.is_image_host(&url("https://notimages.start.gg/a.png")));
        assert!(!scope.is_image_host(&url("https://start.gg/a.png")));
    }

    #[test]
    fn test_from_config() {
        let scope = Scope::from_config(&AppConfig::default()).unwrap();
        assert_eq!(scope.base().as_str(), "http://127.0.0.1:8080/");
    }
}
