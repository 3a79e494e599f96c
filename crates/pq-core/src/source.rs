//! Model-link source detection against the site registry

use crate::settings::{normalize_host, SupportedSite};
use serde::{Deserialize, Serialize};
use url::Url;

/// Label used when no site matches
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Result of classifying a model link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedSource {
    /// Site display name or `Unknown`
    pub label: String,
    /// Whether the matching site is enabled
    pub supported: bool,
}

impl DetectedSource {
    /// No site matched
    #[inline]
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_SOURCE.to_string(),
            supported: false,
        }
    }
}

/// Classify `link` against `sites` in registry order.
///
/// A host matches a site host exactly or as a subdomain of it. Disabled
/// sites still match; they report `supported = false`.
#[must_use]
pub fn detect_source(link: &str, sites: &[SupportedSite]) -> DetectedSource {
    let Ok(url) = Url::parse(link.trim()) else {
        return DetectedSource::unknown();
    };
    let Some(host) = url.host_str().map(normalize_host) else {
        return DetectedSource::unknown();
    };

    sites
        .iter()
        .find(|site| {
            site.hosts.iter().map(|h| normalize_host(h)).any(|site_host| {
                !site_host.is_empty()
                    && (host == site_host || host.ends_with(&format!(".{site_host}")))
            })
        })
        .map_or_else(DetectedSource::unknown, |site| DetectedSource {
            label: site.name.clone(),
            supported: site.enabled,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn sites() -> Vec<SupportedSite> {
        let mut sites = Settings::default().supported_sites;
        sites[0].hosts = vec!["stlflix.com".to_string()];
        sites.push(SupportedSite {
            id: "thingiverse".to_string(),
            name: "Thingiverse".to_string(),
            hosts: vec!["thingiverse.com".to_string()],
            browse_url: String::new(),
            enabled: false,
        });
        sites
    }

    #[test]
    fn suffix_match() {
        let found = detect_source("https://platform.stlflix.com/x", &sites());
        assert_eq!(found.label, "STLFlix");
        assert!(found.supported);
    }

    #[test]
    fn exact_match_with_www() {
        let found = detect_source("https://WWW.stlflix.com/m/2", &sites());
        assert_eq!(found.label, "STLFlix");
    }

    #[test]
    fn disabled_site_not_supported() {
        let found = detect_source("http://thingiverse.com/thing:1", &sites());
        assert_eq!(found.label, "Thingiverse");
        assert!(!found.supported);
    }

    #[test]
    fn lookalike_host_does_not_match() {
        assert_eq!(
            detect_source("https://notstlflix.com/x", &sites()),
            DetectedSource::unknown()
        );
    }

    #[test]
    fn unparseable_link() {
        assert_eq!(detect_source("not a url", &sites()), DetectedSource::unknown());
        assert_eq!(detect_source("", &sites()), DetectedSource::unknown());
    }
}
