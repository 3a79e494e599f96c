//! Process-wide settings
//!
//! Fulfiller names and the supported-site registry. Every sanitize or merge
//! path falls back to the built-in defaults rather than producing an empty
//! list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound on fulfiller names and on hosts per site
pub const MAX_LIST_ENTRIES: usize = 30;

/// Upper bound on slug length
pub const MAX_SLUG_LEN: usize = 48;

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// A print-model site the shop knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedSite {
    /// Slug, unique within settings
    pub id: String,
    /// Display name
    pub name: String,
    /// Normalized host names
    pub hosts: Vec<String>,
    /// Where customers can browse models
    pub browse_url: String,
    /// Whether submissions from this site are accepted
    pub enabled: bool,
}

/// Unsanitized site as it arrives from an admin edit or a stored cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInput {
    /// Requested slug (derived from name when blank)
    #[serde(default)]
    pub id: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Raw host names
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Browse URL
    #[serde(default)]
    pub browse_url: Option<String>,
    /// Enabled flag (defaults to true)
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl From<SupportedSite> for SiteInput {
    fn from(site: SupportedSite) -> Self {
        Self {
            id: Some(site.id),
            name: Some(site.name),
            hosts: site.hosts,
            browse_url: Some(site.browse_url),
            enabled: Some(site.enabled),
        }
    }
}

/// Sanitized settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Ordered, de-duplicated assignee names
    #[serde(alias = "fulfilledByNames")]
    pub fulfiller_names: Vec<String>,
    /// Site registry in match order
    pub supported_sites: Vec<SupportedSite>,
}

/// Partial settings to merge over the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// Fulfiller names, if supplied
    #[serde(default, alias = "fulfilledByNames")]
    pub fulfiller_names: Option<Vec<String>>,
    /// Sites, if supplied
    #[serde(default)]
    pub supported_sites: Option<Vec<SiteInput>>,
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            fulfiller_names: Some(settings.fulfiller_names),
            supported_sites: Some(
                settings
                    .supported_sites
                    .into_iter()
                    .map(SiteInput::from)
                    .collect(),
            ),
        }
    }
}

impl Settings {
    /// Merge a patch over the defaults and sanitize.
    ///
    /// Fields missing from the patch take the defaults. Fields that sanitize
    /// to empty also take the defaults.
    #[must_use]
    pub fn merge(incoming: SettingsPatch) -> Self {
        let base = Self::default();

        let fulfiller_names = incoming
            .fulfiller_names
            .map(|names| sanitize_fulfillers(&names))
            .filter(|names| !names.is_empty())
            .unwrap_or(base.fulfiller_names);

        let supported_sites = incoming
            .supported_sites
            .map(|sites| sanitize_sites(&sites))
            .filter(|sites| !sites.is_empty())
            .unwrap_or(base.supported_sites);

        Self {
            fulfiller_names,
            supported_sites,
        }
    }

    /// Re-sanitize current values
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::merge(self.into())
    }

    /// Sites open to public submissions
    #[must_use]
    pub fn enabled_sites(&self) -> Vec<&SupportedSite> {
        self.supported_sites.iter().filter(|s| s.enabled).collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fulfiller_names: vec![
                "Robert".to_string(),
                "Jared".to_string(),
                "Terence".to_string(),
            ],
            supported_sites: vec![SupportedSite {
                id: "stlflix".to_string(),
                name: "STLFlix".to_string(),
                hosts: vec!["stlflix.com".to_string(), "platform.stlflix.com".to_string()],
                browse_url: "https://platform.stlflix.com/explore".to_string(),
                enabled: true,
            }],
        }
    }
}

/// Lowercase slug of `[a-z0-9-]`, at most 48 chars
#[must_use]
pub fn slugify(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    let dashed = NON_SLUG.replace_all(&lower, "-");
    dashed
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_LEN)
        .collect()
}

/// Lowercase, strip a leading `www.`, drop whitespace
#[must_use]
pub fn normalize_host(host: &str) -> String {
    let lower = host.trim().to_lowercase();
    let stripped = lower.strip_prefix("www.").unwrap_or(&lower);
    stripped.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Trim, drop blanks, cap, de-duplicate case-insensitively keeping the first spelling
#[must_use]
pub fn sanitize_fulfillers(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .take(MAX_LIST_ENTRIES)
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Sanitize a site list.
///
/// Nameless sites are dropped. Ids are slugified and suffixed `-2`, `-3`,
/// ... on collision.
#[must_use]
pub fn sanitize_sites(sites: &[SiteInput]) -> Vec<SupportedSite> {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(sites.len());

    for site in sites {
        let name = site.name.as_deref().unwrap_or_default().trim();
        if name.is_empty() {
            continue;
        }

        let requested = site
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(name);
        let id = slugify(requested);
        if id.is_empty() {
            continue;
        }

        let mut final_id = id.clone();
        let mut suffix = 2;
        while seen_ids.contains(&final_id) {
            final_id = format!("{id}-{suffix}");
            suffix += 1;
        }
        seen_ids.insert(final_id.clone());

        let mut seen_hosts = HashSet::new();
        let hosts = site
            .hosts
            .iter()
            .map(|h| normalize_host(h))
            .filter(|h| !h.is_empty())
            .take(MAX_LIST_ENTRIES)
            .filter(|h| seen_hosts.insert(h.clone()))
            .collect();

        out.push(SupportedSite {
            id: final_id,
            name: name.to_string(),
            hosts,
            browse_url: site
                .browse_url
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            enabled: site.enabled.unwrap_or(true),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn site(name: &str, id: Option<&str>, hosts: &[&str]) -> SiteInput {
        SiteInput {
            id: id.map(str::to_string),
            name: Some(name.to_string()),
            hosts: names(hosts),
            browse_url: None,
            enabled: None,
        }
    }

    #[test]
    fn slugify_rules() {
        assert_eq!(slugify("  Printables Dot Com! "), "printables-dot-com");
        assert_eq!(slugify("--a__b--"), "a-b");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(&"x".repeat(60)).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn normalize_host_rules() {
        assert_eq!(normalize_host(" WWW.Thingiverse.com "), "thingiverse.com");
        assert_eq!(normalize_host("my site.com"), "mysite.com");
        assert_eq!(normalize_host("wwwx.com"), "wwwx.com");
    }

    #[test]
    fn fulfillers_dedupe_case_insensitive() {
        let out = sanitize_fulfillers(&names(&["Jared", " jared ", "", "Robert", "JARED"]));
        assert_eq!(out, names(&["Jared", "Robert"]));
    }

    #[test]
    fn fulfillers_capped() {
        let many: Vec<String> = (0..40).map(|i| format!("name{i}")).collect();
        assert_eq!(sanitize_fulfillers(&many).len(), MAX_LIST_ENTRIES);
    }

    #[test]
    fn sites_uniquify_ids() {
        let out = sanitize_sites(&[
            site("Printables", None, &["printables.com"]),
            site("Printables Mirror", Some("printables"), &[]),
            site("Third", Some("Printables"), &[]),
            site("  ", Some("ghost"), &[]),
        ]);
        let ids: Vec<&str> = out.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["printables", "printables-2", "printables-3"]);
        assert!(out.iter().all(|s| s.enabled));
    }

    #[test]
    fn sites_normalize_hosts() {
        let out = sanitize_sites(&[site(
            "Thingiverse",
            None,
            &["www.thingiverse.com", "Thingiverse.com", " ", "cdn.thingiverse.com"],
        )]);
        assert_eq!(out[0].hosts, names(&["thingiverse.com", "cdn.thingiverse.com"]));
    }

    #[test]
    fn merge_empty_fulfillers_falls_back() {
        let merged = Settings::merge(SettingsPatch {
            fulfiller_names: Some(Vec::new()),
            supported_sites: None,
        });
        assert_eq!(merged, Settings::default());
    }

    #[test]
    fn merge_keeps_valid_fields() {
        let merged = Settings::merge(SettingsPatch {
            fulfiller_names: Some(names(&["Ana"])),
            supported_sites: Some(vec![site("Bad", Some("!!!"), &[])]),
        });
        assert_eq!(merged.fulfiller_names, names(&["Ana"]));
        assert_eq!(merged.supported_sites, Settings::default().supported_sites);
    }

    #[test]
    fn patch_accepts_legacy_key() {
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"fulfilledByNames":["Ana","Bo"]}"#).unwrap();
        assert_eq!(patch.fulfiller_names, Some(names(&["Ana", "Bo"])));
    }

    #[test]
    fn enabled_sites_filters() {
        let mut settings = Settings::default();
        settings.supported_sites[0].enabled = false;
        assert!(settings.enabled_sites().is_empty());
    }
}
