//! Tenant (family) entities and URL route resolution
//!
//! The active tenant is derived from the first path segment of the current
//! URL, never from the token. The token's `familySlug` claim is only used
//! to correct drift (see the session monitor).

use serde::{Deserialize, Serialize};

/// Sub-route users land on after resolving a tenant root
pub const DEFAULT_LANDING_PATH: &str = "log-entry";

/// Top-level path segments that are application routes, never tenant slugs
const RESERVED_SEGMENTS: &[&str] = &["login", "signup", "admin", "api", "onboarding"];

/// An isolated data partition ("family"); all child/activity data belongs
/// to exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    pub id: String,
    pub slug: String,
}

/// A child within a family. Activity data is out of scope here; the id and
/// owning family are what tenancy isolation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baby {
    pub id: String,
    pub family_id: String,
    pub name: String,
}

/// A parsed client-side route: optional tenant slug plus the remaining
/// sub-path (no leading slash).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub tenant_slug: Option<String>,
    pub sub_path: String,
}

impl Route {
    /// Parse a URL path. The first segment resolves as the tenant slug
    /// unless it is empty or a reserved application route.
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim_start_matches('/').trim_end_matches('/');
        let mut parts = trimmed.splitn(2, '/');
        let first = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("");

        if first.is_empty() || RESERVED_SEGMENTS.contains(&first) {
            Self {
                tenant_slug: None,
                sub_path: trimmed.to_string(),
            }
        } else {
            Self {
                tenant_slug: Some(first.to_string()),
                sub_path: rest.to_string(),
            }
        }
    }

    /// Whether this route is exactly a tenant root (`/{slug}`)
    pub fn is_tenant_root(&self) -> bool {
        self.tenant_slug.is_some() && self.sub_path.is_empty()
    }

    /// The full path this route represents
    pub fn path(&self) -> String {
        match (&self.tenant_slug, self.sub_path.is_empty()) {
            (Some(slug), true) => format!("/{slug}"),
            (Some(slug), false) => format!("/{}/{}", slug, self.sub_path),
            (None, true) => "/".to_string(),
            (None, false) => format!("/{}", self.sub_path),
        }
    }

    /// The same sub-path re-rooted under another tenant (drift correction)
    pub fn under_tenant(&self, slug: &str) -> String {
        if self.sub_path.is_empty() {
            format!("/{slug}")
        } else {
            format!("/{}/{}", slug, self.sub_path)
        }
    }

    /// The unauthenticated entry point for this route: the tenant's login
    /// page when a tenant is resolvable, the generic login page otherwise.
    pub fn login_path(&self) -> String {
        match &self.tenant_slug {
            Some(slug) => format!("/{slug}/login"),
            None => "/login".to_string(),
        }
    }
}
