//! Static catalog of identity providers.
//!
//! Each catalog entry carries the provider's URL-safe slug, a human-readable
//! label, its default scope set, and either a well-known OIDC issuer or the
//! `requires_source` flag for providers whose issuer is deployment-specific
//! (generic OpenID Connect, Okta, NextCloud).
//!
//! The catalog is defined at process start and never mutated; activation
//! with credentials produces the registered provider set in the web layer.

use std::collections::BTreeSet;

/// An identity provider known to the gateway.
#[derive(Debug, PartialEq, Eq)]
pub struct Provider {
    slug: &'static str,
    label: &'static str,
    requires_source: bool,
    issuer: Option<&'static str>,
    default_scopes: &'static [&'static str],
}

/// Apple.
pub static APPLE: Provider = Provider {
    slug: "apple",
    label: "Apple",
    requires_source: false,
    issuer: Some("https://appleid.apple.com"),
    default_scopes: &["openid", "email", "name"],
};

/// Test-only provider driven by the faux handshake; no network exchange.
pub static FAUX: Provider = Provider {
    slug: "faux",
    label: "Faux",
    requires_source: false,
    issuer: None,
    default_scopes: &["openid"],
};

/// GitLab.
pub static GITLAB: Provider = Provider {
    slug: "gitlab",
    label: "GitLab",
    requires_source: false,
    issuer: Some("https://gitlab.com"),
    default_scopes: &["openid", "profile", "email", "read_user"],
};

/// Google.
pub static GOOGLE: Provider = Provider {
    slug: "google",
    label: "Google",
    requires_source: false,
    issuer: Some("https://accounts.google.com"),
    default_scopes: &["openid", "profile", "email"],
};

/// LINE.
pub static LINE: Provider = Provider {
    slug: "line",
    label: "LINE",
    requires_source: false,
    issuer: Some("https://access.line.me"),
    default_scopes: &["openid", "profile", "email"],
};

/// LinkedIn.
pub static LINKEDIN: Provider = Provider {
    slug: "linkedin",
    label: "LinkedIn",
    requires_source: false,
    issuer: Some("https://www.linkedin.com/oauth"),
    default_scopes: &["openid", "profile", "email"],
};

/// Microsoft Online.
pub static MICROSOFT: Provider = Provider {
    slug: "microsoft_online",
    label: "Microsoft Online",
    requires_source: false,
    issuer: Some("https://login.microsoftonline.com/common/v2.0"),
    default_scopes: &["openid", "profile", "email"],
};

/// NextCloud. The issuer is the deployment's own instance.
pub static NEXTCLOUD: Provider = Provider {
    slug: "nextcloud",
    label: "NextCloud",
    requires_source: true,
    issuer: None,
    default_scopes: &["openid", "profile", "email"],
};

/// Okta. The issuer is the tenant's Okta domain.
pub static OKTA: Provider = Provider {
    slug: "okta",
    label: "Okta",
    requires_source: true,
    issuer: None,
    default_scopes: &["openid", "profile", "email"],
};

/// Generic OpenID Connect against an explicit discovery URL.
pub static OPENID: Provider = Provider {
    slug: "openid_connect",
    label: "OpenID Connect",
    requires_source: true,
    issuer: None,
    default_scopes: &["openid", "profile", "email"],
};

/// PayPal.
pub static PAYPAL: Provider = Provider {
    slug: "paypal",
    label: "PayPal",
    requires_source: false,
    issuer: Some("https://www.paypal.com"),
    default_scopes: &["openid", "profile", "email"],
};

/// Salesforce.
pub static SALESFORCE: Provider = Provider {
    slug: "salesforce",
    label: "Salesforce",
    requires_source: false,
    issuer: Some("https://login.salesforce.com"),
    default_scopes: &["openid", "profile", "email"],
};

/// Slack.
pub static SLACK: Provider = Provider {
    slug: "slack",
    label: "Slack",
    requires_source: false,
    issuer: Some("https://slack.com"),
    default_scopes: &["openid", "profile", "email"],
};

/// Twitch.
pub static TWITCH: Provider = Provider {
    slug: "twitch",
    label: "Twitch",
    requires_source: false,
    issuer: Some("https://id.twitch.tv/oauth2"),
    default_scopes: &["openid", "user:read:email"],
};

/// Yahoo.
pub static YAHOO: Provider = Provider {
    slug: "yahoo",
    label: "Yahoo",
    requires_source: false,
    issuer: Some("https://api.login.yahoo.com"),
    default_scopes: &["openid", "profile", "email"],
};

/// Zoom.
pub static ZOOM: Provider = Provider {
    slug: "zoom",
    label: "Zoom",
    requires_source: false,
    issuer: Some("https://zoom.us"),
    default_scopes: &["openid", "read:user"],
};

// Kept sorted by slug; `catalog()` relies on this ordering.
static CATALOG: &[&Provider] = &[
    &APPLE,
    &FAUX,
    &GITLAB,
    &GOOGLE,
    &LINE,
    &LINKEDIN,
    &MICROSOFT,
    &NEXTCLOUD,
    &OKTA,
    &OPENID,
    &PAYPAL,
    &SALESFORCE,
    &SLACK,
    &TWITCH,
    &YAHOO,
    &ZOOM,
];

impl Provider {
    /// Returns the URL-path-safe slug.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        self.slug
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Returns true if activation requires a discovery/source URL.
    #[must_use]
    pub fn requires_source(&self) -> bool {
        self.requires_source
    }

    /// Returns the well-known OIDC issuer, if the provider publishes one.
    #[must_use]
    pub fn issuer(&self) -> Option<&'static str> {
        self.issuer
    }

    /// Returns the provider's default scope set.
    #[must_use]
    pub fn default_scopes(&self) -> &'static [&'static str] {
        self.default_scopes
    }

    /// Looks up a catalog entry by slug.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<&'static Provider> {
        CATALOG.iter().find(|p| p.slug == slug).copied()
    }

    /// Returns the full catalog, sorted by slug.
    #[must_use]
    pub fn catalog() -> &'static [&'static Provider] {
        CATALOG
    }

    /// Returns true iff the provider is a catalog member.
    #[must_use]
    pub fn validate(provider: &Provider) -> bool {
        CATALOG.iter().any(|p| *p == provider)
    }

    /// Merges the default scopes with caller-supplied extras.
    ///
    /// The result is the case-normalized union, de-duplicated and sorted.
    #[must_use]
    pub fn merge_scopes(&self, extra: &[String]) -> Vec<String> {
        let mut set: BTreeSet<String> = self
            .default_scopes
            .iter()
            .map(|s| s.to_lowercase())
            .collect();
        set.extend(extra.iter().map(|s| s.to_lowercase()));
        set.into_iter().collect()
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug)
    }
}
