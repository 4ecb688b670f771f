//! Sub-site registry.
//!
//! Every site this tool publishes lives under the same account on the web
//! host, one directory per domain inside `public_html`.

use crate::remote::RemotePath;

/// A site selectable with `--subdomain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubSite {
    /// Identifier passed on the command line
    pub id: &'static str,
    /// Domain name, also the directory name on the web host
    pub domain: &'static str,
    /// Whether the SSL certificate for this domain is managed here
    pub cert_eligible: bool,
}

const REGISTRY: &[SubSite] = &[
    SubSite {
        id: "simon",
        domain: "simon.duchastel.com",
        cert_eligible: true,
    },
    SubSite {
        id: "mr",
        domain: "mr.duchastel.com",
        cert_eligible: true,
    },
    SubSite {
        id: "nicolas",
        domain: "nicolas.duchastel.com",
        cert_eligible: true,
    },
    SubSite {
        id: "pointbolin",
        domain: "pointbolin.com",
        cert_eligible: true,
    },
    SubSite {
        id: "com",
        domain: "duchastel.com",
        cert_eligible: true,
    },
    SubSite {
        id: "org",
        domain: "duchastel.org",
        cert_eligible: true,
    },
    SubSite {
        id: "rentals",
        domain: "rentals.duchastel.com",
        cert_eligible: true,
    },
];

/// All known sub-sites, in registry order.
pub fn all() -> &'static [SubSite] {
    REGISTRY
}

/// Look up a sub-site by its command-line identifier.
pub fn lookup(id: &str) -> Option<&'static SubSite> {
    REGISTRY.iter().find(|site| site.id == id)
}

/// Sub-sites whose certificate can be rotated.
pub fn cert_eligible() -> impl Iterator<Item = &'static SubSite> {
    REGISTRY.iter().filter(|site| site.cert_eligible)
}

impl SubSite {
    /// Publish target on the web host: `/home/<user>/public_html/<domain>`.
    pub fn site_root(&self, username: &str) -> RemotePath {
        RemotePath::new(format!("/home/{}/public_html/{}", username, self.domain))
    }
}
