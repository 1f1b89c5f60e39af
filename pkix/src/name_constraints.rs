//! Name constraints (RFC 5280 §4.2.1.10).
//!
//! DNS, email, IP, URI and directoryName subtrees are enforced. A constraint
//! in any other name form fails closed: the certificates it applies to are
//! rejected.

use std::net::IpAddr;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, NameConstraints as X509NameConstraints};
use x509_parser::x509::{AttributeTypeAndValue, X509Name};

use trustval_types::{GeneralSubtree, NameConstraints};

type Rdns = Vec<Vec<(String, String)>>;

/// One name a certificate asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Name {
    Dns(String),
    Email(String),
    Ip(Vec<u8>),
    Uri { host: String, uri: String },
    Directory { rdns: Rdns, display: String },
}

impl Name {
    fn display(&self) -> String {
        match self {
            Self::Dns(n) | Self::Email(n) => n.clone(),
            Self::Ip(ip) => format_ip(ip),
            Self::Uri { uri, .. } => uri.clone(),
            Self::Directory { display, .. } => display.clone(),
        }
    }
}

/// The names a certificate asserts: its subject DN, subject emails and
/// subject alternative names.
#[derive(Debug, Default)]
pub(crate) struct CertNames(Vec<Name>);

impl CertNames {
    pub(crate) fn of(cert: &X509Certificate<'_>) -> Self {
        let mut names = Vec::new();
        let subject = cert.subject();
        if subject.iter().next().is_some() {
            names.push(directory(subject));
        }
        for attr in subject.iter_email() {
            if let Ok(e) = attr.as_str() {
                names.push(Name::Email(e.to_ascii_lowercase()));
            }
        }
        if let Ok(Some(san)) = cert.subject_alternative_name() {
            for gn in &san.value.general_names {
                match gn {
                    GeneralName::DNSName(n) => names.push(Name::Dns(n.to_ascii_lowercase())),
                    GeneralName::RFC822Name(e) => names.push(Name::Email(e.to_ascii_lowercase())),
                    GeneralName::IPAddress(b) => names.push(Name::Ip(b.to_vec())),
                    GeneralName::URI(u) => names.push(Name::Uri {
                        host: uri_host(u),
                        uri: u.to_string(),
                    }),
                    GeneralName::DirectoryName(dn) => names.push(directory(dn)),
                    _ => {}
                }
            }
        }
        Self(names)
    }
}

fn directory(dn: &X509Name<'_>) -> Name {
    Name::Directory {
        rdns: rdns(dn),
        display: dn.to_string(),
    }
}

fn rdns(dn: &X509Name<'_>) -> Rdns {
    dn.iter()
        .map(|rdn| {
            let mut set: Vec<(String, String)> = rdn
                .iter()
                .map(|atv| (atv.attr_type().to_id_string(), attribute_value(atv)))
                .collect();
            set.sort();
            set
        })
        .collect()
}

fn attribute_value(atv: &AttributeTypeAndValue<'_>) -> String {
    match atv.as_str() {
        Ok(s) => s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase(),
        Err(_) => atv.attr_value().data.iter().map(|b| format!("{b:02x}")).collect(),
    }
}

/// Convert a parsed extension into the owned form carried by anchors.
pub fn from_extension(nc: &X509NameConstraints<'_>) -> NameConstraints {
    let convert = |subtrees: &Option<Vec<x509_parser::extensions::GeneralSubtree<'_>>>| {
        subtrees
            .iter()
            .flatten()
            .map(|s| match &s.base {
                GeneralName::DNSName(c) => GeneralSubtree::Dns(c.to_ascii_lowercase()),
                GeneralName::RFC822Name(c) => GeneralSubtree::Email(c.to_ascii_lowercase()),
                GeneralName::IPAddress(b) => GeneralSubtree::IpAddress(b.to_vec()),
                GeneralName::URI(c) => GeneralSubtree::Uri(c.to_ascii_lowercase()),
                GeneralName::DirectoryName(dn) => GeneralSubtree::DirectoryName(rdns(dn)),
                GeneralName::OtherName(..) => GeneralSubtree::Unsupported("otherName".into()),
                GeneralName::X400Address(..) => GeneralSubtree::Unsupported("x400Address".into()),
                GeneralName::EDIPartyName(..) => {
                    GeneralSubtree::Unsupported("ediPartyName".into())
                }
                GeneralName::RegisteredID(..) => {
                    GeneralSubtree::Unsupported("registeredID".into())
                }
                #[allow(unreachable_patterns)]
                _ => GeneralSubtree::Unsupported("unknown".into()),
            })
            .collect::<Vec<_>>()
    };
    NameConstraints {
        permitted: convert(&nc.permitted_subtrees),
        excluded: convert(&nc.excluded_subtrees),
    }
}

/// Check `names` against `constraints`, returning the first offending name.
///
/// Permitted subtrees only restrict names of their own form.
pub(crate) fn check(constraints: &NameConstraints, names: &CertNames) -> Result<(), String> {
    let unsupported = constraints
        .permitted
        .iter()
        .chain(&constraints.excluded)
        .find_map(|s| match s {
            GeneralSubtree::Unsupported(form) => Some(form),
            _ => None,
        });
    if let Some(form) = unsupported {
        return Err(format!("unenforceable {form} name constraint"));
    }

    for subtree in &constraints.excluded {
        if let Some(name) = names.0.iter().find(|n| matches(subtree, n) == Some(true)) {
            return Err(name.display());
        }
    }

    for name in &names.0 {
        let verdicts: Vec<bool> = constraints
            .permitted
            .iter()
            .filter_map(|s| matches(s, name))
            .collect();
        if !verdicts.is_empty() && !verdicts.contains(&true) {
            return Err(name.display());
        }
    }
    Ok(())
}

/// Whether `name` lies in `subtree`, or `None` when they are different forms.
fn matches(subtree: &GeneralSubtree, name: &Name) -> Option<bool> {
    match (subtree, name) {
        (GeneralSubtree::Dns(c), Name::Dns(n)) => Some(dns_matches(n, c)),
        (GeneralSubtree::Email(c), Name::Email(e)) => Some(email_matches(e, c)),
        (GeneralSubtree::IpAddress(c), Name::Ip(ip)) => Some(ip_matches(ip, c)),
        (GeneralSubtree::Uri(c), Name::Uri { host, .. }) => Some(uri_matches(host, c)),
        (GeneralSubtree::DirectoryName(c), Name::Directory { rdns, .. }) => {
            Some(rdns.starts_with(c))
        }
        _ => None,
    }
}

/// `example.com` matches itself and subdomains; `.example.com` only subdomains.
fn dns_matches(name: &str, constraint: &str) -> bool {
    if constraint.is_empty() {
        return true;
    }
    if constraint.starts_with('.') {
        return name.ends_with(constraint);
    }
    name == constraint
        || (name.len() > constraint.len()
            && name.ends_with(constraint)
            && name.as_bytes().get(name.len() - constraint.len() - 1) == Some(&b'.'))
}

fn email_matches(email: &str, constraint: &str) -> bool {
    if constraint.is_empty() {
        return true;
    }
    if constraint.contains('@') {
        return email == constraint;
    }
    let Some((_, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if constraint.starts_with('.') {
        domain.ends_with(constraint)
    } else {
        domain == constraint
    }
}

fn ip_matches(ip: &[u8], constraint: &[u8]) -> bool {
    let len = ip.len();
    if (len != 4 && len != 16) || constraint.len() != len * 2 {
        return false;
    }
    let (addr, mask) = constraint.split_at(len);
    ip.iter()
        .zip(addr)
        .zip(mask)
        .all(|((i, a), m)| (i & m) == (a & m))
}

/// Host part of a URI, lower-cased; empty when the URI has no authority.
fn uri_host(uri: &str) -> String {
    let rest = uri.split_once("://").map_or("", |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = match host_port.strip_prefix('[') {
        Some(v6) => v6.split(']').next().unwrap_or(""),
        None => host_port.split(':').next().unwrap_or(""),
    };
    host.to_ascii_lowercase()
}

fn uri_matches(host: &str, constraint: &str) -> bool {
    if host.is_empty() {
        return false;
    }
    match constraint.strip_prefix('.') {
        Some(_) => host.ends_with(constraint),
        None => host == constraint,
    }
}

fn format_ip(ip: &[u8]) -> String {
    match ip.len() {
        4 => {
            let octets: [u8; 4] = [ip[0], ip[1], ip[2], ip[3]];
            IpAddr::from(octets).to_string()
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(ip);
            IpAddr::from(octets).to_string()
        }
        _ => format!("{ip:02x?}"),
    }
}
