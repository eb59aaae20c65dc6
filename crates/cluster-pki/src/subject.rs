//! Desired certificate identity.

use std::collections::BTreeSet;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Desired identity of a node certificate.
///
/// Built fresh on every reconcile and never persisted; it is only observed
/// indirectly through the SANs of the issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    common_name: String,
    organization: Option<String>,
    dns_names: BTreeSet<String>,
    ip_addresses: BTreeSet<IpAddr>,
}

impl Subject {
    /// Creates a subject builder for the given common name.
    #[must_use]
    pub fn builder(common_name: impl Into<String>) -> SubjectBuilder {
        SubjectBuilder {
            common_name: common_name.into(),
            organization: None,
            dns_names: BTreeSet::new(),
            ip_addresses: BTreeSet::new(),
        }
    }

    /// Returns the common name.
    #[must_use]
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    /// Returns the organization name, if set.
    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    /// Returns the DNS names.
    #[must_use]
    pub const fn dns_names(&self) -> &BTreeSet<String> {
        &self.dns_names
    }

    /// Returns the IP addresses.
    #[must_use]
    pub const fn ip_addresses(&self) -> &BTreeSet<IpAddr> {
        &self.ip_addresses
    }

    /// Returns DNS names and IP addresses combined, as strings.
    #[must_use]
    pub fn subject_alt_names(&self) -> BTreeSet<String> {
        self.dns_names
            .iter()
            .cloned()
            .chain(self.ip_addresses.iter().map(IpAddr::to_string))
            .collect()
    }
}

/// Builder for [`Subject`].
#[derive(Debug, Clone)]
pub struct SubjectBuilder {
    common_name: String,
    organization: Option<String>,
    dns_names: BTreeSet<String>,
    ip_addresses: BTreeSet<IpAddr>,
}

impl SubjectBuilder {
    /// Sets the organization name.
    #[must_use]
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Adds a DNS name.
    #[must_use]
    pub fn dns(mut self, name: impl Into<String>) -> Self {
        self.dns_names.insert(name.into());
        self
    }

    /// Adds several DNS names.
    #[must_use]
    pub fn dns_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dns_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds an IP address.
    #[must_use]
    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip_addresses.insert(ip);
        self
    }

    /// Adds an address, classifying it by syntax: IP literals become IP
    /// SANs, anything else becomes a DNS SAN.
    #[must_use]
    pub fn address(self, address: &str) -> Self {
        match parse_ip_literal(address) {
            Some(ip) => self.ip(ip),
            None => self.dns(address),
        }
    }

    /// Adds several addresses, see [`SubjectBuilder::address`].
    #[must_use]
    pub fn addresses<'a, I>(self, addresses: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        addresses
            .into_iter()
            .fold(self, |builder, address| builder.address(address))
    }

    /// Builds the subject.
    #[must_use]
    pub fn build(self) -> Subject {
        Subject {
            common_name: self.common_name,
            organization: self.organization,
            dns_names: self.dns_names,
            ip_addresses: self.ip_addresses,
        }
    }
}

/// Parses an IPv4 or IPv6 literal. IPv6 literals may be wrapped in brackets.
#[must_use]
pub fn parse_ip_literal(address: &str) -> Option<IpAddr> {
    let trimmed = address
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(address);
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use test_case::test_case;

    #[test_case("10.0.0.5", true ; "ipv4")]
    #[test_case("::1", true ; "ipv6 loopback")]
    #[test_case("[fd00::1]", true ; "bracketed ipv6")]
    #[test_case("2001:db8::8a2e:370:7334", true ; "ipv6")]
    #[test_case("kafka.example.com", false ; "dns name")]
    #[test_case("10.0.0", false ; "short ipv4")]
    #[test_case("256.1.1.1", false ; "out of range octet")]
    #[test_case("localhost", false ; "localhost")]
    fn classifies_addresses(address: &str, is_ip: bool) {
        assert_eq!(parse_ip_literal(address).is_some(), is_ip);
    }

    #[test]
    fn addresses_are_split_by_kind() {
        let subject = Subject::builder("cn")
            .address("10.0.0.5")
            .address("kafka.example.com")
            .address("fd00::1")
            .build();

        assert!(subject.ip_addresses().contains(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))));
        assert!(subject
            .ip_addresses()
            .contains(&IpAddr::V6(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 1))));
        assert_eq!(subject.dns_names().len(), 1);
        assert!(subject.dns_names().contains("kafka.example.com"));
    }

    #[test]
    fn subject_alt_names_combine_both_kinds() {
        let subject = Subject::builder("cn")
            .dns("a.example.com")
            .ip(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .build();

        let sans = subject.subject_alt_names();
        assert_eq!(sans.len(), 2);
        assert!(sans.contains("a.example.com"));
        assert!(sans.contains("127.0.0.1"));
    }

    #[test]
    fn duplicates_collapse() {
        let subject = Subject::builder("cn").dns("a").dns("a").address("1.1.1.1").address("1.1.1.1").build();
        assert_eq!(subject.subject_alt_names().len(), 2);
    }

    #[test]
    fn ipv6_sans_use_canonical_form() {
        let subject = Subject::builder("cn").address("fd00:0:0:0:0:0:0:1").build();
        assert!(subject.subject_alt_names().contains("fd00::1"));
    }

    #[test]
    fn organization_is_optional() {
        let plain = Subject::builder("cn").build();
        assert_eq!(plain.organization(), None);

        let with_org = Subject::builder("cn").organization("acme").build();
        assert_eq!(with_org.organization(), Some("acme"));
        assert_eq!(with_org.common_name(), "cn");
    }
}
