//! ChangeResourceRecordSets request body
//!
//! The body is written by hand: one fixed element tree, no attributes other
//! than the namespace, no XML declaration.

use std::borrow::Cow;
use who_core::traits::RecordType;

/// Route53 API namespace
pub const XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

/// Fully-qualify a domain name by appending the root dot when absent
pub fn fqdn(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{}.", domain)
    }
}

/// A single-record UPSERT change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Fully-qualified record name
    pub name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    /// Record value (the address text)
    pub value: String,
}

impl ChangeBatch {
    /// UPSERT `domain` to `value`, choosing the record type from the value text
    pub fn upsert(domain: &str, value: &str, ttl: u32) -> Self {
        Self {
            name: fqdn(domain),
            record_type: RecordType::for_address(value),
            ttl,
            value: value.to_string(),
        }
    }

    /// Serialize to the request XML
    pub fn to_xml(&self) -> String {
        format!(
            "<ChangeResourceRecordSetsRequest xmlns=\"{xmlns}\">\
             <ChangeBatch><Changes><Change>\
             <Action>UPSERT</Action>\
             <ResourceRecordSet>\
             <Name>{name}</Name>\
             <Type>{record_type}</Type>\
             <TTL>{ttl}</TTL>\
             <ResourceRecords><ResourceRecord><Value>{value}</Value></ResourceRecord></ResourceRecords>\
             </ResourceRecordSet>\
             </Change></Changes></ChangeBatch>\
             </ChangeResourceRecordSetsRequest>",
            xmlns = XMLNS,
            name = escape(&self.name),
            record_type = self.record_type.as_str(),
            ttl = self.ttl,
            value = escape(&self.value),
        )
    }
}

/// Escape XML text content
fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
