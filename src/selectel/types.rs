use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dns::finder::Page;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,   // uuid
    pub name: String, // "example.com."
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RRSet {
    pub id: String,
    pub name: String, // "_acme-challenge.example.com."
    #[serde(rename = "type")]
    pub rtype: RecordType,
    pub ttl: u32,
    #[serde(default)]
    pub records: Vec<RecordItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordItem {
    pub content: String, // TXT content is stored quoted: "\"value\""
    #[serde(default)]
    pub disabled: bool,
}

impl RecordItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            disabled: false,
        }
    }
}

/// Body for `POST /zones/{zone_id}/rrset`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RRSetCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: RecordType,
    pub ttl: u32,
    pub records: Vec<RecordItem>,
}

/// Body for `PATCH /zones/{zone_id}/rrset/{rrset_id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RRSetUpdate {
    pub ttl: u32,
    pub records: Vec<RecordItem>,
}

/// Listing envelope returned by every collection endpoint.
#[derive(Debug, Deserialize)]
pub struct List<T> {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub next_offset: usize,
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
}

impl<T> From<List<T>> for Page<T> {
    fn from(list: List<T>) -> Self {
        Page {
            items: list.result,
            next_offset: list.next_offset,
            count: list.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    Txt,
    Cname,
    Mx,
    Ns,
    Srv,
    Caa,
    Soa,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Txt => "TXT",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Srv => "SRV",
            RecordType::Caa => "CAA",
            RecordType::Soa => "SOA",
            RecordType::Other(s) => s,
        }
    }
}

impl From<String> for RecordType {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "TXT" => RecordType::Txt,
            "CNAME" => RecordType::Cname,
            "MX" => RecordType::Mx,
            "NS" => RecordType::Ns,
            "SRV" => RecordType::Srv,
            "CAA" => RecordType::Caa,
            "SOA" => RecordType::Soa,
            _ => RecordType::Other(s),
        }
    }
}

impl From<RecordType> for String {
    fn from(t: RecordType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_envelope_decodes() {
        let raw = r#"{
            "count": 2,
            "next_offset": 0,
            "result": [
                {"id": "z1", "name": "example.com."},
                {"id": "z2", "name": "a.example.com.", "disabled": true}
            ]
        }"#;
        let list: List<Zone> = serde_json::from_str(raw).unwrap();
        let page: Page<Zone> = list.into();
        assert_eq!(page.count, 2);
        assert_eq!(page.next_offset, 0);
        assert_eq!(page.items[1].name, "a.example.com.");
        assert!(page.items[1].disabled);
    }

    #[test]
    fn record_type_keeps_unknown_values() {
        let t: RecordType = serde_json::from_str("\"txt\"").unwrap();
        assert_eq!(t, RecordType::Txt);
        let t: RecordType = serde_json::from_str("\"ALIAS\"").unwrap();
        assert_eq!(t, RecordType::Other("ALIAS".into()));
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"ALIAS\"");
    }

    #[test]
    fn rrset_create_serializes_type_field() {
        let body = RRSetCreate {
            name: "_acme-challenge.example.com.".into(),
            rtype: RecordType::Txt,
            ttl: 60,
            records: vec![RecordItem::new("\"v\"")],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "TXT");
        assert_eq!(json["records"][0]["content"], "\"v\"");
        assert_eq!(json["records"][0]["disabled"], false);
    }
}
