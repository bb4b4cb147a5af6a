//! Partial views of the JSON records returned by the VDC API.
//!
//! Every field the EC2 responses read is optional; anything missing, null or
//! of an unexpected shape is absent rather than an error.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct InstanceRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub image_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub ssh_key_pair: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub instance_spec_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub host_node: Option<String>,
    #[serde(deserialize_with = "lenient_strings")]
    pub netfilter_group: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_records")]
    pub vif: Option<Vec<Vif>>,
}

impl InstanceRecord {
    pub fn groups(&self) -> &[String] {
        self.netfilter_group.as_deref().unwrap_or_default()
    }

    /// IPv4 settings of the first network interface, if any.
    pub fn primary_ipv4(&self) -> Option<&Ipv4> {
        self.vif.as_ref()?.first()?.ipv4.as_ref()
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Vif {
    #[serde(deserialize_with = "lenient_record")]
    pub ipv4: Option<Ipv4>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Ipv4 {
    #[serde(deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub nat_address: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ImageRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "image_location")]
    pub source: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub account_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub is_public: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub arch: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

/// One page of a VDC listing: `[{"results": [...], ...}]`.
#[derive(Deserialize, Debug)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(de)?))
}

fn lenient_strings<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => Some(items.into_iter().filter_map(scalar_text).collect()),
        Value::Null => None,
        other => scalar_text(other).map(|s| vec![s]),
    })
}

fn lenient_record<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(de)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

fn lenient_records<'de, D, T>(de: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

fn image_location<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::Object(mut source) => source.remove("uri").and_then(scalar_text),
        other => scalar_text(other),
    })
}
