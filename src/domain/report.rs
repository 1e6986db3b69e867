use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// The part of a Lighthouse JSON report the assertion evaluator reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LighthouseReport {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub audits: BTreeMap<String, Audit>,
}

impl LighthouseReport {
    pub fn audit(&self, name: &str) -> Option<&Audit> {
        self.audits.get(name)
    }
}

/// Single audit entry. A missing or `null` score marks an informative or
/// not-applicable audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Audit {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(
        default,
        rename = "displayValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_value: Option<String>,
}

impl Audit {
    pub fn scored(score: f64) -> Self {
        Self {
            score: Some(score),
            display_value: None,
        }
    }

    pub fn with_display_value(mut self, display_value: impl Into<String>) -> Self {
        self.display_value = Some(display_value.into());
        self
    }

    /// Display value when present and not blank.
    pub fn friendly_display_value(&self) -> Option<&str> {
        self.display_value
            .as_deref()
            .filter(|value| !value.is_empty())
    }
}

/// Descriptor written next to the HTML report so the pipeline tab can label it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub tab_name: String,
    pub report_file_name: String,
    pub meta_file_name: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Audit>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Audit>>::deserialize(deserializer)?.unwrap_or_default())
}
