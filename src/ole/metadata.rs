use super::error::{OleError, Result};
use super::property::{PropertyId, PropertyValue};
use super::time::{EPOCH_DIFFERENCE_SECS, unix_time_to_datetime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Typed view over the SummaryInformation property set.
///
/// Only the first occurrence of each property is used. String properties
/// that decode to an empty string are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codepage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Last person to save the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Application that created the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_printed: Option<DateTime<Utc>>,
    /// Total editing time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<u32>,
}

impl SummaryInfo {
    pub fn from_properties(properties: &[(PropertyId, PropertyValue)]) -> Self {
        let mut info = SummaryInfo::default();
        for (id, value) in properties {
            match id {
                PropertyId::CodePage => fill(&mut info.codepage, codepage(value)),
                PropertyId::Title => fill(&mut info.title, text(value)),
                PropertyId::Subject => fill(&mut info.subject, text(value)),
                PropertyId::Author => fill(&mut info.author, text(value)),
                PropertyId::Keywords => fill(&mut info.keywords, text(value)),
                PropertyId::Comments => fill(&mut info.comments, text(value)),
                PropertyId::Template => fill(&mut info.template, text(value)),
                PropertyId::LastAuthor => fill(&mut info.last_author, text(value)),
                PropertyId::RevisionNumber => fill(&mut info.revision, text(value)),
                PropertyId::AppName => fill(&mut info.application, text(value)),
                PropertyId::CreateTime => fill(&mut info.created, timestamp(value)),
                PropertyId::LastSaveTime => fill(&mut info.last_saved, timestamp(value)),
                PropertyId::LastPrinted => fill(&mut info.last_printed, timestamp(value)),
                PropertyId::EditTime => fill(&mut info.edit_time, duration(value)),
                PropertyId::PageCount => fill(&mut info.page_count, count(value)),
                PropertyId::WordCount => fill(&mut info.word_count, count(value)),
                PropertyId::CharCount => fill(&mut info.char_count, count(value)),
                PropertyId::Security => fill(&mut info.security, count(value)),
                _ => {},
            }
        }
        info
    }

    /// Check if the summary contains any actual data.
    pub fn has_data(&self) -> bool {
        *self != SummaryInfo::default()
    }

    /// Render as a YAML document. Absent fields are omitted.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).map_err(|e| {
            OleError::Serialization(format!("Failed to serialize summary to YAML: {}", e))
        })
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn text(value: &PropertyValue) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn codepage(value: &PropertyValue) -> Option<u32> {
    value.as_i64().map(|cp| u32::from(cp as u16))
}

fn count(value: &PropertyValue) -> Option<u32> {
    value.as_i64().and_then(|v| u32::try_from(v).ok())
}

fn duration(value: &PropertyValue) -> Option<u64> {
    match *value {
        PropertyValue::Duration(secs) => Some(secs),
        _ => None,
    }
}

/// Timestamps equal to the FILETIME epoch are unset.
fn timestamp(value: &PropertyValue) -> Option<DateTime<Utc>> {
    match *value {
        PropertyValue::Filetime(secs) if secs != -EPOCH_DIFFERENCE_SECS => unix_time_to_datetime(secs),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lpstr(s: &str) -> PropertyValue {
        PropertyValue::Lpstr(s.to_string())
    }

    #[test]
    fn test_from_properties() {
        let props = vec![
            (PropertyId::CodePage, PropertyValue::I2(1252)),
            (PropertyId::Title, lpstr("Quarterly report")),
            (PropertyId::Author, PropertyValue::Lpwstr("Kim".to_string())),
            (PropertyId::PageCount, PropertyValue::I4(12)),
            (PropertyId::CreateTime, PropertyValue::Filetime(1_000_000_000)),
            (PropertyId::Security, PropertyValue::I4(0)),
            (PropertyId::EditTime, PropertyValue::Duration(2520)),
        ];
        let info = SummaryInfo::from_properties(&props);
        assert_eq!(info.codepage, Some(1252));
        assert_eq!(info.title.as_deref(), Some("Quarterly report"));
        assert_eq!(info.author.as_deref(), Some("Kim"));
        assert_eq!(info.page_count, Some(12));
        assert_eq!(info.security, Some(0));
        assert_eq!(info.edit_time, Some(2520));
        assert_eq!(
            info.created.map(|dt| dt.to_rfc3339()).as_deref(),
            Some("2001-09-09T01:46:40+00:00")
        );
        assert!(info.has_data());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let props = vec![
            (PropertyId::Title, lpstr("First")),
            (PropertyId::Title, lpstr("Second")),
        ];
        let info = SummaryInfo::from_properties(&props);
        assert_eq!(info.title.as_deref(), Some("First"));
    }

    #[test]
    fn test_empty_and_mistyped_values_are_absent() {
        let props = vec![
            (PropertyId::Title, lpstr("")),
            (PropertyId::Subject, PropertyValue::I4(3)),
            (PropertyId::WordCount, PropertyValue::I4(-1)),
            (PropertyId::LastSaveTime, PropertyValue::Filetime(-EPOCH_DIFFERENCE_SECS)),
            (PropertyId::Thumbnail, PropertyValue::Blob(vec![1])),
            (PropertyId::Unknown(99), lpstr("ignored")),
        ];
        let info = SummaryInfo::from_properties(&props);
        assert_eq!(info, SummaryInfo::default());
        assert!(!info.has_data());
    }

    #[test]
    fn test_utf8_codepage_from_negative_i2() {
        let props = vec![(PropertyId::CodePage, PropertyValue::I2(65001u16 as i16))];
        assert_eq!(SummaryInfo::from_properties(&props).codepage, Some(65001));
    }

    #[test]
    fn test_to_yaml_omits_absent_fields() {
        let info = SummaryInfo {
            title: Some("Report".to_string()),
            page_count: Some(3),
            ..Default::default()
        };
        let yaml = info.to_yaml().unwrap();
        assert!(yaml.contains("title: Report"));
        assert!(yaml.contains("page_count: 3"));
        assert!(!yaml.contains("subject"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let info = SummaryInfo::from_properties(&[
            (PropertyId::CodePage, PropertyValue::I2(1252)),
            (PropertyId::Title, lpstr("Quarterly report")),
            (PropertyId::LastAuthor, lpstr("Sam")),
            (PropertyId::CreateTime, PropertyValue::Filetime(1_000_000_000)),
            (PropertyId::EditTime, PropertyValue::Duration(2520)),
            (PropertyId::WordCount, PropertyValue::I4(480)),
        ]);
        let yaml = info.to_yaml().unwrap();
        let parsed: SummaryInfo = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(parsed, info);
    }
}
