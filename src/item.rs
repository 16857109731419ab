// item.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// A todo entry as the client holds it. `date` is always normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
    pub is_done: bool,
}

pub const SAMPLE_TITLE: &str = "Sample Item";
pub const SAMPLE_DESCRIPTION: &str = "This is a sample TODO item";

/// User input for an item that does not exist yet. Only `Draft::new` builds one,
/// so a draft in hand has already passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    title: String,
    description: String,
    date: DateTime<Utc>,
}

impl Draft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        date: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let description = description.into();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let date = date.ok_or(ValidationError::MissingDate)?;
        Ok(Self {
            title,
            description,
            date,
        })
    }

    /// The placeholder item the "generate" action creates.
    pub fn sample(date: DateTime<Utc>) -> Self {
        Self {
            title: SAMPLE_TITLE.to_string(),
            description: SAMPLE_DESCRIPTION.to_string(),
            date,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

/// A due date as it arrives at the boundary, before normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawDate {
    Absent,
    Typed(DateTime<Utc>),
    Text(String),
}

impl RawDate {
    /// Only JSON strings carry a date; `null`, numbers and objects do not.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => RawDate::Text(s.clone()),
            _ => RawDate::Absent,
        }
    }
}

impl From<Option<DateTime<Utc>>> for RawDate {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map(RawDate::Typed).unwrap_or(RawDate::Absent)
    }
}

pub fn normalize_date(raw: RawDate) -> Option<DateTime<Utc>> {
    match raw {
        RawDate::Absent => None,
        RawDate::Typed(d) => Some(d),
        RawDate::Text(s) => parse_date_str(&s),
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Offset-less timestamps are taken as UTC
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// ISO-8601 with millisecond precision and a `Z` suffix, the form the backend stores.
pub fn format_iso(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Item as it travels over the wire. Every field but `id` is lenient on the way in.
#[derive(Debug, Deserialize)]
pub(crate) struct WireItem {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default, rename = "isDone")]
    pub is_done: Option<bool>,
}

impl From<WireItem> for Item {
    fn from(w: WireItem) -> Self {
        Item {
            id: w.id,
            title: w.title.unwrap_or_default(),
            description: w.description.unwrap_or_default(),
            date: normalize_date(RawDate::from_json(w.date.as_ref())),
            is_done: w.is_done.unwrap_or(false),
        }
    }
}

/// Outbound body for PUT. `date` is left out entirely when absent.
#[derive(Debug, Serialize)]
pub(crate) struct ItemBody<'a> {
    pub id: i64,
    pub title: &'a str,
    pub description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "isDone")]
    pub is_done: bool,
}

impl<'a> From<&'a Item> for ItemBody<'a> {
    fn from(item: &'a Item) -> Self {
        ItemBody {
            id: item.id,
            title: &item.title,
            description: &item.description,
            date: item.date.map(format_iso),
            is_done: item.is_done,
        }
    }
}

/// Outbound body for POST. New items always start open.
#[derive(Debug, Serialize)]
pub(crate) struct DraftBody<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub date: String,
    #[serde(rename = "isDone")]
    pub is_done: bool,
}

impl<'a> From<&'a Draft> for DraftBody<'a> {
    fn from(draft: &'a Draft) -> Self {
        DraftBody {
            title: &draft.title,
            description: &draft.description,
            date: format_iso(draft.date),
            is_done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }

    #[test]
    fn absent_and_blank_strings_normalize_to_none() {
        assert_eq!(normalize_date(RawDate::Absent), None);
        assert_eq!(normalize_date(RawDate::Text(String::new())), None);
        assert_eq!(normalize_date(RawDate::Text("   \t".into())), None);
    }

    #[test]
    fn typed_dates_pass_through() {
        let d = utc(2030, 6, 1, 8, 30);
        assert_eq!(normalize_date(RawDate::Typed(d)), Some(d));
    }

    #[test]
    fn accepts_iso_and_plain_dates() {
        assert_eq!(
            normalize_date(RawDate::Text("2030-06-01T08:30:00.000Z".into())),
            Some(utc(2030, 6, 1, 8, 30))
        );
        assert_eq!(
            normalize_date(RawDate::Text("2030-06-01T10:30:00+02:00".into())),
            Some(utc(2030, 6, 1, 8, 30))
        );
        assert_eq!(
            normalize_date(RawDate::Text("2030-06-01".into())),
            Some(utc(2030, 6, 1, 0, 0))
        );
        assert_eq!(
            normalize_date(RawDate::Text("2030-06-01 08:30".into())),
            Some(utc(2030, 6, 1, 8, 30))
        );
    }

    #[test]
    fn unparsable_strings_normalize_to_none() {
        for s in ["tomorrow", "2025-11-31T23:59:59.999Z", "2030-13-01", "31/12/2030", "null"] {
            assert_eq!(normalize_date(RawDate::Text(s.into())), None, "{s}");
        }
    }

    #[test]
    fn normalizing_twice_is_the_same_as_once() {
        for raw in ["2030-06-01T08:30:00.123Z", "2030-06-01", "garbage", ""] {
            let once = normalize_date(RawDate::Text(raw.into()));
            let twice = normalize_date(RawDate::from(once));
            assert_eq!(once, twice, "{raw}");
            let via_text = normalize_date(once.map(format_iso).map(RawDate::Text).unwrap_or(RawDate::Absent));
            assert_eq!(once, via_text, "{raw}");
        }
    }

    #[test]
    fn non_string_json_dates_are_absent() {
        assert_eq!(RawDate::from_json(Some(&Value::Null)), RawDate::Absent);
        assert_eq!(RawDate::from_json(Some(&serde_json::json!(12345))), RawDate::Absent);
        assert_eq!(RawDate::from_json(None), RawDate::Absent);
    }

    #[test]
    fn wire_item_fills_defaults() {
        let w: WireItem = serde_json::from_str(r#"{"id": 7, "date": "not a date"}"#).unwrap();
        let item = Item::from(w);
        assert_eq!(item.id, 7);
        assert_eq!(item.title, "");
        assert_eq!(item.description, "");
        assert_eq!(item.date, None);
        assert!(!item.is_done);
    }

    #[test]
    fn item_body_omits_absent_date() {
        let item = Item {
            id: 3,
            title: "A".into(),
            description: "b".into(),
            date: None,
            is_done: true,
        };
        let v = serde_json::to_value(ItemBody::from(&item)).unwrap();
        assert!(v.get("date").is_none());
        assert_eq!(v["isDone"], Value::Bool(true));
    }

    #[test]
    fn draft_body_formats_date_and_starts_open() {
        let draft = Draft::new("Buy milk", "2%", Some(utc(2030, 6, 1, 0, 0))).unwrap();
        let v = serde_json::to_value(DraftBody::from(&draft)).unwrap();
        assert_eq!(v["date"], "2030-06-01T00:00:00.000Z");
        assert_eq!(v["isDone"], Value::Bool(false));
    }

    #[test]
    fn draft_requires_all_fields() {
        let d = Some(utc(2030, 6, 1, 0, 0));
        assert_eq!(Draft::new("", "x", d), Err(ValidationError::EmptyTitle));
        assert_eq!(Draft::new("x", "  ", d), Err(ValidationError::EmptyDescription));
        assert_eq!(Draft::new("x", "y", None), Err(ValidationError::MissingDate));
    }
}
