//! Preset date ranges and their labels.
//!
//! Every range is a pure function of the supplied `now`; nothing here reads the
//! wall clock directly, see [`Clock`].

use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use strum::{EnumCount, EnumIter, EnumProperty, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

pub mod calendar_math;
mod clock;

pub use clock::{Clock, FixedClock, SystemClock};

use self::calendar_math::{
    at_end, at_start, end_of_day, first_of_month, first_of_year, last_of_month, months_back,
    start_of_day,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown preset range key '{0}'")]
    InvalidKey(String),
}

/// Named range presets. Declaration order is display order; the `label`
/// property is the only place display text is defined.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    EnumCount,
    EnumIter,
    EnumString,
    EnumProperty,
    IntoStaticStr,
)]
pub enum PresetKey {
    #[strum(props(label = "Today"))]
    Today,
    #[strum(props(label = "Yesterday"))]
    Yesterday,
    #[strum(props(label = "Last 7 Days"))]
    Last7Days,
    #[strum(props(label = "Last 28 Days"))]
    Last28Days,
    #[strum(props(label = "Last 30 Days"))]
    Last30Days,
    #[strum(props(label = "Last 90 Days"))]
    Last90Days,
    #[strum(props(label = "This Month"))]
    ThisMonth,
    #[strum(props(label = "Last Month"))]
    LastMonth,
    #[strum(props(label = "Last 12 Months"))]
    Last12Months,
    #[strum(props(label = "Last Calendar Year"))]
    LastCalendarYear,
    #[strum(props(label = "This Year (Jan - Today)"))]
    ThisYear,
    #[strum(props(label = "Custom"))]
    Custom,
}

impl PresetKey {
    pub const DEFAULT: PresetKey = PresetKey::Last28Days;

    /// Every key in display order.
    pub const ALL: [PresetKey; PresetKey::COUNT] = [
        PresetKey::Today,
        PresetKey::Yesterday,
        PresetKey::Last7Days,
        PresetKey::Last28Days,
        PresetKey::Last30Days,
        PresetKey::Last90Days,
        PresetKey::ThisMonth,
        PresetKey::LastMonth,
        PresetKey::Last12Months,
        PresetKey::LastCalendarYear,
        PresetKey::ThisYear,
        PresetKey::Custom,
    ];

    /// Programmatic name, as accepted by [`resolve_key_or_default`].
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        self.get_str("label").unwrap_or_else(|| self.as_str())
    }

    pub fn is_custom(self) -> bool {
        matches!(self, PresetKey::Custom)
    }

    pub fn from_index(index: usize) -> Option<PresetKey> {
        PresetKey::ALL.get(index).copied()
    }

    pub fn index_of(key: PresetKey) -> Option<usize> {
        PresetKey::ALL.iter().position(|candidate| *candidate == key)
    }
}

impl Default for PresetKey {
    fn default() -> Self {
        PresetKey::DEFAULT
    }
}

impl std::fmt::Display for PresetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive start/end pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateSpan {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl DateSpan {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self { start, end }
    }

    pub fn start_day(&self) -> Date {
        self.start.date()
    }

    pub fn end_day(&self) -> Date {
        self.end.date()
    }

    pub fn label(&self) -> String {
        format_range_label(self.start, self.end)
    }
}

/// Every preset evaluated against `now`, in declaration order.
pub fn compute_ranges(now: OffsetDateTime) -> IndexMap<PresetKey, DateSpan> {
    PresetKey::iter()
        .map(|key| (key, compute_range(key, now)))
        .collect()
}

pub fn compute_range(key: PresetKey, now: OffsetDateTime) -> DateSpan {
    let today = now.date();
    let offset = now.offset();
    let trailing_days = |days: i64| DateSpan::new(start_of_day(now - Duration::days(days)), now);

    match key {
        PresetKey::Today => DateSpan::new(start_of_day(now), end_of_day(now)),
        PresetKey::Yesterday => {
            let yesterday = now - Duration::days(1);
            DateSpan::new(start_of_day(yesterday), end_of_day(yesterday))
        }
        PresetKey::Last7Days => trailing_days(6),
        PresetKey::Last28Days => trailing_days(27),
        PresetKey::Last30Days => trailing_days(29),
        PresetKey::Last90Days => trailing_days(89),
        PresetKey::ThisMonth => DateSpan::new(
            at_start(first_of_month(today), offset),
            at_end(last_of_month(today), offset),
        ),
        PresetKey::LastMonth => {
            let month = months_back(today, 1);
            DateSpan::new(at_start(month, offset), at_end(last_of_month(month), offset))
        }
        PresetKey::Last12Months => DateSpan::new(at_start(months_back(today, 11), offset), now),
        PresetKey::LastCalendarYear => {
            let this_year = first_of_year(today);
            let last_day = this_year - Duration::days(1);
            DateSpan::new(
                at_start(first_of_year(last_day), offset),
                at_end(last_day, offset),
            )
        }
        PresetKey::ThisYear => DateSpan::new(at_start(first_of_year(today), offset), now),
        PresetKey::Custom => DateSpan::new(now, now),
    }
}

/// Span covering whole days from `start` through `end`, or just `start` when
/// no end has been picked yet.
pub fn custom_span(start: Date, end: Option<Date>, offset: UtcOffset) -> DateSpan {
    let end = end.unwrap_or(start).max(start);
    DateSpan::new(at_start(start, offset), at_end(end, offset))
}

pub fn lookup_label(raw: &str) -> Result<&'static str, CatalogError> {
    PresetKey::from_str(raw)
        .map(PresetKey::label)
        .map_err(|_| CatalogError::InvalidKey(raw.to_string()))
}

pub fn resolve_key_or_default(raw: &str) -> PresetKey {
    PresetKey::from_str(raw).unwrap_or(PresetKey::DEFAULT)
}

/// `(key, label)` pairs in display order.
pub fn preset_options() -> impl Iterator<Item = (PresetKey, &'static str)> {
    PresetKey::iter().map(|key| (key, key.label()))
}

pub fn format_range_label(start: OffsetDateTime, end: OffsetDateTime) -> String {
    let short = format_description!("[day] [month repr:short]");
    let with_year = format_description!("[day] [month repr:short] [year]");
    let start_format = if start.year() == end.year() {
        short
    } else {
        with_year
    };
    let start_text = start
        .format(start_format)
        .unwrap_or_else(|_| start.date().to_string());
    let end_text = end
        .format(with_year)
        .unwrap_or_else(|_| end.date().to_string());
    format!("{start_text}-{end_text}")
}

#[cfg(test)]
mod tests {
    use super::calendar_math::month_distance;
    use super::*;
    use assert_matches::assert_matches;
    use time::macros::{date, datetime, time};

    fn fixed_now() -> OffsetDateTime {
        datetime!(2022-03-15 14:30:12 +02:00)
    }

    #[test]
    fn labels_follow_declaration_order() {
        let labels: Vec<_> = preset_options().map(|(_, label)| label).collect();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "Today");
        assert_eq!(labels[2], "Last 7 Days");
        assert_eq!(labels[9], "Last Calendar Year");
        assert_eq!(labels[11], "Custom");
    }

    #[test]
    fn lookup_label_rejects_unknown_keys() {
        assert_eq!(lookup_label("Last7Days"), Ok("Last 7 Days"));
        assert_eq!(lookup_label("LastCalendarYear"), Ok("Last Calendar Year"));
        assert_matches!(lookup_label("Last 7 Days"), Err(CatalogError::InvalidKey(key)) if key == "Last 7 Days");
    }

    #[test]
    fn resolve_falls_back_to_last_28_days() {
        assert_eq!(resolve_key_or_default("NotARealKey"), PresetKey::Last28Days);
        assert_eq!(resolve_key_or_default(""), PresetKey::Last28Days);
        assert_eq!(resolve_key_or_default("ThisMonth"), PresetKey::ThisMonth);
    }

    #[test]
    fn every_range_is_ordered_and_repeatable() {
        let boundaries = [
            fixed_now(),
            datetime!(2023-01-01 00:00 UTC),
            datetime!(2024-02-29 12:00 UTC),
            datetime!(2022-12-31 23:59:59 UTC),
        ];
        for now in boundaries {
            let first = compute_ranges(now);
            assert_eq!(first.len(), 12);
            for (key, span) in &first {
                assert!(span.start <= span.end, "{key} is inverted at {now}");
                if *key != PresetKey::ThisMonth {
                    assert!(span.end <= end_of_day(now), "{key} ends after today at {now}");
                }
            }
            assert_eq!(first, compute_ranges(now));
        }
    }

    #[test]
    fn all_keys_match_declaration_order() {
        assert!(PresetKey::ALL.iter().copied().eq(PresetKey::iter()));
        assert_eq!(PresetKey::from_index(3), Some(PresetKey::Last28Days));
        assert_eq!(PresetKey::index_of(PresetKey::Custom), Some(11));
        assert_eq!(PresetKey::from_index(PresetKey::COUNT), None);
    }

    #[test]
    fn single_days_cover_whole_day() {
        let now = fixed_now();
        let today = compute_range(PresetKey::Today, now);
        assert_eq!(today.start, datetime!(2022-03-15 00:00 +02:00));
        assert_eq!(today.end.time(), time!(23:59:59.999));
        let yesterday = compute_range(PresetKey::Yesterday, now);
        assert_eq!(yesterday.start_day(), date!(2022 - 03 - 14));
        assert_eq!(yesterday.end_day(), date!(2022 - 03 - 14));
    }

    #[test]
    fn trailing_windows_end_now() {
        let now = fixed_now();
        for (key, days) in [
            (PresetKey::Last7Days, 6),
            (PresetKey::Last28Days, 27),
            (PresetKey::Last30Days, 29),
            (PresetKey::Last90Days, 89),
        ] {
            let span = compute_range(key, now);
            assert_eq!(span.end, now);
            assert_eq!(span.start.time(), time::Time::MIDNIGHT);
            assert_eq!((span.end - span.start).whole_days(), days, "{key}");
        }
    }

    #[test]
    fn month_presets_bound_calendar_months() {
        let now = fixed_now();
        let this_month = compute_range(PresetKey::ThisMonth, now);
        assert_eq!(this_month.start, datetime!(2022-03-01 00:00 +02:00));
        assert_eq!(this_month.end, datetime!(2022-03-31 23:59:59.999 +02:00));

        let last_month = compute_range(PresetKey::LastMonth, now);
        assert_eq!(last_month.start, datetime!(2022-02-01 00:00 +02:00));
        assert_eq!(last_month.end, datetime!(2022-02-28 23:59:59.999 +02:00));
    }

    #[test]
    fn last_month_from_january_is_previous_december() {
        let span = compute_range(PresetKey::LastMonth, datetime!(2023-01-31 08:00 UTC));
        assert_eq!(span.start_day(), date!(2022 - 12 - 01));
        assert_eq!(span.end_day(), date!(2022 - 12 - 31));
    }

    #[test]
    fn last_twelve_months_spans_eleven_month_steps() {
        let now = fixed_now();
        let span = compute_range(PresetKey::Last12Months, now);
        assert_eq!(span.end, now);
        assert_eq!(span.start_day(), date!(2021 - 04 - 01));
        assert_eq!(month_distance(span.start_day(), span.end_day()), 11);
    }

    #[test]
    fn year_presets() {
        let now = fixed_now();
        let last_year = compute_range(PresetKey::LastCalendarYear, now);
        assert_eq!(last_year.start, datetime!(2021-01-01 00:00 +02:00));
        assert_eq!(last_year.end, datetime!(2021-12-31 23:59:59.999 +02:00));

        let this_year = compute_range(PresetKey::ThisYear, now);
        assert_eq!(this_year.start, datetime!(2022-01-01 00:00 +02:00));
        assert_eq!(this_year.end, now);
    }

    #[test]
    fn custom_is_a_point_at_now() {
        let now = fixed_now();
        let span = compute_range(PresetKey::Custom, now);
        assert_eq!(span, DateSpan::new(now, now));
    }

    #[test]
    fn custom_span_without_end_covers_start_day() {
        let span = custom_span(date!(2022 - 03 - 05), None, UtcOffset::UTC);
        assert_eq!(span.start, datetime!(2022-03-05 00:00 UTC));
        assert_eq!(span.end, datetime!(2022-03-05 23:59:59.999 UTC));
    }

    #[test]
    fn range_label_omits_repeated_year() {
        assert_eq!(
            format_range_label(datetime!(2022-03-01 00:00 UTC), datetime!(2022-03-10 00:00 UTC)),
            "01 Mar-10 Mar 2022"
        );
        assert_eq!(
            format_range_label(datetime!(2021-12-25 00:00 UTC), datetime!(2022-01-05 00:00 UTC)),
            "25 Dec 2021-05 Jan 2022"
        );
    }
}
