//! Selection controller: holds the applied and pending ranges, mediates
//! between the catalog, the calendar widget and the host.

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::catalog::{
    compute_range, format_range_label, lookup_label, resolve_key_or_default, Clock, DateSpan,
    PresetKey,
};
use crate::config::PickerConfig;

mod calendar;
pub mod state;

pub use calendar::{CalendarView, CalendarWidget, Week};
pub use state::{RangeSelection, SelectionState};

/// Emitted to the host once per apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeChange {
    pub selected_key: PresetKey,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerLabels {
    pub applied: String,
    pub applied_dates: String,
    pub pending: String,
}

pub struct DateRangePicker<W> {
    clock: Box<dyn Clock>,
    widget: Option<W>,
    state: SelectionState,
    labels: PickerLabels,
    subscribers: Vec<Sender<RangeChange>>,
    reset_pending_on_cancel: bool,
}

impl<W: CalendarWidget> DateRangePicker<W> {
    pub fn new(config: &PickerConfig, clock: Box<dyn Clock>) -> Self {
        let (key, span) = resolve_initial(&config.initial_key, clock.as_ref());
        Self {
            clock,
            widget: None,
            state: SelectionState::new(key, span),
            labels: initial_labels(key, span),
            subscribers: Vec::new(),
            reset_pending_on_cancel: config.reset_pending_on_cancel,
        }
    }

    /// Resets both buffers to `default_key` (or the fallback preset).
    pub fn initialize(&mut self, default_key: &str) {
        let (key, span) = resolve_initial(default_key, self.clock.as_ref());
        self.state = SelectionState::new(key, span);
        self.labels = initial_labels(key, span);
        tracing::debug!(%key, "picker initialised");
    }

    pub fn attach_widget(&mut self, widget: W) {
        self.widget = Some(widget);
    }

    pub fn widget(&self) -> Option<&W> {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> Option<&mut W> {
        self.widget.as_mut()
    }

    pub fn subscribe(&mut self) -> Receiver<RangeChange> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn labels(&self) -> &PickerLabels {
        &self.labels
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub fn open(&mut self) {
        let focus = self.state.custom_start();
        if let Some(widget) = self.widget.as_mut() {
            widget.open();
            if let Some(day) = focus {
                widget.focus_date(day);
            }
        }
    }

    pub fn select_preset(&mut self, key: PresetKey) {
        if key.is_custom() {
            self.state = self.state.clone().with_custom_mode();
            self.refresh_custom_label();
            tracing::debug!("pending range switched to custom");
            return;
        }

        let span = compute_range(key, self.clock.now());
        self.state = self.state.clone().with_preset(key, span);
        self.labels.pending = key.label().to_string();
        if let Some(widget) = self.widget.as_mut() {
            widget.focus_date(span.start_day());
        }
        tracing::debug!(%key, "pending preset selected");
    }

    /// Host-facing variant taking a raw key; unknown names fall back.
    pub fn select_preset_named(&mut self, raw: &str) {
        self.select_preset(resolve_logged(raw));
    }

    pub fn on_day_clicked(&mut self, day: Date) {
        let offset = self.clock.now().offset();
        self.state = self.state.clone().with_day_clicked(day, offset);
        self.refresh_custom_label();
        tracing::debug!(%day, "calendar day clicked");
    }

    pub fn set_hover(&mut self, day: Option<Date>) {
        self.state = self.state.clone().with_hover(day);
    }

    pub fn is_day_in_preview_band(&self, day: Date) -> bool {
        self.state.is_day_in_preview_band(day)
    }

    pub fn is_day_inside_applied_band(&self, day: Date) -> bool {
        self.state.is_day_inside_applied_band(day)
    }

    pub fn is_day_selected(&self, day: Date) -> bool {
        self.state.is_day_selected(day)
    }

    pub fn is_active_range(&self, key: PresetKey) -> bool {
        self.labels.pending == key.label()
    }

    /// Parses `text` through the widget; anything unparseable or invalid
    /// yields `current` unchanged.
    pub fn validate_typed_date(&self, current: Option<Date>, text: &str) -> Option<Date> {
        let Some(widget) = self.widget.as_ref() else {
            return current;
        };
        match widget.parse(text) {
            Some(date) if widget.is_valid(date) => Some(date),
            _ => current,
        }
    }

    pub fn type_start_date(&mut self, text: &str) {
        let current = self.state.custom_start();
        let Some(start) = self.validate_typed_date(current, text) else {
            return;
        };
        if current == Some(start) {
            return;
        }
        let offset = self.clock.now().offset();
        let end = self.state.custom_end();
        self.state = self.state.clone().with_custom_bounds(start, end, offset);
        self.refresh_custom_label();
        if let Some(widget) = self.widget.as_mut() {
            widget.focus_date(start);
        }
    }

    pub fn type_end_date(&mut self, text: &str) {
        let Some(start) = self.state.custom_start() else {
            return;
        };
        let current = self.state.custom_end();
        let end = self.validate_typed_date(current, text);
        if end == current || end.is_some_and(|end| end <= start) {
            return;
        }
        let offset = self.clock.now().offset();
        self.state = self.state.clone().with_custom_bounds(start, end, offset);
        self.refresh_custom_label();
    }

    pub fn apply(&mut self) -> RangeChange {
        self.state = self.state.clone().committed();
        let applied = self.state.applied();
        self.labels.applied = lookup_label(applied.key.as_str())
            .unwrap_or_else(|_| applied.key.label())
            .to_string();
        self.labels.pending = self.labels.applied.clone();
        self.labels.applied_dates = format_range_label(applied.span.start, applied.span.end);

        let change = RangeChange {
            selected_key: applied.key,
            start_date: applied.span.start,
            end_date: applied.span.end,
        };
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
        tracing::info!(
            key = %change.selected_key,
            range = %self.labels.applied_dates,
            "date range applied"
        );

        self.close_widget();
        change
    }

    pub fn cancel(&mut self) {
        if self.reset_pending_on_cancel {
            self.state = self.state.clone().reverted();
            self.labels.pending = self.labels.applied.clone();
        }
        self.close_widget();
        tracing::debug!("picker canceled");
    }

    fn close_widget(&mut self) {
        if let Some(widget) = self.widget.as_mut() {
            widget.close();
        }
    }

    fn refresh_custom_label(&mut self) {
        if self.state.has_complete_custom_range() {
            self.labels.pending = PresetKey::Custom.label().to_string();
        }
    }
}

/// Resolves a raw key, warning when it falls back to the default.
pub(crate) fn resolve_logged(raw: &str) -> PresetKey {
    let key = resolve_key_or_default(raw);
    if key.as_str() != raw {
        tracing::warn!(raw, fallback = %key, "unrecognised preset key");
    }
    key
}

fn resolve_initial(raw: &str, clock: &dyn Clock) -> (PresetKey, DateSpan) {
    let key = resolve_logged(raw);
    (key, compute_range(key, clock.now()))
}

fn initial_labels(key: PresetKey, span: DateSpan) -> PickerLabels {
    PickerLabels {
        applied: key.label().to_string(),
        applied_dates: span.label(),
        pending: key.label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FixedClock;
    use time::macros::{date, datetime};

    #[derive(Debug, Default)]
    struct RecordingWidget {
        focused: Vec<Date>,
        opened: usize,
        closed: usize,
    }

    impl CalendarWidget for RecordingWidget {
        fn parse(&self, text: &str) -> Option<Date> {
            match text {
                "2022-03-03" => Some(date!(2022 - 03 - 03)),
                "2022-03-12" => Some(date!(2022 - 03 - 12)),
                "1800-01-01" => Some(date!(1800 - 01 - 01)),
                _ => None,
            }
        }

        fn is_valid(&self, date: Date) -> bool {
            date.year() >= 1900
        }

        fn focus_date(&mut self, date: Date) {
            self.focused.push(date);
        }

        fn open(&mut self) {
            self.opened += 1;
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    fn picker(initial_key: &str) -> DateRangePicker<RecordingWidget> {
        let config = PickerConfig {
            initial_key: initial_key.to_string(),
            ..PickerConfig::default()
        };
        let clock = FixedClock(datetime!(2022-03-15 14:30 UTC));
        let mut picker = DateRangePicker::new(&config, Box::new(clock));
        picker.attach_widget(RecordingWidget::default());
        picker
    }

    #[test]
    fn unknown_initial_key_falls_back() {
        let picker = picker("Fortnight");
        assert_eq!(picker.state().applied().key, PresetKey::Last28Days);
        assert_eq!(picker.labels().applied, "Last 28 Days");
        assert_eq!(picker.labels().applied_dates, "16 Feb-15 Mar 2022");
    }

    #[test]
    fn initialize_resets_both_buffers() {
        let mut picker = picker("Today");
        picker.select_preset(PresetKey::LastMonth);
        picker.initialize("ThisYear");
        assert_eq!(picker.state().applied().key, PresetKey::ThisYear);
        assert_eq!(picker.state().pending().key, PresetKey::ThisYear);
        assert_eq!(picker.labels().pending, "This Year (Jan - Today)");
    }

    #[test]
    fn selecting_preset_updates_pending_and_focuses_start() {
        let mut picker = picker("Today");
        picker.select_preset(PresetKey::LastMonth);
        assert_eq!(picker.state().pending().key, PresetKey::LastMonth);
        assert_eq!(picker.state().applied().key, PresetKey::Today);
        assert_eq!(picker.labels().pending, "Last Month");
        assert!(picker.is_active_range(PresetKey::LastMonth));
        let widget = picker.widget().expect("widget attached");
        assert_eq!(widget.focused, vec![date!(2022 - 02 - 01)]);
    }

    #[test]
    fn custom_label_waits_for_both_days() {
        let mut picker = picker("Today");
        picker.on_day_clicked(date!(2022 - 03 - 15));
        assert_eq!(picker.labels().pending, "Today");
        assert_eq!(picker.state().pending().key, PresetKey::Custom);

        picker.on_day_clicked(date!(2022 - 03 - 03));
        picker.on_day_clicked(date!(2022 - 03 - 09));
        assert_eq!(picker.labels().pending, "Custom");
        assert!(picker.is_active_range(PresetKey::Custom));
    }

    #[test]
    fn custom_preset_keeps_seeded_days() {
        let mut picker = picker("Last7Days");
        let span = picker.state().pending().span;
        picker.select_preset(PresetKey::Custom);
        assert_eq!(picker.state().pending().span, span);
        assert_eq!(picker.state().pending().key, PresetKey::Custom);
        assert_eq!(picker.labels().pending, "Custom");
        assert_eq!(picker.state().custom_start(), Some(date!(2022 - 03 - 09)));
    }

    #[test]
    fn custom_preset_leaves_pending_span_untouched() {
        let mut picker = picker("Last7Days");
        let rx = picker.subscribe();
        let before = picker.state().pending().span;
        picker.select_preset(PresetKey::Custom);
        assert_eq!(picker.state().pending().span, before);
        assert_eq!(before.end, datetime!(2022-03-15 14:30 UTC));

        let change = picker.apply();
        assert_eq!(change.selected_key, PresetKey::Custom);
        assert_eq!(change.end_date, datetime!(2022-03-15 14:30 UTC));
        assert_eq!(rx.try_recv().ok(), Some(change));
    }

    #[test]
    fn named_preset_falls_back_and_focuses_start() {
        let mut picker = picker("Today");
        picker.select_preset_named("Fortnight");
        assert_eq!(picker.state().pending().key, PresetKey::Last28Days);
        assert_eq!(picker.labels().pending, "Last 28 Days");
        let widget = picker.widget().expect("widget attached");
        assert_eq!(widget.focused, vec![date!(2022 - 02 - 16)]);
    }

    #[test]
    fn apply_emits_exactly_one_change_and_closes() {
        let mut picker = picker("Today");
        let rx = picker.subscribe();
        picker.on_day_clicked(date!(2022 - 03 - 01));
        picker.on_day_clicked(date!(2022 - 03 - 10));
        assert!(rx.try_recv().is_err());

        let change = picker.apply();
        assert_eq!(change.selected_key, PresetKey::Custom);
        assert_eq!(change.start_date, datetime!(2022-03-01 00:00 UTC));
        assert_eq!(change.end_date, datetime!(2022-03-10 23:59:59.999 UTC));
        assert_eq!(rx.try_recv(), Ok(change));
        assert!(rx.try_recv().is_err());
        assert_eq!(picker.labels().applied, "Custom");
        assert_eq!(picker.labels().applied_dates, "01 Mar-10 Mar 2022");
        assert_eq!(picker.widget().map(|w| w.closed), Some(1));
    }

    #[test]
    fn apply_preset_reports_computed_range() {
        let mut picker = picker("Today");
        let rx = picker.subscribe();
        picker.select_preset(PresetKey::Last7Days);
        picker.apply();
        let change = rx.try_recv().expect("change emitted");
        assert_eq!(change.selected_key, PresetKey::Last7Days);
        assert_eq!(change.start_date, datetime!(2022-03-09 00:00 UTC));
        assert_eq!(change.end_date, datetime!(2022-03-15 14:30 UTC));
    }

    #[test]
    fn cancel_emits_nothing_and_keeps_pending() {
        let mut picker = picker("Today");
        let rx = picker.subscribe();
        picker.select_preset(PresetKey::Last90Days);
        picker.cancel();
        assert!(rx.try_recv().is_err());
        assert_eq!(picker.state().pending().key, PresetKey::Last90Days);
        assert_eq!(picker.state().applied().key, PresetKey::Today);
        assert_eq!(picker.widget().map(|w| w.closed), Some(1));
    }

    #[test]
    fn cancel_can_revert_when_configured() {
        let config = PickerConfig {
            initial_key: "Today".into(),
            reset_pending_on_cancel: true,
            ..PickerConfig::default()
        };
        let clock = FixedClock(datetime!(2022-03-15 14:30 UTC));
        let mut picker: DateRangePicker<RecordingWidget> =
            DateRangePicker::new(&config, Box::new(clock));
        picker.select_preset(PresetKey::Last90Days);
        picker.cancel();
        assert_eq!(picker.state().pending().key, PresetKey::Today);
        assert_eq!(picker.labels().pending, "Today");
    }

    #[test]
    fn missing_widget_is_silent() {
        let config = PickerConfig::default();
        let clock = FixedClock(datetime!(2022-03-15 14:30 UTC));
        let mut picker: DateRangePicker<RecordingWidget> =
            DateRangePicker::new(&config, Box::new(clock));
        picker.open();
        picker.select_preset(PresetKey::ThisMonth);
        picker.cancel();
        picker.apply();
        assert_eq!(picker.validate_typed_date(None, "2022-03-03"), None);
    }

    #[test]
    fn typed_dates_fall_back_to_current_value() {
        let picker = picker("Today");
        let current = Some(date!(2022 - 03 - 05));
        assert_eq!(
            picker.validate_typed_date(current, "2022-03-03"),
            Some(date!(2022 - 03 - 03))
        );
        assert_eq!(picker.validate_typed_date(current, "garbage"), current);
        assert_eq!(picker.validate_typed_date(current, "1800-01-01"), current);
    }

    #[test]
    fn typed_bounds_become_custom_range() {
        let mut picker = picker("Today");
        picker.type_start_date("2022-03-03");
        picker.type_end_date("2022-03-12");
        assert_eq!(picker.state().custom_start(), Some(date!(2022 - 03 - 03)));
        assert_eq!(picker.state().custom_end(), Some(date!(2022 - 03 - 12)));
        assert_eq!(picker.state().pending().key, PresetKey::Custom);
        assert_eq!(picker.labels().pending, "Custom");
    }

    #[test]
    fn open_focuses_pending_start() {
        let mut picker = picker("LastCalendarYear");
        picker.open();
        let widget = picker.widget().expect("widget attached");
        assert_eq!(widget.opened, 1);
        assert_eq!(widget.focused, vec![date!(2021 - 01 - 01)]);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut picker = picker("Today");
        let rx = picker.subscribe();
        drop(picker.subscribe());
        picker.apply();
        assert_eq!(picker.subscribers.len(), 1);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn range_change_serialises_rfc3339() {
        let change = RangeChange {
            selected_key: PresetKey::Last7Days,
            start_date: datetime!(2022-03-09 00:00 UTC),
            end_date: datetime!(2022-03-15 14:30 UTC),
        };
        let json = serde_json::to_value(&change).expect("serialise");
        assert_eq!(json["selected_key"], "Last7Days");
        assert_eq!(json["start_date"], "2022-03-09T00:00:00Z");
    }
}
