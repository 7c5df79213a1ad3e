use time::{Date, UtcOffset};

use crate::catalog::{custom_span, DateSpan, PresetKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSelection {
    pub key: PresetKey,
    pub span: DateSpan,
}

/// Applied and pending buffers plus the day picks backing the calendar
/// highlight. Transitions consume the state and return the next one.
///
/// Preset selections seed `custom_start`/`custom_end` with the preset's
/// bounding days so the calendar shows what the preset covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    applied: RangeSelection,
    pending: RangeSelection,
    custom_start: Option<Date>,
    custom_end: Option<Date>,
    hover: Option<Date>,
}

impl SelectionState {
    pub fn new(key: PresetKey, span: DateSpan) -> Self {
        let selection = RangeSelection { key, span };
        Self {
            applied: selection,
            pending: selection,
            custom_start: Some(span.start_day()),
            custom_end: Some(span.end_day()),
            hover: None,
        }
    }

    pub fn applied(&self) -> RangeSelection {
        self.applied
    }

    pub fn pending(&self) -> RangeSelection {
        self.pending
    }

    pub fn custom_start(&self) -> Option<Date> {
        self.custom_start
    }

    pub fn custom_end(&self) -> Option<Date> {
        self.custom_end
    }

    pub fn hover(&self) -> Option<Date> {
        self.hover
    }

    pub fn has_complete_custom_range(&self) -> bool {
        self.custom_start.is_some() && self.custom_end.is_some()
    }

    #[must_use]
    pub fn with_preset(self, key: PresetKey, span: DateSpan) -> Self {
        debug_assert!(!key.is_custom());
        Self {
            pending: RangeSelection { key, span },
            custom_start: Some(span.start_day()),
            custom_end: Some(span.end_day()),
            ..self
        }
    }

    /// Switches the pending key to custom. The pending span and the picked
    /// days stay as they are until a day is clicked or typed.
    #[must_use]
    pub fn with_custom_mode(self) -> Self {
        Self {
            pending: RangeSelection {
                key: PresetKey::Custom,
                span: self.pending.span,
            },
            ..self
        }
    }

    #[must_use]
    pub fn with_day_clicked(self, day: Date, offset: UtcOffset) -> Self {
        let (custom_start, custom_end) = match (self.custom_start, self.custom_end) {
            (None, None) => (Some(day), None),
            (Some(start), None) if day > start => (Some(start), Some(day)),
            _ => (Some(day), None),
        };
        Self {
            custom_start,
            custom_end,
            ..self
        }
        .recompute_custom(offset)
    }

    /// Replaces the picks directly, as typed input does.
    #[must_use]
    pub fn with_custom_bounds(self, start: Date, end: Option<Date>, offset: UtcOffset) -> Self {
        Self {
            custom_start: Some(start),
            custom_end: end.filter(|end| *end > start),
            ..self
        }
        .recompute_custom(offset)
    }

    #[must_use]
    pub fn with_hover(self, hover: Option<Date>) -> Self {
        Self { hover, ..self }
    }

    #[must_use]
    pub fn committed(self) -> Self {
        Self {
            applied: self.pending,
            ..self
        }
    }

    /// Discards the pending buffer in favour of the applied one.
    #[must_use]
    pub fn reverted(self) -> Self {
        Self {
            pending: self.applied,
            custom_start: Some(self.applied.span.start_day()),
            custom_end: Some(self.applied.span.end_day()),
            hover: None,
            ..self
        }
    }

    fn recompute_custom(self, offset: UtcOffset) -> Self {
        let span = match self.custom_start {
            Some(start) => custom_span(start, self.custom_end, offset),
            None => self.pending.span,
        };
        Self {
            pending: RangeSelection {
                key: PresetKey::Custom,
                span,
            },
            ..self
        }
    }

    pub fn is_day_in_preview_band(&self, day: Date) -> bool {
        match (self.custom_start, self.custom_end, self.hover) {
            (Some(start), None, Some(hover)) => day > start && day < hover,
            _ => false,
        }
    }

    pub fn is_day_inside_applied_band(&self, day: Date) -> bool {
        match (self.custom_start, self.custom_end) {
            (Some(start), Some(end)) => day > start && day < end,
            _ => false,
        }
    }

    pub fn is_day_selected(&self, day: Date) -> bool {
        self.custom_start == Some(day)
            || self.custom_end == Some(day)
            || self.is_day_inside_applied_band(day)
            || self.is_day_in_preview_band(day)
    }
}
