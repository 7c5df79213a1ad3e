use strum::EnumCount;
use time::{Date, Duration};

use crate::catalog::PresetKey;
use crate::picker::{RangeChange, SelectionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Presets,
    Calendar,
    StartInput,
    EndInput,
}

impl FocusPane {
    fn next(self) -> Self {
        match self {
            FocusPane::Presets => FocusPane::Calendar,
            FocusPane::Calendar => FocusPane::StartInput,
            FocusPane::StartInput => FocusPane::EndInput,
            FocusPane::EndInput => FocusPane::Presets,
        }
    }

    fn previous(self) -> Self {
        match self {
            FocusPane::Presets => FocusPane::EndInput,
            FocusPane::Calendar => FocusPane::Presets,
            FocusPane::StartInput => FocusPane::Calendar,
            FocusPane::EndInput => FocusPane::StartInput,
        }
    }

    pub fn is_input(self) -> bool {
        matches!(self, FocusPane::StartInput | FocusPane::EndInput)
    }
}

/// Host-side interaction state; the selection itself lives in the picker.
#[derive(Debug, Clone)]
pub struct AppState {
    pub focus: FocusPane,
    pub preset_cursor: usize,
    pub day_cursor: Date,
    pub start_input: String,
    pub end_input: String,
    pub last_change: Option<RangeChange>,
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(today: Date) -> Self {
        Self {
            focus: FocusPane::Presets,
            preset_cursor: 0,
            day_cursor: today,
            start_input: String::new(),
            end_input: String::new(),
            last_change: None,
            status_message: None,
        }
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        self.focus = if forward {
            self.focus.next()
        } else {
            self.focus.previous()
        };
    }

    pub fn move_preset_cursor(&mut self, delta: isize) {
        let count = PresetKey::COUNT;
        let next = (self.preset_cursor as isize + delta).rem_euclid(count as isize);
        self.preset_cursor = next as usize;
    }

    pub fn point_preset_cursor_at(&mut self, key: PresetKey) {
        if let Some(index) = PresetKey::index_of(key) {
            self.preset_cursor = index;
        }
    }

    pub fn move_day_cursor(&mut self, days: i64) {
        self.day_cursor += Duration::days(days);
    }

    pub fn active_input_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FocusPane::StartInput => Some(&mut self.start_input),
            FocusPane::EndInput => Some(&mut self.end_input),
            _ => None,
        }
    }

    /// Rewrites both text inputs from the picker's current day picks.
    pub fn sync_inputs(&mut self, selection: &SelectionState) {
        self.start_input = selection
            .custom_start()
            .map(|day| day.to_string())
            .unwrap_or_default();
        self.end_input = selection
            .custom_end()
            .map(|day| day.to_string())
            .unwrap_or_default();
    }
}
