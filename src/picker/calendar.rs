use time::macros::format_description;
use time::{Date, Duration};

use crate::catalog::calendar_math::{first_of_month, last_of_month, months_back, next_month};
use crate::config::{CalendarOptions, WeekStart};

/// Day-grid widget and the dropdown hosting it.
pub trait CalendarWidget {
    fn parse(&self, text: &str) -> Option<Date>;
    fn is_valid(&self, date: Date) -> bool;
    fn focus_date(&mut self, date: Date);
    fn open(&mut self);
    fn close(&mut self);
}

#[derive(Debug, Clone)]
pub struct CalendarView {
    displayed: Date,
    open: bool,
    week_starts_on: WeekStart,
    min_year: i32,
    max_year: i32,
}

pub type Week = [Option<Date>; 7];

impl CalendarView {
    pub fn new(options: &CalendarOptions, today: Date) -> Self {
        Self {
            displayed: first_of_month(today),
            open: false,
            week_starts_on: options.week_starts_on,
            min_year: options.min_year,
            max_year: options.max_year,
        }
    }

    /// First day of the month on screen.
    pub fn displayed_month(&self) -> Date {
        self.displayed
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn previous_month(&mut self) {
        let target = months_back(self.displayed, 1);
        if self.is_valid(target) {
            self.displayed = target;
        }
    }

    pub fn next_month(&mut self) {
        let target = next_month(self.displayed);
        if self.is_valid(target) {
            self.displayed = target;
        }
    }

    pub fn weekday_headers(&self) -> [&'static str; 7] {
        match self.week_starts_on {
            WeekStart::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
            WeekStart::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
        }
    }

    pub fn weeks(&self) -> Vec<Week> {
        let first = self.displayed;
        let last = last_of_month(first);
        let lead = match self.week_starts_on {
            WeekStart::Monday => first.weekday().number_days_from_monday(),
            WeekStart::Sunday => first.weekday().number_days_from_sunday(),
        } as usize;

        let mut weeks = Vec::with_capacity(6);
        let mut week: Week = [None; 7];
        let mut column = lead;
        let mut day = first;
        loop {
            week[column] = Some(day);
            column += 1;
            if column == 7 {
                weeks.push(week);
                week = [None; 7];
                column = 0;
            }
            if day == last {
                break;
            }
            day += Duration::days(1);
        }
        if column > 0 {
            weeks.push(week);
        }
        weeks
    }
}

impl CalendarWidget for CalendarView {
    fn parse(&self, text: &str) -> Option<Date> {
        let format = format_description!("[year]-[month]-[day]");
        Date::parse(text.trim(), format).ok()
    }

    fn is_valid(&self, date: Date) -> bool {
        (self.min_year..=self.max_year).contains(&date.year())
    }

    fn focus_date(&mut self, date: Date) {
        if self.is_valid(date) {
            self.displayed = first_of_month(date);
        }
    }

    fn open(&mut self) {
        self.open = true;
    }

    fn close(&mut self) {
        self.open = false;
    }
}
