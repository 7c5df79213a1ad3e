use time::macros::time;
use time::{Date, Duration, OffsetDateTime, Time, UtcOffset};

/// Last representable instant of a day, at millisecond precision.
pub const END_OF_DAY: Time = time!(23:59:59.999);

pub fn start_of_day(at: OffsetDateTime) -> OffsetDateTime {
    at.replace_time(Time::MIDNIGHT)
}

pub fn end_of_day(at: OffsetDateTime) -> OffsetDateTime {
    at.replace_time(END_OF_DAY)
}

pub fn first_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

pub fn last_of_month(date: Date) -> Date {
    let days = time::util::days_in_year_month(date.year(), date.month());
    first_of_month(date) + Duration::days(i64::from(days) - 1)
}

pub fn first_of_year(date: Date) -> Date {
    date - Duration::days(i64::from(date.ordinal()) - 1)
}

/// First day of the month `months` before the month containing `date`.
pub fn months_back(date: Date, months: u32) -> Date {
    let mut cursor = first_of_month(date);
    for _ in 0..months {
        cursor = first_of_month(cursor - Duration::days(1));
    }
    cursor
}

/// First day of the month after the month containing `date`.
pub fn next_month(date: Date) -> Date {
    last_of_month(date) + Duration::days(1)
}

pub fn at_start(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.with_time(Time::MIDNIGHT).assume_offset(offset)
}

pub fn at_end(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.with_time(END_OF_DAY).assume_offset(offset)
}

/// Whole calendar months between the months of `from` and `to`.
pub fn month_distance(from: Date, to: Date) -> i32 {
    let from_index = from.year() * 12 + i32::from(u8::from(from.month()));
    let to_index = to.year() * 12 + i32::from(u8::from(to.month()));
    to_index - from_index
}
