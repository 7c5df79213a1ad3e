use once_cell::sync::OnceCell;
use time::OffsetDateTime;

/// Source of "now" for range computation.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in the local offset, or UTC when the offset cannot be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        match OffsetDateTime::now_local() {
            Ok(now) => now,
            Err(err) => {
                warn_missing_offset(&err);
                OffsetDateTime::now_utc()
            }
        }
    }
}

static OFFSET_WARNED: OnceCell<()> = OnceCell::new();

/// Logs the UTC fallback on first use only. Returns whether it logged.
fn warn_missing_offset(err: &time::error::IndeterminateOffset) -> bool {
    let mut logged = false;
    OFFSET_WARNED.get_or_init(|| {
        tracing::warn!(?err, "local offset unavailable, using UTC");
        logged = true;
    });
    logged
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}
