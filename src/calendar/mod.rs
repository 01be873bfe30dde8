//! `MarketCalendar` (spec §4.1, component C1): trading-day/session-hours
//! decisions backed by a remote status feed with a deterministic offline
//! fallback. Grounded on `original_source/utils/market_calendar.py`.

mod fallback;

use crate::config::CalendarConfig;
use crate::domain::errors::ProviderError;
use crate::domain::ports::{MarketCalendarFeed, SessionStatus};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

const REGULAR_OPEN: NaiveTime = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
const REGULAR_CLOSE: NaiveTime = NaiveTime::from_hms_opt(16, 0, 0).unwrap();
const EARLY_CLOSE: NaiveTime = NaiveTime::from_hms_opt(13, 0, 0).unwrap();

struct StatusCache {
    status: SessionStatus,
    fetched_at: DateTime<Utc>,
}

/// US equity market calendar. Consults an optional remote status feed with
/// a 60s TTL (spec default) and always falls back to the deterministic
/// computed calendar on feed failure.
pub struct MarketCalendar {
    feed: Option<Arc<dyn MarketCalendarFeed>>,
    config: CalendarConfig,
    status_cache: Mutex<Option<StatusCache>>,
}

impl MarketCalendar {
    pub fn new(feed: Option<Arc<dyn MarketCalendarFeed>>, config: CalendarConfig) -> Self {
        Self {
            feed,
            config,
            status_cache: Mutex::new(None),
        }
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        fallback::is_trading_day(date)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        fallback::is_holiday(date)
    }

    pub fn is_early_close(&self, date: NaiveDate) -> bool {
        fallback::is_early_close(date)
    }

    /// `None` when the market is closed on `date`.
    pub fn market_hours(&self, date: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
        if !self.is_trading_day(date) {
            return None;
        }
        let close = if self.is_early_close(date) {
            EARLY_CLOSE
        } else {
            REGULAR_CLOSE
        };
        Some((REGULAR_OPEN, close))
    }

    /// Consults the remote feed (TTL `status_ttl_secs`) for the current
    /// moment; falls back to the computed calendar for any other moment,
    /// on feed failure, or when no feed is configured (spec §4.1 policy).
    pub async fn is_market_open(&self, now: DateTime<Utc>) -> bool {
        let is_current = (Utc::now() - now).num_seconds().abs() <= 300;

        if is_current {
            if let Some(feed) = &self.feed {
                if let Some(status) = self.status_from_cache_or_feed(feed.as_ref(), now).await {
                    return status == SessionStatus::Open || status == SessionStatus::EarlyClose;
                }
            }
        }
        self.is_market_open_fallback(now)
    }

    async fn status_from_cache_or_feed(
        &self,
        feed: &dyn MarketCalendarFeed,
        now: DateTime<Utc>,
    ) -> Option<SessionStatus> {
        {
            let cache = self.status_cache.lock().await;
            if let Some(entry) = cache.as_ref() {
                let age = (Utc::now() - entry.fetched_at).num_seconds();
                if age >= 0 && (age as u64) < self.config.status_ttl_secs {
                    return Some(entry.status);
                }
            }
        }

        match feed.session_status(now.date_naive()).await {
            Ok(status) => {
                let mut cache = self.status_cache.lock().await;
                *cache = Some(StatusCache {
                    status,
                    fetched_at: Utc::now(),
                });
                Some(status)
            }
            Err(err) => {
                warn!(error = %err, "calendar feed unavailable, falling back to stale cache or computed calendar");
                self.status_cache.lock().await.as_ref().map(|c| c.status)
            }
        }
    }

    fn is_market_open_fallback(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&eastern_offset(now.date_naive()));
        let date = local.date_naive();
        match self.market_hours(date) {
            Some((open, close)) => {
                let t = local.time();
                t >= open && t <= close
            }
            None => false,
        }
    }

    pub fn next_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut d = date + Duration::days(1);
        for _ in 0..10 {
            if self.is_trading_day(d) {
                return d;
            }
            d += Duration::days(1);
        }
        d
    }

    pub async fn seconds_until_open(&self, now: DateTime<Utc>) -> i64 {
        if self.is_market_open(now).await {
            return 0;
        }
        let local = now.with_timezone(&eastern_offset(now.date_naive()));
        let date = local.date_naive();

        let open_naive = if self.is_trading_day(date) && local.time() < REGULAR_OPEN {
            date.and_time(REGULAR_OPEN)
        } else {
            self.next_trading_day(date).and_time(REGULAR_OPEN)
        };
        let open_dt = eastern_offset(open_naive.date()).from_local_datetime(&open_naive).unwrap();
        (open_dt.with_timezone(&Utc) - now).num_seconds().max(0)
    }

    pub async fn seconds_until_close(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_market_open(now).await {
            return 0;
        }
        let local = now.with_timezone(&eastern_offset(now.date_naive()));
        let date = local.date_naive();
        let Some((_, close)) = self.market_hours(date) else {
            return 0;
        };
        let close_naive = date.and_time(close);
        let close_dt = eastern_offset(date).from_local_datetime(&close_naive).unwrap();
        (close_dt.with_timezone(&Utc) - now).num_seconds().max(0)
    }
}

/// US Eastern offset approximated by the standard DST rule (second Sunday
/// in March to first Sunday in November), avoiding a full tz-database
/// dependency for a single fixed-offset exchange timezone.
fn eastern_offset(date: NaiveDate) -> FixedOffset {
    if is_us_dst(date) {
        FixedOffset::west_opt(4 * 3600).unwrap()
    } else {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }
}

fn is_us_dst(date: NaiveDate) -> bool {
    let year = date.year();
    let march_start = NaiveDate::from_ymd_opt(year, 3, 1).unwrap();
    let second_sunday_march = nth_sunday(march_start, 2);
    let november_start = NaiveDate::from_ymd_opt(year, 11, 1).unwrap();
    let first_sunday_november = nth_sunday(november_start, 1);
    date >= second_sunday_march && date < first_sunday_november
}

fn nth_sunday(month_start: NaiveDate, n: u32) -> NaiveDate {
    let mut days_ahead = Weekday::Sun.num_days_from_monday() as i64
        - month_start.weekday().num_days_from_monday() as i64;
    if days_ahead < 0 {
        days_ahead += 7;
    }
    let first = month_start + Duration::days(days_ahead);
    first + Duration::weeks((n - 1) as i64)
}

/// Error wrapper matching `ProviderError` so a calendar feed failure can be
/// surfaced consistently when callers want it (most callers use the
/// infallible fallback-backed methods above instead).
pub fn feed_unavailable(reason: impl Into<String>) -> ProviderError {
    ProviderError::Unavailable(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_when_no_feed_configured() {
        let calendar = MarketCalendar::new(None, CalendarConfig::default());
        // Saturday at noon UTC is never open, trivially, regardless of DST.
        let saturday = Utc.with_ymd_and_hms(2026, 1, 3, 16, 0, 0).unwrap();
        assert!(!calendar.is_market_open(saturday).await);
    }

    #[test]
    fn market_hours_none_on_weekend() {
        let calendar = MarketCalendar::new(None, CalendarConfig::default());
        assert!(calendar
            .market_hours(NaiveDate::from_ymd_opt(2026, 1, 3).unwrap())
            .is_none());
    }

    #[test]
    fn early_close_uses_1pm_close() {
        let calendar = MarketCalendar::new(None, CalendarConfig::default());
        let black_friday = NaiveDate::from_ymd_opt(2026, 11, 27).unwrap();
        let (_, close) = calendar.market_hours(black_friday).unwrap();
        assert_eq!(close, EARLY_CLOSE);
    }
}
