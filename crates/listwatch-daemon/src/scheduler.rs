//! Adaptive poll interval.
//!
//! Picks the delay before the next cycle from long-run activity: the
//! hour-of-day histogram around the current hour (previous, current, next)
//! approximates momentum, and minutes since the last new item is a faster
//! signal layered on top. Inside the configured night window no interval is
//! returned at all.

use std::time::Duration;

use chrono::{DateTime, Local, Timelike, Utc};
use listwatch_core::AppConfig;
use listwatch_store::{StatsState, StatsStore};

/// Minutes-since-last value used when no new item has ever been seen.
pub const NEVER_MINUTES: i64 = 999;

const ACTIVE_NEARBY: u64 = 5;
const ACTIVE_RECENT_MINUTES: i64 = 30;
const MODERATE_NEARBY: u64 = 2;
const MODERATE_RECENT_MINUTES: i64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub base_interval: Duration,
    pub mid_interval: Duration,
    pub slow_interval: Duration,
    /// First hour of the sleep window (inclusive).
    pub sleep_start_hour: u32,
    /// End of the sleep window (exclusive). Equal to the start disables it.
    pub sleep_end_hour: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(300),
            mid_interval: Duration::from_secs(900),
            slow_interval: Duration::from_secs(1800),
            sleep_start_hour: 1,
            sleep_end_hour: 8,
        }
    }
}

impl ScheduleConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_interval: Duration::from_secs(config.base_interval_secs),
            mid_interval: Duration::from_secs(config.mid_interval_secs),
            slow_interval: Duration::from_secs(config.slow_interval_secs),
            sleep_start_hour: config.sleep_start_hour,
            sleep_end_hour: config.sleep_end_hour,
        }
    }

    /// `true` when `hour` falls in `[sleep_start_hour, sleep_end_hour)`,
    /// wrapping past midnight when start > end.
    #[must_use]
    pub fn in_sleep_window(&self, hour: u32) -> bool {
        let (start, end) = (self.sleep_start_hour, self.sleep_end_hour);
        if start <= end {
            (start..end).contains(&hour)
        } else {
            hour >= start || hour < end
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Active,
    Moderate,
    LowFrequency,
}

impl Tier {
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Tier::Active => "active",
            Tier::Moderate => "moderate",
            Tier::LowFrequency => "low-frequency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Inside the sleep window; poll again for wake-up on the short cadence.
    Sleep,
    Poll {
        interval: Duration,
        tier: Tier,
        nearby: u64,
        minutes_since_last: i64,
    },
}

/// Pure tier selection from already-derived signals.
#[must_use]
pub fn select_tier(nearby: u64, minutes_since_last: i64) -> Tier {
    if nearby >= ACTIVE_NEARBY || minutes_since_last < ACTIVE_RECENT_MINUTES {
        Tier::Active
    } else if nearby >= MODERATE_NEARBY || minutes_since_last < MODERATE_RECENT_MINUTES {
        Tier::Moderate
    } else {
        Tier::LowFrequency
    }
}

/// Owns the stats store; the only component that mutates it.
pub struct AdaptiveScheduler {
    config: ScheduleConfig,
    stats: StatsStore,
}

impl AdaptiveScheduler {
    #[must_use]
    pub fn new(config: ScheduleConfig, stats: StatsStore) -> Self {
        Self { config, stats }
    }

    #[must_use]
    pub fn stats(&self) -> &StatsState {
        self.stats.state()
    }

    /// Whether the local wall clock is currently inside the sleep window.
    #[must_use]
    pub fn is_sleeping_now(&self) -> bool {
        self.config.in_sleep_window(Local::now().hour())
    }

    /// Decision for the current local hour.
    #[must_use]
    pub fn decide(&self) -> Decision {
        self.decide_at(Local::now().hour(), Utc::now())
    }

    /// Decision for local hour `hour` at instant `now`.
    #[must_use]
    pub fn decide_at(&self, hour: u32, now: DateTime<Utc>) -> Decision {
        if self.config.in_sleep_window(hour) {
            return Decision::Sleep;
        }

        let state = self.stats.state();
        let h = i64::from(hour);
        let nearby = state.count_at(h - 1) + state.count_at(h) + state.count_at(h + 1);
        let minutes_since_last = state
            .last_new_item_at
            .map_or(NEVER_MINUTES, |last| (now - last).num_minutes());

        let tier = select_tier(nearby, minutes_since_last);
        let interval = match tier {
            Tier::Active => self.config.base_interval,
            Tier::Moderate => self.config.mid_interval,
            Tier::LowFrequency => self.config.slow_interval,
        };

        Decision::Poll {
            interval,
            tier,
            nearby,
            minutes_since_last,
        }
    }

    /// Folds one completed cycle into the stats, bucketed by the current local hour.
    pub fn update(&mut self, new_items: u64) -> &StatsState {
        self.update_at(new_items, Local::now().hour(), Utc::now())
    }

    pub fn update_at(&mut self, new_items: u64, hour: u32, now: DateTime<Utc>) -> &StatsState {
        self.stats.record_cycle(new_items, hour, now)
    }

    /// Counts one cycle-level failure. Does not touch the interval signals.
    pub fn record_error(&mut self) -> &StatsState {
        self.stats.record_error(Utc::now())
    }
}
