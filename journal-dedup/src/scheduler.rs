use crate::aggregator::FeedUpdater;
use crate::types::{FeedError, JournalConfig, Result};
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use tracing::{error, info};

/// Fires a full run once a day at a fixed local hour.
///
/// The next trigger is computed only after the previous run returns, so runs
/// never overlap however long they take.
pub struct DailySchedule {
    hour: u32,
}

impl DailySchedule {
    pub fn new(hour: u32) -> Result<Self> {
        if hour >= 24 {
            return Err(FeedError::Config(format!("schedule hour {} out of range", hour)));
        }
        Ok(Self { hour })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// First trigger instant strictly after `now`.
    pub fn next_run_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let at = NaiveTime::from_hms_opt(self.hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let today = now.date().and_time(at);
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Run forever. A failed run is logged and the loop waits for the next day.
    pub async fn run_forever(&self, updater: &FeedUpdater, journals: &[JournalConfig]) {
        loop {
            let now = Local::now().naive_local();
            let next = self.next_run_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!("Next run at {} (in {}s)", next, wait.as_secs());
            tokio::time::sleep(wait).await;

            let today = Local::now().date_naive();
            match updater.run_all(journals, today).await {
                Ok(report) => info!(
                    "Scheduled run for {} done, {} failures",
                    report.date,
                    report.failures()
                ),
                Err(e) => error!("Scheduled run for {} failed: {}", today, e),
            }
        }
    }
}
