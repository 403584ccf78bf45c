use chrono::{ NaiveDate, Utc };
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{ Mutex, MutexGuard, PoisonError };
use crate::models::api::QuotaStatus;

/// Counts for a single UTC day. Older days are dropped, not kept around.
#[derive(Debug)]
struct DailyUsage {
    day: NaiveDate,
    used: HashMap<IpAddr, u32>,
}

impl DailyUsage {
    fn used_on(&self, ip: IpAddr, day: NaiveDate) -> u32 {
        if self.day != day {
            return 0;
        }
        self.used.get(&ip).copied().unwrap_or(0)
    }
}

/// Per-IP daily request counter. Counters reset at the start of each UTC day.
pub struct QuotaTracker {
    limit: u32,
    usage: Mutex<DailyUsage>,
}

impl QuotaTracker {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            usage: Mutex::new(DailyUsage { day: NaiveDate::MIN, used: HashMap::new() }),
        }
    }

    pub fn status(&self, ip: IpAddr) -> QuotaStatus {
        self.status_on(ip, today())
    }

    /// Consumes one unit. `Err` carries the (exhausted) status when nothing is left.
    pub fn try_acquire(&self, ip: IpAddr) -> Result<QuotaStatus, QuotaStatus> {
        self.try_acquire_on(ip, today())
    }

    /// Gives back a unit taken by `try_acquire` today.
    pub fn release(&self, ip: IpAddr) {
        self.release_on(ip, today())
    }

    fn lock(&self) -> MutexGuard<'_, DailyUsage> {
        self.usage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remaining(&self, used: u32) -> QuotaStatus {
        QuotaStatus {
            remaining: self.limit.saturating_sub(used),
            limit: self.limit,
        }
    }

    fn status_on(&self, ip: IpAddr, day: NaiveDate) -> QuotaStatus {
        self.remaining(self.lock().used_on(ip, day))
    }

    fn try_acquire_on(&self, ip: IpAddr, day: NaiveDate) -> Result<QuotaStatus, QuotaStatus> {
        let mut usage = self.lock();
        if usage.day != day {
            usage.day = day;
            usage.used.clear();
        }
        let used = usage.used_on(ip, day);
        if used >= self.limit {
            return Err(self.remaining(used));
        }
        usage.used.insert(ip, used + 1);
        Ok(self.remaining(used + 1))
    }

    fn release_on(&self, ip: IpAddr, day: NaiveDate) {
        let mut usage = self.lock();
        if usage.day != day {
            return;
        }
        if let Some(used) = usage.used.get_mut(&ip) {
            *used = used.saturating_sub(1);
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
