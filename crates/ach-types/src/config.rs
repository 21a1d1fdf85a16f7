//! Per-routing-number configuration shapes, and the `OdfiAccount` struct
//! threading ODFI identity explicitly instead of through process-wide
//! globals.

use crate::routing::RoutingNumber;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Ftp,
    Sftp,
}

/// Local wall-clock cutoff (HHMM) and timezone for a single routing number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoffTime {
    pub routing_number: RoutingNumber,
    pub cutoff: NaiveTime,
    pub timezone: Tz,
}

impl CutoffTime {
    /// Time remaining until the next cutoff, from `now`. Negative once the
    /// cutoff has passed today (the caller is responsible for deciding
    /// whether "passed" means "for today" vs. "roll to tomorrow" — the
    /// uploader only cares about the `0 < delta <= window` case).
    pub fn diff(&self, now: DateTime<Utc>) -> chrono::Duration {
        let local_now = now.with_timezone(&self.timezone);
        let today_cutoff = self.timezone.from_local_datetime(
            &local_now.date_naive().and_time(self.cutoff)
        ).single().unwrap_or_else(|| local_now);
        today_cutoff.signed_duration_since(local_now)
    }

    /// True when `now` falls within `(0, window]` of the cutoff, i.e. the
    /// pre-cutoff upload window an uploader should act within.
    pub fn within_window(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let delta = self.diff(now);
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero());
        delta > chrono::Duration::zero() && delta <= window
    }
}

#[derive(Debug, Clone)]
pub struct FileTransferConfig {
    pub routing_number: RoutingNumber,
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    /// SFTP only: path to a private key file, if key-based auth is used.
    pub private_key_path: Option<String>,
    pub outbound_path: String,
    pub inbound_path: String,
    pub return_path: String,
    /// CIDR blocks the resolved transport hostname's IP must fall within.
    pub allowed_ips: Vec<String>,
}

/// Origin routing number/identification and default holder name, threaded
/// explicitly through constructors instead of living as process-wide
/// mutable defaults.
#[derive(Debug, Clone)]
pub struct OdfiAccount {
    pub routing_number: RoutingNumber,
    pub identification: String,
    pub default_holder_name: String,
}
