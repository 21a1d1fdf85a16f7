//! Merges then ships every mergable file whose destination is within its
//! upload window to the ODFI (spec.md §4.3).
//!
//! Follows a resolve-then-dispatch shape: the uploader never talks to a
//! transport directly, it asks [`ach_transport::make_agent`] for one keyed
//! by the file's destination.

use crate::error::Result;
use crate::merger::Merger;
use ach_core::{Clock, Metrics};
use ach_store::ConfigRepository;
use ach_transport::{check_hostname_allowed, make_agent};
use ach_types::RoutingNumber;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Uploader {
    config: ConfigRepository,
    metrics: Arc<dyn Metrics>,
    clock: Arc<dyn Clock>,
    forced_cutoff_upload_delta: Duration,
}

impl Uploader {
    pub fn new(
        config: ConfigRepository,
        metrics: Arc<dyn Metrics>,
        clock: Arc<dyn Clock>,
        forced_cutoff_upload_delta: Duration,
    ) -> Self {
        Self { config, metrics, clock, forced_cutoff_upload_delta }
    }

    /// spec §4.3: drains the merger, then uploads every file that is either
    /// finalized by a rollover, within its destination's cutoff window, or
    /// (when `force` is set) simply pending, regardless of cutoff.
    pub async fn merge_and_upload_files(&self, merger: &Merger, batch_size: usize, force: bool) -> Result<()> {
        let finalized = merger.drain(batch_size)?;
        let mut candidates: Vec<PathBuf> = finalized.into_iter().map(|f| f.path).collect();

        for entry in self.candidate_files(merger, force)? {
            if !candidates.contains(&entry) {
                candidates.push(entry);
            }
        }

        for path in candidates {
            self.upload_one(merger, &path).await;
        }

        Ok(())
    }

    fn candidate_files(&self, merger: &Merger, force: bool) -> Result<Vec<PathBuf>> {
        let dir = merger.merged_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let now = self.clock.now();
        let mut out = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else { continue };
            if !name.ends_with(".ach") {
                continue;
            }
            let Some(destination) = destination_from_filename(&name) else { continue };
            if force {
                out.push(entry.path());
                continue;
            }
            if let Some(cutoff) = self.config.cutoff(destination) {
                if cutoff.within_window(now, self.forced_cutoff_upload_delta) {
                    out.push(entry.path());
                }
            }
        }
        Ok(out)
    }

    async fn upload_one(&self, merger: &Merger, path: &PathBuf) {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else { return };
        let Some(destination) = destination_from_filename(&filename) else { return };
        let destination_label = destination.as_str();
        let labels: [(&str, &str); 1] = [("routing_number", destination_label.as_str())];

        let Some(config) = self.config.transfer_config(destination) else {
            self.metrics.incr("missing_ach_file_upload_configs", &labels);
            tracing::warn!(%destination, "no file-transfer config for destination, skipping upload");
            return;
        };

        let contents = match std::fs::read(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(%destination, error = %e, "failed to read mergable file for upload");
                return;
            }
        };

        let agent = make_agent(config);

        if let Err(e) = check_hostname_allowed(agent.hostname(), config.port, &config.allowed_ips).await {
            self.metrics.incr("ach_file_upload_errors", &labels);
            tracing::error!(%destination, error = %e, "upload host failed allow-list check");
            return;
        }

        if let Err(e) = agent.upload_file(&filename, &contents).await {
            self.metrics.incr("ach_file_upload_errors", &labels);
            tracing::error!(%destination, error = %e, "upload failed, file will be retried next tick");
            return;
        }

        if let Err(e) = merger.mark_uploaded(&filename) {
            tracing::warn!(%destination, error = %e, "upload succeeded but bookkeeping update failed");
        }

        self.metrics.incr("ach_files_uploaded", &labels);
    }
}

fn destination_from_filename(name: &str) -> Option<RoutingNumber> {
    let stem = name.strip_suffix(".ach.uploaded").or_else(|| name.strip_suffix(".ach"))?;
    let mut parts = stem.splitn(3, '-');
    parts.next()?;
    let dest_str = parts.next()?;
    RoutingNumber::parse(dest_str).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::Merger;
    use ach_core::{FixedClock, InMemoryMetrics};
    use ach_store::Store;
    use ach_types::{FileTransferConfig, Protocol};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn routing() -> RoutingNumber {
        RoutingNumber::parse("091400606").unwrap()
    }

    #[tokio::test]
    async fn skips_upload_when_no_config_and_records_metric() {
        let dir = tempdir().unwrap();
        let merged_dir = dir.path().join("merged");
        std::fs::create_dir_all(&merged_dir).unwrap();
        std::fs::write(merged_dir.join("20260728-091400606-1.ach"), b"placeholder").unwrap();

        let store = Store::temporary().unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 7, 28, 14, 30, 0).unwrap()));
        let merger = Merger::new(store, merged_dir, 10_000, clock.clone());
        let metrics = Arc::new(InMemoryMetrics::new());
        let uploader = Uploader::new(ConfigRepository::new(), metrics.clone(), clock, Duration::from_secs(300));

        uploader.merge_and_upload_files(&merger, 10, true).await.unwrap();

        assert_eq!(metrics.get("missing_ach_file_upload_configs", &[("routing_number", "091400606")]), 1);
        assert_eq!(metrics.get("ach_files_uploaded", &[]), 0);
    }

    #[test]
    fn destination_from_filename_ignores_uploaded_suffix() {
        let r = routing();
        assert_eq!(destination_from_filename("20260728-091400606-1.ach"), Some(r));
        assert_eq!(destination_from_filename("20260728-091400606-1.ach.uploaded"), Some(r));
        assert_eq!(destination_from_filename("not-a-mergable-file.txt"), None);
    }

    #[tokio::test]
    async fn allowed_ip_mismatch_records_error_metric_and_skips_upload() {
        let dir = tempdir().unwrap();
        let merged_dir = dir.path().join("merged");
        std::fs::create_dir_all(&merged_dir).unwrap();
        std::fs::write(merged_dir.join("20260728-091400606-1.ach"), b"placeholder").unwrap();

        let r = routing();
        let mut config = ConfigRepository::new();
        config.insert_transfer_config(FileTransferConfig {
            routing_number: r,
            protocol: Protocol::Ftp,
            host: "localhost".to_string(),
            port: 21,
            username: "gateway".to_string(),
            password: Some("secret".to_string()),
            private_key_path: None,
            outbound_path: "/outbound".to_string(),
            inbound_path: "/inbound".to_string(),
            return_path: "/return".to_string(),
            allowed_ips: vec!["10.0.0.0/8".to_string()],
        });

        let store = Store::temporary().unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 7, 28, 14, 30, 0).unwrap()));
        let merger = Merger::new(store, merged_dir, 10_000, clock.clone());
        let metrics = Arc::new(InMemoryMetrics::new());
        let uploader = Uploader::new(config, metrics.clone(), clock, Duration::from_secs(300));

        uploader.merge_and_upload_files(&merger, 10, true).await.unwrap();

        assert_eq!(metrics.get("ach_file_upload_errors", &[("routing_number", "091400606")]), 1);
        assert_eq!(metrics.get("missing_ach_file_upload_configs", &[]), 0);
        assert_eq!(metrics.get("ach_files_uploaded", &[]), 0);
    }
}
