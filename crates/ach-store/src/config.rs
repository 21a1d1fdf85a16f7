//! The per-routing-number `ConfigRepository`: resolves file-transfer
//! endpoints and cutoff times for a given ODFI routing number. Built once
//! at startup by the config loader (`ach-gateway`) from a TOML file; the
//! pipeline only ever sees this read-only lookup.

use ach_types::{CutoffTime, FileTransferConfig, RoutingNumber};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ConfigRepository {
    transfer_configs: HashMap<RoutingNumber, FileTransferConfig>,
    cutoffs: HashMap<RoutingNumber, CutoffTime>,
}

impl ConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_transfer_config(&mut self, config: FileTransferConfig) {
        self.transfer_configs.insert(config.routing_number, config);
    }

    pub fn insert_cutoff(&mut self, cutoff: CutoffTime) {
        self.cutoffs.insert(cutoff.routing_number, cutoff);
    }

    /// `None` means the caller should record a
    /// `missing_ach_file_upload_configs` metric and skip the file.
    pub fn transfer_config(&self, routing_number: RoutingNumber) -> Option<&FileTransferConfig> {
        self.transfer_configs.get(&routing_number)
    }

    pub fn cutoff(&self, routing_number: RoutingNumber) -> Option<&CutoffTime> {
        self.cutoffs.get(&routing_number)
    }

    pub fn all_cutoffs(&self) -> impl Iterator<Item = &CutoffTime> {
        self.cutoffs.values()
    }

    /// Every configured routing number's transport config, polled once per
    /// tick by the return/correction processor.
    pub fn all_transfer_configs(&self) -> impl Iterator<Item = &FileTransferConfig> {
        self.transfer_configs.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn missing_config_resolves_to_none() {
        let repo = ConfigRepository::new();
        assert!(repo.transfer_config(RoutingNumber::parse("091400606").unwrap()).is_none());
    }

    #[test]
    fn inserted_config_resolves_by_routing_number() {
        let mut repo = ConfigRepository::new();
        let routing = RoutingNumber::parse("091400606").unwrap();
        repo.insert_cutoff(CutoffTime {
            routing_number: routing,
            cutoff: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            timezone: chrono_tz::America::New_York,
        });
        assert!(repo.cutoff(routing).is_some());
    }
}
