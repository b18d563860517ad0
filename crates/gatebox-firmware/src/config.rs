//! NVS-backed configuration lookup.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::EspError;

use gatebox_recovery::ConfigStore;

const NAMESPACE: &str = "gatebox";
const MAX_VALUE_LEN: usize = 128;

/// Reads recovery settings from the `gatebox` NVS namespace.
pub struct NvsConfig {
    nvs: EspNvs<NvsDefault>,
}

impl NvsConfig {
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, EspError> {
        Ok(Self {
            nvs: EspNvs::new(partition, NAMESPACE, true)?,
        })
    }
}

impl ConfigStore for NvsConfig {
    fn get(&mut self, key: &str) -> Option<String> {
        let mut buf = [0u8; MAX_VALUE_LEN];
        match self.nvs.get_str(key, &mut buf) {
            Ok(Some(value)) => Some(value.to_string()),
            Ok(None) => None,
            Err(err) => {
                log::warn!("config key '{}' unreadable: {}", key, err);
                None
            }
        }
    }
}
