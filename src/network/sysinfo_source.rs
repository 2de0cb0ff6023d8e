// Interface table via sysinfo, with link state from sysfs.

use super::NetworkSource;
use super::linux;
use crate::error::ObserverStartError;
use crate::models::InterfaceState;
use std::path::PathBuf;
use sysinfo::Networks;

const NO_MAC: &str = "00:00:00:00:00:00";

pub struct SysinfoNetworkSource {
    sys_root: PathBuf,
    networks: Option<Networks>,
}

impl SysinfoNetworkSource {
    pub fn new(sys_root: impl Into<PathBuf>) -> Self {
        Self {
            sys_root: sys_root.into(),
            networks: None,
        }
    }
}

impl NetworkSource for SysinfoNetworkSource {
    fn open(&mut self) -> Result<(), ObserverStartError> {
        #[cfg(target_os = "linux")]
        {
            let class_net = self.sys_root.join("class/net");
            std::fs::read_dir(&class_net).map_err(|e| ObserverStartError::SourceUnavailable {
                reason: format!("{}: {}", class_net.display(), e),
            })?;
        }
        self.networks = Some(Networks::new_with_refreshed_list());
        Ok(())
    }

    fn poll(&mut self) -> anyhow::Result<Vec<InterfaceState>> {
        let networks = self
            .networks
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("network source polled before open"))?;
        networks.refresh(true);
        let rows = networks
            .list()
            .iter()
            .map(|(name, data)| {
                let mac = data.mac_address().to_string();
                InterfaceState {
                    name: name.clone(),
                    mac: (mac != NO_MAC).then_some(mac),
                    link_up: linux::link_is_up(&self.sys_root, name),
                    addresses: data
                        .ip_networks()
                        .iter()
                        .map(|n| format!("{}/{}", n.addr, n.prefix))
                        .collect(),
                }
            })
            .collect();
        Ok(rows)
    }
}
