use lanwake_common::config::Config;
use lanwake_core::registry::Registry;

use crate::terminal::print;

pub fn list(cfg: &Config) {
    let registry: Registry = Registry::new(cfg.devices.clone());
    print::device_table(&registry.list());
}
