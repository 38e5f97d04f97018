use anyhow::bail;
use lanwake_common::config::Config;
use lanwake_common::device::{DeviceId, DeviceSnapshot};
use lanwake_common::network::mac;
use lanwake_core::Runtime;
use lanwake_core::wake::WakeError;

use crate::terminal::{print, spinner};

pub async fn wake(target: &str, force: bool, cfg: &Config) -> anyhow::Result<()> {
    let runtime: Runtime = Runtime::new(cfg);

    let Some(id) = runtime.registry.find_by_name(target).or_else(|| {
        mac::parse_mac(target)
            .ok()
            .and_then(|mac| runtime.registry.find_by_hardware_address(mac))
    }) else {
        return wake_unregistered(target, &runtime);
    };

    if force {
        let row: DeviceSnapshot = snapshot(&runtime, id)?;
        let mac: String = row.device.hardware_address.to_string();
        if !runtime.wake.wake_host(&mac, &row.device.name) {
            bail!("could not transmit magic packet to {}", row.device.name);
        }
        return Ok(());
    }

    {
        let _progress = spinner::start(&format!("Checking whether {target} is awake..."));
        runtime.monitor.check_device(id).await?;
    }

    let row: DeviceSnapshot = snapshot(&runtime, id)?;
    print::device_table(std::slice::from_ref(&row));

    match runtime.wake.wake_device(id) {
        Ok(()) => Ok(()),
        Err(WakeError::AlreadyOnline(name)) => {
            print::print_status(format!("{name} is already online, use --force to send anyway"));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn snapshot(runtime: &Runtime, id: DeviceId) -> anyhow::Result<DeviceSnapshot> {
    match runtime.registry.get(id) {
        Some(row) => Ok(row),
        None => bail!("device {id} vanished from the registry"),
    }
}

fn wake_unregistered(target: &str, runtime: &Runtime) -> anyhow::Result<()> {
    if mac::parse_mac(target).is_err() {
        bail!("{target:?} is neither a configured device nor a hardware address");
    }
    if !runtime.wake.wake_host(target, target) {
        bail!("could not transmit magic packet to {target}");
    }
    Ok(())
}
