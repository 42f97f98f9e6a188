use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

fn get_host() -> cpal::Host {
    cpal::default_host()
}

/// Finds the output device called `device_name`, or the host default when `None`.
pub fn get_or_default_output(device_name: Option<&str>) -> anyhow::Result<Device> {
    let host = get_host();
    tracing::debug!("Host: {:?}", host.id());

    let Some(target) = device_name else {
        return host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("No default output device"));
    };

    host.output_devices()?
        .find(|device| device.name().is_ok_and(|name| name == target))
        .ok_or_else(|| anyhow::anyhow!("No target device found: {}", target))
}

pub fn get_available_outputs() -> anyhow::Result<String> {
    let host = get_host();
    let default_device = host
        .default_output_device()
        .and_then(|device| device.name().ok());

    let mut device_names: Vec<String> = Vec::new();
    for out_device in host.output_devices()? {
        let Ok(d_name) = out_device.name() else {
            continue;
        };
        let mut d = match out_device.default_output_config() {
            Ok(d_cfg) => {
                format!(" * {}({}ch, {}hz)", d_name, d_cfg.channels(), d_cfg.sample_rate().0)
            }
            Err(_) => format!(" * {}", d_name),
        };
        if default_device.as_deref() == Some(d_name.as_str()) {
            d.push_str(" [default]");
        }
        device_names.push(d);
    }
    Ok(device_names.join("\n"))
}
