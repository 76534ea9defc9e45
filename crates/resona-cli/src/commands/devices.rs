//! Audio output device listing.

use clap::Args;
use resona_engine::{AudioBackend, CpalBackend};

/// List available output devices.
#[derive(Args)]
pub struct DevicesArgs {}

/// Run the devices command.
pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();
    let devices = backend.list_outputs()?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    let default_name = backend.default_output()?.map(|d| d.name);

    println!("Output Devices");
    println!("==============\n");
    for (idx, device) in devices.iter().enumerate() {
        let marker = if Some(&device.name) == default_name.as_ref() {
            " (default)"
        } else {
            ""
        };
        println!(
            "  [{}] {} ({} Hz){}",
            idx, device.name, device.default_sample_rate, marker
        );
    }
    Ok(())
}
