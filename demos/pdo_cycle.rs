//! Cyclic process data against a drive, with the mapping taken from a UI configuration file.
//!
//! Usage: `pdo_cycle [address] [mapping.json]`. Without a mapping file the drive's own PDO
//! configuration is read back over SDO.

use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

use somanet_ethernet::{objects, Device, DeviceState, PdoMappings, UiConfig};
use somanet_ethernet::device::expiry;

const CYCLES: usize = 100;
const PERIOD: Duration = Duration::from_millis(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let endpoint: SocketAddr = std::env::args().nth(1)
        .unwrap_or_else(|| "192.168.100.5:8080".into())
        .parse()?;

    let mut drive = Device::new(endpoint);
    if !drive.connect().await {
        return Err("connection failed".into());
    }

    drive.load_parameters(true, expiry::PARAMETER_LOAD).await?;

    match std::env::args().nth(2) {
        Some(path) => {
            let config = UiConfig::from_json(&std::fs::read_to_string(path)?)?;
            drive.set_mappings(PdoMappings::from_config(&config)?);
        }
        None => drive.read_pdo_mapping(expiry::SDO).await?,
    }
    println!(
        "mapping: {} bytes out, {} bytes in",
        drive.mappings().rx_packed_size(),
        drive.mappings().tx_packed_size(),
    );

    drive.set_state(DeviceState::Operational, expiry::STATE).await?;

    let position = objects::cia402::current::position;
    let mut interval = tokio::time::interval(PERIOD);
    for _ in 0 .. CYCLES {
        interval.tick().await;
        drive.exchange_process_data(expiry::PROCESS_DATA).await?;
        if let Some(value) = drive.find_parameter(position.index, position.subindex)?.try_get::<i32>() {
            println!("position: {}", value);
        }
    }

    drive.set_state(DeviceState::PreOperational, expiry::STATE).await?;
    drive.disconnect().await;
    Ok(())
}
