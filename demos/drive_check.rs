//! Connect to a drive, bring it to OP, dump its identity and a file.
//!
//! The drive address can be given as first argument, e.g. `192.168.100.5:8080`.

use std::error::Error;
use std::net::SocketAddr;

use somanet_ethernet::{objects, Device, DeviceState};
use somanet_ethernet::device::expiry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let endpoint: SocketAddr = std::env::args().nth(1)
        .unwrap_or_else(|| "192.168.100.5:8080".into())
        .parse()?;

    let mut drive = Device::new(endpoint);
    assert!(!drive.is_connected().await);

    println!("connecting to {} ...", endpoint);
    if !drive.connect().await {
        return Err("connection failed".into());
    }

    drive.set_state(DeviceState::Operational, expiry::STATE).await?;
    let state = drive.get_state(expiry::STATE).await?;
    println!("state: {:?}", state);

    println!("loading parameters and reading their values ...");
    drive.load_parameters(true, expiry::PARAMETER_LOAD).await?;
    println!("done, {} parameters", drive.parameters().len());

    let product: u32 = drive
        .find_parameter(objects::identity::product.index, objects::identity::product.subindex)?
        .get()?;
    println!("product code: {:#010x}", product);

    let version: String = drive
        .find_parameter(objects::software_version.index, objects::software_version.subindex)?
        .get()?;
    println!("software version: {}", version);

    println!("reading .hardware_description ...");
    let content = drive.read_file(".hardware_description", expiry::FILE).await?;
    println!("{}", String::from_utf8_lossy(&content));

    let files = drive.read_file_list(true, expiry::FILE_SYSTEM).await?;
    println!("files on the drive: {:?}", files);

    println!("disconnecting from {} ...", endpoint);
    drive.disconnect().await;
    Ok(())
}
