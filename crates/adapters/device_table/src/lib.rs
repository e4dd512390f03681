//! # powermunin-adapter-device-table
//!
//! Loads the device table that maps meter inputs to circuit names and
//! calibrations.
//!
//! The table is a headerless CSV file with one device per row:
//!
//! ```text
//! # id, name, pulses per kWh
//! 1, kitchen, 1000
//! 2, heatpump, 800
//! ```
//!
//! Whitespace around fields is ignored and lines starting with `#` are
//! comments.
//!
//! ## Dependency rule
//! Depends on `powermunin-domain` only.

mod error;

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use powermunin_domain::device::Device;
use powermunin_domain::registry::DeviceRegistry;

pub use error::DeviceTableError;

/// Raw row: device id, name, pulses per kWh.
type DeviceRow = (u32, String, u32);

fn builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .trim(Trim::All)
        .comment(Some(b'#'));
    builder
}

/// Load the device table from `path`.
///
/// # Errors
///
/// Returns [`DeviceTableError::Open`] when the file cannot be read,
/// [`DeviceTableError::Row`] for malformed rows and
/// [`DeviceTableError::Domain`] for empty names, zero calibrations or
/// duplicate ids.
pub fn load(path: &Path) -> Result<DeviceRegistry, DeviceTableError> {
    let reader = builder()
        .from_path(path)
        .map_err(|source| DeviceTableError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let registry = read_registry(reader)?;
    tracing::info!(path = %path.display(), devices = registry.len(), "device table loaded");
    Ok(registry)
}

/// Parse a device table from any reader.
///
/// # Errors
///
/// Same as [`load`], minus the open failure.
pub fn parse<R: Read>(input: R) -> Result<DeviceRegistry, DeviceTableError> {
    read_registry(builder().from_reader(input))
}

fn read_registry<R: Read>(mut reader: csv::Reader<R>) -> Result<DeviceRegistry, DeviceTableError> {
    let mut devices = Vec::new();
    for row in reader.deserialize::<DeviceRow>() {
        let (id, name, pulses_per_kwh) = row.map_err(DeviceTableError::Row)?;
        let device = Device::builder()
            .id(id)
            .name(name)
            .pulses_per_kwh(pulses_per_kwh)
            .build()
            .map_err(DeviceTableError::Domain)?;
        tracing::info!(id = %device.id, name = %device.name, pulses_per_kwh, "device");
        devices.push(device);
    }
    DeviceRegistry::new(devices).map_err(DeviceTableError::Domain)
}
