//! Device registry — the immutable table of known devices.
//!
//! Built once at startup and shared read-only with the parser and the
//! aggregator.

use std::collections::BTreeMap;

use crate::device::{Device, DeviceId};
use crate::error::{MuninError, ValidationError};

/// Known devices keyed by meter input number.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<DeviceId, Device>,
}

impl DeviceRegistry {
    /// Build a registry, validating every device and rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`MuninError::Validation`] when a device is invalid or an id
    /// appears twice.
    pub fn new(devices: impl IntoIterator<Item = Device>) -> Result<Self, MuninError> {
        let mut table = BTreeMap::new();
        for device in devices {
            device.validate()?;
            let id = device.id;
            if table.insert(id, device).is_some() {
                return Err(ValidationError::DuplicateDevice(id.get()).into());
            }
        }
        Ok(Self { devices: table })
    }

    /// Look up a device by id.
    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// Resolve a raw id as decoded from the wire.
    ///
    /// Negative or out-of-range ids resolve to `None`.
    #[must_use]
    pub fn resolve(&self, raw: i64) -> Option<&Device> {
        DeviceId::try_from(raw).ok().and_then(|id| self.get(id))
    }

    /// Iterate devices in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Iterate known ids in order.
    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.devices.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
