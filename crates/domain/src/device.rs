//! Device — one monitored electrical circuit on the pulse meter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MuninError, ValidationError};

/// Meter input number identifying a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Wrap a raw meter input number.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Access the raw input number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for DeviceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl TryFrom<i64> for DeviceId {
    type Error = std::num::TryFromIntError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        u32::try_from(raw).map(Self)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A monitored circuit and its pulse calibration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// Used as a topic segment on the bus.
    pub name: String,
    pub pulses_per_kwh: u32,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MuninError::Validation`] when `name` is empty or
    /// `pulses_per_kwh` is zero.
    pub fn validate(&self) -> Result<(), MuninError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.pulses_per_kwh == 0 {
            return Err(ValidationError::ZeroCalibration.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    pulses_per_kwh: Option<u32>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn pulses_per_kwh(mut self, pulses_per_kwh: u32) -> Self {
        self.pulses_per_kwh = Some(pulses_per_kwh);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`MuninError::Validation`] if `name` is missing or empty, or
    /// `pulses_per_kwh` is missing or zero.
    pub fn build(self) -> Result<Device, MuninError> {
        let device = Device {
            id: self.id.unwrap_or(DeviceId(0)),
            name: self.name.unwrap_or_default(),
            pulses_per_kwh: self.pulses_per_kwh.unwrap_or_default(),
        };
        device.validate()?;
        Ok(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_device() {
        let device = Device::builder()
            .id(3)
            .name("kitchen")
            .pulses_per_kwh(1000)
            .build()
            .unwrap();
        assert_eq!(device.id, DeviceId::new(3));
        assert_eq!(device.name, "kitchen");
        assert_eq!(device.pulses_per_kwh, 1000);
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Device::builder().id(1).pulses_per_kwh(1000).build();
        assert!(matches!(
            result,
            Err(MuninError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_return_validation_error_when_calibration_is_zero() {
        let result = Device::builder().id(1).name("heater").build();
        assert!(matches!(
            result,
            Err(MuninError::Validation(ValidationError::ZeroCalibration))
        ));
    }

    #[test]
    fn should_convert_non_negative_raw_id() {
        assert_eq!(DeviceId::try_from(7_i64).unwrap(), DeviceId::new(7));
    }

    #[test]
    fn should_reject_negative_raw_id() {
        assert!(DeviceId::try_from(-1_i64).is_err());
    }

    #[test]
    fn should_display_raw_number() {
        assert_eq!(DeviceId::new(12).to_string(), "12");
    }
}
