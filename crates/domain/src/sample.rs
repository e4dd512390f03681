//! Sample aggregation — running power statistics per device.

use std::collections::HashMap;

use crate::device::DeviceId;
use crate::registry::DeviceRegistry;

/// Running statistics over instantaneous power readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleStore {
    count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl SampleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reading.
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
    }

    /// Mean of all readings since the last reset, `None` when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Spread between the largest and smallest reading.
    #[must_use]
    pub fn deviation(&self) -> Option<f64> {
        Some((self.max? - self.min?).abs())
    }

    /// Forget every reading.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.max
    }
}

/// One [`SampleStore`] per registered device.
#[derive(Debug, Clone, Default)]
pub struct SampleAggregator {
    stores: HashMap<DeviceId, SampleStore>,
}

impl SampleAggregator {
    /// Create an empty store for every device in the registry.
    #[must_use]
    pub fn for_registry(registry: &DeviceRegistry) -> Self {
        Self {
            stores: registry.ids().map(|id| (id, SampleStore::new())).collect(),
        }
    }

    /// Record a reading for a device.
    ///
    /// Returns the updated store, or `None` when the device has no store.
    pub fn add(&mut self, id: DeviceId, watts: f64) -> Option<&SampleStore> {
        let store = self.stores.get_mut(&id)?;
        store.add(watts);
        Some(&*store)
    }

    /// Average power for a device, `None` when it has no readings.
    #[must_use]
    pub fn average(&self, id: DeviceId) -> Option<f64> {
        self.stores.get(&id).and_then(SampleStore::average)
    }

    /// Empty a device's store.
    pub fn reset(&mut self, id: DeviceId) {
        if let Some(store) = self.stores.get_mut(&id) {
            store.reset();
        }
    }

    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&SampleStore> {
        self.stores.get(&id)
    }
}
