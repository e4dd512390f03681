//! Power derivation — pulses and pulse timing to energy and power.

use crate::error::PlausibilityReject;

/// Pulse interval ticks per second (the meter counts in 100 µs steps).
pub const TICKS_PER_SECOND: f64 = 10_000.0;

/// Readings above this instantaneous power are treated as meter noise.
pub const MAX_PLAUSIBLE_WATTS: f64 = 25_000.0;

/// Energy and power derived from one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Energy represented by this record's pulses.
    pub watt_hours: f64,
    /// Power estimate from the interval between the last two pulses.
    pub instant_watts: f64,
}

/// Convert a record's pulse figures into a [`Reading`].
///
/// An interval below one tick yields 0 W.
///
/// # Errors
///
/// Returns [`PlausibilityReject`] when the instantaneous power is negative
/// or above [`MAX_PLAUSIBLE_WATTS`].
#[allow(clippy::cast_precision_loss)]
pub fn derive(
    pulse_count: i64,
    last_pulse_interval: i64,
    pulses_per_kwh: u32,
) -> Result<Reading, PlausibilityReject> {
    let watt_hours = pulse_count as f64 / f64::from(pulses_per_kwh) * 1000.0;

    let instant_watts = if last_pulse_interval >= 1 {
        3600.0 * TICKS_PER_SECOND / last_pulse_interval as f64
    } else {
        0.0
    };

    Ok(Reading {
        watt_hours,
        instant_watts: check_plausibility(instant_watts)?,
    })
}

/// Pass through an instantaneous power value that is within range.
///
/// Both bounds are inclusive.
///
/// # Errors
///
/// Returns [`PlausibilityReject`] when `watts` is below zero or above
/// [`MAX_PLAUSIBLE_WATTS`].
pub fn check_plausibility(watts: f64) -> Result<f64, PlausibilityReject> {
    if (0.0..=MAX_PLAUSIBLE_WATTS).contains(&watts) {
        Ok(watts)
    } else {
        Err(PlausibilityReject { watts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_derive_watt_hours_and_watts() {
        let reading = derive(100, 360_000, 1000).unwrap();
        assert!((reading.watt_hours - 100.0).abs() < f64::EPSILON);
        assert!((reading.instant_watts - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_scale_by_calibration() {
        let reading = derive(1, 36_000, 800).unwrap();
        assert!((reading.watt_hours - 1.25).abs() < 1e-9);
        assert!((reading.instant_watts - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn should_report_zero_watts_without_interval() {
        let reading = derive(3, 0, 1000).unwrap();
        assert!(reading.instant_watts.abs() < f64::EPSILON);

        let reading = derive(3, -5, 1000).unwrap();
        assert!(reading.instant_watts.abs() < f64::EPSILON);
    }

    #[test]
    fn should_accept_exact_upper_bound() {
        // 36_000_000 / 1440 = 25_000
        let reading = derive(1, 1440, 1000).unwrap();
        assert!((reading.instant_watts - MAX_PLAUSIBLE_WATTS).abs() < f64::EPSILON);
    }

    #[test]
    fn should_reject_interval_just_below_bound() {
        let err = derive(1, 1439, 1000).unwrap_err();
        assert!(err.watts > MAX_PLAUSIBLE_WATTS);
    }

    #[test]
    fn should_accept_plausibility_boundaries() {
        assert!(check_plausibility(0.0).is_ok());
        assert!(check_plausibility(25_000.0).is_ok());
    }

    #[test]
    fn should_reject_just_outside_boundaries() {
        assert!(check_plausibility(25_000.01).is_err());
        assert!(check_plausibility(-0.01).is_err());
    }

    #[test]
    fn should_reject_nan() {
        assert!(check_plausibility(f64::NAN).is_err());
    }
}
