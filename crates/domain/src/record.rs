//! Record — one decoded data line of a meter frame.
//!
//! A data line carries four whitespace-separated decimal integers:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `device_id` | meter input number |
//! | `pulse_count` | pulses since the previous frame |
//! | `last_pulse_interval` | time between the last two pulses, in 100 µs ticks |
//! | `checksum` | XOR of the three fields above |

use std::str::FromStr;

use crate::error::{ChecksumError, FrameError, MuninError};

const FIELD_COUNT: usize = 4;

/// A decoded and checksum-verified data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub device_id: i64,
    pub pulse_count: i64,
    pub last_pulse_interval: i64,
    pub checksum: i64,
}

impl Record {
    /// XOR of the three data fields.
    #[must_use]
    pub fn computed_checksum(&self) -> i64 {
        self.device_id ^ self.pulse_count ^ self.last_pulse_interval
    }

    /// Whether the carried checksum matches the data fields.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.computed_checksum() == self.checksum
    }
}

impl FromStr for Record {
    type Err = MuninError;

    /// Decode a data line, verifying field count, integer syntax and checksum.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        if tokens.len() != FIELD_COUNT {
            return Err(FrameError::FieldCount {
                line: line.to_string(),
                actual: tokens.len(),
            }
            .into());
        }

        let mut fields = [0_i64; FIELD_COUNT];
        for (slot, token) in fields.iter_mut().zip(&tokens) {
            *slot = token.parse().map_err(|_| FrameError::InvalidInteger {
                line: line.to_string(),
                token: (*token).to_string(),
            })?;
        }

        let [device_id, pulse_count, last_pulse_interval, checksum] = fields;
        let record = Self {
            device_id,
            pulse_count,
            last_pulse_interval,
            checksum,
        };

        if !record.is_valid() {
            return Err(ChecksumError {
                line: line.to_string(),
                expected: checksum,
                computed: record.computed_checksum(),
            }
            .into());
        }

        Ok(record)
    }
}
