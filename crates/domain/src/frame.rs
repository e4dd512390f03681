//! Frame extraction from the meter's byte stream.
//!
//! The meter emits frames of the form:
//!
//! ```text
//! +\r\n
//! <device_id> <pulse_count> <last_pulse_interval> <checksum>\r\n
//! ...
//! -\r\n
//! ```
//!
//! [`FrameParser`] accumulates raw bytes across reads and yields a frame
//! once its end line has arrived. Anything before the start marker is
//! discarded; anything after the end line stays buffered for the next frame.

use crate::device::Device;
use crate::error::{FrameError, MuninError};
use crate::record::Record;
use crate::registry::DeviceRegistry;

const START_MARKER: &[u8] = b"+\r\n";
const LINE_END: &[u8] = b"\r\n";
const END_PREFIX: u8 = b'-';

/// Restartable frame extractor over a growing byte buffer.
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: Vec<u8>,
}

impl FrameParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Drop everything buffered.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes waiting for a complete frame.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Extract the next complete frame, if one is buffered.
    ///
    /// Returns `None` when no start marker has been seen yet or the end line
    /// has not fully arrived; the buffer is kept for the next call.
    pub fn next_frame(&mut self) -> Option<Frame> {
        let start = find(&self.buffer, START_MARKER)?;
        self.buffer.drain(..start);

        let mut cursor = START_MARKER.len();
        let mut lines = Vec::new();
        loop {
            let len = find(&self.buffer[cursor..], LINE_END)?;
            let line = &self.buffer[cursor..cursor + len];
            cursor += len + LINE_END.len();
            if line.first() == Some(&END_PREFIX) {
                break;
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
        }

        self.buffer.drain(..cursor);
        Some(Frame { lines })
    }

    /// Lazily iterate every complete frame currently buffered.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames { parser: self }
    }
}

/// Iterator returned by [`FrameParser::frames`].
#[derive(Debug)]
pub struct Frames<'a> {
    parser: &'a mut FrameParser,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.next_frame()
    }
}

/// The data lines between a start marker and an end line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<String>,
}

impl Frame {
    /// Raw data lines, without line terminators.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Decode data lines in order, without consulting the registry.
    pub fn records(&self) -> impl Iterator<Item = Result<Record, MuninError>> + '_ {
        self.lines.iter().map(|line| line.parse::<Record>())
    }

    /// Decode data lines in order and resolve each against the registry.
    ///
    /// Records naming an unregistered device yield
    /// [`FrameError::UnknownDevice`]. Callers stop at the first error that
    /// [aborts the frame](MuninError::aborts_frame).
    pub fn decode<'a>(
        &'a self,
        registry: &'a DeviceRegistry,
    ) -> impl Iterator<Item = Result<(Record, &'a Device), MuninError>> + 'a {
        self.records().map(move |decoded| -> Result<(Record, &'a Device), MuninError> {
            let record = decoded?;
            let device = registry
                .resolve(record.device_id)
                .ok_or(FrameError::UnknownDevice(record.device_id))?;
            Ok((record, device))
        })
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;

    fn parse_all(bytes: &[u8]) -> Vec<Frame> {
        let mut parser = FrameParser::new();
        parser.extend(bytes);
        parser.frames().collect()
    }

    #[test]
    fn should_report_nothing_without_start_marker() {
        let mut parser = FrameParser::new();
        parser.extend(b"1 2 3 0\r\n-\r\n");
        assert!(parser.next_frame().is_none());
        assert_eq!(parser.buffered_len(), 12);
    }

    #[test]
    fn should_discard_garbage_before_start_marker() {
        let frames = parse_all(b"garbage+\r\n1 100 360000 359973\r\n-\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].lines(), ["1 100 360000 359973"]);
    }

    #[test]
    fn should_wait_for_end_line() {
        let mut parser = FrameParser::new();
        parser.extend(b"+\r\n1 100 360000 359973\r\n");
        assert!(parser.next_frame().is_none());

        parser.extend(b"-");
        assert!(parser.next_frame().is_none());

        parser.extend(b"\r\n");
        let frame = parser.next_frame().unwrap();
        assert_eq!(frame.lines().len(), 1);
        assert_eq!(parser.buffered_len(), 0);
    }

    #[test]
    fn should_resume_across_split_reads() {
        let mut parser = FrameParser::new();
        for chunk in [&b"+\r"[..], b"\n1 100 3", b"60000 359973\r", b"\n-\r\n"] {
            parser.extend(chunk);
        }
        let frame = parser.next_frame().unwrap();
        assert_eq!(frame.lines(), ["1 100 360000 359973"]);
    }

    #[test]
    fn should_retain_bytes_after_end_line() {
        let mut parser = FrameParser::new();
        parser.extend(b"+\r\n1 2 3 0\r\n-\r\n+\r\n2 50");
        let first = parser.next_frame().unwrap();
        assert_eq!(first.lines(), ["1 2 3 0"]);
        assert!(parser.next_frame().is_none());

        parser.extend(b" 7200 7184\r\n-\r\n");
        let second = parser.next_frame().unwrap();
        assert_eq!(second.lines(), ["2 50 7200 7184"]);
    }

    #[test]
    fn should_yield_empty_frame() {
        let frames = parse_all(b"+\r\n-\r\n");
        assert_eq!(frames.len(), 1);
        assert!(frames[0].lines().is_empty());
    }

    #[test]
    fn should_end_frame_on_any_dash_line() {
        let frames = parse_all(b"+\r\n1 2 3 0\r\n-end\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].lines(), ["1 2 3 0"]);
    }

    #[test]
    fn should_yield_consecutive_frames_lazily() {
        let mut parser = FrameParser::new();
        parser.extend(b"+\r\n1 2 3 0\r\n-\r\n+\r\n2 50 7200 7184\r\n-\r\n");
        let mut frames = parser.frames();
        assert_eq!(frames.next().unwrap().lines(), ["1 2 3 0"]);
        assert_eq!(frames.next().unwrap().lines(), ["2 50 7200 7184"]);
        assert!(frames.next().is_none());
    }

    #[test]
    fn should_yield_same_records_after_reset() {
        let input = b"noise+\r\n1 100 360000 359973\r\n2 50 7200 7184\r\n-\r\n";
        let mut parser = FrameParser::new();

        parser.extend(input);
        let first: Vec<Record> = parser
            .frames()
            .flat_map(|f| f.records().collect::<Vec<_>>())
            .map(Result::unwrap)
            .collect();

        parser.reset();
        parser.extend(input);
        let second: Vec<Record> = parser
            .frames()
            .flat_map(|f| f.records().collect::<Vec<_>>())
            .map(Result::unwrap)
            .collect();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn should_decode_against_registry() {
        let registry = DeviceRegistry::new([Device::builder()
            .id(1)
            .name("oven")
            .pulses_per_kwh(1000)
            .build()
            .unwrap()])
        .unwrap();
        let frames = parse_all(b"+\r\n1 100 360000 359973\r\n2 50 7200 7184\r\n-\r\n");

        let decoded: Vec<_> = frames[0].decode(&registry).collect();
        assert_eq!(decoded.len(), 2);

        let (record, device) = decoded[0].as_ref().unwrap();
        assert_eq!(record.pulse_count, 100);
        assert_eq!(device.name, "oven");

        assert!(matches!(
            decoded[1],
            Err(MuninError::Frame(FrameError::UnknownDevice(2)))
        ));
    }
}
