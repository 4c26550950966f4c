//! Frontier recording / playback.
//!
//! When a sweep runs with `film` set, a [`TraceRecorder`] captures every
//! settle event and batches them into [`TraceFrame`]s. [`TraceEncoder`] and
//! [`TraceDecoder`] persist frames to a byte stream using a compact
//! length-prefixed binary format, so a recorded sweep can be replayed later
//! at frame granularity.
//!
//! ## Wire format
//!
//! Each frame is written as:
//! ```text
//! [total_byte_len: u32 LE]
//! [start: u64 LE]  (settle index of the first event)
//! [width: i32 LE]
//! [height: i32 LE]
//! [num_events: u32 LE]
//! for each event:
//!   [pos.x: i32 LE] [pos.y: i32 LE]
//!   [distance: f64 LE]
//! ```

use std::io::{self, Read, Write};

use wayfield_core::Point;

use crate::search::SettleEvent;

/// Bytes per serialized event: pos(8) + distance(8) = 16
const EVENT_SIZE: usize = 16;
/// Header size: start(8) + width(4) + height(4) + num_events(4) = 20
const HEADER_SIZE: usize = 20;

/// An ordered batch of settle events, one playback step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceFrame {
    /// Grid width at recording time.
    pub width: i32,
    /// Grid height at recording time.
    pub height: i32,
    /// Settle index of the first event in this frame.
    pub start: u64,
    /// Events in settle order.
    pub events: Vec<SettleEvent>,
}

/// A recorded sweep: every frame in settle order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trace {
    pub frames: Vec<TraceFrame>,
}

impl Trace {
    /// Total number of settle events across all frames.
    pub fn event_count(&self) -> usize {
        self.frames.iter().map(|f| f.events.len()).sum()
    }

    /// Write every frame to `writer` in the trace wire format.
    pub fn write_to<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut enc = TraceEncoder::new(writer);
        for frame in &self.frames {
            enc.encode(frame)?;
        }
        enc.flush()
    }

    /// Read frames from `reader` until EOF.
    pub fn read_from<R: Read>(reader: R) -> io::Result<Self> {
        let mut dec = TraceDecoder::new(reader);
        let mut frames = Vec::new();
        while let Some(frame) = dec.decode()? {
            frames.push(frame);
        }
        Ok(Self { frames })
    }
}

// ---------------------------------------------------------------------------
// TraceRecorder
// ---------------------------------------------------------------------------

/// Buffers settle events during a sweep, closing a frame every `every`
/// events.
pub struct TraceRecorder {
    width: i32,
    height: i32,
    every: usize,
    start: u64,
    total: u64,
    current: Vec<SettleEvent>,
    frames: Vec<TraceFrame>,
}

impl TraceRecorder {
    /// Start a recording for a `width` x `height` grid with `every` events
    /// per frame (clamped to at least 1).
    pub fn new(width: i32, height: i32, every: usize) -> Self {
        Self {
            width,
            height,
            every: every.max(1),
            start: 0,
            total: 0,
            current: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Record one settle event.
    pub fn settle(&mut self, pos: Point, distance: f64) {
        self.current.push(SettleEvent { pos, distance });
        self.total += 1;
        if self.current.len() >= self.every {
            self.close_frame();
        }
    }

    /// Number of events recorded so far.
    pub fn recorded(&self) -> u64 {
        self.total
    }

    fn close_frame(&mut self) {
        if self.current.is_empty() {
            return;
        }
        self.frames.push(TraceFrame {
            width: self.width,
            height: self.height,
            start: self.start,
            events: std::mem::take(&mut self.current),
        });
        self.start = self.total;
    }

    /// Close any partial frame and return the finished trace.
    pub fn finish(mut self) -> Trace {
        self.close_frame();
        Trace {
            frames: self.frames,
        }
    }
}

// ---------------------------------------------------------------------------
// TraceEncoder
// ---------------------------------------------------------------------------

/// Encodes [`TraceFrame`]s to a byte-oriented writer.
pub struct TraceEncoder<W: Write> {
    writer: W,
}

impl<W: Write> TraceEncoder<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single frame.
    pub fn encode(&mut self, frame: &TraceFrame) -> io::Result<()> {
        let num_events = frame.events.len() as u32;
        let total_len = (HEADER_SIZE + frame.events.len() * EVENT_SIZE) as u32;

        // Length prefix
        self.writer.write_all(&total_len.to_le_bytes())?;

        // Header
        self.writer.write_all(&frame.start.to_le_bytes())?;
        self.writer.write_all(&frame.width.to_le_bytes())?;
        self.writer.write_all(&frame.height.to_le_bytes())?;
        self.writer.write_all(&num_events.to_le_bytes())?;

        // Events
        for ev in &frame.events {
            self.writer.write_all(&ev.pos.x.to_le_bytes())?;
            self.writer.write_all(&ev.pos.y.to_le_bytes())?;
            self.writer.write_all(&ev.distance.to_le_bytes())?;
        }

        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the encoder, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

// ---------------------------------------------------------------------------
// TraceDecoder
// ---------------------------------------------------------------------------

/// Decodes [`TraceFrame`]s from a byte-oriented reader.
pub struct TraceDecoder<R: Read> {
    reader: R,
}

impl<R: Read> TraceDecoder<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read the next frame, or `None` at EOF.
    pub fn decode(&mut self) -> io::Result<Option<TraceFrame>> {
        // Read length prefix
        let mut len_buf = [0u8; 4];
        match self.reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }
        let total_len = u32::from_le_bytes(len_buf) as usize;

        if total_len < HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "trace frame too small",
            ));
        }

        // Read the entire frame payload
        let mut data = vec![0u8; total_len];
        self.reader.read_exact(&mut data)?;

        // Parse header
        let start = u64::from_le_bytes(data[0..8].try_into().unwrap());
        let width = i32::from_le_bytes(data[8..12].try_into().unwrap());
        let height = i32::from_le_bytes(data[12..16].try_into().unwrap());
        let num_events = u32::from_le_bytes(data[16..20].try_into().unwrap()) as usize;

        let expected = HEADER_SIZE + num_events * EVENT_SIZE;
        if total_len != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "trace frame size mismatch: expected {} bytes, got {}",
                    expected, total_len
                ),
            ));
        }

        // Parse events
        let mut events = Vec::with_capacity(num_events);
        let mut offset = HEADER_SIZE;
        for _ in 0..num_events {
            let x = i32::from_le_bytes(data[offset..offset + 4].try_into().unwrap());
            let y = i32::from_le_bytes(data[offset + 4..offset + 8].try_into().unwrap());
            let distance = f64::from_le_bytes(data[offset + 8..offset + 16].try_into().unwrap());

            events.push(SettleEvent {
                pos: Point::new(x, y),
                distance,
            });

            offset += EVENT_SIZE;
        }

        Ok(Some(TraceFrame {
            width,
            height,
            start,
            events,
        }))
    }

    /// Consume the decoder, returning the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_batches_by_every() {
        let mut rec = TraceRecorder::new(4, 4, 2);
        for i in 0..5 {
            rec.settle(Point::new(i, 0), i as f64);
        }
        assert_eq!(rec.recorded(), 5);

        let trace = rec.finish();
        assert_eq!(trace.frames.len(), 3);
        assert_eq!(trace.frames[0].events.len(), 2);
        assert_eq!(trace.frames[1].events.len(), 2);
        assert_eq!(trace.frames[2].events.len(), 1);
        assert_eq!(trace.frames[0].start, 0);
        assert_eq!(trace.frames[1].start, 2);
        assert_eq!(trace.frames[2].start, 4);
        assert_eq!(trace.event_count(), 5);
    }

    #[test]
    fn recorder_with_every_one_frames_each_event() {
        let mut rec = TraceRecorder::new(2, 2, 1);
        rec.settle(Point::new(0, 0), 0.0);
        rec.settle(Point::new(1, 0), 1.0);

        let trace = rec.finish();
        assert_eq!(trace.frames.len(), 2);
        assert!(trace.frames.iter().all(|f| f.events.len() == 1));
    }

    #[test]
    fn empty_recording_has_no_frames() {
        let trace = TraceRecorder::new(8, 8, 4).finish();
        assert!(trace.frames.is_empty());
        assert_eq!(trace.event_count(), 0);
    }

    #[test]
    fn round_trip_empty_frame() {
        let frame = TraceFrame {
            width: 80,
            height: 24,
            start: 7,
            events: vec![],
        };

        let mut buf = Vec::new();
        {
            let mut enc = TraceEncoder::new(&mut buf);
            enc.encode(&frame).unwrap();
        }

        let mut dec = TraceDecoder::new(buf.as_slice());
        let decoded = dec.decode().unwrap().unwrap();
        assert_eq!(decoded, frame);

        // Next decode should be EOF
        assert!(dec.decode().unwrap().is_none());
    }

    #[test]
    fn round_trip_with_events() {
        let frame = TraceFrame {
            width: 40,
            height: 20,
            start: 0,
            events: vec![
                SettleEvent {
                    pos: Point::new(5, 10),
                    distance: 3.25,
                },
                SettleEvent {
                    pos: Point::new(-2, 0),
                    distance: 0.1,
                },
            ],
        };

        let mut buf = Vec::new();
        TraceEncoder::new(&mut buf).encode(&frame).unwrap();

        let decoded = TraceDecoder::new(buf.as_slice()).decode().unwrap().unwrap();
        assert_eq!(decoded.events.len(), 2);
        // Distances survive bit-exact.
        assert_eq!(decoded, frame);
    }

    #[test]
    fn round_trip_multiple_frames() {
        let mut rec = TraceRecorder::new(6, 6, 3);
        for i in 0..10 {
            rec.settle(Point::new(i % 6, i / 6), i as f64 * 0.5);
        }
        let trace = rec.finish();
        assert_eq!(trace.frames.len(), 4);

        let mut buf = Vec::new();
        trace.write_to(&mut buf).unwrap();
        let back = Trace::read_from(buf.as_slice()).unwrap();
        assert_eq!(back, trace);
    }

    #[test]
    fn decoder_rejects_size_mismatch() {
        // Length prefix says 25 payload bytes; a zero-event header needs 20.
        let mut buf = Vec::new();
        buf.extend_from_slice(&25u32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 25]);

        let err = TraceDecoder::new(buf.as_slice()).decode().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
