//! Jitter buffer that turns out-of-order RTP packets into an ordered frame run.

use std::collections::HashMap;

use bytes::Bytes;
use tracing::debug;

use super::packet::RtpPacket;
use super::FrameReassembler;

/// Default number of packets buffered behind a gap before the gap is skipped.
pub const DEFAULT_MAX_LATE: u16 = 200;

/// One reassembled audio frame (a single Opus packet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub sequence_number: u16,
    pub timestamp: u32,
    pub payload: Bytes,
}

impl From<RtpPacket> for AudioFrame {
    fn from(packet: RtpPacket) -> Self {
        Self {
            sequence_number: packet.sequence_number,
            timestamp: packet.timestamp,
            payload: packet.payload,
        }
    }
}

/// Reorders packets by 16-bit sequence number, handling wraparound.
///
/// Packets older than the next expected sequence number and duplicates are
/// dropped. When a gap stays open until `max_late` packets are buffered behind
/// it, the missing packets are given up on and output resumes at the oldest
/// buffered packet.
#[derive(Debug)]
pub struct SampleBuilder {
    max_late: u16,
    next_seq: Option<u16>,
    pending: HashMap<u16, RtpPacket>,
    dropped: u64,
}

impl SampleBuilder {
    pub fn new(max_late: u16) -> Self {
        Self {
            max_late: max_late.max(1),
            next_seq: None,
            pending: HashMap::new(),
            dropped: 0,
        }
    }

    /// Packets discarded as late or duplicate so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    fn distance(from: u16, to: u16) -> i16 {
        to.wrapping_sub(from) as i16
    }

    fn drain_contiguous(&mut self, next: &mut u16, out: &mut Vec<AudioFrame>) {
        while let Some(packet) = self.pending.remove(next) {
            out.push(packet.into());
            *next = next.wrapping_add(1);
        }
    }

    /// Oldest buffered sequence number and the span from `next` to the newest.
    fn buffered_extent(&self, next: u16) -> Option<(u16, u16)> {
        let mut oldest: Option<(u16, i16)> = None;
        let mut newest: i16 = 0;
        for &seq in self.pending.keys() {
            let d = Self::distance(next, seq);
            if oldest.is_none_or(|(_, od)| d < od) {
                oldest = Some((seq, d));
            }
            newest = newest.max(d);
        }
        oldest.map(|(seq, _)| (seq, newest as u16 + 1))
    }
}

impl Default for SampleBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LATE)
    }
}

impl FrameReassembler for SampleBuilder {
    fn push(&mut self, packet: RtpPacket) {
        let next = *self.next_seq.get_or_insert(packet.sequence_number);
        let seq = packet.sequence_number;

        if Self::distance(next, seq) < 0 {
            self.dropped += 1;
            debug!(seq, next, "Dropping late RTP packet");
            return;
        }
        if self.pending.contains_key(&seq) {
            self.dropped += 1;
            debug!(seq, "Dropping duplicate RTP packet");
            return;
        }
        self.pending.insert(seq, packet);
    }

    fn pop_ready(&mut self) -> Vec<AudioFrame> {
        let Some(mut next) = self.next_seq else {
            return Vec::new();
        };

        let mut out = Vec::new();
        loop {
            self.drain_contiguous(&mut next, &mut out);
            match self.buffered_extent(next) {
                Some((oldest, span)) if span >= self.max_late => {
                    debug!(
                        from = next,
                        to = oldest,
                        "Skipping RTP sequence gap"
                    );
                    next = oldest;
                }
                _ => break,
            }
        }
        self.next_seq = Some(next);
        out
    }
}
