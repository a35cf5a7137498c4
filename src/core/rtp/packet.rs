//! RTP packet header parsing (RFC 3550).

use bytes::Bytes;

use crate::core::stt::STTError;

const RTP_VERSION: u8 = 2;
const FIXED_HEADER_LEN: usize = 12;

/// A parsed RTP packet. The payload is copied out of the datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub payload: Bytes,
}

impl RtpPacket {
    pub fn new(sequence_number: u16, timestamp: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            marker: false,
            payload_type: 111,
            sequence_number,
            timestamp,
            ssrc: 0,
            payload: payload.into(),
        }
    }

    /// Parse a raw datagram. CSRC entries and header extensions are skipped,
    /// trailing padding is removed.
    pub fn parse(data: &[u8]) -> Result<Self, STTError> {
        if data.len() < FIXED_HEADER_LEN {
            return Err(invalid(format!("packet too short: {} bytes", data.len())));
        }

        let version = (data[0] >> 6) & 0x03;
        if version != RTP_VERSION {
            return Err(invalid(format!("unsupported RTP version {version}")));
        }

        let padding = (data[0] >> 5) & 0x01 == 1;
        let extension = (data[0] >> 4) & 0x01 == 1;
        let csrc_count = (data[0] & 0x0F) as usize;
        let marker = data[1] & 0x80 != 0;
        let payload_type = data[1] & 0x7F;
        let sequence_number = u16::from_be_bytes([data[2], data[3]]);
        let timestamp = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let ssrc = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

        let mut offset = FIXED_HEADER_LEN + csrc_count * 4;

        if extension {
            if data.len() < offset + 4 {
                return Err(invalid("truncated header extension".to_string()));
            }
            let ext_words = u16::from_be_bytes([data[offset + 2], data[offset + 3]]) as usize;
            offset += 4 + ext_words * 4;
        }

        let mut end = data.len();
        if padding {
            let pad = data[data.len() - 1] as usize;
            if pad == 0 {
                return Err(invalid("zero padding length".to_string()));
            }
            end = end.saturating_sub(pad);
        }

        if offset > end {
            return Err(invalid("header exceeds packet length".to_string()));
        }

        Ok(Self {
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            payload: Bytes::copy_from_slice(&data[offset..end]),
        })
    }
}

fn invalid(msg: String) -> STTError {
    STTError::InvalidAudioFormat(msg)
}
