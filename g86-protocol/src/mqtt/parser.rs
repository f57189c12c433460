//! Incremental inbound packet parser

use heapless::Vec;

use super::header;
use super::packet::PacketError;
use crate::telemetry::{self, Message};
use crate::topics::Topic;

/// Largest packet body kept in memory; bigger packets are skipped
pub const MAX_PACKET_SIZE: usize = 256;

/// A packet the broker sends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    ConnAck {
        session_present: bool,
        return_code: u8,
    },
    SubAck {
        packet_id: u16,
        return_code: u8,
    },
    UnsubAck {
        packet_id: u16,
    },
    /// Payload truncated to the message buffer
    Publish {
        topic: Topic,
        payload: Message,
    },
    PingResp,
}

/// State machine for parsing inbound packets
#[derive(Debug, Clone)]
pub struct PacketParser {
    state: ParseState,
    header: u8,
    length: usize,
    length_bytes: u8,
    buffer: Vec<u8, MAX_PACKET_SIZE>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for the fixed header byte
    WaitingForHeader,
    /// Accumulating the remaining length
    ReadingLength,
    /// Reading body bytes
    ReadingBody,
    /// Skipping the body of an oversized packet
    Discarding { remaining: usize },
}

impl Default for PacketParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketParser {
    /// Create a new packet parser
    pub const fn new() -> Self {
        Self {
            state: ParseState::WaitingForHeader,
            header: 0,
            length: 0,
            length_bytes: 0,
            buffer: Vec::new(),
        }
    }

    /// Reset the parser state
    ///
    /// Call after the connection drops so a half-read packet is not
    /// glued onto the next session.
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForHeader;
        self.header = 0;
        self.length = 0;
        self.length_bytes = 0;
        self.buffer.clear();
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(packet))` when a complete packet is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` when a packet was
    /// rejected. The parser is ready for the next packet after an error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Incoming>, PacketError> {
        match self.state {
            ParseState::WaitingForHeader => {
                self.header = byte;
                self.length = 0;
                self.length_bytes = 0;
                self.state = ParseState::ReadingLength;
                Ok(None)
            }
            ParseState::ReadingLength => {
                if self.length_bytes == 4 {
                    self.reset();
                    return Err(PacketError::MalformedLength);
                }
                self.length |= ((byte & 0x7F) as usize) << (7 * self.length_bytes);
                self.length_bytes += 1;

                if byte & 0x80 != 0 {
                    return Ok(None);
                }

                if self.length == 0 {
                    return self.complete();
                }
                if self.length > MAX_PACKET_SIZE {
                    log_warn!("Skipping oversized packet ({} bytes)", self.length);
                    self.state = ParseState::Discarding {
                        remaining: self.length,
                    };
                } else {
                    self.buffer.clear();
                    self.state = ParseState::ReadingBody;
                }
                Ok(None)
            }
            ParseState::ReadingBody => {
                // Cannot fail, the length was checked against the capacity
                let _ = self.buffer.push(byte);
                if self.buffer.len() == self.length {
                    return self.complete();
                }
                Ok(None)
            }
            ParseState::Discarding { remaining } => {
                if remaining <= 1 {
                    self.reset();
                    return Err(PacketError::PacketTooLarge);
                }
                self.state = ParseState::Discarding {
                    remaining: remaining - 1,
                };
                Ok(None)
            }
        }
    }

    fn complete(&mut self) -> Result<Option<Incoming>, PacketError> {
        let result = decode(self.header, &self.buffer);
        self.reset();
        result.map(Some)
    }
}

fn decode(header_byte: u8, body: &[u8]) -> Result<Incoming, PacketError> {
    match header_byte & 0xF0 {
        header::CONNACK => {
            let [flags, return_code] = fixed::<2>(body)?;
            Ok(Incoming::ConnAck {
                session_present: flags & 0x01 != 0,
                return_code,
            })
        }
        header::SUBACK => {
            let [hi, lo, return_code] = fixed::<3>(body)?;
            Ok(Incoming::SubAck {
                packet_id: u16::from_be_bytes([hi, lo]),
                return_code,
            })
        }
        header::UNSUBACK => {
            let [hi, lo] = fixed::<2>(body)?;
            Ok(Incoming::UnsubAck {
                packet_id: u16::from_be_bytes([hi, lo]),
            })
        }
        header::PINGRESP => Ok(Incoming::PingResp),
        header::PUBLISH => decode_publish(header_byte, body),
        _ => Err(PacketError::UnexpectedPacket(header_byte)),
    }
}

fn fixed<const N: usize>(body: &[u8]) -> Result<[u8; N], PacketError> {
    body.get(..N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(PacketError::Truncated)
}

fn decode_publish(header_byte: u8, body: &[u8]) -> Result<Incoming, PacketError> {
    let qos = (header_byte >> 1) & 0x03;

    let [hi, lo] = fixed::<2>(body)?;
    let topic_len = u16::from_be_bytes([hi, lo]) as usize;
    let topic_bytes = body.get(2..2 + topic_len).ok_or(PacketError::Truncated)?;
    let topic_str = core::str::from_utf8(topic_bytes).map_err(|_| PacketError::InvalidUtf8)?;

    let mut topic = Topic::new();
    topic
        .push_str(topic_str)
        .map_err(|_| PacketError::TopicTooLong)?;

    let mut offset = 2 + topic_len;
    if qos > 0 {
        // Packet identifier, unused at QoS 0 subscriptions
        offset += 2;
    }
    let payload_bytes = body.get(offset..).ok_or(PacketError::Truncated)?;
    let payload_str = core::str::from_utf8(payload_bytes).map_err(|_| PacketError::InvalidUtf8)?;

    let (payload, truncated) = telemetry::bounded(payload_str);
    if truncated {
        log_warn!("Payload on {} truncated", topic_str);
    }

    Ok(Incoming::Publish { topic, payload })
}
