//! MQTT 3.1.1 client subset
//!
//! Just enough of the protocol for a QoS 0 telemetry client: connect,
//! subscribe, unsubscribe, publish and keep-alive. Inbound packets are
//! parsed incrementally from the socket byte stream.
//!
//! Packet format:
//! - HEADER (1 byte): packet type (high nibble) and flags (low nibble)
//! - REMAINING LENGTH (1-4 bytes): 7 bits per byte, high bit = continuation
//! - BODY (REMAINING LENGTH bytes): variable header and payload

mod packet;
mod parser;

pub use packet::{
    decode_remaining_length, encode_remaining_length, Connect, Outgoing, PacketError,
    MAX_REMAINING_LENGTH, PROTOCOL_LEVEL,
};
pub use parser::{Incoming, PacketParser, MAX_PACKET_SIZE};

/// Packet type headers
pub mod header {
    pub const CONNECT: u8 = 0x10;
    pub const CONNACK: u8 = 0x20;
    pub const PUBLISH: u8 = 0x30;
    pub const SUBSCRIBE: u8 = 0x82;
    pub const SUBACK: u8 = 0x90;
    pub const UNSUBSCRIBE: u8 = 0xA2;
    pub const UNSUBACK: u8 = 0xB0;
    pub const PINGREQ: u8 = 0xC0;
    pub const PINGRESP: u8 = 0xD0;
    pub const DISCONNECT: u8 = 0xE0;
}

/// CONNACK return code for an accepted connection
pub const CONNECTION_ACCEPTED: u8 = 0x00;

/// SUBACK return code for a rejected subscription
pub const SUBSCRIPTION_FAILURE: u8 = 0x80;
