//! Outbound packet encoding and remaining-length codec

use super::header;

/// MQTT 3.1.1 protocol level
pub const PROTOCOL_LEVEL: u8 = 4;

/// Largest value representable in four remaining-length bytes
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;

const PROTOCOL_NAME: &[u8] = b"MQTT";

const FLAG_CLEAN_SESSION: u8 = 0x02;
const FLAG_PASSWORD: u8 = 0x40;
const FLAG_USERNAME: u8 = 0x80;

/// Errors that can occur during packet encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Remaining length uses more than four bytes
    MalformedLength,
    /// Inbound packet exceeds the parser buffer
    PacketTooLarge,
    /// String field is not valid UTF-8
    InvalidUtf8,
    /// Topic does not fit the topic buffer
    TopicTooLong,
    /// String field longer than 65535 bytes
    StringTooLong,
    /// Body shorter than its fields require
    Truncated,
    /// Packet type a client never receives
    UnexpectedPacket(u8),
}

/// Encode `len` as a remaining-length field
///
/// Returns the number of bytes written (1-4).
pub fn encode_remaining_length(mut len: usize, buffer: &mut [u8]) -> Result<usize, PacketError> {
    if len > MAX_REMAINING_LENGTH {
        return Err(PacketError::MalformedLength);
    }

    let mut written = 0;
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        *buffer.get_mut(written).ok_or(PacketError::BufferTooSmall)? = byte;
        written += 1;
        if len == 0 {
            return Ok(written);
        }
    }
}

/// Decode a remaining-length field from the start of `bytes`
///
/// Returns `Ok(None)` if `bytes` ends before the field does, otherwise the
/// value and the number of bytes consumed.
pub fn decode_remaining_length(bytes: &[u8]) -> Result<Option<(usize, usize)>, PacketError> {
    let mut value = 0usize;
    for (i, &byte) in bytes.iter().enumerate() {
        if i == 4 {
            return Err(PacketError::MalformedLength);
        }
        value |= ((byte & 0x7F) as usize) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    if bytes.len() >= 4 {
        return Err(PacketError::MalformedLength);
    }
    Ok(None)
}

/// CONNECT parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connect<'a> {
    pub client_id: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub keep_alive_s: u16,
}

/// A packet the client sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outgoing<'a> {
    Connect(Connect<'a>),
    Subscribe { packet_id: u16, topic: &'a str },
    Unsubscribe { packet_id: u16, topic: &'a str },
    /// QoS 0, never retained
    Publish { topic: &'a str, payload: &'a [u8] },
    PingReq,
    Disconnect,
}

impl Outgoing<'_> {
    /// Encode this packet into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, PacketError> {
        let body_len = self.body_len()?;

        let mut length_bytes = [0u8; 4];
        let length_len = encode_remaining_length(body_len, &mut length_bytes)?;

        let mut writer = Writer::new(buffer);
        writer.put_u8(self.header())?;
        writer.put_bytes(&length_bytes[..length_len])?;

        match *self {
            Outgoing::Connect(connect) => {
                let mut flags = FLAG_CLEAN_SESSION;
                if connect.username.is_some() {
                    flags |= FLAG_USERNAME;
                }
                if connect.password.is_some() {
                    flags |= FLAG_PASSWORD;
                }

                writer.put_str(PROTOCOL_NAME)?;
                writer.put_u8(PROTOCOL_LEVEL)?;
                writer.put_u8(flags)?;
                writer.put_u16(connect.keep_alive_s)?;
                writer.put_str(connect.client_id.as_bytes())?;
                if let Some(username) = connect.username {
                    writer.put_str(username.as_bytes())?;
                }
                if let Some(password) = connect.password {
                    writer.put_str(password.as_bytes())?;
                }
            }
            Outgoing::Subscribe { packet_id, topic } => {
                writer.put_u16(packet_id)?;
                writer.put_str(topic.as_bytes())?;
                // Requested QoS
                writer.put_u8(0)?;
            }
            Outgoing::Unsubscribe { packet_id, topic } => {
                writer.put_u16(packet_id)?;
                writer.put_str(topic.as_bytes())?;
            }
            Outgoing::Publish { topic, payload } => {
                writer.put_str(topic.as_bytes())?;
                writer.put_bytes(payload)?;
            }
            Outgoing::PingReq | Outgoing::Disconnect => {}
        }

        Ok(writer.pos)
    }

    fn header(&self) -> u8 {
        match self {
            Outgoing::Connect(_) => header::CONNECT,
            Outgoing::Subscribe { .. } => header::SUBSCRIBE,
            Outgoing::Unsubscribe { .. } => header::UNSUBSCRIBE,
            Outgoing::Publish { .. } => header::PUBLISH,
            Outgoing::PingReq => header::PINGREQ,
            Outgoing::Disconnect => header::DISCONNECT,
        }
    }

    fn body_len(&self) -> Result<usize, PacketError> {
        let len = match *self {
            Outgoing::Connect(connect) => {
                // Protocol name, level, flags, keep-alive
                let mut len = str_len(PROTOCOL_NAME)? + 4;
                len += str_len(connect.client_id.as_bytes())?;
                if let Some(username) = connect.username {
                    len += str_len(username.as_bytes())?;
                }
                if let Some(password) = connect.password {
                    len += str_len(password.as_bytes())?;
                }
                len
            }
            Outgoing::Subscribe { topic, .. } => 2 + str_len(topic.as_bytes())? + 1,
            Outgoing::Unsubscribe { topic, .. } => 2 + str_len(topic.as_bytes())?,
            Outgoing::Publish { topic, payload } => str_len(topic.as_bytes())? + payload.len(),
            Outgoing::PingReq | Outgoing::Disconnect => 0,
        };
        Ok(len)
    }
}

/// Encoded size of a length-prefixed string
fn str_len(bytes: &[u8]) -> Result<usize, PacketError> {
    if bytes.len() > u16::MAX as usize {
        return Err(PacketError::StringTooLong);
    }
    Ok(2 + bytes.len())
}

struct Writer<'b> {
    buffer: &'b mut [u8],
    pos: usize,
}

impl<'b> Writer<'b> {
    fn new(buffer: &'b mut [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    fn put_u8(&mut self, byte: u8) -> Result<(), PacketError> {
        self.put_bytes(&[byte])
    }

    fn put_u16(&mut self, value: u16) -> Result<(), PacketError> {
        self.put_bytes(&value.to_be_bytes())
    }

    fn put_str(&mut self, bytes: &[u8]) -> Result<(), PacketError> {
        str_len(bytes)?;
        self.put_u16(bytes.len() as u16)?;
        self.put_bytes(bytes)
    }

    fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), PacketError> {
        let end = self.pos + bytes.len();
        self.buffer
            .get_mut(self.pos..end)
            .ok_or(PacketError::BufferTooSmall)?
            .copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_connect() {
        let packet = Outgoing::Connect(Connect {
            client_id: "G86-INFO",
            username: Some("public"),
            password: Some("public"),
            keep_alive_s: 60,
        });
        let mut buffer = [0u8; 64];
        let len = packet.encode(&mut buffer).unwrap();

        // 10 fixed + 10 client id + 8 + 8 credentials
        assert_eq!(len, 2 + 36);
        assert_eq!(buffer[0], header::CONNECT);
        assert_eq!(buffer[1], 36);
        assert_eq!(&buffer[2..8], b"\x00\x04MQTT");
        assert_eq!(buffer[8], PROTOCOL_LEVEL);
        assert_eq!(buffer[9], 0xC2); // username, password, clean session
        assert_eq!(&buffer[10..12], &[0, 60]);
        assert_eq!(&buffer[12..22], b"\x00\x08G86-INFO");
    }

    #[test]
    fn test_encode_connect_anonymous() {
        let packet = Outgoing::Connect(Connect {
            client_id: "c",
            username: None,
            password: None,
            keep_alive_s: 0,
        });
        let mut buffer = [0u8; 32];
        let len = packet.encode(&mut buffer).unwrap();

        assert_eq!(len, 2 + 13);
        assert_eq!(buffer[9], FLAG_CLEAN_SESSION);
    }

    #[test]
    fn test_encode_subscribe() {
        let packet = Outgoing::Subscribe {
            packet_id: 7,
            topic: "/GOLF86/ECU/RPM",
        };
        let mut buffer = [0u8; 32];
        let len = packet.encode(&mut buffer).unwrap();

        assert_eq!(len, 2 + 2 + 17 + 1);
        assert_eq!(buffer[0], header::SUBSCRIBE);
        assert_eq!(buffer[1], 20);
        assert_eq!(&buffer[2..4], &[0, 7]);
        assert_eq!(&buffer[4..6], &[0, 15]);
        assert_eq!(buffer[len - 1], 0);
    }

    #[test]
    fn test_encode_unsubscribe() {
        let packet = Outgoing::Unsubscribe {
            packet_id: 0x0102,
            topic: "a/b",
        };
        let mut buffer = [0u8; 16];
        let len = packet.encode(&mut buffer).unwrap();

        assert_eq!(&buffer[..len], &[0xA2, 7, 1, 2, 0, 3, b'a', b'/', b'b']);
    }

    #[test]
    fn test_encode_publish() {
        let packet = Outgoing::Publish {
            topic: "/GOLF86/TM1/started",
            payload: b"true",
        };
        let mut buffer = [0u8; 32];
        let len = packet.encode(&mut buffer).unwrap();

        assert_eq!(len, 2 + 2 + 19 + 4);
        assert_eq!(buffer[0], header::PUBLISH);
        assert_eq!(&buffer[len - 4..len], b"true");
    }

    #[test]
    fn test_encode_ping_and_disconnect() {
        let mut buffer = [0u8; 2];
        assert_eq!(Outgoing::PingReq.encode(&mut buffer), Ok(2));
        assert_eq!(buffer, [0xC0, 0]);
        assert_eq!(Outgoing::Disconnect.encode(&mut buffer), Ok(2));
        assert_eq!(buffer, [0xE0, 0]);
    }

    #[test]
    fn test_buffer_too_small() {
        let packet = Outgoing::Publish {
            topic: "/GOLF86/TM1/value",
            payload: b"00-00-00:000",
        };
        let mut buffer = [0u8; 8];
        assert_eq!(packet.encode(&mut buffer), Err(PacketError::BufferTooSmall));
    }

    #[test]
    fn test_remaining_length_boundaries() {
        let mut buffer = [0u8; 4];
        assert_eq!(encode_remaining_length(127, &mut buffer), Ok(1));
        assert_eq!(buffer[0], 0x7F);
        assert_eq!(encode_remaining_length(128, &mut buffer), Ok(2));
        assert_eq!(&buffer[..2], &[0x80, 0x01]);
        assert_eq!(encode_remaining_length(MAX_REMAINING_LENGTH, &mut buffer), Ok(4));
        assert_eq!(
            encode_remaining_length(MAX_REMAINING_LENGTH + 1, &mut buffer),
            Err(PacketError::MalformedLength)
        );
    }

    #[test]
    fn test_decode_remaining_length_partial() {
        assert_eq!(decode_remaining_length(&[]), Ok(None));
        assert_eq!(decode_remaining_length(&[0x80]), Ok(None));
        assert_eq!(decode_remaining_length(&[0x80, 0x01, 0xFF]), Ok(Some((128, 2))));
        assert_eq!(
            decode_remaining_length(&[0xFF, 0xFF, 0xFF, 0xFF, 0x01]),
            Err(PacketError::MalformedLength)
        );
    }

    proptest! {
        #[test]
        fn test_remaining_length_codec(len in 0usize..=MAX_REMAINING_LENGTH) {
            let mut buffer = [0u8; 4];
            let written = encode_remaining_length(len, &mut buffer).unwrap();
            prop_assert_eq!(
                decode_remaining_length(&buffer[..written]),
                Ok(Some((len, written)))
            );
        }
    }
}
