use bytes::{BufMut, BytesMut};

use super::{MAX_PAYLOAD_SIZE, MIN_BUFFER_SIZE, PROTO_HEADER, PROTO_VERSION};

pub enum FrameError {
    FrameTooSmall,
    InvalidHeader,
    VersionMismatch(u8),
    ExcessivePayloadLength(usize),
    InvalidPadding,
    InvalidPayload,
}

impl std::error::Error for FrameError {}

impl std::fmt::Debug for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::FrameTooSmall => write!(f, "FrameTooSmall"),
            Self::InvalidHeader => write!(f, "InvalidHeader"),
            Self::VersionMismatch(got) => write!(f, "VersionMismatch({})", got),
            Self::ExcessivePayloadLength(len) => write!(f, "ExcessivePayloadLength({})", len),
            Self::InvalidPadding => write!(f, "InvalidPadding"),
            Self::InvalidPayload => write!(f, "InvalidPayload"),
        }
    }
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::FrameTooSmall => write!(f, "frame too small"),
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::VersionMismatch(got) => write!(f, "version mismatch: {}", got),
            Self::ExcessivePayloadLength(len) => write!(f, "excessive payload length: {}", len),
            Self::InvalidPadding => write!(f, "invalid padding"),
            Self::InvalidPayload => write!(f, "invalid payload"),
        }
    }
}

enum FrameMessage {
    Session = 0x10,
    Shutdown = 0x11,
}

pub struct Frame {
    buffer: BytesMut,
    pub message: u8,
    pub payload_length: usize,
}

impl Frame {
    pub fn new(message: u8, payload_length: usize) -> Self {
        let mut buffer = BytesMut::with_capacity(MIN_BUFFER_SIZE + payload_length);

        buffer.put(&PROTO_HEADER[..]);
        buffer.put_u8(PROTO_VERSION);
        buffer.put_u8(message);
        buffer.put_u16(payload_length as u16);
        buffer.put(&[0u8; 3][..]);

        Self {
            buffer,
            message,
            payload_length,
        }
    }

    #[inline]
    pub fn put(&mut self, payload: &[u8]) {
        self.buffer.put(payload);
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> std::result::Result<Self, Self::Error> {
        if buffer.len() < MIN_BUFFER_SIZE {
            Err(FrameError::FrameTooSmall)?
        }

        if buffer[0..3] != PROTO_HEADER[..] {
            Err(FrameError::InvalidHeader)?
        }

        let version = buffer[3];
        if version != PROTO_VERSION {
            Err(FrameError::VersionMismatch(version))?
        }

        let payload_length = u16::from_be_bytes([buffer[5], buffer[6]]) as usize;
        if payload_length > MAX_PAYLOAD_SIZE {
            Err(FrameError::ExcessivePayloadLength(payload_length))?
        }

        if buffer[7..10] != [0u8; 3] {
            Err(FrameError::InvalidPadding)?
        }

        Ok(Self::new(buffer[4], payload_length))
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.buffer[..]
    }
}

/// Opens a stream of readings. The name identifies the trip to the collector.
pub struct Session {
    name: String,
}

impl Session {
    /// Maximum session name length in characters.
    pub const MAX_NAME_LENGTH: usize = 64;

    pub fn new(name: String) -> Self {
        Self {
            name: name.chars().take(Self::MAX_NAME_LENGTH).collect::<String>(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TryFrom<Vec<u8>> for Session {
    type Error = FrameError;

    fn try_from(buffer: Vec<u8>) -> Result<Self, Self::Error> {
        let name = String::from_utf8(buffer).map_err(|_| FrameError::InvalidPayload)?;

        Ok(Self::new(name))
    }
}

impl super::Packetize for Session {
    const MESSAGE_TYPE: u8 = FrameMessage::Session as u8;

    fn to_bytes(&self) -> Vec<u8> {
        self.name.as_bytes().to_vec()
    }
}

/// Closes a stream of readings.
pub struct Shutdown;

impl TryFrom<Vec<u8>> for Shutdown {
    type Error = FrameError;

    fn try_from(_value: Vec<u8>) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}

impl super::Packetize for Shutdown {
    const MESSAGE_TYPE: u8 = FrameMessage::Shutdown as u8;
    const MESSAGE_SIZE: Option<usize> = Some(0);

    fn to_bytes(&self) -> Vec<u8> {
        vec![]
    }
}
