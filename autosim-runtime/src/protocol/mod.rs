use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub mod frame;

/// The protocol header.
///
/// This is used to identify the protocol. The header is always the same and is
/// always present at the start of a frame. The bytes shown here are the ASCII
/// representation of the header.
const PROTO_HEADER: [u8; 3] = [b'A', b'S', b'M'];

/// The protocol version.
///
/// If the version is not the same as the expected version, the frame is
/// considered invalid. The version is only changed when the protocol is changed
/// in a way that is not backwards compatible.
const PROTO_VERSION: u8 = 0x01;

/// The minimum buffer size required to read a frame.
const MIN_BUFFER_SIZE: usize = PROTO_HEADER.len()
    + std::mem::size_of::<u8>()
    + std::mem::size_of::<u8>()
    + std::mem::size_of::<u16>()
    + 3;

/// The maximum payload size.
///
/// The maximum size of a frame is `MIN_BUFFER_SIZE + MAX_PAYLOAD_SIZE`. Frames
/// announcing a larger payload are rejected.
const MAX_PAYLOAD_SIZE: usize = 1_024;

/// A packet that can be sent over the network.
pub trait Packetize: TryFrom<Vec<u8>> + Sized {
    /// The message type of the packet.
    const MESSAGE_TYPE: u8;
    /// If the packet has a fixed size, this is the size of the packet. If the
    /// packet has a variable size, this is `None`.
    ///
    /// This is used to validate the size of the packet when receiving a packet.
    const MESSAGE_SIZE: Option<usize> = None;

    /// Convert packet to bytes.
    fn to_bytes(&self) -> Vec<u8>;
}

pub struct Stream<T> {
    inner: T,
}

impl<T> Stream<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    #[inline]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    #[inline]
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: AsyncWrite + Unpin> Stream<T> {
    pub async fn send_packet<P: Packetize>(&mut self, packet: &P) -> std::io::Result<()> {
        let payload = packet.to_bytes();
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Packet too large: {} bytes", payload.len()),
            ));
        }

        let mut frame = frame::Frame::new(P::MESSAGE_TYPE, payload.len());
        frame.put(&payload[..]);

        self.inner.write_all(frame.as_ref()).await
    }

    #[inline]
    pub async fn send_shutdown(&mut self) -> std::io::Result<()> {
        self.send_packet(&frame::Shutdown).await?;
        self.inner.flush().await
    }
}

impl<T: AsyncRead + Unpin> Stream<T> {
    pub async fn read_frame(&mut self) -> std::io::Result<frame::Frame> {
        let mut header_buffer = [0u8; MIN_BUFFER_SIZE];

        self.inner.read_exact(&mut header_buffer).await?;

        frame::Frame::try_from(&header_buffer[..]).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to parse frame: {}", e),
            )
        })
    }

    /// Skip the payload of a frame the caller has no use for.
    pub async fn discard(&mut self, size: usize) -> std::io::Result<()> {
        let mut payload_buffer = vec![0u8; size];
        self.inner.read_exact(&mut payload_buffer).await?;

        Ok(())
    }

    pub async fn recv_packet<P: Packetize>(&mut self, size: usize) -> std::io::Result<P> {
        if let Some(expected) = P::MESSAGE_SIZE {
            if size != expected {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Invalid packet size: expected {}, got {}", expected, size),
                ));
            }
        }

        let mut payload_buffer = vec![0u8; size];
        self.inner.read_exact(&mut payload_buffer).await?;

        P::try_from(payload_buffer).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "Failed to parse packet")
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::{Position, Reading};

    #[test]
    fn test_proto_header() {
        assert_eq!(PROTO_HEADER, [b'A', b'S', b'M']);
    }

    #[test]
    fn test_min_buffer_size() {
        assert_eq!(MIN_BUFFER_SIZE, 10);
    }

    #[tokio::test]
    async fn test_stream_reading() {
        let (client, server) = tokio::io::duplex(1_024);

        let reading = Reading {
            offset: Duration::from_secs(15),
            rpm: 1_450,
            speed: 31,
            fuel: 99.98,
            engine_temperature: 81,
            dtc: Some("P0133".parse().unwrap()),
            position: Position::new(59.36, 17.97, 0.0),
        };

        let mut writer = Stream::new(client);
        writer
            .send_packet(&frame::Session::new("trip".to_string()))
            .await
            .unwrap();
        writer.send_packet(&reading).await.unwrap();
        writer.send_shutdown().await.unwrap();

        let mut reader = Stream::new(server);

        let frame = reader.read_frame().await.unwrap();
        assert_eq!(frame.message, frame::Session::MESSAGE_TYPE);
        let session = reader
            .recv_packet::<frame::Session>(frame.payload_length)
            .await
            .unwrap();
        assert_eq!(session.name(), "trip");

        let frame = reader.read_frame().await.unwrap();
        assert_eq!(frame.message, Reading::MESSAGE_TYPE);
        let received = reader
            .recv_packet::<Reading>(frame.payload_length)
            .await
            .unwrap();
        assert_eq!(received, reading);

        let frame = reader.read_frame().await.unwrap();
        assert_eq!(frame.message, frame::Shutdown::MESSAGE_TYPE);
        assert_eq!(frame.payload_length, 0);
    }

    #[tokio::test]
    async fn test_stream_discard() {
        let (client, server) = tokio::io::duplex(1_024);

        let mut writer = Stream::new(client);
        writer
            .send_packet(&frame::Session::new("ignored".to_string()))
            .await
            .unwrap();
        writer.send_shutdown().await.unwrap();

        let mut reader = Stream::new(server);

        let frame = reader.read_frame().await.unwrap();
        reader.discard(frame.payload_length).await.unwrap();

        let frame = reader.read_frame().await.unwrap();
        assert_eq!(frame.message, frame::Shutdown::MESSAGE_TYPE);
    }

    #[tokio::test]
    async fn test_recv_wrong_size() {
        let (client, server) = tokio::io::duplex(1_024);

        let mut writer = Stream::new(client);
        writer
            .send_packet(&frame::Session::new("short".to_string()))
            .await
            .unwrap();

        let mut reader = Stream::new(server);
        let frame = reader.read_frame().await.unwrap();

        assert!(reader
            .recv_packet::<Reading>(frame.payload_length)
            .await
            .is_err());
    }
}
