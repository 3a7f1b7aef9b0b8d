use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::core::Reading;
use crate::protocol::{frame, Stream};

/// Sink for simulation readings.
///
/// A failed publish is reported to the caller and never ends the trip.
#[async_trait::async_trait]
pub trait Publisher: Send {
    /// Publish a single reading.
    async fn publish(&mut self, reading: &Reading) -> io::Result<()>;

    /// Release the sink after the last reading.
    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl<P: Publisher + ?Sized> Publisher for Box<P> {
    async fn publish(&mut self, reading: &Reading) -> io::Result<()> {
        (**self).publish(reading).await
    }

    async fn close(&mut self) -> io::Result<()> {
        (**self).close().await
    }
}

/// Publisher writing every reading to the log.
///
/// Used when no other sink is configured.
#[derive(Default)]
pub struct LogPublisher;

#[async_trait::async_trait]
impl Publisher for LogPublisher {
    async fn publish(&mut self, reading: &Reading) -> io::Result<()> {
        debug!("No sink configured, skipping send of {}", reading);

        Ok(())
    }
}

/// Publisher sending readings as frames over a byte stream.
pub struct StreamPublisher<T> {
    stream: Stream<T>,
}

impl<T: AsyncWrite + Unpin + Send> StreamPublisher<T> {
    /// Open a session on the stream.
    pub async fn start(inner: T, session_name: impl ToString) -> io::Result<Self> {
        let mut stream = Stream::new(inner);

        stream
            .send_packet(&frame::Session::new(session_name.to_string()))
            .await?;

        Ok(Self { stream })
    }
}

#[async_trait::async_trait]
impl<T: AsyncWrite + Unpin + Send> Publisher for StreamPublisher<T> {
    async fn publish(&mut self, reading: &Reading) -> io::Result<()> {
        self.stream.send_packet(reading).await?;
        self.stream.inner_mut().flush().await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.stream.send_shutdown().await?;
        self.stream.inner_mut().shutdown().await
    }
}
