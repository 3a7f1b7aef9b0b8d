use ansi_term::Colour::{Purple, Red, Yellow};
use autosim::{
    core::{Reading, Summary},
    protocol::{
        frame::{Session, Shutdown},
        Packetize, Stream,
    },
};
use tokio::io::AsyncRead;

fn style_session(name: &str) -> String {
    Purple.paint(format!("[{}]", name)).to_string()
}

/// Receive readings from a single simulator until it closes the stream.
pub(crate) async fn session<T: AsyncRead + Unpin>(stream: T, peer: String) -> Summary {
    let mut client = Stream::new(stream);

    let mut name = peer;
    let mut summary = Summary::default();

    loop {
        let frame = match client.read_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::UnexpectedEof {
                    log::error!("{} Failed to read frame: {}", style_session(&name), e);
                }
                break;
            }
        };

        match frame.message {
            Session::MESSAGE_TYPE => {
                match client.recv_packet::<Session>(frame.payload_length).await {
                    Ok(session) => {
                        name = session.name().to_string();
                        log::info!("{} Session started", style_session(&name));
                    }
                    Err(e) => {
                        log::error!("{} Invalid session: {}", style_session(&name), e);
                        break;
                    }
                }
            }
            Reading::MESSAGE_TYPE => {
                match client.recv_packet::<Reading>(frame.payload_length).await {
                    Ok(reading) => {
                        let label = match reading.dtc {
                            Some(_) => Red.bold().paint("Reading"),
                            None => Yellow.bold().paint("Reading"),
                        };

                        log::info!("{} {} » {}", style_session(&name), label, reading);

                        summary.push(&reading);
                    }
                    Err(e) => {
                        log::error!("{} Invalid reading: {}", style_session(&name), e);
                        break;
                    }
                }
            }
            Shutdown::MESSAGE_TYPE => {
                log::debug!("{} Simulator closed the session", style_session(&name));
                break;
            }
            message => {
                log::warn!("{} Unknown message 0x{:X}", style_session(&name), message);
                if client.discard(frame.payload_length).await.is_err() {
                    break;
                }
            }
        }
    }

    log::info!("{} Session closed\n{}", style_session(&name), summary);

    summary
}

/// Listen for simulators and log every reading received.
pub(crate) async fn listen(address: String) -> anyhow::Result<()> {
    use std::sync::Arc;
    use tokio::net::TcpListener;

    let semaphore = Arc::new(tokio::sync::Semaphore::new(
        autosim::consts::NETWORK_MAX_CLIENTS,
    ));

    let listener = TcpListener::bind(&address).await?;

    log::info!("Listening on: {}", address);

    loop {
        let (stream, addr) = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Termination requested");
                break;
            }
            accept = listener.accept() => accept?,
        };

        log::debug!("Accepted connection from: {}", addr);

        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                log::warn!("Too many connections");
                continue;
            }
        };

        tokio::spawn(async move {
            session(stream, addr.to_string()).await;
            drop(permit);
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use autosim::core::Position;
    use autosim::net::{Publisher, StreamPublisher};

    fn reading(offset: u64, dtc: Option<&str>) -> Reading {
        Reading {
            offset: Duration::from_secs(offset),
            rpm: 1_500,
            speed: 40,
            fuel: 99.0,
            engine_temperature: 88,
            dtc: dtc.map(|code| code.parse().unwrap()),
            position: Position::new(59.36, 17.97, 0.0),
        }
    }

    #[tokio::test]
    async fn test_session() {
        let (client, server) = tokio::io::duplex(4_096);

        let collector = tokio::spawn(session(server, "peer".to_string()));

        let mut publisher = StreamPublisher::start(client, "autosim-csimd/test")
            .await
            .unwrap();
        publisher.publish(&reading(0, None)).await.unwrap();
        publisher.publish(&reading(15, Some("P0300"))).await.unwrap();
        publisher.publish(&reading(30, Some("P0300"))).await.unwrap();
        publisher.close().await.unwrap();

        let summary = collector.await.unwrap();

        assert_eq!(summary.count(), 3);
        assert_eq!(summary.dtc_count, 2);
        assert_eq!(summary.last_dtc, Some("P0300".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_session_dropped() {
        let (client, server) = tokio::io::duplex(4_096);

        let collector = tokio::spawn(session(server, "peer".to_string()));

        let mut publisher = StreamPublisher::start(client, "dropped").await.unwrap();
        publisher.publish(&reading(0, None)).await.unwrap();
        drop(publisher);

        let summary = collector.await.unwrap();

        assert_eq!(summary.count(), 1);
    }
}
