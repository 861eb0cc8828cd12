//! JSON publishing and event-loop supervision.
//!
//! rumqttc only makes progress while its `EventLoop` is polled. `Publisher::start`
//! moves the event loop onto a tokio task which keeps polling, reconnects with
//! [`Backoff`] after errors, and stops when the cancellation token fires.

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, Packet, QoS};
use serde::Serialize;
use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{backoff::Backoff, client::ClientBuilder, error::TransferError};

/// Publishes serializable values as JSON payloads.
///
/// Cheap to clone; all clones share the same connection.
#[derive(Clone)]
pub struct Publisher {
    client: AsyncClient,
    qos: QoS,
    cancel: CancellationToken,
}

impl Publisher {
    /// Builds the client and spawns the event-loop driver.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        builder: ClientBuilder,
        cancel: CancellationToken,
    ) -> Result<(Self, JoinHandle<()>), TransferError> {
        let (client, event_loop) = builder.build()?;
        let driver = tokio::spawn(drive(event_loop, cancel.clone()));
        Ok((Self::from_client(client, cancel), driver))
    }

    /// Wraps an existing client. Publishes use QoS 1 without retain.
    pub fn from_client(client: AsyncClient, cancel: CancellationToken) -> Self {
        Self {
            client,
            qos: QoS::AtLeastOnce,
            cancel,
        }
    }

    /// Serializes `data` to JSON and queues it for `topic`.
    ///
    /// Never waits for queue space: while the broker is unreachable the
    /// request queue fills up and further publishes fail with
    /// [`TransferError::ClientTransfer`] until the connection recovers.
    pub async fn publish_json<T>(&self, topic: &str, data: &T) -> Result<(), TransferError>
    where
        T: Serialize + ?Sized,
    {
        let payload = serde_json::to_vec(data)?;
        debug!("Publishing {} bytes to '{}'", payload.len(), topic);
        self.client.try_publish(topic, self.qos, false, payload)?;
        Ok(())
    }

    /// Requests DISCONNECT if there is queue space and stops the event-loop driver.
    pub async fn shutdown(&self) {
        if let Err(e) = self.client.try_disconnect() {
            debug!("Disconnect request not delivered: {}", e);
        }
        self.cancel.cancel();
    }
}

/// Polls the event loop until cancelled, backing off after connection errors.
async fn drive(mut event_loop: EventLoop, cancel: CancellationToken) {
    let mut backoff = Backoff::default();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Cancellation requested, MQTT event loop stopped");
                break;
            }
            event = event_loop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        if ack.code == ConnectReturnCode::Success {
                            info!("Connected to MQTT broker");
                            backoff.reset();
                        } else {
                            warn!("Broker refused connection: {:?}", ack.code);
                        }
                    }
                    Ok(event) => {
                        debug!("MQTT event: {:?}", event);
                    }
                    Err(e) => {
                        let delay = backoff.next_sleep();
                        warn!(
                            "MQTT connection error: {} (attempt {}), retrying in {:.1}s",
                            e,
                            backoff.attempt(),
                            delay.as_secs_f64()
                        );
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = sleep(delay) => {}
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rumqttc::MqttOptions;
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Sample {
        temperature: f64,
    }

    fn client() -> (AsyncClient, EventLoop) {
        AsyncClient::new(MqttOptions::new("test_client", "localhost", 1883), 10)
    }

    #[tokio::test]
    async fn test_publish_json_queues_request() {
        let (client, _event_loop) = client();
        let publisher = Publisher::from_client(client, CancellationToken::new());

        let result = publisher
            .publish_json("sensors/bme280/garage", &Sample { temperature: 21.5 })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_publish_json_rejects_wildcard_topic() {
        let (client, _event_loop) = client();
        let publisher = Publisher::from_client(client, CancellationToken::new());

        let result = publisher
            .publish_json("sensors/#", &Sample { temperature: 21.5 })
            .await;
        assert!(matches!(result, Err(TransferError::ClientTransfer(_))));
    }

    #[tokio::test]
    async fn test_publish_fails_after_event_loop_dropped() {
        let (client, event_loop) = client();
        drop(event_loop);
        let publisher = Publisher::from_client(client, CancellationToken::new());

        let result = publisher
            .publish_json("sensors/bme280/garage", &Sample { temperature: 21.5 })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_full_queue_does_not_block() {
        let cancel = CancellationToken::new();
        let builder = ClientBuilder::from_url("test_client", "tcp://127.0.0.1:1", 10).unwrap();
        let (publisher, driver) = Publisher::start(builder, cancel.clone()).unwrap();

        let mut failed = 0;
        for _ in 0..15 {
            let result = tokio::time::timeout(
                Duration::from_secs(1),
                publisher.publish_json("sensors/bme280/garage", &Sample { temperature: 21.5 }),
            )
            .await
            .expect("publish must not wait for queue space");
            if result.is_err() {
                failed += 1;
            }
        }
        assert!(failed > 0, "publishes beyond the queue capacity should fail");

        tokio::time::timeout(Duration::from_secs(1), publisher.shutdown())
            .await
            .expect("shutdown must not wait for queue space");
        let joined = tokio::time::timeout(Duration::from_secs(5), driver).await;
        assert!(joined.is_ok(), "driver should stop after shutdown");
    }

    #[tokio::test]
    async fn test_driver_stops_on_cancel() {
        let cancel = CancellationToken::new();
        let builder = ClientBuilder::from_url("test_client", "tcp://127.0.0.1:1", 10).unwrap();
        let (publisher, driver) = Publisher::start(builder, cancel.clone()).unwrap();

        publisher.shutdown().await;

        let joined = tokio::time::timeout(Duration::from_secs(5), driver).await;
        assert!(joined.is_ok(), "driver should stop after cancellation");
    }
}
