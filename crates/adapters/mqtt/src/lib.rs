//! # feedbridge-adapter-mqtt
//!
//! Remote store backed by retained MQTT topics.
//!
//! ## Responsibilities
//! - Map every store path to the topic `<base_topic>/<path>`
//! - Publish writes as retained JSON payloads (QoS 1)
//! - Run the rumqttc event loop in the background, re-subscribing to every
//!   tracked topic after each (re)connect
//! - Serve reads from the retained values received this session
//!
//! Reads and writes fail with [`MqttError::NotConnected`] when the broker
//! cannot be reached within the request timeout, so callers can fall back
//! to their local cache.
//!
//! ## Dependency rule
//! Depends on `feedbridge-app` (port traits) and `feedbridge-domain` only.

pub mod config;
pub mod error;
mod topics;

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use serde_json::Value;
use tokio::task::JoinHandle;

use feedbridge_app::ports::{RemoteStore, Subscription};
use feedbridge_domain::error::FeedBridgeError;

pub use config::MqttConfig;
pub use error::MqttError;

use topics::Topics;

/// Capacity of the rumqttc request channel.
const REQUEST_CAPACITY: usize = 20;

/// Delay before the event loop retries after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// [`RemoteStore`] implementation over an MQTT broker.
pub struct MqttStore {
    client: AsyncClient,
    config: MqttConfig,
    topics: Arc<Topics>,
    driver: JoinHandle<()>,
}

impl MqttStore {
    /// Start the client and subscribe to `paths` once connected.
    ///
    /// Must be called from within a Tokio runtime; the connection itself is
    /// established in the background.
    pub fn connect<'a>(config: MqttConfig, paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(config.keep_alive());

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let topics = Arc::new(Topics::default());
        for path in paths {
            topics.track(&config.topic(path));
        }

        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            base_topic = %config.base_topic,
            "connecting to MQTT broker"
        );
        let driver = tokio::spawn(drive(eventloop, client.clone(), Arc::clone(&topics)));

        Self {
            client,
            config,
            topics,
            driver,
        }
    }

    /// Whether the broker connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.topics.is_connected()
    }

    /// Wait up to the request timeout for the broker connection.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::NotConnected`] when the timeout elapses first.
    pub async fn wait_connected(&self) -> Result<(), MqttError> {
        let mut connection = self.topics.connection();
        let connected = tokio::time::timeout(
            self.config.request_timeout(),
            connection.wait_for(|up| *up),
        )
        .await
        .is_ok_and(|res| res.is_ok());
        if connected {
            Ok(())
        } else {
            Err(MqttError::NotConnected)
        }
    }

    /// Send a clean disconnect to the broker.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Client`] when the request could not be queued.
    pub async fn disconnect(&self) -> Result<(), MqttError> {
        self.client.disconnect().await.map_err(MqttError::Client)
    }

    async fn ensure_subscribed(&self, topic: &str) -> Result<(), MqttError> {
        if self.topics.track(topic) && self.topics.is_connected() {
            self.client
                .subscribe(topic, QoS::AtLeastOnce)
                .await
                .map_err(MqttError::Client)?;
        }
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<Value>, MqttError> {
        let topic = self.config.topic(path);
        self.ensure_subscribed(&topic).await?;
        self.wait_connected().await?;

        let deadline = tokio::time::Instant::now() + self.config.request_timeout();
        loop {
            let arrival = self.topics.arrival();
            if let Some(known) = self.topics.cached(&topic) {
                return Ok(known);
            }
            if tokio::time::timeout_at(deadline, arrival).await.is_err() {
                tracing::debug!(%topic, "no retained value on topic");
                self.topics.mark_absent(&topic);
                return Ok(None);
            }
        }
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), MqttError> {
        let topic = self.config.topic(path);
        self.ensure_subscribed(&topic).await?;
        if !self.topics.is_connected() {
            return Err(MqttError::NotConnected);
        }
        let payload = serde_json::to_vec(&value).map_err(MqttError::PayloadEncode)?;
        self.client
            .publish(topic.as_str(), QoS::AtLeastOnce, true, payload)
            .await
            .map_err(MqttError::Client)?;
        self.topics.on_local_set(&topic, &value);
        tracing::debug!(%topic, %value, "published");
        Ok(())
    }
}

impl Drop for MqttStore {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

impl RemoteStore for MqttStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, FeedBridgeError> {
        Ok(self.read(path).await?)
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), FeedBridgeError> {
        Ok(self.write(path, value).await?)
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription, FeedBridgeError> {
        let topic = self.config.topic(path);
        let rx = self.topics.watch(&topic);
        self.ensure_subscribed(&topic).await?;
        Ok(rx)
    }
}

/// Poll the rumqttc event loop forever, tracking the connection state.
async fn drive(mut eventloop: EventLoop, client: AsyncClient, topics: Arc<Topics>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("mqtt connected");
                topics.on_connected();
                for topic in topics.tracked() {
                    if let Err(err) = client.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
                        tracing::error!(%topic, %err, "subscribe failed");
                    }
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let topic = String::from_utf8_lossy(publish.topic.as_ref());
                topics.on_publish(&topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::warn!("mqtt disconnected by broker");
                topics.on_disconnected();
            }
            Ok(_) => {}
            Err(err) => {
                if topics.is_connected() {
                    tracing::warn!(%err, "mqtt connection lost");
                } else {
                    tracing::debug!(%err, "mqtt connection attempt failed");
                }
                topics.on_disconnected();
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
