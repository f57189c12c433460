//! MQTT session task
//!
//! One TCP session to the broker carries both panels' subscriptions and
//! the timer status publications. Inbound telemetry is formatted once and
//! routed by topic: the dot-matrix panel gets it through
//! [`PRIMARY_MESSAGE`], the 7-segment panel through the shared message slot.

use core::convert::Infallible;

use defmt::*;
use embassy_futures::select::{select3, select4, Either3, Either4};
use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::{TcpReader, TcpSocket, TcpWriter};
use embassy_net::{IpAddress, IpEndpoint, Ipv4Address, Stack};
use embassy_time::{with_timeout, Duration, Instant, Timer};
use embedded_io_async::Write;
use heapless::String;
use portable_atomic::Ordering;

use g86_core::config::{DeviceConfig, MAX_SERVER_LEN};
use g86_core::routing::{SubscriptionDiff, Subscriptions, TelemetryRouter};
use g86_protocol::mqtt::{
    Connect, Incoming, Outgoing, PacketError, PacketParser, CONNECTION_ACCEPTED,
    SUBSCRIPTION_FAILURE,
};
use g86_protocol::{Topic, DEFAULT_BASE};

use crate::channels::{
    SubscriptionChange, DROPPED_PUBLICATIONS, MQTT_ONLINE, PRIMARY_MESSAGE,
    PUBLISH_CHANNEL, SHARED, SUBSCRIPTION_CHANNEL,
};

pub const CLIENT_ID: &str = "G86-INFO";
const USERNAME: &str = "public";
const PASSWORD: &str = "public";

pub const CONNECT_ATTEMPTS: u32 = 20;
pub const CONNECT_RETRY_DELAY_MS: u64 = 1000;
pub const RECONNECT_INTERVAL_MS: u64 = 5000;
pub const KEEP_ALIVE_S: u16 = 60;

const CONNACK_TIMEOUT_MS: u64 = 5000;
const SOCKET_BUFFER_SIZE: usize = 1024;
const PACKET_BUFFER_SIZE: usize = 256;
const READ_CHUNK_SIZE: usize = 128;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// Broker host did not resolve
    Dns,
    /// TCP connect attempts exhausted
    Connect,
    /// Read or write failed, or the broker closed the connection
    Socket,
    /// Packet encode or decode failed
    Protocol(PacketError),
    /// CONNACK carried a non-zero return code
    Refused(u8),
    /// No CONNACK, or nothing heard for one and a half keep-alive periods
    Timeout,
}

impl From<PacketError> for SessionError {
    fn from(e: PacketError) -> Self {
        SessionError::Protocol(e)
    }
}

/// Broker address from the device config
pub struct Broker {
    pub host: String<MAX_SERVER_LEN>,
    pub port: u16,
}

impl Broker {
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            host: config.mqtt_server.clone(),
            port: config.mqtt_port,
        }
    }
}

#[embassy_executor::task]
pub async fn mqtt_task(stack: Stack<'static>, broker: Broker, subscriptions: Subscriptions) {
    info!("MQTT task started");

    let mut rx_buffer = [0u8; SOCKET_BUFFER_SIZE];
    let mut tx_buffer = [0u8; SOCKET_BUFFER_SIZE];
    let mut router = TelemetryRouter::new(subscriptions);

    loop {
        stack.wait_config_up().await;

        let result = run_session(stack, &broker, &mut rx_buffer, &mut tx_buffer, &mut router).await;
        match result {
            Ok(never) => match never {},
            Err(e) => warn!("MQTT session ended: {:?}", e),
        }
        MQTT_ONLINE.signal(false);

        info!("Reconnecting in {} ms", RECONNECT_INTERVAL_MS);
        offline_wait(&mut router, RECONNECT_INTERVAL_MS).await;
    }
}

/// Sleep while discarding publications and tracking subscription changes
async fn offline_wait(router: &mut TelemetryRouter, duration_ms: u64) {
    let deadline = Instant::now() + Duration::from_millis(duration_ms);
    loop {
        match select3(
            Timer::at(deadline),
            PUBLISH_CHANNEL.receive(),
            SUBSCRIPTION_CHANNEL.receive(),
        )
        .await
        {
            Either3::First(()) => return,
            Either3::Second(publication) => {
                debug!("Offline, dropped {} publication", publication.status.suffix());
            }
            Either3::Third(change) => {
                // Re-issued in full on the next connect
                router.change(change.panel, change.topic);
            }
        }
    }
}

async fn resolve(stack: Stack<'static>, host: &str) -> Result<IpAddress, SessionError> {
    if let Ok(address) = host.parse::<Ipv4Address>() {
        return Ok(IpAddress::Ipv4(address));
    }
    let addresses = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(|e| {
            warn!("DNS lookup of {} failed: {:?}", host, e);
            SessionError::Dns
        })?;
    addresses.first().copied().ok_or(SessionError::Dns)
}

async fn run_session(
    stack: Stack<'static>,
    broker: &Broker,
    rx_buffer: &mut [u8],
    tx_buffer: &mut [u8],
    router: &mut TelemetryRouter,
) -> Result<Infallible, SessionError> {
    let address = resolve(stack, &broker.host).await?;
    let endpoint = IpEndpoint::new(address, broker.port);

    let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
    let mut attempt = 0;
    loop {
        attempt += 1;
        info!(
            "Connecting to {}:{} (attempt {}/{})",
            broker.host.as_str(),
            broker.port,
            attempt,
            CONNECT_ATTEMPTS
        );
        match socket.connect(endpoint).await {
            Ok(()) => break,
            Err(e) => {
                warn!("TCP connect failed: {:?}", e);
                socket.abort();
                if attempt >= CONNECT_ATTEMPTS {
                    return Err(SessionError::Connect);
                }
                offline_wait(&mut router, CONNECT_RETRY_DELAY_MS).await;
            }
        }
    }

    let (reader, writer) = socket.split();
    let mut session = Session {
        reader,
        writer,
        parser: PacketParser::new(),
        next_packet_id: 1,
        last_sent: Instant::now(),
        last_received: Instant::now(),
    };

    session.handshake().await?;
    info!("MQTT connected as {}", CLIENT_ID);
    MQTT_ONLINE.signal(true);

    for topic in router.subscriptions().distinct() {
        session.subscribe(topic).await?;
    }

    session.run(router).await
}

/// A connected broker session
struct Session<'a> {
    reader: TcpReader<'a>,
    writer: TcpWriter<'a>,
    parser: PacketParser,
    next_packet_id: u16,
    last_sent: Instant,
    last_received: Instant,
}

impl Session<'_> {
    async fn send(&mut self, packet: Outgoing<'_>) -> Result<(), SessionError> {
        let mut buffer = [0u8; PACKET_BUFFER_SIZE];
        let len = packet.encode(&mut buffer)?;
        self.writer
            .write_all(&buffer[..len])
            .await
            .map_err(|_| SessionError::Socket)?;
        self.last_sent = Instant::now();
        Ok(())
    }

    fn packet_id(&mut self) -> u16 {
        let id = self.next_packet_id;
        self.next_packet_id = self.next_packet_id.wrapping_add(1).max(1);
        id
    }

    async fn subscribe(&mut self, topic: &Topic) -> Result<(), SessionError> {
        let packet_id = self.packet_id();
        debug!("SUBSCRIBE {} ({})", topic.as_str(), packet_id);
        self.send(Outgoing::Subscribe {
            packet_id,
            topic: topic.as_str(),
        })
        .await
    }

    async fn unsubscribe(&mut self, topic: &Topic) -> Result<(), SessionError> {
        let packet_id = self.packet_id();
        debug!("UNSUBSCRIBE {} ({})", topic.as_str(), packet_id);
        self.send(Outgoing::Unsubscribe {
            packet_id,
            topic: topic.as_str(),
        })
        .await
    }

    /// Read until one packet is complete
    async fn read_packet(&mut self) -> Result<Incoming, SessionError> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte).await {
                Ok(0) | Err(_) => return Err(SessionError::Socket),
                Ok(_) => {}
            }
            if let Some(packet) = self.parser.feed(byte[0])? {
                return Ok(packet);
            }
        }
    }

    async fn handshake(&mut self) -> Result<(), SessionError> {
        self.send(Outgoing::Connect(Connect {
            client_id: CLIENT_ID,
            username: Some(USERNAME),
            password: Some(PASSWORD),
            keep_alive_s: KEEP_ALIVE_S,
        }))
        .await?;

        let reply = with_timeout(
            Duration::from_millis(CONNACK_TIMEOUT_MS),
            self.read_packet(),
        )
        .await
        .map_err(|_| SessionError::Timeout)??;

        match reply {
            Incoming::ConnAck { return_code, .. } if return_code == CONNECTION_ACCEPTED => {
                self.last_received = Instant::now();
                Ok(())
            }
            Incoming::ConnAck { return_code, .. } => Err(SessionError::Refused(return_code)),
            _ => Err(SessionError::Protocol(PacketError::UnexpectedPacket(0))),
        }
    }

    async fn run(&mut self, router: &mut TelemetryRouter) -> Result<Infallible, SessionError> {
        let keep_alive = Duration::from_secs(KEEP_ALIVE_S as u64);
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let ping_at = self.last_sent + keep_alive / 2;
            let event = select4(
                self.reader.read(&mut chunk),
                PUBLISH_CHANNEL.receive(),
                SUBSCRIPTION_CHANNEL.receive(),
                Timer::at(ping_at),
            )
            .await;

            match event {
                Either4::First(Ok(0)) | Either4::First(Err(_)) => {
                    return Err(SessionError::Socket);
                }
                Either4::First(Ok(n)) => {
                    self.last_received = Instant::now();
                    for &byte in &chunk[..n] {
                        match self.parser.feed(byte) {
                            Ok(Some(packet)) => self.handle(packet, router).await,
                            Ok(None) => {}
                            Err(e) => warn!("Dropped inbound packet: {:?}", e),
                        }
                    }
                }
                Either4::Second(publication) => {
                    let topic = match publication.topic(DEFAULT_BASE) {
                        Ok(topic) => topic,
                        Err(e) => {
                            warn!("Unpublishable timer status: {:?}", e);
                            continue;
                        }
                    };
                    self.send(Outgoing::Publish {
                        topic: topic.as_str(),
                        payload: publication.payload().as_bytes(),
                    })
                    .await?;
                }
                Either4::Third(change) => self.resubscribe(change, router).await?,
                Either4::Fourth(()) => {
                    if self.last_received.elapsed() > keep_alive + keep_alive / 2 {
                        return Err(SessionError::Timeout);
                    }
                    let dropped = DROPPED_PUBLICATIONS.swap(0, Ordering::Relaxed);
                    if dropped > 0 {
                        warn!("{} publications dropped, queue full", dropped);
                    }
                    trace!("PINGREQ");
                    self.send(Outgoing::PingReq).await?;
                }
            }
        }
    }

    async fn handle(&mut self, packet: Incoming, router: &mut TelemetryRouter) {
        match packet {
            Incoming::Publish { topic, payload } => {
                let now_ms = Instant::now().as_millis() as u32;
                if let Some(message) = router.route(&topic, &payload, now_ms, &SHARED).await {
                    PRIMARY_MESSAGE.signal(message);
                }
            }
            Incoming::SubAck {
                packet_id,
                return_code,
            } => {
                if return_code == SUBSCRIPTION_FAILURE {
                    warn!("Subscription {} rejected", packet_id);
                }
            }
            Incoming::PingResp | Incoming::UnsubAck { .. } => {}
            Incoming::ConnAck { .. } => debug!("Unexpected CONNACK"),
        }
    }

    async fn resubscribe(
        &mut self,
        change: SubscriptionChange,
        router: &mut TelemetryRouter,
    ) -> Result<(), SessionError> {
        let SubscriptionDiff {
            unsubscribe,
            subscribe,
        } = router.change(change.panel, change.topic);

        if let Some(topic) = unsubscribe {
            self.unsubscribe(&topic).await?;
        }
        if let Some(topic) = subscribe {
            self.subscribe(&topic).await?;
        }
        Ok(())
    }
}
