use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::SinkExt;
use futures::StreamExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::codec::FramedWrite;
use tokio_util::codec::LengthDelimitedCodec;
use tokio_util::sync::CancellationToken;

use crate::callback::InnerTransportCallback;
use crate::connections::TransportConfig;
use crate::core::callback::SharedTransportCallback;
use crate::core::transport::ConnectionInterface;
use crate::core::transport::ConnectionState;
use crate::core::transport::TransportInterface;
use crate::core::transport::TransportMessage;
use crate::error::Error;
use crate::error::Result;
use crate::pool::Pool;

type FrameReader = FramedRead<OwnedReadHalf, LengthDelimitedCodec>;
type FrameWriter = FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>;

/// Pause of the accept loop after a failed `accept`, e.g. when running out of descriptors.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A registered TCP connection. Reads are driven by a receive loop owned by the transport,
/// writes go through [ConnectionInterface::send_message].
pub struct TcpConnection {
    cid: String,
    writer: tokio::sync::Mutex<FrameWriter>,
    closed: AtomicBool,
    cancel: CancellationToken,
}

/// [TcpTransport] owns the listening socket and one [TcpConnection] per remote endpoint.
/// Cloning it is cheap, every clone shares the same pool.
#[derive(Clone)]
pub struct TcpTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    listen_addr: SocketAddr,
    advertised_addr: SocketAddr,
    config: TransportConfig,
    callback: SharedTransportCallback,
    pool: Pool<TcpConnection>,
    dial_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    listener: Mutex<Option<TcpListener>>,
    cancel: CancellationToken,
}

fn parse_cid(cid: &str) -> Result<SocketAddr> {
    cid.parse()
        .map_err(|_| Error::InvalidConnectionId(cid.to_string()))
}

impl TcpConnection {
    fn new(cid: &str, writer: FrameWriter, cancel: CancellationToken) -> Self {
        Self {
            cid: cid.to_string(),
            writer: tokio::sync::Mutex::new(writer),
            closed: AtomicBool::new(false),
            cancel,
        }
    }

    /// The listening endpoint of the remote peer.
    pub fn cid(&self) -> &str {
        &self.cid
    }
}

#[async_trait]
impl ConnectionInterface for TcpConnection {
    type Error = Error;

    async fn send_message(&self, msg: TransportMessage) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed(self.cid.clone()));
        }
        let data = bincode::serialize(&msg).map(Bytes::from)?;
        let mut writer = self.writer.lock().await;
        writer.send(data).await?;
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        if self.closed.load(Ordering::SeqCst) {
            ConnectionState::Closed
        } else {
            ConnectionState::Connected
        }
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.cancel.cancel();
        let mut writer = self.writer.lock().await;
        if let Err(e) = SinkExt::<Bytes>::close(&mut *writer).await {
            tracing::debug!("Shutdown write half of {} failed: {e}", self.cid);
        }
        Ok(())
    }
}

impl TcpTransport {
    /// Bind the listening socket. Nothing is accepted until [TcpTransport::listen] is called.
    /// `external_address` is announced to peers instead of the bound address when given,
    /// which is required when binding a wildcard address.
    pub async fn bind(
        addr: SocketAddr,
        external_address: Option<SocketAddr>,
        config: TransportConfig,
        callback: SharedTransportCallback,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Bind(addr, e))?;
        let listen_addr = listener.local_addr()?;
        let advertised_addr = external_address.unwrap_or(listen_addr);
        tracing::info!("Transport bound on {listen_addr}, advertised as {advertised_addr}");

        Ok(Self {
            inner: Arc::new(TransportInner {
                listen_addr,
                advertised_addr,
                config,
                callback,
                pool: Pool::new(),
                dial_locks: DashMap::new(),
                listener: Mutex::new(Some(listener)),
                cancel: CancellationToken::new(),
            }),
        })
    }

    /// Spawn the accept loop. Can only be called once.
    pub fn listen(&self) -> Result<JoinHandle<()>> {
        let listener = self
            .inner
            .listener
            .lock()
            .map_err(|_| Error::ListenerLock)?
            .take()
            .ok_or(Error::AlreadyListening)?;
        let inner = self.inner.clone();
        Ok(tokio::spawn(async move { inner.accept_loop(listener).await }))
    }

    /// The address the socket is actually bound to.
    pub fn listen_addr(&self) -> SocketAddr {
        self.inner.listen_addr
    }

    /// The address peers use to reach this transport, also the id other transports give us.
    pub fn advertised_addr(&self) -> SocketAddr {
        self.inner.advertised_addr
    }

    /// Stop accepting and close every registered connection.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Ok(mut listener) = self.inner.listener.lock() {
            listener.take();
        }
        for (cid, conn) in self.inner.pool.drain() {
            if let Err(e) = conn.close().await {
                tracing::debug!("Close connection {cid} on shutdown failed: {e}");
            }
        }
        tracing::info!("Transport on {} shut down", self.inner.listen_addr);
    }
}

impl TransportInner {
    fn codec(&self) -> LengthDelimitedCodec {
        LengthDelimitedCodec::builder()
            .max_frame_length(self.config.max_frame_length)
            .new_codec()
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let inner = self.clone();
                        tokio::spawn(async move {
                            if let Err(e) = inner.accept(stream, peer).await {
                                tracing::warn!("Reject inbound connection from {peer}: {e}");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!("Accept on {} failed: {e}", self.listen_addr);
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }
        }
        tracing::debug!("Accept loop on {} stopped", self.listen_addr);
    }

    async fn accept(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) -> Result<()> {
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = FramedRead::new(read_half, self.codec());

        let frame = match tokio::time::timeout(self.config.handshake_timeout, reader.next()).await
        {
            Ok(Some(frame)) => frame?,
            _ => return Err(Error::HandshakeExpected(peer.to_string())),
        };
        let cid = match bincode::deserialize(&frame)? {
            TransportMessage::Handshake(cid) => cid,
            TransportMessage::Custom(_) => return Err(Error::HandshakeExpected(peer.to_string())),
        };
        parse_cid(&cid)?;

        tracing::debug!("Accepted connection from {cid} ({peer})");
        let writer = FramedWrite::new(write_half, self.codec());
        self.register(&cid, reader, writer).await;
        Ok(())
    }

    async fn connect(self: &Arc<Self>, cid: &str) -> Result<Arc<TcpConnection>> {
        if let Ok(conn) = self.pool.connection(cid) {
            if conn.connection_state() == ConnectionState::Connected {
                return Ok(conn);
            }
        }
        let addr = parse_cid(cid)?;

        // Concurrent senders to the same peer share one dial.
        let lock = self.dial_locks.entry(cid.to_string()).or_default().clone();
        let dialed = {
            let _guard = lock.lock().await;
            match self.pool.connection(cid) {
                Ok(conn) if conn.connection_state() == ConnectionState::Connected => Ok(conn),
                _ => self.dial(cid, addr).await,
            }
        };
        drop(lock);
        // The last waiter drops the lock entry.
        self.dial_locks
            .remove_if(cid, |_, lock| Arc::strong_count(lock) == 1);
        dialed
    }

    async fn dial(self: &Arc<Self>, cid: &str, addr: SocketAddr) -> Result<Arc<TcpConnection>> {
        let stream =
            match tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(addr)).await
            {
                Ok(stream) => stream?,
                Err(_) => return Err(Error::ConnectTimeout(cid.to_string())),
            };
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        let mut writer = FramedWrite::new(write_half, self.codec());
        let handshake =
            bincode::serialize(&TransportMessage::Handshake(self.advertised_addr.to_string()))?;
        writer.send(Bytes::from(handshake)).await?;

        tracing::debug!("Dialed {cid}");
        let reader = FramedRead::new(read_half, self.codec());
        Ok(self.register(cid, reader, writer).await)
    }

    async fn register(
        self: &Arc<Self>,
        cid: &str,
        reader: FrameReader,
        writer: FrameWriter,
    ) -> Arc<TcpConnection> {
        let conn = Arc::new(TcpConnection::new(cid, writer, self.cancel.child_token()));
        if let Some(old) = self.pool.replace(cid, conn.clone()) {
            tracing::debug!("Replace connection to {cid}");
            if let Err(e) = old.close().await {
                tracing::debug!("Close replaced connection to {cid} failed: {e}");
            }
        }

        let callback = InnerTransportCallback::new(cid, self.callback.clone());
        callback
            .on_connection_state_change(ConnectionState::Connected)
            .await;

        let inner = self.clone();
        let receiving = conn.clone();
        tokio::spawn(async move { inner.receive_loop(receiving, reader, callback).await });

        conn
    }

    async fn receive_loop(
        self: Arc<Self>,
        conn: Arc<TcpConnection>,
        mut reader: FrameReader,
        callback: InnerTransportCallback,
    ) {
        loop {
            tokio::select! {
                _ = conn.cancel.cancelled() => break,
                frame = reader.next() => match frame {
                    Some(Ok(frame)) => callback.on_message(&frame.freeze()).await,
                    Some(Err(e)) => {
                        tracing::warn!("Read from {} failed: {e}", conn.cid);
                        break;
                    }
                    None => {
                        tracing::debug!("Connection {} closed by remote", conn.cid);
                        break;
                    }
                }
            }
        }
        self.release(&conn).await;
    }

    /// Unregister `conn` if it is still the current connection of its peer, then close it.
    async fn release(&self, conn: &Arc<TcpConnection>) {
        if self.pool.remove_if_same(&conn.cid, conn) {
            InnerTransportCallback::new(&conn.cid, self.callback.clone())
                .on_connection_state_change(ConnectionState::Closed)
                .await;
        }
        if let Err(e) = conn.close().await {
            tracing::debug!("Close connection {} failed: {e}", conn.cid);
        }
    }
}

#[async_trait]
impl TransportInterface for TcpTransport {
    type Connection = TcpConnection;
    type Error = Error;

    async fn connect(&self, cid: &str) -> Result<Arc<Self::Connection>> {
        self.inner.connect(cid).await
    }

    async fn send(&self, cid: &str, data: Bytes) -> Result<()> {
        let conn = self.inner.connect(cid).await?;
        if let Err(e) = conn.send_message(TransportMessage::Custom(data)).await {
            tracing::warn!("Send to {cid} failed, release connection: {e}");
            self.inner.release(&conn).await;
            return Err(e);
        }
        Ok(())
    }

    async fn close_connection(&self, cid: &str) -> Result<()> {
        let conn = self.inner.pool.connection(cid)?;
        self.inner.release(&conn).await;
        Ok(())
    }

    fn connection(&self, cid: &str) -> Result<Arc<Self::Connection>> {
        self.inner.pool.connection(cid)
    }

    fn connections(&self) -> Vec<(String, Arc<Self::Connection>)> {
        self.inner.pool.connections()
    }

    fn connection_ids(&self) -> Vec<String> {
        self.inner.pool.connection_ids()
    }
}
