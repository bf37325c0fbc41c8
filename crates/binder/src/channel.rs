//! # Channel Transport with Async Pump
//!
//! A byte-oriented duplex transport over tokio mpsc channels. The client side
//! spawns a pump task that demultiplexes replies and correlates them with
//! pending transactions by sequence number. The serving side runs [`serve`],
//! which spawns one task per inbound transaction.
//!
//! ## Format
//!
//! Every message is an envelope `[Kind: u8][Seq: u64][Target: u64][Frame]`,
//! little-endian. Replies echo the sequence number and target of the
//! transaction they answer. Releases carry seq `0` and an empty frame.
//!
//! ## Invariants
//! - Once the pump stops, every pending and later transaction fails with
//!   `ConnectionLost`.
//! - A reply nobody waits for (timed out, duplicate) is dropped.
//! - References are accounted per connection. A client that disappears
//!   without releasing them does not keep its objects alive.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::task::JoinSet;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use transact::ObjectId;

use crate::config::Config;
use crate::node::Node;
use crate::transport::Result;
use crate::transport::Transport;
use crate::transport::TransportError;

pub(crate) const KIND_TRANSACT: u8 = 0;
pub(crate) const KIND_REPLY: u8 = 1;
pub(crate) const KIND_RELEASE: u8 = 2;

const HEADER_LEN: usize = 1 + 8 + 8;

pub(crate) struct Envelope<'a> {
    pub(crate) kind: u8,
    pub(crate) seq: u64,
    pub(crate) target: ObjectId,
    pub(crate) frame: &'a [u8],
}

impl<'a> Envelope<'a> {
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.frame.len());
        buf.push(self.kind);
        buf.extend_from_slice(&self.seq.to_le_bytes());
        buf.extend_from_slice(&self.target.0.to_le_bytes());
        buf.extend_from_slice(self.frame);
        buf
    }

    pub(crate) fn decode(buf: &'a [u8]) -> std::result::Result<Self, String> {
        if buf.len() < HEADER_LEN {
            return Err(format!("envelope of {} bytes is shorter than its header", buf.len()));
        }
        let (header, frame) = buf.split_at(HEADER_LEN);
        let word = |at: usize| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&header[at..at + 8]);
            u64::from_le_bytes(bytes)
        };
        Ok(Self { kind: header[0], seq: word(1), target: ObjectId(word(9)), frame })
    }
}

type Pending = DashMap<u64, oneshot::Sender<Result<Vec<u8>>>>;

/// The calling end of a channel connection.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    pending: Arc<Pending>,
    seq_gen: AtomicU64,
    closed: Arc<AtomicBool>,
    config: Config,
}

impl ChannelTransport {
    /// Wraps a channel pair and spawns the reply pump.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(tx: mpsc::UnboundedSender<Vec<u8>>, rx: mpsc::UnboundedReceiver<Vec<u8>>, config: Config) -> Self {
        let pending: Arc<Pending> = Arc::new(DashMap::new());
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(Self::pump(rx, pending.clone(), closed.clone()));

        Self {
            tx,
            pending,
            seq_gen: AtomicU64::new(1),
            closed,
            config,
        }
    }

    /// Starts [`serve`] for `node` on a fresh channel pair and returns the
    /// client end plus the server task.
    pub fn spawn(node: Arc<Node>) -> (Self, JoinHandle<()>) {
        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        let config = *node.config();

        let server = tokio::spawn(serve(node, server_rx, server_tx));
        (Self::new(client_tx, client_rx, config), server)
    }

    /// Whether the connection has been lost.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn pump(mut rx: mpsc::UnboundedReceiver<Vec<u8>>, pending: Arc<Pending>, closed: Arc<AtomicBool>) {
        let error = loop {
            let Some(msg) = rx.recv().await else {
                break TransportError::ConnectionLost("channel closed".into());
            };

            let envelope = match Envelope::decode(&msg) {
                Ok(envelope) if envelope.kind == KIND_REPLY => envelope,
                Ok(envelope) => {
                    break TransportError::ConnectionLost(format!("unexpected envelope kind {}", envelope.kind));
                }
                Err(e) => break TransportError::ConnectionLost(e),
            };

            // No pending request for this sequence: a late or duplicate reply.
            if let Some((_, tx)) = pending.remove(&envelope.seq) {
                let _ = tx.send(Ok(envelope.frame.to_vec()));
            } else {
                trace!(seq = envelope.seq, "dropping unclaimed reply");
            }
        };

        debug!(error = %error, "channel pump stopped");
        closed.store(true, Ordering::Release);
        Self::notify_all_pending(&pending, error);
    }

    fn notify_all_pending(pending: &Pending, error: TransportError) {
        let keys: Vec<u64> = pending.iter().map(|e| *e.key()).collect();
        for key in keys {
            if let Some((_, tx)) = pending.remove(&key) {
                let _ = tx.send(Err(error.clone()));
            }
        }
    }

    fn lost() -> TransportError {
        TransportError::ConnectionLost("channel closed".into())
    }
}

#[async_trait::async_trait]
impl Transport for ChannelTransport {
    async fn transact(&self, target: ObjectId, frame: Vec<u8>) -> Result<Vec<u8>> {
        let max = self.config.max_transaction_len;
        if frame.len() > max {
            return Err(TransportError::PayloadTooLarge { len: frame.len(), max });
        }
        if self.is_closed() {
            return Err(Self::lost());
        }

        let seq = self.seq_gen.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.insert(seq, reply_tx);

        // The pump may have drained the map between the check and the insert.
        if self.is_closed() {
            self.pending.remove(&seq);
            return Err(Self::lost());
        }

        let envelope = Envelope { kind: KIND_TRANSACT, seq, target, frame: &frame }.encode();
        if self.tx.send(envelope).is_err() {
            self.pending.remove(&seq);
            return Err(Self::lost());
        }

        let reply = match self.config.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, reply_rx).await {
                Ok(reply) => reply,
                Err(_) => {
                    self.pending.remove(&seq);
                    return Err(TransportError::Timeout);
                }
            },
            None => reply_rx.await,
        };

        reply.unwrap_or_else(|_| Err(Self::lost()))
    }

    fn release(&self, target: ObjectId) {
        let envelope = Envelope { kind: KIND_RELEASE, seq: 0, target, frame: &[] }.encode();
        if self.tx.send(envelope).is_err() {
            trace!(object = %target, "release after channel closed");
        }
    }
}

/// References handed to one connection, by object.
type Held = DashMap<ObjectId, usize>;

/// Serves `node` over a channel pair until the inbound side closes.
///
/// Every reference a reply hands to this connection is recorded, and the
/// client can only release what it holds. When the connection closes, the
/// server waits for in-flight transactions and then drops whatever the
/// client still held.
pub async fn serve(node: Arc<Node>, mut rx: mpsc::UnboundedReceiver<Vec<u8>>, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let held: Arc<Held> = Arc::new(DashMap::new());
    let mut tasks = JoinSet::new();

    loop {
        let msg = tokio::select! {
            msg = rx.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
            Some(_) = tasks.join_next(), if !tasks.is_empty() => continue,
        };

        let envelope = match Envelope::decode(&msg) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "dropping malformed envelope");
                continue;
            }
        };

        match envelope.kind {
            KIND_TRANSACT => {
                let node = node.clone();
                let held = held.clone();
                let tx = tx.clone();
                let (seq, target, frame) = (envelope.seq, envelope.target, envelope.frame.to_vec());

                tasks.spawn(async move {
                    let (reply, published) = node.transact_tracked(target, &frame).await;
                    // Recorded before the reply leaves, so a release can never overtake it.
                    if let Some(id) = published {
                        *held.entry(id).or_insert(0) += 1;
                    }
                    let envelope = Envelope { kind: KIND_REPLY, seq, target, frame: &reply }.encode();
                    if tx.send(envelope).is_err() {
                        debug!(seq, "client went away before the reply");
                    }
                });
            }
            KIND_RELEASE => release_held(&node, &held, envelope.target),
            kind => warn!(kind, "dropping envelope of unexpected kind"),
        }
    }

    while tasks.join_next().await.is_some() {}

    let leftover: Vec<(ObjectId, usize)> = held.iter().map(|e| (*e.key(), *e.value())).collect();
    for (id, refs) in &leftover {
        for _ in 0..*refs {
            node.release(*id);
        }
    }
    debug!(objects = leftover.len(), "channel server stopped");
}

fn release_held(node: &Node, held: &Held, id: ObjectId) {
    let released = match held.entry(id) {
        Entry::Occupied(mut e) => {
            *e.get_mut() -= 1;
            if *e.get() == 0 {
                e.remove();
            }
            true
        }
        Entry::Vacant(_) => false,
    };

    if released {
        node.release(id);
    } else {
        trace!(object = %id, "ignoring release of a reference this connection does not hold");
    }
}
