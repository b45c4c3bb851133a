// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-connection session state and its sender/receiver task pair.
//!
//! The original hub runs one receiver thread and one sender thread per
//! client, coordinated through a mutex-guarded outbox and a condition
//! variable. The async redesign (explicitly sanctioned by the design notes)
//! keeps the same two-worker shape but replaces the queue with an
//! `mpsc` channel and the "check `connected` on every wakeup" discipline
//! with a [`CancellationToken`] the sender observes at every send.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use tokio::{net::TcpStream, sync::Mutex, sync::mpsc, task::JoinHandle};
use tokio_util::{codec::Framed, sync::CancellationToken};
use tracing::{debug, warn};

use crate::{
    hub::{dispatcher, registry::Registry},
    wire::{codec::SerpCodec, message::Message, serpid::SerpId},
};

/// Server-side state for one connected client. Lives for as long as the
/// registry (or the disconnected set) holds a strong reference to it.
pub struct Session {
    id: SerpId,
    addr: SocketAddr,
    outbox: mpsc::UnboundedSender<Message>,
    connected: AtomicBool,
    receiver_done: AtomicBool,
    stop_writes: CancellationToken,
    sender_task: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    #[inline]
    pub fn id(&self) -> SerpId {
        self.id
    }

    #[inline]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    #[inline]
    pub fn receiver_done(&self) -> bool {
        self.receiver_done.load(Ordering::Acquire)
    }

    /// Push a message onto this session's outbox. Silently dropped if the
    /// sender task has already exited — matches the hub's best-effort
    /// delivery guarantee (§1 Non-goals).
    pub fn enqueue(&self, msg: Message) {
        if self.outbox.send(msg).is_err() {
            debug!(id = %self.id, "dropping message: sender task already gone");
        }
    }

    /// Idempotent: marks the session as no longer connected and tells the
    /// sender task to stop draining its queue once it next wakes.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            self.stop_writes.cancel();
        }
    }

    /// Await the sender task's completion. Called only from the reaper,
    /// never from the receiver task itself, to avoid a self-join.
    pub async fn join_sender(&self) {
        let handle = self.sender_task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(id = %self.id, "sender task panicked: {e}");
            }
        }
    }
}

/// Split the TCP stream into a framed sink/stream pair, spawn the sender
/// and receiver tasks, and return the shared session handle. The caller is
/// responsible for inserting the returned session into the [`Registry`].
pub async fn spawn(
    stream: TcpStream,
    addr: SocketAddr,
    id: SerpId,
    registry: Arc<Registry>,
    codec: SerpCodec,
) -> Arc<Session> {
    let framed = Framed::new(stream, codec);
    let (sink, stream_in) = framed.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let session = Arc::new(Session {
        id,
        addr,
        outbox: tx,
        connected: AtomicBool::new(true),
        receiver_done: AtomicBool::new(false),
        stop_writes: CancellationToken::new(),
        sender_task: Mutex::new(None),
    });

    let sender_session = Arc::clone(&session);
    let sender_handle = tokio::spawn(async move {
        sender_loop(sender_session, sink, rx).await;
    });
    *session.sender_task.lock().await = Some(sender_handle);

    let receiver_session = Arc::clone(&session);
    tokio::spawn(async move {
        receiver_loop(receiver_session, registry, stream_in).await;
    });

    session
}

/// Drains the outbox onto the socket. Checks `stop_writes` before sending
/// and again after each send so a disconnect mid-burst still cuts the
/// greedy drain short, while a burst of sends between wakeups only costs
/// one scheduling round-trip.
async fn sender_loop(
    session: Arc<Session>,
    mut sink: SplitSink<Framed<TcpStream, SerpCodec>, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    'outer: loop {
        let next = tokio::select! {
            _ = session.stop_writes.cancelled() => break,
            msg = rx.recv() => msg,
        };
        let Some(mut msg) = next else { break };

        loop {
            if let Err(e) = sink.send(msg).await {
                debug!(id = %session.id, "write failed, closing sender: {e}");
                break 'outer;
            }
            if session.stop_writes.is_cancelled() {
                break 'outer;
            }
            match rx.try_recv() {
                Ok(queued) => msg = queued,
                Err(_) => break,
            }
        }
    }
}

/// Decodes messages off the socket and hands each to the dispatcher
/// synchronously, exactly as the original's receiver thread does. Any
/// decode error or EOF is fatal for the session.
async fn receiver_loop(
    session: Arc<Session>,
    registry: Arc<Registry>,
    mut stream: futures_util::stream::SplitStream<Framed<TcpStream, SerpCodec>>,
) {
    loop {
        match stream.next().await {
            Some(Ok(msg)) => dispatcher::dispatch(&registry, &session, msg).await,
            Some(Err(e)) => {
                debug!(id = %session.id, "decode error, disconnecting: {e}");
                break;
            },
            None => break,
        }
    }

    registry.disconnect(session.id());
    session.receiver_done.store(true, Ordering::Release);
}
