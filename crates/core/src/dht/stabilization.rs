//! Stabilization run daemons to maintain the ring.
//!
//! Four periodic tasks run on their own cadence: stabilize, fix fingers, check
//! predecessor and an optional dump of the ring state. They only talk to the ring
//! through compare-and-set updates, so they may overlap with message handlers.

use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::ProtocolConfig;
use crate::dht::RingState;
use crate::dispatch::Dispatch;
use crate::dispatch::Lifetime;
use crate::error::Error;
use crate::error::Result;
use crate::inspect::RingInspect;
use crate::message::handlers::liveness::AliveSubscriber;
use crate::message::handlers::stabilization::FixFingerSubscriber;
use crate::message::CorrelationKey;
use crate::message::KeepAliveSend;
use crate::message::LookupSend;
use crate::message::Message;
use crate::message::MessageHandler;
use crate::message::MessageKind;
use crate::message::StabilizeSend;
use crate::swarm::transport::SwarmTransport;
use crate::swarm::NodeLifecycle;

/// The stabilization runner.
pub struct Stabilizer {
    transport: Arc<SwarmTransport>,
    dht: Arc<RingState>,
    dispatch: Dispatch,
    handler: MessageHandler,
    lifecycle: Arc<NodeLifecycle>,
    config: ProtocolConfig,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl Stabilizer {
    /// Create a new stabilization runner.
    pub fn new(
        transport: Arc<SwarmTransport>,
        dispatch: Dispatch,
        handler: MessageHandler,
        lifecycle: Arc<NodeLifecycle>,
        config: ProtocolConfig,
    ) -> Self {
        let dht = transport.dht.clone();
        Self {
            transport,
            dht,
            dispatch,
            handler,
            lifecycle,
            config,
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    /// Propose ourselves as predecessor of our successor.
    ///
    /// While the successor is ourselves (or unknown) the predecessor, if any, is
    /// dialed and promoted to successor first. This is how the creator of a ring
    /// learns about the first node that joined it.
    ///
    /// A node that lost both neighbours becomes its own successor again, a ring of one.
    pub async fn stabilize(&self) -> Result<()> {
        let me = self.dht.me;
        let successor = self.dht.successor()?;
        let target = match successor {
            Some(successor) if successor != me => successor,
            _ => {
                let Some(predecessor) = self.dht.predecessor()? else {
                    if successor.is_none() && self.dht.compare_and_set_finger(1, None, Some(me))? {
                        tracing::warn!("{me} lost every neighbour, fall back to a ring of its own");
                    }
                    return Ok(());
                };
                if predecessor == me {
                    return Ok(());
                }
                if !self.transport.connect(&predecessor).await {
                    self.dht.invalidate(&predecessor)?;
                    return Ok(());
                }
                self.dht
                    .compare_and_set_finger(1, successor.as_ref(), Some(predecessor))?;
                predecessor
            }
        };

        tracing::debug!("STABILIZATION stabilize: {target}");
        self.transport
            .send_or_invalidate(&target, Message::StabilizeSend(StabilizeSend))
            .await;
        Ok(())
    }

    /// Refresh the next finger of the rotating index.
    pub async fn fix_fingers(&self) -> Result<()> {
        let me = self.dht.me;
        let index = self.dht.next_fix_finger_index()?;
        let target = self.dht.space.finger_target(me.id, index)?;
        let current = self.dht.finger(index)?;

        // The successor covers (me, successor], no round trip needed.
        if let Some(successor) = self.dht.successor()? {
            if self.dht.space.in_half_open_arc(me.id, target, successor.id) {
                if current != Some(successor) {
                    self.dht
                        .compare_and_set_finger(index, current.as_ref(), Some(successor))?;
                }
                return Ok(());
            }
        }
        if self.dht.is_responsible(target)? {
            if current != Some(me) {
                self.dht
                    .compare_and_set_finger(index, current.as_ref(), Some(me))?;
            }
            return Ok(());
        }

        tracing::debug!("STABILIZATION fix_fingers: finger[{index}] target {target}");
        let subscription = self.dispatch.subscribe(
            CorrelationKey::responsible(target),
            Lifetime::Timeout(self.config.lookup_timeout()),
            Arc::new(FixFingerSubscriber::new(
                self.transport.clone(),
                index,
                current,
            )),
        );
        let msg = LookupSend {
            target,
            source: me,
            visited: vec![],
        };
        if !self.handler.forward_lookup(msg).await? {
            self.dispatch.unsubscribe(&subscription);
            tracing::debug!("No route for finger[{index}] yet");
        }
        Ok(())
    }

    /// Probe the predecessor, it is cleared when no answer arrives in time.
    pub async fn check_predecessor(&self) -> Result<()> {
        let Some(predecessor) = self.dht.predecessor()? else {
            return Ok(());
        };

        let subscription = self.dispatch.subscribe(
            CorrelationKey::kind(MessageKind::IsAlive),
            Lifetime::Timeout(self.config.liveness_timeout()),
            Arc::new(AliveSubscriber::new(self.dht.clone(), predecessor)),
        );
        if !self
            .transport
            .send_or_invalidate(&predecessor, Message::KeepAliveSend(KeepAliveSend))
            .await
        {
            self.dispatch.unsubscribe(&subscription);
        }
        Ok(())
    }

    /// Log the current view of the ring.
    pub fn dump(&self) -> Result<()> {
        let inspect = RingInspect::inspect(
            &self.dht,
            self.lifecycle.get(),
            self.transport.connection_ids(),
        );
        let json = serde_json::to_string(&inspect).map_err(Error::Serialize)?;
        tracing::info!("{json}");
        Ok(())
    }

    /// Spawn the periodic tasks. Only the first call has an effect.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("Start periodic tasks of {}", self.dht.me);

        self.spawn_periodic("stabilize", self.config.stabilize_interval(), |s| async move {
            s.stabilize().await
        });
        self.spawn_periodic("fix_fingers", self.config.fix_fingers_interval(), |s| async move {
            s.fix_fingers().await
        });
        self.spawn_periodic(
            "check_predecessor",
            self.config.check_predecessor_interval(),
            |s| async move { s.check_predecessor().await },
        );
        if let Some(interval) = self.config.dump_interval() {
            self.spawn_periodic("dump", interval, |s| async move { s.dump() });
        }
    }

    /// Stop every periodic task.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    fn spawn_periodic<F, Fut>(self: &Arc<Self>, name: &'static str, period: Duration, task: F)
    where
        F: Fn(Arc<Self>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let this = self.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = task(this.clone()).await {
                            tracing::error!("[{name}] failed: {e}");
                        }
                    }
                }
            }
            tracing::debug!("[{name}] stopped");
        });
    }
}
