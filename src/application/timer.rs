//! Countdown timers, one actor task per auction.
//!
//! Handlers dispatch a [`TimerCommand`] from inside the floor executor, while
//! the auction lock is still held, stamped with the committed floor version.
//! The actor applies only signals newer than the last one it saw, so commands
//! take effect in commit order no matter how they travel.
//!
//! With a [`TimerBus`] every signal is also shared with the other engine
//! instances. Each instance keeps a replica of the countdown for readers;
//! only the instance that issued the `Start` (the owner) broadcasts ticks and
//! signals expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, interval_at, Instant, MissedTickBehavior};

use crate::domain::foundation::{AuctionId, NodeId, PlayerId};
use crate::domain::timer::{Countdown, Tick, TimerCommand, TimerExpired, TimerSignal, TimerUpdate};
use crate::ports::TimerBus;

use super::gateway::BroadcastGateway;

const EXPIRY_CAPACITY: usize = 64;

/// A countdown reached zero. Policy (sell, unsold, keep waiting) is the
/// subscriber's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerExpiry {
    pub auction_id: AuctionId,
    pub player_id: PlayerId,
}

struct TimerHandle {
    signals: mpsc::UnboundedSender<TimerSignal>,
    state: watch::Receiver<Option<Countdown>>,
}

pub struct TimerCoordinator {
    node_id: NodeId,
    gateway: Arc<BroadcastGateway>,
    tick: Duration,
    timers: Mutex<HashMap<AuctionId, TimerHandle>>,
    expiries: broadcast::Sender<TimerExpiry>,
    outbound: Option<mpsc::UnboundedSender<TimerSignal>>,
}

impl TimerCoordinator {
    /// A coordinator for a single engine instance.
    pub fn new(gateway: Arc<BroadcastGateway>, tick: Duration) -> Self {
        let (expiries, _) = broadcast::channel(EXPIRY_CAPACITY);
        Self {
            node_id: NodeId::new(),
            gateway,
            tick,
            timers: Mutex::new(HashMap::new()),
            expiries,
            outbound: None,
        }
    }

    /// A coordinator that shares every dispatched signal over `bus`.
    ///
    /// Signals are forwarded by one task in dispatch order; a failed or slow
    /// publish is logged and dropped.
    pub fn with_bus(
        gateway: Arc<BroadcastGateway>,
        tick: Duration,
        bus: Arc<dyn TimerBus>,
        publish_timeout: Duration,
    ) -> Self {
        let (outbound, pending) = mpsc::unbounded_channel();
        tokio::spawn(forward_signals(bus, publish_timeout, pending));
        Self {
            outbound: Some(outbound),
            ..Self::new(gateway, tick)
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Applies a committed command here and shares it with other instances.
    ///
    /// Call it before the auction lock is released.
    pub fn dispatch(&self, auction_id: AuctionId, version: u64, command: TimerCommand) {
        let signal = TimerSignal::new(auction_id, version, self.node_id, command);
        self.apply_signal(signal);
        if let Some(outbound) = &self.outbound {
            let _ = outbound.send(signal);
        }
    }

    /// Applies a signal issued by another instance. Echoes of this
    /// instance's own signals are ignored.
    pub fn receive(&self, signal: TimerSignal) {
        if signal.origin == self.node_id {
            return;
        }
        tracing::trace!(
            auction_id = %signal.auction_id,
            version = signal.version,
            origin = %signal.origin,
            "Timer signal received"
        );
        self.apply_signal(signal);
    }

    pub fn snapshot(&self, auction_id: AuctionId) -> Option<Countdown> {
        self.handles()
            .get(&auction_id)
            .and_then(|handle| handle.state.borrow().clone())
    }

    pub fn subscribe_expiries(&self) -> broadcast::Receiver<TimerExpiry> {
        self.expiries.subscribe()
    }

    pub fn active_auctions(&self) -> usize {
        self.handles().len()
    }

    fn handles(&self) -> std::sync::MutexGuard<'_, HashMap<AuctionId, TimerHandle>> {
        self.timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply_signal(&self, signal: TimerSignal) {
        let auction_id = signal.auction_id;
        let mut handles = self.handles();
        if let Some(handle) = handles.get(&auction_id) {
            if handle.signals.send(signal).is_ok() {
                if signal.command == TimerCommand::Close {
                    handles.remove(&auction_id);
                }
                return;
            }
            handles.remove(&auction_id);
        }
        if !matches!(signal.command, TimerCommand::Start { .. }) {
            return;
        }

        let (signals, receiver) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(None);
        let actor = TimerActor {
            auction_id,
            node_id: self.node_id,
            gateway: Arc::clone(&self.gateway),
            tick: self.tick,
            expiries: self.expiries.clone(),
            state: state_tx,
        };
        tokio::spawn(actor.run(receiver));
        if signals.send(signal).is_ok() {
            handles.insert(auction_id, TimerHandle { signals, state });
        }
    }
}

async fn forward_signals(
    bus: Arc<dyn TimerBus>,
    publish_timeout: Duration,
    mut pending: mpsc::UnboundedReceiver<TimerSignal>,
) {
    while let Some(signal) = pending.recv().await {
        match time::timeout(publish_timeout, bus.publish(&signal)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(
                auction_id = %signal.auction_id,
                version = signal.version,
                error = %e,
                "Timer signal publish failed"
            ),
            Err(_) => tracing::warn!(
                auction_id = %signal.auction_id,
                version = signal.version,
                "Timer signal publish timed out"
            ),
        }
    }
}

struct TimerActor {
    auction_id: AuctionId,
    node_id: NodeId,
    gateway: Arc<BroadcastGateway>,
    tick: Duration,
    expiries: broadcast::Sender<TimerExpiry>,
    state: watch::Sender<Option<Countdown>>,
}

impl TimerActor {
    async fn run(self, mut signals: mpsc::UnboundedReceiver<TimerSignal>) {
        let mut countdown: Option<Countdown> = None;
        let mut owner: Option<NodeId> = None;
        let mut last_version = 0u64;
        let mut ticker = interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let running = countdown.as_ref().map_or(false, Countdown::is_running);
            tokio::select! {
                signal = signals.recv() => {
                    let Some(signal) = signal else { break };
                    if signal.version <= last_version {
                        tracing::debug!(
                            auction_id = %self.auction_id,
                            version = signal.version,
                            last_version,
                            "Dropping stale timer signal"
                        );
                        continue;
                    }
                    last_version = signal.version;
                    if matches!(signal.command, TimerCommand::Start { .. }) {
                        owner = Some(signal.origin);
                    }
                    if signal.command == TimerCommand::Close {
                        self.state.send_replace(None);
                        break;
                    }

                    let announce = apply(&mut countdown, signal.command);
                    self.state.send_replace(countdown.clone());
                    if let Some(seconds) = announce {
                        ticker.reset();
                        if owner == Some(self.node_id) {
                            self.gateway
                                .publish_event(self.auction_id, &TimerUpdate { seconds })
                                .await;
                        }
                    }
                }
                _ = ticker.tick(), if running => {
                    let Some(current) = countdown.as_mut() else { continue };
                    let player_id = current.player_id();
                    let outcome = current.tick();
                    self.state.send_replace(countdown.clone());
                    if owner != Some(self.node_id) {
                        continue;
                    }
                    match outcome {
                        Tick::Remaining(seconds) => {
                            self.gateway
                                .publish_event(self.auction_id, &TimerUpdate { seconds })
                                .await;
                        }
                        Tick::Expired => {
                            self.gateway
                                .publish_event(self.auction_id, &TimerUpdate { seconds: 0 })
                                .await;
                            self.gateway
                                .publish_event(self.auction_id, &TimerExpired { player_id })
                                .await;
                            tracing::info!(
                                auction_id = %self.auction_id,
                                player_id = %player_id,
                                "Countdown expired"
                            );
                            let _ = self.expiries.send(TimerExpiry {
                                auction_id: self.auction_id,
                                player_id,
                            });
                        }
                        Tick::Idle => {}
                    }
                }
            }
        }
        tracing::debug!(auction_id = %self.auction_id, "Timer actor stopped");
    }
}

/// Applies a command; returns the seconds to announce if clients should
/// resync.
fn apply(countdown: &mut Option<Countdown>, command: TimerCommand) -> Option<u32> {
    match command {
        TimerCommand::Start {
            player_id,
            seconds,
            frozen,
        } => {
            let mut fresh = Countdown::start(player_id, seconds);
            if frozen {
                fresh.freeze();
            }
            let remaining = fresh.remaining_secs();
            *countdown = Some(fresh);
            Some(remaining)
        }
        TimerCommand::Reset { player_id } => match countdown.as_mut() {
            Some(current) if current.player_id() == player_id => {
                current.reset();
                Some(current.remaining_secs())
            }
            _ => None,
        },
        TimerCommand::Freeze => {
            if let Some(current) = countdown.as_mut() {
                current.freeze();
            }
            None
        }
        TimerCommand::Resume => match countdown.as_mut() {
            Some(current) => {
                if current.resume() {
                    Some(current.remaining_secs())
                } else {
                    None
                }
            }
            None => None,
        },
        TimerCommand::Stop { player_id } => {
            let matches = match (countdown.as_ref(), player_id) {
                (Some(current), Some(player_id)) => current.player_id() == player_id,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if matches {
                *countdown = None;
            }
            None
        }
        TimerCommand::Close => {
            *countdown = None;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryTimerBus, RecordingBroadcaster};
    use crate::domain::timer::CountdownState;
    use crate::ports::Channel;

    fn coordinator() -> (TimerCoordinator, Arc<RecordingBroadcaster>) {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let gateway = Arc::new(BroadcastGateway::new(
            broadcaster.clone(),
            Duration::from_millis(100),
        ));
        (
            TimerCoordinator::new(gateway, Duration::from_secs(1)),
            broadcaster,
        )
    }

    fn clustered(bus: &Arc<InMemoryTimerBus>) -> (Arc<TimerCoordinator>, Arc<RecordingBroadcaster>) {
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let gateway = Arc::new(BroadcastGateway::new(
            broadcaster.clone(),
            Duration::from_millis(100),
        ));
        let timers = Arc::new(TimerCoordinator::with_bus(
            gateway,
            Duration::from_secs(1),
            bus.clone(),
            Duration::from_millis(100),
        ));
        let mut incoming = bus.subscribe();
        let receiver = Arc::clone(&timers);
        tokio::spawn(async move {
            while let Ok(signal) = incoming.recv().await {
                receiver.receive(signal);
            }
        });
        (timers, broadcaster)
    }

    async fn elapse(millis: u64) {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    fn remaining(timers: &TimerCoordinator, auction: AuctionId) -> Option<u32> {
        timers.snapshot(auction).map(|c| c.remaining_secs())
    }

    fn state(timers: &TimerCoordinator, auction: AuctionId) -> Option<CountdownState> {
        timers.snapshot(auction).map(|c| c.state())
    }

    fn start(player_id: PlayerId, seconds: u32) -> TimerCommand {
        TimerCommand::Start {
            player_id,
            seconds,
            frozen: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pause_at_twelve_resumes_from_twelve() {
        let (timers, _) = coordinator();
        let (auction, player) = (AuctionId::new(), PlayerId::new());

        timers.dispatch(auction, 1, start(player, 30));
        elapse(18_500).await;
        assert_eq!(remaining(&timers, auction), Some(12));

        timers.dispatch(auction, 2, TimerCommand::Freeze);
        elapse(10_000).await;
        assert_eq!(remaining(&timers, auction), Some(12));
        assert_eq!(state(&timers, auction), Some(CountdownState::Frozen));

        timers.dispatch(auction, 3, TimerCommand::Resume);
        elapse(500).await;
        assert_eq!(remaining(&timers, auction), Some(12));
        elapse(600).await;
        assert_eq!(remaining(&timers, auction), Some(11));
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_bid_resets_to_full_duration() {
        let (timers, broadcaster) = coordinator();
        let (auction, player) = (AuctionId::new(), PlayerId::new());

        timers.dispatch(auction, 1, start(player, 10));
        elapse(4_500).await;
        assert_eq!(remaining(&timers, auction), Some(6));

        timers.dispatch(auction, 2, TimerCommand::Reset { player_id: player });
        elapse(10).await;
        assert_eq!(remaining(&timers, auction), Some(10));
        assert_eq!(
            broadcaster.last_named("timer-update").unwrap().data,
            serde_json::json!({ "seconds": 10 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reset_for_another_player_is_ignored() {
        let (timers, _) = coordinator();
        let auction = AuctionId::new();

        timers.dispatch(auction, 1, start(PlayerId::new(), 10));
        elapse(3_500).await;
        timers.dispatch(auction, 2, TimerCommand::Reset { player_id: PlayerId::new() });
        elapse(10).await;
        assert_eq!(remaining(&timers, auction), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_is_signalled_once() {
        let (timers, broadcaster) = coordinator();
        let (auction, player) = (AuctionId::new(), PlayerId::new());
        let mut expiries = timers.subscribe_expiries();

        timers.dispatch(auction, 1, start(player, 3));
        let expiry = expiries.recv().await.unwrap();
        assert_eq!(expiry, TimerExpiry { auction_id: auction, player_id: player });

        elapse(5_000).await;
        let names = broadcaster.event_names(&Channel::Auction(auction));
        assert_eq!(
            names.iter().filter(|n| n.as_str() == "timer-expired").count(),
            1
        );
        assert_eq!(state(&timers, auction), Some(CountdownState::Expired));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_and_close_end_the_countdown() {
        let (timers, broadcaster) = coordinator();
        let (auction, player) = (AuctionId::new(), PlayerId::new());

        timers.dispatch(auction, 1, start(player, 30));
        elapse(2_500).await;
        timers.dispatch(auction, 2, TimerCommand::Stop { player_id: Some(player) });
        elapse(10).await;
        assert_eq!(timers.snapshot(auction), None);

        broadcaster.clear();
        elapse(5_000).await;
        assert!(broadcaster.published().is_empty());

        timers.dispatch(auction, 3, TimerCommand::Close);
        assert_eq!(timers.active_auctions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn frozen_start_holds_full_duration() {
        let (timers, _) = coordinator();
        let auction = AuctionId::new();

        timers.dispatch(
            auction,
            1,
            TimerCommand::Start {
                player_id: PlayerId::new(),
                seconds: 20,
                frozen: true,
            },
        );
        elapse(5_000).await;
        assert_eq!(remaining(&timers, auction), Some(20));

        timers.dispatch(auction, 2, TimerCommand::Resume);
        elapse(1_100).await;
        assert_eq!(remaining(&timers, auction), Some(19));
    }

    #[tokio::test(start_paused = true)]
    async fn late_freeze_after_newer_resume_is_dropped() {
        let (timers, _) = coordinator();
        let (auction, player) = (AuctionId::new(), PlayerId::new());

        timers.dispatch(auction, 1, start(player, 30));
        timers.dispatch(auction, 3, TimerCommand::Resume);
        timers.dispatch(auction, 2, TimerCommand::Freeze);
        elapse(2_100).await;

        assert_eq!(state(&timers, auction), Some(CountdownState::Running));
        assert_eq!(remaining(&timers, auction), Some(28));

        timers.dispatch(auction, 4, TimerCommand::Reset { player_id: player });
        elapse(10).await;
        assert_eq!(remaining(&timers, auction), Some(30));
    }

    #[tokio::test(start_paused = true)]
    async fn late_stop_does_not_end_a_restarted_countdown() {
        let (timers, _) = coordinator();
        let (auction, player) = (AuctionId::new(), PlayerId::new());

        timers.dispatch(auction, 1, start(player, 30));
        // Sale at version 2, undone at version 3; the stop arrives last.
        timers.dispatch(auction, 3, start(player, 30));
        timers.dispatch(auction, 2, TimerCommand::Stop { player_id: Some(player) });
        elapse(1_100).await;

        assert_eq!(remaining(&timers, auction), Some(29));
        assert_eq!(state(&timers, auction), Some(CountdownState::Running));
    }

    #[tokio::test(start_paused = true)]
    async fn bus_signals_reach_the_owning_instance() {
        let bus = Arc::new(InMemoryTimerBus::new());
        let (owner, owner_broadcasts) = clustered(&bus);
        let (peer, peer_broadcasts) = clustered(&bus);
        let (auction, player) = (AuctionId::new(), PlayerId::new());

        owner.dispatch(auction, 1, start(player, 30));
        elapse(10_500).await;
        assert_eq!(remaining(&owner, auction), Some(20));
        assert_eq!(remaining(&peer, auction), Some(20));

        // A bid accepted by the peer resets the owner's countdown.
        peer.dispatch(auction, 2, TimerCommand::Reset { player_id: player });
        elapse(10).await;
        assert_eq!(remaining(&owner, auction), Some(30));

        peer.dispatch(auction, 3, TimerCommand::Freeze);
        elapse(5_000).await;
        assert_eq!(state(&owner, auction), Some(CountdownState::Frozen));
        assert_eq!(remaining(&owner, auction), Some(30));

        // Only the owner broadcasts the countdown.
        assert!(owner_broadcasts.last_named("timer-update").is_some());
        assert!(peer_broadcasts.last_named("timer-update").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn own_echo_is_ignored() {
        let (timers, _) = coordinator();
        let (auction, player) = (AuctionId::new(), PlayerId::new());
        timers.dispatch(auction, 1, start(player, 30));
        elapse(5_100).await;

        timers.receive(TimerSignal::new(auction, 9, timers.node_id(), start(player, 30)));
        elapse(10).await;
        assert_eq!(remaining(&timers, auction), Some(25));
    }

    #[test]
    fn commands_without_a_timer_are_no_ops() {
        let mut countdown = None;
        assert_eq!(apply(&mut countdown, TimerCommand::Freeze), None);
        assert_eq!(apply(&mut countdown, TimerCommand::Resume), None);
        assert_eq!(
            apply(&mut countdown, TimerCommand::Stop { player_id: None }),
            None
        );
        assert!(countdown.is_none());
    }
}
