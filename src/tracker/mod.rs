//! [PresenceTracker] ties the pieces together: a repeating poll task reads the idle source,
//! moves the status model between online and away, and emits events through the dispatcher.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use crate::{
    config::TrackerConfig,
    error::{PresenceError, Result},
    events::{emitter::Listener, status_event_name, Dispatcher, Emission, Event, StatusChange},
    idle::IdleSource,
    status::{Status, StatusModel},
    utils::clock::{Clock, DefaultClock},
};

struct TrackerState {
    model: StatusModel,
    dispatcher: Dispatcher,
    timer: Option<CancellationToken>,
    /// Bumped on every teardown. A tick only delivers while the epoch it started in is current.
    epoch: u64,
}

impl TrackerState {
    fn teardown(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.dispatcher.clear();
        self.epoch += 1;
    }
}

struct Shared {
    config: TrackerConfig,
    clock: Arc<dyn Clock>,
    idle_source: Mutex<Box<dyn IdleSource>>,
    state: Mutex<TrackerState>,
    /// Held for the whole of a tick so that ticks never overlap.
    tick: Mutex<()>,
}

/// Tracks whether the user is online or away.
///
/// Clones share the same tracker. No state lock is held while listeners run, so listeners are
/// free to query the tracker, (un)subscribe or even destroy it from inside a callback. Calling
/// [PresenceTracker::poll] from a listener deadlocks, since the tick it runs in is still going.
#[derive(Clone)]
pub struct PresenceTracker {
    shared: Arc<Shared>,
}

impl PresenceTracker {
    pub fn new(config: TrackerConfig, idle_source: impl IdleSource + 'static) -> Result<Self> {
        Self::with_clock(config, idle_source, DefaultClock)
    }

    pub fn with_clock(
        config: TrackerConfig,
        idle_source: impl IdleSource + 'static,
        clock: impl Clock,
    ) -> Result<Self> {
        config.validate()?;
        let model = StatusModel::new(config.initial_status, clock.time());
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                clock: Arc::new(clock),
                idle_source: Mutex::new(Box::new(idle_source)),
                state: Mutex::new(TrackerState {
                    model,
                    dispatcher: Dispatcher::default(),
                    timer: None,
                    epoch: 0,
                }),
                tick: Mutex::new(()),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }

    pub fn current_status(&self) -> Status {
        self.state().model.current_status()
    }

    pub fn last_online_at(&self) -> Option<DateTime<Utc>> {
        self.state().model.last_online_at()
    }

    /// Overrides the current status without emitting anything. Strings are validated first and
    /// an invalid one leaves the tracker untouched.
    pub fn set_status<S>(&self, status: S) -> Result<()>
    where
        S: TryInto<Status>,
        PresenceError: From<S::Error>,
    {
        let status = status.try_into()?;
        let now = self.shared.clock.time();
        self.state().model.set_status(status, now);
        Ok(())
    }

    pub fn on(&self, name: &str, listener: Listener) {
        self.state().dispatcher.on(name, listener);
    }

    pub fn off(&self, name: &str, listener: &Listener) {
        self.state().dispatcher.off(name, listener);
    }

    pub fn is_running(&self) -> bool {
        self.state()
            .timer
            .as_ref()
            .is_some_and(|timer| !timer.is_cancelled())
    }

    /// Starts polling every `poll_interval` on the current tokio runtime.
    ///
    /// If polling is already running it is torn down first, the same way [Self::destroy] does,
    /// including every subscription. The first `init` after construction or after `destroy`
    /// keeps whatever was subscribed in between.
    pub fn init(&self) -> Result<()> {
        let runtime = Handle::try_current().map_err(|_| PresenceError::NoRuntime)?;
        let token = CancellationToken::new();

        {
            let mut state = self.state();
            if state.timer.is_some() {
                info!("Re-initialising, dropping previous poll task and subscriptions");
                state.teardown();
            }
            state.timer = Some(token.clone());
        }

        info!(
            "Starting presence polling every {:?}",
            self.shared.config.poll_interval
        );
        runtime.spawn(
            poll_loop(
                Arc::downgrade(&self.shared),
                self.shared.clock.clone(),
                self.shared.config.poll_interval,
                token,
            )
            .instrument(info_span!("presence polling")),
        );
        Ok(())
    }

    /// Stops polling and drops every subscription. Nothing is emitted afterwards until the
    /// tracker is initialised and subscribed to again.
    pub fn destroy(&self) {
        self.state().teardown();
        info!("Presence tracker destroyed");
    }

    /// Emits `name` to its listeners right away, in registration order.
    pub fn emit(&self, name: &str, change: Option<StatusChange>) {
        let emission = self.state().dispatcher.prepare(Event {
            name: name.into(),
            change,
        });
        emission.deliver();
    }

    /// Delivers an emission unless the tracker was torn down since the tick started.
    fn deliver_in(&self, epoch: u64, emission: impl FnOnce(&Dispatcher) -> Emission) -> bool {
        let emission = {
            let state = self.state();
            if state.epoch != epoch {
                return false;
            }
            emission(&state.dispatcher)
        };
        emission.deliver();
        true
    }

    /// Runs a single tick: read idle time, transition if needed, then fire due timed events.
    /// Concurrent calls are serialised.
    pub fn poll(&self) {
        let _tick = self
            .shared
            .tick
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let epoch = self.state().epoch;

        let idle_time = {
            let mut source = self
                .shared
                .idle_source
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            source.idle_time()
        };
        let idle_time = match idle_time {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to read idle time, skipping tick {e:?}");
                return;
            }
        };
        let inactivity = self.shared.config.inactivity_duration;

        let previous_status = self.current_status();
        debug!("Polled idle time {idle_time:?} while {previous_status}");
        let next_status = match previous_status {
            Status::Online if idle_time >= inactivity => Some(Status::Away),
            Status::Away if idle_time < inactivity => Some(Status::Online),
            _ => None,
        };

        if let Some(current_status) = next_status {
            info!("Status changed from {previous_status} to {current_status}");
            // Listeners observe the previous status until both events are out.
            let change = Event::status_change(StatusChange {
                previous_status,
                current_status,
            });
            let status_event = Event::named(status_event_name(current_status));
            let delivered = self.deliver_in(epoch, |d| d.prepare(change))
                && self.deliver_in(epoch, |d| d.prepare(status_event));
            let now = self.shared.clock.time();
            self.state().model.set_status(current_status, now);
            if !delivered {
                debug!("Tracker torn down during the tick");
                return;
            }
        }

        for emission in self.due_timed_events(idle_time, inactivity) {
            debug!("Timed event {} is due", emission.event().name);
            if self.state().epoch != epoch {
                return;
            }
            emission.deliver();
        }
    }

    fn due_timed_events(&self, idle_time: Duration, inactivity: Duration) -> Vec<Emission> {
        let now = self.shared.clock.time();
        let state = self.state();
        let status = state.model.current_status();
        let elapsed = match status {
            // Idle time includes the stretch before the user crossed into away.
            Status::Away => idle_time.checked_sub(inactivity),
            Status::Online => state.model.online_for(now),
        };
        match elapsed {
            Some(elapsed) => state.dispatcher.due_timed_events(status, elapsed),
            None => vec![],
        }
    }
}

/// Poll task body. Ticks run one after another; a late tick pushes the following ones back
/// instead of bunching up.
async fn poll_loop(
    shared: Weak<Shared>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    shutdown: CancellationToken,
) {
    let mut tick_point = clock.instant();
    loop {
        tick_point = (tick_point + poll_interval).max(clock.instant());

        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("Poll task cancelled");
                return
            }
            _ = clock.sleep_until(tick_point) => ()
        }

        if shutdown.is_cancelled() {
            return;
        }
        let Some(shared) = shared.upgrade() else {
            debug!("Tracker dropped, stopping poll task");
            return;
        };
        PresenceTracker { shared }.poll();
    }
}
