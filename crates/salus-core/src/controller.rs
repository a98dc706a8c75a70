// ── Polling controller ──
//
// Lifecycle management for one thermostat: login, state declaration,
// periodic refresh, and routing of consumer write requests from the
// StateStore to the portal session.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use salus_api::{DeviceStatus, PortalSession};

use crate::config::ThermostatConfig;
use crate::error::CoreError;
use crate::guard::UpdateGuard;
use crate::state::{StateChange, StateKey, StateStore, StateValue, definitions};

// ── Outcomes ─────────────────────────────────────────────────────

/// Result of one refresh cycle. Errors never escape a cycle; they are
/// reported here and reflected in `info.connection`.
#[derive(Debug)]
pub enum RefreshOutcome {
    Updated(DeviceStatus),
    /// Another cycle held the update guard.
    Skipped,
    Failed(CoreError),
}

/// Result of handling one state change.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Acknowledged, deleted, mistyped, or not a writable key.
    Ignored,
    Applied,
    Failed(CoreError),
}

// ── Controller ───────────────────────────────────────────────────

/// Drives one thermostat against a [`StateStore`].
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Nothing touches the
/// network until [`start()`](Self::start) or one of the one-shot calls.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ThermostatConfig,
    store: Arc<StateStore>,
    session: StdMutex<Option<Arc<PortalSession>>>,
    update_in_progress: AtomicBool,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    pub fn new(config: ThermostatConfig, store: Arc<StateStore>) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                session: StdMutex::new(None),
                update_in_progress: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ThermostatConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.inner.store
    }

    /// Device id of the current portal session, if logged in.
    pub fn device_id(&self) -> Option<String> {
        let slot = self.inner.session.lock().expect("session lock poisoned");
        slot.as_ref().and_then(|s| s.device_id())
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start polling.
    ///
    /// Validates credentials (no network on failure), logs in, declares
    /// the state surface, subscribes to write requests, runs one refresh,
    /// then arms the periodic timer.
    pub async fn start(&self) -> Result<(), CoreError> {
        let config = &self.inner.config;
        config.validate()?;

        let session = self.session()?;
        session.login().await?;

        self.declare_states();

        // Subscribe before the first refresh so no request is missed.
        let rx = self.inner.store.subscribe();
        {
            let ctrl = self.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(command_task(ctrl, rx)));
        }

        self.refresh().await;

        let interval = config.effective_poll_interval();
        {
            let ctrl = self.clone();
            let cancel = self.inner.cancel.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(refresh_task(ctrl, interval, cancel)));
        }

        info!(
            interval_secs = interval.as_secs(),
            "controller started"
        );
        Ok(())
    }

    /// Stop the timer, the command task, and pending settle refreshes.
    ///
    /// In-flight portal calls are abandoned, so nothing is published once
    /// this returns. Safe to call before `start` and more than once.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        // Take the handles first: the command task may be waiting on this
        // lock to register a settle refresh.
        let handles = std::mem::take(&mut *self.inner.task_handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
        debug!("controller stopped");
    }

    /// Declare every state of the surface. Existing declarations and
    /// their values are kept.
    pub fn declare_states(&self) {
        self.inner.store.declare_all(definitions());
    }

    // ── Refresh cycle ────────────────────────────────────────────

    /// Run one refresh cycle unless one is already in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = UpdateGuard::try_acquire(&self.inner.update_in_progress) else {
            warn!("update already in progress, skipping");
            return RefreshOutcome::Skipped;
        };

        match self.read_status().await {
            Ok((status, device_id)) => {
                self.publish_status(&status, device_id);
                RefreshOutcome::Updated(status)
            }
            Err(e) => {
                error!(
                    error = %e,
                    transient = e.is_transient(),
                    "failed to update device status"
                );
                self.publish(StateKey::Connection, false);
                RefreshOutcome::Failed(e)
            }
        }
    }

    async fn read_status(&self) -> Result<(DeviceStatus, Option<String>), CoreError> {
        let session = self.session()?;
        let status = session.read().await?;
        Ok((status, session.device_id()))
    }

    fn publish_status(&self, status: &DeviceStatus, device_id: Option<String>) {
        self.publish(StateKey::CurrentTemp, status.current_temp);
        self.publish(StateKey::SetTemp, status.set_temp);
        self.publish(StateKey::AutoMode, status.auto_mode);
        self.publish(StateKey::HeatStatus, status.heat_active);
        self.publish(StateKey::Connection, true);
        self.publish(StateKey::DeviceId, device_id.unwrap_or_default());

        debug!(
            current = status.current_temp,
            set = status.set_temp,
            auto = status.auto_mode,
            heat = status.heat_active,
            "status updated"
        );
    }

    fn publish(&self, key: StateKey, value: impl Into<StateValue>) {
        if let Err(e) = self.inner.store.publish(key, value) {
            warn!(%key, error = %e, "could not publish state");
        }
    }

    // ── Write requests ───────────────────────────────────────────

    /// Turn an unacknowledged change into a portal write.
    ///
    /// On success the value is republished acknowledged and one refresh
    /// is scheduled after the settle delay. Failures are logged and the
    /// request stays unacknowledged.
    pub async fn handle_state_change(&self, change: StateChange) -> WriteOutcome {
        if change.ack {
            return WriteOutcome::Ignored;
        }
        let Some(value) = change.value else {
            return WriteOutcome::Ignored;
        };
        let key = change.key;

        let result = match (key, &value) {
            (StateKey::SetTemp, StateValue::Number(target)) => {
                info!(%key, %value, "user command received");
                self.set_temperature(*target).await
            }
            (StateKey::AutoMode, StateValue::Bool(enabled)) => {
                info!(%key, %value, "user command received");
                self.set_auto_mode(*enabled).await
            }
            (StateKey::SetTemp | StateKey::AutoMode, _) => {
                debug!(%key, kind = %value.kind(), "ignoring mistyped request");
                return WriteOutcome::Ignored;
            }
            _ => {
                warn!(%key, "unknown state change");
                return WriteOutcome::Ignored;
            }
        };

        match result {
            Ok(_) => {
                self.publish(key, value);
                self.schedule_settle_refresh().await;
                WriteOutcome::Applied
            }
            Err(e) => {
                error!(%key, error = %e, "failed to process state change");
                WriteOutcome::Failed(e)
            }
        }
    }

    async fn schedule_settle_refresh(&self) {
        let ctrl = self.clone();
        let cancel = self.inner.cancel.clone();
        let delay = self.inner.config.settle_delay;

        let handle = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    run_until_cancelled(&cancel, ctrl.refresh()).await;
                }
            }
        });

        let mut handles = self.inner.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    // ── Direct operations ────────────────────────────────────────

    /// Read the thermostat once, bypassing the state surface.
    pub async fn read_once(&self) -> Result<DeviceStatus, CoreError> {
        self.inner.config.validate()?;
        Ok(self.session()?.read().await?)
    }

    /// Set the target temperature. Returns the portal confirmation.
    pub async fn set_temperature(&self, value: f64) -> Result<Value, CoreError> {
        self.inner.config.validate()?;
        Ok(self.session()?.set_temperature(value).await?)
    }

    /// Switch between AUTO (`true`) and OFF (`false`).
    pub async fn set_auto_mode(&self, enabled: bool) -> Result<Value, CoreError> {
        self.inner.config.validate()?;
        Ok(self.session()?.set_auto_mode(enabled).await?)
    }

    /// One-shot: run `f` against a logged-in controller, then shut down.
    ///
    /// No state surface, no timer. Meant for single CLI invocations.
    pub async fn oneshot<F, Fut, T>(config: ThermostatConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        config.validate()?;
        let controller = Controller::new(config, Arc::new(StateStore::new()));
        controller.session()?.login().await?;

        let result = f(controller.clone()).await;
        controller.shutdown().await;
        result
    }

    // ── Helpers ──────────────────────────────────────────────────

    /// The portal session, built on first use. Building does not touch
    /// the network.
    fn session(&self) -> Result<Arc<PortalSession>, CoreError> {
        let mut slot = self.inner.session.lock().expect("session lock poisoned");
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }

        let config = &self.inner.config;
        let session = Arc::new(PortalSession::new(
            config.credentials(),
            &config.transport(),
        )?);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Run a refresh cycle on every tick.
async fn refresh_task(controller: Controller, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if run_until_cancelled(&cancel, controller.refresh()).await.is_none() {
                    break;
                }
            }
        }
    }
}

/// Route unacknowledged state changes to portal writes.
async fn command_task(controller: Controller, mut rx: broadcast::Receiver<StateChange>) {
    let cancel = controller.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            change = rx.recv() => match change {
                Ok(change) => {
                    let write = controller.handle_state_change(change);
                    if run_until_cancelled(&cancel, write).await.is_none() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "state change receiver lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// Drive `work` unless shutdown wins first; `None` means it was dropped
/// mid-flight.
async fn run_until_cancelled<F: Future>(
    cancel: &CancellationToken,
    work: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = work => Some(out),
    }
}
