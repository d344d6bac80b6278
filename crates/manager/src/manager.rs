use keeper_cli::{extract, CliGateway, Subcommand};
use keeper_core::{
    validate_threshold, BatteryEvent, BatteryInfo, CallbackResult, CliResult, EventKind, KeeperError,
    Listeners,
};
use tracing::{debug, info, warn};

/// Owns the current battery snapshot and mediates every threshold change.
///
/// All calls block until the external tool has finished, including the
/// follow-up refresh after a successful mutation, so calls never overlap.
/// The manager is not reentrant; callers driving it from a timer must skip
/// a tick while a previous call is still running.
#[derive(Debug)]
pub struct BatteryManager {
    gateway: CliGateway,
    /// `None` until the first successful [`initialize`](Self::initialize).
    current: Option<BatteryInfo>,
    listeners: Listeners<BatteryEvent>,
}

impl Default for BatteryManager {
    fn default() -> Self {
        Self::new(CliGateway::default())
    }
}

impl BatteryManager {
    pub fn new(gateway: CliGateway) -> Self {
        Self {
            gateway,
            current: None,
            listeners: Listeners::default(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    /// The latest snapshot, if initialized.
    pub fn current_info(&self) -> Option<&BatteryInfo> {
        self.current.as_ref()
    }

    pub fn register_event_callback(
        &mut self,
        callback: impl Fn(&BatteryEvent) -> CallbackResult + Send + 'static,
    ) {
        self.listeners.register(callback);
    }

    /// Query and store the first snapshot. State is untouched on failure.
    pub fn initialize(&mut self) -> CliResult {
        let info = self
            .query()
            .map_err(|e| e.context("Failed to initialize"))?;
        info!("Battery manager initialized: {info}");
        self.current = Some(info);
        Ok(())
    }

    /// Replace the snapshot with a fresh query and publish any transitions.
    pub fn refresh_status(&mut self) -> CliResult {
        let Some(previous) = &self.current else {
            return Err(KeeperError::NotInitialized);
        };
        let old_threshold = previous.end_threshold;

        let info = self
            .query()
            .map_err(|e| e.context("Failed to refresh status"))?;
        let new_threshold = info.end_threshold;
        debug!("Refreshed battery status: {info}");
        self.current = Some(info);

        if old_threshold != new_threshold {
            info!("Charge threshold changed: {old_threshold}% -> {new_threshold}%");
            self.listeners.emit(&BatteryEvent::now(EventKind::ThresholdChanged {
                old_threshold,
                new_threshold,
            }));
        }
        Ok(())
    }

    /// Set the end threshold until the next reboot.
    pub fn set_threshold(&mut self, threshold: i64) -> CliResult {
        self.ensure_initialized()?;
        let threshold = validate_threshold(threshold)?;
        self.mutate(Subcommand::Set(threshold))
    }

    /// Set the end threshold and keep it across boot and resume.
    pub fn persist_threshold(&mut self, threshold: i64) -> CliResult {
        self.ensure_initialized()?;
        let threshold = validate_threshold(threshold)?;
        self.mutate(Subcommand::Persist(threshold))
    }

    /// Remove the limit so the battery charges to 100%.
    pub fn clear_threshold(&mut self) -> CliResult {
        self.ensure_initialized()?;
        self.mutate(Subcommand::Clear)
    }

    fn ensure_initialized(&self) -> CliResult {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(KeeperError::NotInitialized)
        }
    }

    /// Run a mutating subcommand, then resynchronize from the tool.
    ///
    /// The resulting snapshot is authoritative: the tool may clamp or ignore
    /// the requested value.
    fn mutate(&mut self, subcommand: Subcommand) -> CliResult {
        self.gateway.run(subcommand)?;
        info!("Applied {:?}", subcommand);

        if let Err(e) = self.refresh_status() {
            // The change itself went through; only the resync failed.
            warn!("{e}");
        }
        Ok(())
    }

    fn query(&self) -> CliResult<BatteryInfo> {
        let output = self.gateway.run(Subcommand::Status)?;
        extract(&output)
    }
}
