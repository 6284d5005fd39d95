//! The achievement manager: aggregate root and mutation authority.
//!
//! Owns the ordered achievement collection, classifies protected (built-in)
//! versus externally registered achievements, gates every mutation of a
//! protected achievement behind a capability token, drives monitor
//! lifecycles, and owns persistence. All mutation flows through this one
//! choke point; monitors and collaborators never touch an achievement
//! directly.

use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use error::TrackerError;
use store::{KvStore, PersistenceCodec, ResetCommand, STATE_KEY};

use crate::achievement::Achievement;
use crate::builtin::{self, RESERVED_ID};
use crate::events::{ACHIEVEMENT_UNLOCKED, EventSink, NotificationQueue};
use crate::monitor::{MonitorHooks, ProgressSignal, SignalSender};
use crate::persist::{self, StoredAchievement};
use crate::reconcile::{self, RegistrationHook};

/// Shared secret authorizing mutation of protected achievements.
///
/// Injected at construction and compared by exact string equality; never
/// read from ambient process configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct CapabilityToken(String);

impl CapabilityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// `true` when the candidate token matches exactly.
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        candidate == Some(self.0.as_str())
    }

}

impl fmt::Debug for CapabilityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CapabilityToken(..)")
    }
}

/// Who owns an achievement's definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Compiled into this crate; its identifier is protected.
    Builtin,
    /// Registered by an external collaborator.
    External,
}

/// One achievement plus its classification and optional monitor.
struct Registration {
    achievement: Achievement,
    origin: Origin,
    monitor: Option<MonitorHooks>,
}

/// Configuration injected into the manager at construction.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Capability token protecting built-in achievements.
    pub token: String,
    /// Secret key for the persistence codec.
    pub secret: String,
    /// Key the collection is stored under.
    pub storage_key: String,
    /// Interval between scheduled persists.
    pub autosave_interval: Duration,
}

impl ManagerConfig {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
            storage_key: STATE_KEY.to_string(),
            autosave_interval: Duration::from_secs(60),
        }
    }
}

/// Tracks when the next scheduled persist is due.
#[derive(Debug)]
struct AutosaveTimer {
    interval: Duration,
    last_save: Option<Instant>,
}

impl AutosaveTimer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_save: None,
        }
    }

    fn due(&self) -> bool {
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    fn mark(&mut self) {
        self.last_save = Some(Instant::now());
    }
}

/// Manager for all achievements.
pub struct AchievementManager {
    entries: Vec<Registration>,
    /// Stored progress for identifiers whose definitions were unknown at
    /// load time, staged until their owners register.
    pending_settings: HashMap<String, StoredAchievement>,
    token: CapabilityToken,
    codec: PersistenceCodec,
    store: Box<dyn KvStore>,
    storage_key: String,
    sink: Box<dyn EventSink>,
    queue: NotificationQueue,
    registry: Option<Box<dyn RegistrationHook>>,
    started: bool,
    autosave: AutosaveTimer,
    signal_tx: SignalSender,
    signal_rx: Receiver<ProgressSignal>,
}

impl AchievementManager {
    /// Creates a manager, loading prior state from the store or falling
    /// back to the built-in defaults when none exists or it fails its
    /// integrity check.
    pub fn new(
        config: ManagerConfig,
        store: Box<dyn KvStore>,
        sink: Box<dyn EventSink>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel();
        let mut manager = Self {
            entries: Vec::new(),
            pending_settings: HashMap::new(),
            token: CapabilityToken::new(config.token),
            codec: PersistenceCodec::new(&config.secret),
            store,
            storage_key: config.storage_key,
            sink,
            queue: NotificationQueue::new(),
            registry: None,
            started: false,
            autosave: AutosaveTimer::new(config.autosave_interval),
            signal_tx,
            signal_rx,
        };
        manager.load_or_default();
        manager
    }

    /// Installs the hook through which external collaborators register
    /// achievements; consumed by [`Self::check_for_changes`].
    pub fn set_registration_hook(&mut self, hook: Box<dyn RegistrationHook>) {
        self.registry = Some(hook);
    }

    fn load_or_default(&mut self) {
        if let Err(err) = self.load_stored() {
            warn!(error = %err, "failed to load stored achievements; falling back to defaults");
            self.entries.clear();
            self.pending_settings.clear();
        }
        self.install_missing_builtins();
    }

    fn load_stored(&mut self) -> Result<(), TrackerError> {
        let Some(raw) = self.store.get(&self.storage_key) else {
            return Ok(());
        };
        let plaintext = self.codec.open(&raw)?;
        let records = persist::decode_collection(&plaintext)?;

        for record in records {
            if builtin::is_protected(&record.id) {
                let achievement = record.to_achievement()?;
                self.add_with_monitor(achievement, Origin::Builtin, None);
            } else {
                // Definition owner has not registered yet; stage the
                // progress for reconciliation.
                self.pending_settings.insert(record.id.clone(), record);
            }
        }
        Ok(())
    }

    fn install_missing_builtins(&mut self) {
        match builtin::default_achievements() {
            Ok(defaults) => {
                for achievement in defaults {
                    if self.get(achievement.id()).is_none() {
                        self.add_with_monitor(achievement, Origin::Builtin, None);
                    }
                }
            }
            Err(err) => warn!(error = %err, "failed to build default achievements"),
        }
    }

    /// Adds an achievement without a monitor. Duplicate or reserved
    /// identifiers are logged and rejected, never panicked on.
    pub fn add(&mut self, achievement: Achievement, origin: Origin) -> bool {
        self.add_with_monitor(achievement, origin, None)
    }

    /// Adds an achievement together with its optional monitor capability.
    ///
    /// If monitoring has already started, the monitor is started
    /// immediately. Externally registered identifiers pick up any progress
    /// staged for them during load.
    pub fn add_with_monitor(
        &mut self,
        mut achievement: Achievement,
        origin: Origin,
        mut monitor: Option<MonitorHooks>,
    ) -> bool {
        let id = achievement.id().to_string();
        if id.trim().is_empty() {
            warn!("attempted to add an achievement without an identifier");
            return false;
        }
        if id == RESERVED_ID {
            warn!(id = %id, "achievement identifier is reserved");
            return false;
        }
        if self.get(&id).is_some() {
            warn!(id = %id, "achievement with this identifier already exists");
            return false;
        }

        if origin == Origin::External {
            if let Some(staged) = self.pending_settings.remove(&id) {
                match restore_staged(&achievement, &staged) {
                    Ok(restored) => achievement = restored,
                    Err(err) => {
                        warn!(id = %id, error = %err, "discarding unusable staged progress");
                    }
                }
            }
        }

        if self.started {
            if let Some(hooks) = monitor.as_mut() {
                hooks.stop();
                hooks.start(self.signal_tx.clone());
            }
        }

        self.entries.push(Registration {
            achievement,
            origin,
            monitor,
        });
        true
    }

    /// Returns the achievement matching `id`, if any.
    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.entries
            .iter()
            .map(|entry| &entry.achievement)
            .find(|achievement| achievement.id() == id)
    }

    /// All achievements in insertion order.
    pub fn achievements(&self) -> impl Iterator<Item = &Achievement> {
        self.entries.iter().map(|entry| &entry.achievement)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stored records still waiting for their owner to register.
    pub fn staged_count(&self) -> usize {
        self.pending_settings.len()
    }

    /// Applies a progress delta to the achievement matching `id`.
    ///
    /// Missing/empty identifiers and negative deltas are usage errors and
    /// surface immediately. A wrong or missing token on a protected
    /// identifier is logged and skipped. An unknown identifier is logged,
    /// not an error. Persists whenever the update unlocked a level.
    pub fn update(
        &mut self,
        id: &str,
        delta: f64,
        token: Option<&str>,
    ) -> Result<(), TrackerError> {
        if id.trim().is_empty() {
            return Err(TrackerError::MissingId);
        }
        if !delta.is_finite() || delta < 0.0 {
            return Err(TrackerError::InvalidDelta(delta));
        }
        if builtin::is_protected(id) && !self.token.matches(token) {
            warn!(id = %id, "attempted to update a protected achievement without authorization");
            return Ok(());
        }

        let mut unlocked = 0;
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.achievement.id() == id)
        {
            Some(entry) => unlocked = entry.achievement.update(delta, &mut self.queue)?,
            None => warn!(id = %id, "could not find achievement to update"),
        }

        if unlocked > 0 {
            if let Err(err) = self.save() {
                warn!(error = %err, "failed to persist after unlock");
            }
        }
        self.deliver_due();
        Ok(())
    }

    /// Removes an externally registered achievement, stopping its monitor
    /// first. Protected achievements can never be removed.
    pub fn remove(&mut self, id: &str) -> bool {
        if builtin::is_protected(id) {
            warn!(id = %id, "protected achievements cannot be removed");
            return false;
        }
        match self
            .entries
            .iter()
            .position(|entry| entry.achievement.id() == id)
        {
            Some(at) => {
                let mut entry = self.entries.remove(at);
                if let Some(hooks) = entry.monitor.as_mut() {
                    hooks.stop();
                }
                true
            }
            None => {
                warn!(id = %id, "could not find achievement to remove");
                false
            }
        }
    }

    /// Resets one achievement, or every achievement when `id` is `"all"`.
    ///
    /// Token-gated like [`Self::update`]; the `"all"` sentinel always
    /// requires the token since it touches protected achievements. Persists
    /// afterwards unless `suppress_save`.
    pub fn reset(
        &mut self,
        id: &str,
        overall: bool,
        token: Option<&str>,
        suppress_save: bool,
    ) -> Result<(), TrackerError> {
        if id.trim().is_empty() {
            return Err(TrackerError::MissingId);
        }

        if id == RESERVED_ID {
            if !self.token.matches(token) {
                warn!("attempted to reset all achievements without authorization");
                return Ok(());
            }
            for entry in &mut self.entries {
                entry.achievement.reset(overall);
            }
        } else {
            if builtin::is_protected(id) && !self.token.matches(token) {
                warn!(id = %id, "attempted to reset a protected achievement without authorization");
                return Ok(());
            }
            match self
                .entries
                .iter_mut()
                .find(|entry| entry.achievement.id() == id)
            {
                Some(entry) => entry.achievement.reset(overall),
                None => warn!(id = %id, "could not find achievement to reset"),
            }
        }

        if !suppress_save {
            self.save()?;
        }
        Ok(())
    }

    fn reset_internal(&mut self, id: &str) {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.achievement.id() == id)
        {
            Some(entry) => entry.achievement.reset(true),
            None => warn!(id = %id, "emergency reset names an unknown achievement"),
        }
    }

    /// Starts every monitor, binding it to this manager's signal channel.
    /// Newly added achievements with monitors are started immediately from
    /// now on.
    pub fn start_monitoring(&mut self) {
        self.started = true;
        for entry in &mut self.entries {
            if let Some(hooks) = entry.monitor.as_mut() {
                // stop() is idempotent; clearing first guarantees a restart
                // never doubles up callbacks.
                hooks.stop();
                hooks.start(self.signal_tx.clone());
            }
        }
    }

    /// Stops every monitor.
    pub fn stop_monitoring(&mut self) {
        self.started = false;
        for entry in &mut self.entries {
            if let Some(hooks) = entry.monitor.as_mut() {
                hooks.stop();
            }
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Drains queued monitor signals through [`Self::update`]. Invalid
    /// signals are logged and dropped; monitors cannot crash the manager.
    pub fn pump_signals(&mut self) {
        while let Ok(signal) = self.signal_rx.try_recv() {
            if let Err(err) = self.update(&signal.id, signal.delta, signal.token.as_deref()) {
                warn!(id = %signal.id, error = %err, "dropping invalid monitor signal");
            }
        }
    }

    /// One cooperative step: pump monitor signals, deliver due
    /// notifications, and persist when the autosave interval has elapsed.
    pub fn tick(&mut self) {
        self.pump_signals();
        self.deliver_due();
        if self.autosave.due() {
            if let Err(err) = self.save() {
                warn!(error = %err, "scheduled save failed");
            }
        }
    }

    fn deliver_due(&mut self) {
        for event in self.queue.drain_due() {
            self.sink.emit(ACHIEVEMENT_UNLOCKED, &event);
        }
    }

    /// Delivers every pending notification immediately, regardless of its
    /// stagger delay. Intended for host unload.
    pub fn flush_notifications(&mut self) {
        for event in self.queue.drain_all() {
            self.sink.emit(ACHIEVEMENT_UNLOCKED, &event);
        }
    }

    /// Reconciles the collection against live definitions: absorbs external
    /// registrations (last one wins per identifier) and migrates built-ins
    /// whose compiled definitions changed since the stored state was
    /// written. Runs after load, before monitoring starts.
    pub fn check_for_changes(&mut self) {
        if let Some(mut hook) = self.registry.take() {
            for descriptor in reconcile::dedupe_last_wins(hook.achievements()) {
                let id = descriptor.id.clone();
                match descriptor.into_parts() {
                    Ok((achievement, monitor)) => {
                        self.add_with_monitor(achievement, Origin::External, monitor);
                    }
                    Err(err) => {
                        warn!(id = %id, error = %err, "skipping invalid external registration");
                    }
                }
            }
            self.registry = Some(hook);
        }

        // Internal migration; bypasses the public token gate on purpose.
        for at in 0..self.entries.len() {
            if self.entries[at].origin != Origin::Builtin {
                continue;
            }
            let id = self.entries[at].achievement.id().to_string();
            let Some(live) = builtin::definition(&id) else {
                continue;
            };
            match reconcile::migrate(&self.entries[at].achievement, live) {
                Ok(Some(migrated)) => {
                    info!(id = %id, level = migrated.level(), "migrated achievement to changed definition");
                    self.entries[at].achievement = migrated;
                }
                Ok(None) => {}
                Err(err) => warn!(id = %id, error = %err, "failed to migrate achievement"),
            }
        }

        if let Err(err) = self.save() {
            warn!(error = %err, "failed to persist reconciled achievements");
        }
    }

    /// Persists the collection, honoring the emergency reset sentinel.
    ///
    /// When the currently stored value is a plaintext reset command, the
    /// command is executed instead of the requested save: `reset`/
    /// `reset:all` clears the stored entry; `reset:<ids>` resets each named
    /// achievement with the internal token, persisting after each one to
    /// bound data loss if interrupted.
    pub fn save(&mut self) -> Result<(), TrackerError> {
        if let Some(raw) = self.store.get(&self.storage_key) {
            if let Some(command) = ResetCommand::parse(&raw) {
                return self.handle_reset_command(command);
            }
        }
        self.write_state()
    }

    fn handle_reset_command(&mut self, command: ResetCommand) -> Result<(), TrackerError> {
        match command {
            ResetCommand::Clear => {
                warn!("emergency reset: clearing stored achievement data");
                self.store.remove(&self.storage_key)
            }
            ResetCommand::Ids(ids) => {
                warn!(?ids, "emergency reset: resetting named achievements");
                for id in ids {
                    self.reset_internal(&id);
                    self.write_state()?;
                }
                Ok(())
            }
        }
    }

    fn write_state(&mut self) -> Result<(), TrackerError> {
        let mut records: Vec<StoredAchievement> = self
            .entries
            .iter()
            .map(|entry| StoredAchievement::from_achievement(&entry.achievement))
            .collect();

        // Staged records survive a save so late registrants keep their
        // progress, in a stable order.
        let mut staged: Vec<StoredAchievement> =
            self.pending_settings.values().cloned().collect();
        staged.sort_by(|a, b| a.id.cmp(&b.id));
        records.extend(staged);

        let plaintext = persist::encode_collection(&records)?;
        let sealed = self.codec.seal(&plaintext)?;
        self.store.set(&self.storage_key, &sealed)?;
        self.autosave.mark();
        Ok(())
    }
}

/// Applies staged stored progress to a freshly registered achievement.
///
/// A matching table restores level and progress exactly; a changed table
/// remaps the stored cumulative progress onto the new widths.
fn restore_staged(
    achievement: &Achievement,
    staged: &StoredAchievement,
) -> Result<Achievement, TrackerError> {
    let stored_table = staged.settings.to_table()?;
    let (level, progress) = if stored_table.same_widths(achievement.table()) {
        (staged.level, staged.progress)
    } else {
        let cumulative = staged.cumulative_progress()?;
        reconcile::remap_progress(achievement.table(), cumulative)
    };
    Achievement::restore(achievement.id(), achievement.table().clone(), level, progress)
}
