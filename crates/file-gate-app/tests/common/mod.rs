//! Shared fixtures for portal integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use file_gate_app::{Portal, PortalEvent};
use file_gate_core::{GateConfig, LockRecord};
use file_gate_download::{DownloadError, FileProbe, ProbeResponse};
use file_gate_session::{KeyValueStore, MemoryStore, StoreError};
use file_gate_timer::ManualClock;

/// Shared secret used by [`test_config`].
#[allow(dead_code)]
pub const SECRET: &str = "access2024";

/// File location used by [`test_config`].
#[allow(dead_code)]
pub const FILE_URL: &str = "https://files.example.test/generated_file.ext";

/// Fixed start instant for every harness.
#[allow(dead_code)]
pub const T0: u64 = 1_700_000_000_000;

/// Default configuration pointing at the test file location.
#[allow(dead_code)]
pub fn test_config() -> GateConfig {
    GateConfig {
        secret: SECRET.to_string(),
        file_url: FILE_URL.to_string(),
        ..GateConfig::default()
    }
}

/// Probe returning a fixed answer and counting calls.
#[derive(Debug)]
pub struct StubProbe {
    answer: Result<ProbeResponse, String>,
    calls: AtomicUsize,
}

impl StubProbe {
    /// Probe answering `200` with a suggested filename.
    #[allow(dead_code)]
    pub fn ok(filename: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(ProbeResponse {
                status: 200,
                content_disposition: Some(format!("attachment; filename=\"{filename}\"")),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    /// Probe answering with `status` and no headers.
    #[allow(dead_code)]
    pub fn status(status: u16) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(ProbeResponse {
                status,
                content_disposition: None,
            }),
            calls: AtomicUsize::new(0),
        })
    }

    /// Probe failing at the transport level.
    #[allow(dead_code)]
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            answer: Err("connection refused".to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of probes issued.
    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FileProbe for StubProbe {
    fn probe(&self, _url: &str) -> Result<ProbeResponse, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(DownloadError::Transport)
    }
}

/// Store whose every operation fails, like disabled browser storage.
#[derive(Debug, Default)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("storage disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage disabled".to_string()))
    }
}

/// One portal plus the handles a test needs to drive it.
pub struct Harness {
    /// Portal under test.
    pub portal: Portal,
    /// Clock shared with the portal.
    pub clock: ManualClock,
    /// Probe handed to the portal.
    pub probe: Arc<StubProbe>,
}

impl Harness {
    /// Advances time by `delta_ms` and polls once.
    #[allow(dead_code)]
    pub fn advance(&mut self, delta_ms: u64) -> Vec<PortalEvent> {
        self.clock.advance(delta_ms);
        self.portal.poll()
    }

    /// Advances `total_ms` in `step_ms` increments, polling after each.
    #[allow(dead_code)]
    pub fn advance_in_steps(&mut self, total_ms: u64, step_ms: u64) -> Vec<PortalEvent> {
        let mut events = Vec::new();
        let mut elapsed = 0;
        while elapsed < total_ms {
            let step = step_ms.min(total_ms - elapsed);
            events.extend(self.advance(step));
            elapsed += step;
        }
        events
    }

    /// Current instant of the shared clock.
    #[allow(dead_code)]
    pub fn clock_now(&self) -> u64 {
        use file_gate_timer::Clock;
        self.clock.now_ms()
    }

    /// Submits the correct secret and waits out the verification delay.
    #[allow(dead_code)]
    pub fn login(&mut self) -> Vec<PortalEvent> {
        self.portal.submit(SECRET);
        self.advance(self.portal.config().login_delay_ms)
    }
}

/// Builds an unloaded portal over `store` with its own clock at [`T0`].
#[allow(dead_code)]
pub fn harness_on(store: Arc<dyn KeyValueStore>, probe: Arc<StubProbe>) -> Harness {
    harness_with_clock(store, probe, ManualClock::new(T0))
}

/// Builds an unloaded portal sharing `clock` with other portals.
#[allow(dead_code)]
pub fn harness_with_clock(
    store: Arc<dyn KeyValueStore>,
    probe: Arc<StubProbe>,
    clock: ManualClock,
) -> Harness {
    let portal = Portal::new(test_config(), store, probe.clone(), Arc::new(clock.clone()))
        .expect("test portal should build");
    Harness {
        portal,
        clock,
        probe,
    }
}

/// Builds and loads a portal over a fresh memory store.
#[allow(dead_code)]
pub fn loaded_harness() -> (Harness, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let mut harness = harness_on(store.clone(), StubProbe::ok("generated_file.ext"));
    harness.portal.load().expect("first load should succeed");
    (harness, store)
}

/// Reads the lock record straight from the backend.
#[allow(dead_code)]
pub fn stored_lock(store: &dyn KeyValueStore) -> Option<LockRecord> {
    store
        .get(file_gate_core::DEFAULT_LOCK_KEY)
        .expect("backend read should succeed")
        .and_then(|raw| LockRecord::decode(&raw))
}

/// Writes a lock record straight into the backend.
#[allow(dead_code)]
pub fn seed_lock(store: &dyn KeyValueStore, record: LockRecord) {
    let raw = record.to_json().expect("record should encode");
    store
        .set(file_gate_core::DEFAULT_LOCK_KEY, &raw)
        .expect("backend write should succeed");
}
