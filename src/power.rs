//! Power state table and autonomous power state transition table builder.

use crate::identify::{PS_FLAG_NON_OPERATIONAL, PowerStateDescriptor};

/// Highest power state index the APST feature can address.
pub const MAX_POWER_STATE_INDEX: u8 = 31;

/// Granularity of the idle transition time field in microseconds.
pub const APST_TRANSITION_UNIT_US: u64 = 1_000;

/// Maximum representable idle transition time, in transition units.
pub const APST_MAX_TRANSITION_UNITS: u64 = (1 << 24) - 1;

/// Power state information relevant to autonomous transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerState {
    /// Entry latency in microseconds
    pub entry_latency_us: u32,
    /// Exit latency in microseconds
    pub exit_latency_us: u32,
    /// Non-operational state
    pub non_operational: bool,
}

impl PowerState {
    /// Aggregate cost of entering and then leaving this state.
    pub fn total_latency_us(&self) -> u64 {
        self.entry_latency_us as u64 + self.exit_latency_us as u64
    }
}

impl From<&PowerStateDescriptor> for PowerState {
    fn from(desc: &PowerStateDescriptor) -> Self {
        Self {
            entry_latency_us: desc.entry_latency,
            exit_latency_us: desc.exit_latency,
            non_operational: (desc.flags & PS_FLAG_NON_OPERATIONAL) != 0,
        }
    }
}

/// Per-controller power state context.
///
/// Replaced wholesale from identify data; the states are immutable hardware
/// facts for the lifetime of one identify snapshot. The table is fixed-size
/// to mirror the wire format, with `npss` bounding the valid entries.
#[derive(Debug, Clone)]
pub struct PowerContext {
    /// Number of power states support (zero-based maximum index).
    /// Index `npss` is the lowest-power state.
    pub npss: u8,
    /// Whether the controller advertises APST support
    pub apst_supported: bool,
    /// Maximum acceptable aggregate transition latency in microseconds.
    /// `u64::MAX` means unconstrained; `0` disables APST entirely.
    pub ps_max_latency_us: u64,
    /// Power state table; only indices `0..=npss` are meaningful
    pub states: [PowerState; 32],
}

impl PowerContext {
    /// Create an empty context with no identify data applied yet.
    pub fn new() -> Self {
        Self {
            npss: 0,
            apst_supported: false,
            ps_max_latency_us: u64::MAX,
            states: [PowerState::default(); 32],
        }
    }
}

impl Default for PowerContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Autonomous power state transition feature payload.
///
/// One 64-bit entry per power state index. A zero entry programs no
/// autonomous target for that state. This is a transient artifact of one
/// build-and-program pass, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApstTable {
    /// Raw transition entries, one per power state index
    pub entries: [u64; 32],
}

impl ApstTable {
    /// Create an all-zero table.
    pub fn zeroed() -> Self {
        Self { entries: [0; 32] }
    }

    /// Serialize to the Set Features data buffer layout.
    pub fn as_bytes(&self) -> [u8; 256] {
        let mut bytes = [0u8; 256];
        for (chunk, entry) in bytes.chunks_exact_mut(8).zip(self.entries.iter()) {
            chunk.copy_from_slice(&entry.to_le_bytes());
        }
        bytes
    }
}

/// Encode one transition entry targeting `state` after an idle period equal
/// to the state's full entry-plus-exit latency.
fn apst_entry(state: u8, total_latency_us: u64) -> u64 {
    let mut transition_units = total_latency_us.div_ceil(APST_TRANSITION_UNIT_US);
    if transition_units > APST_MAX_TRANSITION_UNITS {
        transition_units = APST_MAX_TRANSITION_UNITS;
    }
    ((state as u64) << 3) | (transition_units << 8)
}

/// Build the APST table for a controller.
///
/// Walks the table from the lowest-power state toward the highest-power
/// state. Each state is programmed to transition to the nearest deeper
/// non-operational state whose entry-plus-exit latency fits within the
/// latency ceiling; the idle time before the transition is 100% of that
/// total latency, which bounds time spent transitioning to at most half the
/// idle period.
///
/// Returns the payload and whether the feature should be enabled. A zero
/// ceiling turns APST off entirely; a ceiling no state satisfies yields an
/// enabled feature with an empty table.
///
/// The caller must have checked `context.npss <= MAX_POWER_STATE_INDEX`.
pub fn build_apst_table(context: &PowerContext) -> (ApstTable, bool) {
    let mut table = ApstTable::zeroed();

    if context.ps_max_latency_us == 0 {
        return (table, false);
    }

    let mut target = 0u64;
    for state in (0..=context.npss).rev() {
        if target != 0 {
            table.entries[state as usize] = target;
        }

        // Only non-operational states are useful autonomous targets.
        let ps = &context.states[state as usize];
        if !ps.non_operational {
            continue;
        }

        let total_latency_us = ps.total_latency_us();
        if total_latency_us > context.ps_max_latency_us {
            continue;
        }

        target = apst_entry(state, total_latency_us);
    }

    (table, true)
}
