//! Per-controller autonomous power state transition management.

use log::{debug, warn};

use crate::error::Result;
use crate::features::{AdminTransport, FeatureId};
use crate::identify::IdentifyController;
use crate::latency::{LatencyToleranceHook, normalize_latency_tolerance};
use crate::power::{MAX_POWER_STATE_INDEX, PowerContext, PowerState, build_apst_table};

/// Construction options for [`ApstManager`].
#[derive(Debug, Clone, Copy)]
pub struct ApstOptions {
    /// Initial latency ceiling in microseconds, applied once at controller
    /// initialization. Values above `i32::MAX` are treated as unconstrained.
    pub default_ps_max_latency_us: u64,
}

impl Default for ApstOptions {
    fn default() -> Self {
        Self {
            default_ps_max_latency_us: 100_000,
        }
    }
}

/// Autonomous power state transition manager for one controller.
///
/// Owns the controller's power state context and funnels both reconfiguration
/// triggers (identify refresh and latency tolerance updates) into a single
/// build-and-program pass. Callers serialize access per controller through
/// the exclusive borrow; no additional locking happens here.
///
/// Failure to program APST is never fatal: the controller keeps operating
/// with whatever power state behavior the hardware retained.
pub struct ApstManager {
    context: PowerContext,
}

impl ApstManager {
    /// Create a manager for a newly initialized controller.
    ///
    /// The initial latency ceiling is seeded from the configured default,
    /// clamped to `i32::MAX` and routed through the same normalization as a
    /// live latency tolerance request.
    pub fn new(options: &ApstOptions) -> Self {
        let mut context = PowerContext::new();
        let initial = options.default_ps_max_latency_us.min(i32::MAX as u64) as i32;
        context.ps_max_latency_us = normalize_latency_tolerance(initial);
        Self { context }
    }

    /// Current power state context.
    pub fn context(&self) -> &PowerContext {
        &self.context
    }

    /// Apply freshly fetched identify data.
    ///
    /// Invoked at controller initialization and after every successful
    /// identify, including post-reset re-identify. Overwrites the power
    /// state table as a unit, updates the latency tolerance control surface
    /// on support flag edges, and reprograms the feature when supported (a
    /// reset may have cleared the hardware's live APST state).
    pub fn handle_identify<T, H>(&mut self, id: &IdentifyController, transport: &mut T, hook: &mut H)
    where
        T: AdminTransport,
        H: LatencyToleranceHook,
    {
        let prev_apsta = self.context.apst_supported;

        self.context.npss = id.npss;
        self.context.apst_supported = id.supports_apst();
        let descriptors = id.psd;
        for (state, desc) in self.context.states.iter_mut().zip(descriptors.iter()) {
            *state = PowerState::from(desc);
        }

        if self.context.apst_supported && !prev_apsta {
            hook.expose_latency_tolerance();
        } else if !self.context.apst_supported && prev_apsta {
            hook.hide_latency_tolerance();
        }

        if self.context.apst_supported {
            if let Err(err) = self.configure(transport) {
                warn!("failed to set APST feature: {}", err);
            }
        }
    }

    /// Handle a latency tolerance request from the OS power management layer.
    ///
    /// A request that normalizes to the current ceiling is a no-op;
    /// reprogramming the device only happens when the ceiling changes.
    pub fn set_latency_tolerance<T: AdminTransport>(&mut self, value: i32, transport: &mut T) {
        let latency = normalize_latency_tolerance(value);
        if self.context.ps_max_latency_us == latency {
            return;
        }

        self.context.ps_max_latency_us = latency;
        if let Err(err) = self.configure(transport) {
            warn!("failed to set APST feature: {}", err);
        }
    }

    /// Build the transition table and program it into the device.
    fn configure<T: AdminTransport>(&mut self, transport: &mut T) -> Result<()> {
        if !self.context.apst_supported {
            return Ok(());
        }

        if self.context.npss > MAX_POWER_STATE_INDEX {
            warn!("NPSS {} is invalid; not using APST", self.context.npss);
            return Ok(());
        }

        let (table, enable) = build_apst_table(&self.context);
        let bytes = table.as_bytes();
        let data = if enable { Some(&bytes[..]) } else { None };

        transport.set_features(FeatureId::AutonomousPowerState, enable as u32, data)?;
        debug!(
            "APST {} (latency ceiling {}us)",
            if enable { "enabled" } else { "disabled" },
            self.context.ps_max_latency_us
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::identify::PS_FLAG_NON_OPERATIONAL;
    use std::vec;
    use std::vec::Vec;

    struct RecordingTransport {
        calls: Vec<(FeatureId, u32, Option<Vec<u8>>)>,
        fail: bool,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                calls: Vec::new(),
                fail: false,
            }
        }
    }

    impl AdminTransport for RecordingTransport {
        fn set_features(
            &mut self,
            feature_id: FeatureId,
            dword11: u32,
            data: Option<&[u8]>,
        ) -> Result<()> {
            self.calls.push((feature_id, dword11, data.map(|d| d.to_vec())));
            if self.fail {
                return Err(Error::CommandFailed(0x02));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHook {
        exposed: usize,
        hidden: usize,
    }

    impl LatencyToleranceHook for RecordingHook {
        fn expose_latency_tolerance(&mut self) {
            self.exposed += 1;
        }

        fn hide_latency_tolerance(&mut self) {
            self.hidden += 1;
        }
    }

    fn identify_with(npss: u8, apsta: u8, states: &[(u32, u32, bool)]) -> IdentifyController {
        let mut buf = vec![0u8; 4096];
        buf[263] = npss;
        buf[265] = apsta;
        for (i, &(entry, exit, non_op)) in states.iter().enumerate() {
            let base = 2048 + i * 32;
            if non_op {
                buf[base + 3] = PS_FLAG_NON_OPERATIONAL;
            }
            buf[base + 4..base + 8].copy_from_slice(&entry.to_le_bytes());
            buf[base + 8..base + 12].copy_from_slice(&exit.to_le_bytes());
        }
        IdentifyController::from_bytes(&buf).unwrap()
    }

    fn manager() -> ApstManager {
        ApstManager::new(&ApstOptions::default())
    }

    #[test]
    fn identify_programs_apst_when_supported() {
        let mut mgr = manager();
        let mut transport = RecordingTransport::new();
        let mut hook = RecordingHook::default();

        let id = identify_with(2, 1, &[(0, 0, false), (10, 10, false), (100, 50, true)]);
        mgr.handle_identify(&id, &mut transport, &mut hook);

        assert_eq!(hook.exposed, 1);
        assert_eq!(transport.calls.len(), 1);

        let (feature, dword11, data) = &transport.calls[0];
        assert_eq!(*feature, FeatureId::AutonomousPowerState);
        assert_eq!(*dword11, 1);
        let data = data.as_ref().unwrap();
        assert_eq!(data.len(), 256);

        // States 0 and 1 target state 2 with a 1ms idle time.
        let expected = ((2u64 << 3) | (1 << 8)).to_le_bytes();
        assert_eq!(&data[0..8], &expected);
        assert_eq!(&data[8..16], &expected);
        assert_eq!(&data[16..24], &[0; 8]);
    }

    #[test]
    fn identify_without_support_does_nothing() {
        let mut mgr = manager();
        let mut transport = RecordingTransport::new();
        let mut hook = RecordingHook::default();

        let id = identify_with(2, 0, &[(0, 0, false), (10, 10, true)]);
        mgr.handle_identify(&id, &mut transport, &mut hook);

        assert_eq!(hook.exposed, 0);
        assert_eq!(hook.hidden, 0);
        assert!(transport.calls.is_empty());
    }

    #[test]
    fn support_flag_edges_toggle_control_surface_once() {
        let mut mgr = manager();
        let mut transport = RecordingTransport::new();
        let mut hook = RecordingHook::default();
        let states = [(0, 0, false), (100, 50, true)];

        mgr.handle_identify(&identify_with(1, 1, &states), &mut transport, &mut hook);
        assert_eq!(hook.exposed, 1);
        let programmed = transport.calls.len();
        assert_eq!(programmed, 1);

        // Re-identify with unchanged support: no edge, but reprogrammed.
        mgr.handle_identify(&identify_with(1, 1, &states), &mut transport, &mut hook);
        assert_eq!(hook.exposed, 1);
        assert_eq!(transport.calls.len(), 2);

        // Support withdrawn by a firmware change: hidden once, no programming.
        mgr.handle_identify(&identify_with(1, 0, &states), &mut transport, &mut hook);
        assert_eq!(hook.hidden, 1);
        assert_eq!(transport.calls.len(), 2);

        mgr.handle_identify(&identify_with(1, 0, &states), &mut transport, &mut hook);
        assert_eq!(hook.hidden, 1);
    }

    #[test]
    fn invalid_npss_skips_programming() {
        let mut mgr = manager();
        let mut transport = RecordingTransport::new();
        let mut hook = RecordingHook::default();

        let id = identify_with(32, 1, &[(100, 50, true)]);
        mgr.handle_identify(&id, &mut transport, &mut hook);

        // The control surface still follows the support flag.
        assert_eq!(hook.exposed, 1);
        assert!(transport.calls.is_empty());
    }

    #[test]
    fn redundant_latency_updates_program_once() {
        let mut mgr = manager();
        let mut transport = RecordingTransport::new();
        let mut hook = RecordingHook::default();

        let id = identify_with(1, 1, &[(0, 0, false), (100, 50, true)]);
        mgr.handle_identify(&id, &mut transport, &mut hook);
        assert_eq!(transport.calls.len(), 1);

        mgr.set_latency_tolerance(5_000, &mut transport);
        assert_eq!(transport.calls.len(), 2);
        mgr.set_latency_tolerance(5_000, &mut transport);
        assert_eq!(transport.calls.len(), 2);

        // Both sentinels normalize to the same ceiling.
        mgr.set_latency_tolerance(crate::latency::LATENCY_TOLERANCE_NO_CONSTRAINT, &mut transport);
        assert_eq!(transport.calls.len(), 3);
        mgr.set_latency_tolerance(crate::latency::LATENCY_TOLERANCE_ANY, &mut transport);
        assert_eq!(transport.calls.len(), 3);
    }

    #[test]
    fn zero_tolerance_disables_without_payload() {
        let mut mgr = manager();
        let mut transport = RecordingTransport::new();
        let mut hook = RecordingHook::default();

        let id = identify_with(1, 1, &[(0, 0, false), (100, 50, true)]);
        mgr.handle_identify(&id, &mut transport, &mut hook);

        mgr.set_latency_tolerance(0, &mut transport);
        let (feature, dword11, data) = transport.calls.last().unwrap();
        assert_eq!(*feature, FeatureId::AutonomousPowerState);
        assert_eq!(*dword11, 0);
        assert!(data.is_none());
    }

    #[test]
    fn latency_update_before_identify_does_not_program() {
        let mut mgr = manager();
        let mut transport = RecordingTransport::new();

        mgr.set_latency_tolerance(5_000, &mut transport);
        assert!(transport.calls.is_empty());
        assert_eq!(mgr.context().ps_max_latency_us, 5_000);
    }

    #[test]
    fn programming_failure_is_not_fatal() {
        let mut mgr = manager();
        let mut transport = RecordingTransport::new();
        transport.fail = true;
        let mut hook = RecordingHook::default();

        let id = identify_with(1, 1, &[(0, 0, false), (100, 50, true)]);
        mgr.handle_identify(&id, &mut transport, &mut hook);
        assert_eq!(transport.calls.len(), 1);

        // The manager keeps reacting to later triggers.
        transport.fail = false;
        mgr.set_latency_tolerance(5_000, &mut transport);
        assert_eq!(transport.calls.len(), 2);
    }

    #[test]
    fn default_ceiling_seeds_from_options() {
        let mgr = ApstManager::new(&ApstOptions {
            default_ps_max_latency_us: 25_000,
        });
        assert_eq!(mgr.context().ps_max_latency_us, 25_000);
    }

    #[test]
    fn oversized_default_means_unconstrained() {
        // Clamping to i32::MAX lands on the "any latency" sentinel.
        let mgr = ApstManager::new(&ApstOptions {
            default_ps_max_latency_us: u64::MAX,
        });
        assert_eq!(mgr.context().ps_max_latency_us, u64::MAX);
    }
}
