//! Feature identifiers and the admin command seam used to program them.

use crate::error::Result;

/// NVMe feature identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureId {
    /// Command arbitration
    Arbitration = 0x01,
    /// Power management
    PowerManagement = 0x02,
    /// Temperature threshold
    TemperatureThreshold = 0x04,
    /// Number of queues
    NumberOfQueues = 0x07,
    /// Interrupt coalescing
    InterruptCoalescing = 0x08,
    /// Asynchronous event configuration
    AsyncEventConfig = 0x0B,
    /// Autonomous power state transition
    AutonomousPowerState = 0x0C,
    /// Host memory buffer
    HostMemBuffer = 0x0D,
    /// Keep alive timer
    KeepAliveTimer = 0x0F,
    /// Host controlled thermal management
    HostControlledThermal = 0x10,
    /// Non-operational power state config
    NonOperationalPowerState = 0x11,
}

/// Admin command transport for a single controller.
///
/// Implemented by the surrounding driver; this crate issues one Set Features
/// per reconfiguration through it. The transport owns command submission,
/// completion, DMA placement of the data buffer, and the command's own
/// timeout policy. Implementations report a failed allocation of the data
/// buffer as [`crate::Error::AllocationFailed`] and a rejected command
/// through [`crate::Error::CommandFailed`] or [`crate::Error::NvmeStatus`].
pub trait AdminTransport {
    /// Issue a Set Features command.
    ///
    /// `dword11` carries the feature-specific value and `data` the optional
    /// feature data buffer.
    fn set_features(
        &mut self,
        feature_id: FeatureId,
        dword11: u32,
        data: Option<&[u8]>,
    ) -> Result<()>;
}
