//! Identify Controller data structures consumed by APST configuration.

use core::mem::size_of;

use crate::error::{Error, Result};

/// Power state descriptor.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct PowerStateDescriptor {
    /// Maximum power in centiwatts (100mW units)
    pub max_power: u16,
    /// Reserved
    _rsvd1: u8,
    /// Flags
    pub flags: u8,
    /// Entry latency in microseconds
    pub entry_latency: u32,
    /// Exit latency in microseconds
    pub exit_latency: u32,
    /// Relative read throughput
    pub read_throughput: u8,
    /// Relative read latency
    pub read_latency: u8,
    /// Relative write throughput
    pub write_throughput: u8,
    /// Relative write latency
    pub write_latency: u8,
    /// Idle power in centiwatts
    pub idle_power: u16,
    /// Idle power scale
    pub idle_power_scale: u8,
    /// Reserved
    _rsvd2: u8,
    /// Active power in centiwatts
    pub active_power: u16,
    /// Active power scale
    pub active_power_scale: u8,
    /// Reserved
    _rsvd3: [u8; 9],
}

/// Non-operational state flag in [`PowerStateDescriptor::flags`].
pub const PS_FLAG_NON_OPERATIONAL: u8 = 0x02;

/// Identify Controller data structure (CNS 01h).
///
/// Only the fields this crate consumes are named; the remainder is kept as
/// reserved padding so every named field sits at its specified byte offset
/// within the 4096-byte identify buffer.
#[derive(Clone, Copy)]
#[repr(C, packed)]
pub struct IdentifyController {
    /// PCI Vendor ID
    pub vid: u16,
    /// PCI Subsystem Vendor ID
    pub ssvid: u16,
    /// Serial number (ASCII)
    pub sn: [u8; 20],
    /// Model number (ASCII)
    pub mn: [u8; 40],
    /// Firmware revision (ASCII)
    pub fr: [u8; 8],
    /// Recommended arbitration burst
    pub rab: u8,
    /// IEEE OUI identifier
    pub ieee: [u8; 3],
    /// Controller multi-path I/O and namespace sharing capabilities
    pub cmic: u8,
    /// Maximum data transfer size
    pub mdts: u8,
    /// Controller ID
    pub cntlid: u16,
    /// Version
    pub ver: u32,
    /// RTD3 resume latency in microseconds
    pub rtd3r: u32,
    /// RTD3 entry latency in microseconds
    pub rtd3e: u32,
    /// Optional asynchronous events supported
    pub oaes: u32,
    /// Controller attributes
    pub ctratt: u32,
    /// Reserved
    _rsvd1: [u8; 156],
    /// Optional admin command support
    pub oacs: u16,
    /// Abort command limit
    pub acl: u8,
    /// Asynchronous event request limit
    pub aerl: u8,
    /// Firmware updates
    pub frmw: u8,
    /// Log page attributes
    pub lpa: u8,
    /// Error log page entries
    pub elpe: u8,
    /// Number of power states support (zero-based maximum index)
    pub npss: u8,
    /// Admin vendor specific command configuration
    pub avscc: u8,
    /// Autonomous power state transition attributes
    pub apsta: u8,
    /// Warning composite temperature threshold in Kelvin
    pub wctemp: u16,
    /// Critical composite temperature threshold in Kelvin
    pub cctemp: u16,
    /// Reserved
    _rsvd2: [u8; 1778],
    /// Power state descriptors
    pub psd: [PowerStateDescriptor; 32],
    /// Vendor specific
    pub vs: [u8; 1024],
}

impl IdentifyController {
    /// Parse from a raw identify buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < size_of::<Self>() {
            return Err(Error::InvalidBufferSize);
        }

        Ok(unsafe { core::ptr::read_unaligned(data.as_ptr() as *const Self) })
    }

    /// Whether the controller supports autonomous power state transitions.
    pub fn supports_apst(&self) -> bool {
        self.apsta & 0x01 != 0
    }
}
