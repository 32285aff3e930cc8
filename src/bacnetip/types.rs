//! Closed value sets used by BVLC and NPDU.

use strum::{FromRepr, IntoStaticStr};

use crate::field::wire_enum;

/// Priority of an NPDU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NpduNetworkPriority {
    /// Ordinary traffic.
    #[default]
    NormalMessage = 0b00,
    /// Urgent traffic.
    UrgentMessage = 0b01,
    /// Critical equipment messages.
    CriticalEquipmentMessage = 0b10,
    /// Life safety messages.
    LifeSafetyMessage = 0b11,
}
wire_enum!(NpduNetworkPriority, u8, 2);

/// Result code of a `BVLC-Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr)]
#[repr(u16)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BvlcResultCode {
    /// Success.
    SuccessfulCompletion = 0x0000,
    /// Write-Broadcast-Distribution-Table failed.
    WriteBroadcastDistributionTableNak = 0x0010,
    /// Read-Broadcast-Distribution-Table failed.
    ReadBroadcastDistributionTableNak = 0x0020,
    /// Register-Foreign-Device failed.
    RegisterForeignDeviceNak = 0x0030,
    /// Read-Foreign-Device-Table failed.
    ReadForeignDeviceTableNak = 0x0040,
    /// Delete-Foreign-Device-Table-Entry failed.
    DeleteForeignDeviceTableEntryNak = 0x0050,
    /// Distribute-Broadcast-To-Network failed.
    DistributeBroadcastToNetworkNak = 0x0060,
}
wire_enum!(BvlcResultCode, u16, 16, "BVLCResultCode");
