//! The host-visible register map.
//!
//! The host reads everything and writes only `Abort`, `Axes` and
//! `BufferLength`. [`StatusRegisters`] is a fixed-layout snapshot of the
//! whole map, taken in one call so its fields are always mutually consistent.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

use super::state::{BufferId, EngineStatus, ErrorCode};

/// Who may write a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterAccess {
    /// Written only by the engine.
    ReadOnly,
    /// Written by the host.
    HostWritable,
}

/// Register identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    Status = 0,
    Abort = 1,
    Axes = 2,
    BufferLength = 3,
    TotalPoints = 4,
    CurrentIndex = 5,
    CurrentBuffer = 6,
    BufferAdrA = 7,
    BufferAdrB = 8,
    CurrentBufferAdr = 9,
    BufferFillA = 10,
    BufferFillB = 11,
    CurrentBufferFill = 12,
    PrevBufferFill = 13,
    Error = 14,
    Version = 15,
}

impl Register {
    pub const ALL: [Register; 16] = [
        Self::Status,
        Self::Abort,
        Self::Axes,
        Self::BufferLength,
        Self::TotalPoints,
        Self::CurrentIndex,
        Self::CurrentBuffer,
        Self::BufferAdrA,
        Self::BufferAdrB,
        Self::CurrentBufferAdr,
        Self::BufferFillA,
        Self::BufferFillB,
        Self::CurrentBufferFill,
        Self::PrevBufferFill,
        Self::Error,
        Self::Version,
    ];

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::ALL.len() {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    pub const fn access(self) -> RegisterAccess {
        match self {
            Self::Abort | Self::Axes | Self::BufferLength => RegisterAccess::HostWritable,
            _ => RegisterAccess::ReadOnly,
        }
    }

    /// Register name as used by the controller's variable map.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Abort => "Abort",
            Self::Axes => "Axes",
            Self::BufferLength => "BufferLength",
            Self::TotalPoints => "TotalPoints",
            Self::CurrentIndex => "CurrentIndex",
            Self::CurrentBuffer => "CurrentBuffer",
            Self::BufferAdrA => "BufferAdr_A",
            Self::BufferAdrB => "BufferAdr_B",
            Self::CurrentBufferAdr => "CurrentBufferAdr",
            Self::BufferFillA => "BufferFill_A",
            Self::BufferFillB => "BufferFill_B",
            Self::CurrentBufferFill => "CurrentBufferFill",
            Self::PrevBufferFill => "PrevBufferFill",
            Self::Error => "Error",
            Self::Version => "Version",
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of every register (64 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(C)]
pub struct StatusRegisters {
    pub status: EngineStatus,
    pub error: ErrorCode,
    pub current_buffer: BufferId,
    pub abort: bool,
    #[serde(skip)]
    pub _pad: [u8; 4],
    /// Raw `Axes` register as last written by the host.
    pub axes: i64,
    pub buffer_length: u32,
    pub version: u32,
    pub total_points: u64,
    pub current_index: u32,
    pub current_buffer_fill: u32,
    pub buffer_adr_a: u32,
    pub buffer_adr_b: u32,
    pub current_buffer_adr: u32,
    pub buffer_fill_a: u32,
    pub buffer_fill_b: u32,
    pub prev_buffer_fill: u32,
}

const_assert_eq!(core::mem::size_of::<StatusRegisters>(), 64);
const_assert_eq!(core::mem::align_of::<StatusRegisters>(), 8);

impl StatusRegisters {
    /// Integer value of one register, as `read` would return it.
    pub const fn get(&self, register: Register) -> i64 {
        match register {
            Register::Status => self.status as i64,
            Register::Abort => self.abort as i64,
            Register::Axes => self.axes,
            Register::BufferLength => self.buffer_length as i64,
            Register::TotalPoints => self.total_points as i64,
            Register::CurrentIndex => self.current_index as i64,
            Register::CurrentBuffer => self.current_buffer as i64,
            Register::BufferAdrA => self.buffer_adr_a as i64,
            Register::BufferAdrB => self.buffer_adr_b as i64,
            Register::CurrentBufferAdr => self.current_buffer_adr as i64,
            Register::BufferFillA => self.buffer_fill_a as i64,
            Register::BufferFillB => self.buffer_fill_b as i64,
            Register::CurrentBufferFill => self.current_buffer_fill as i64,
            Register::PrevBufferFill => self.prev_buffer_fill as i64,
            Register::Error => self.error as i64,
            Register::Version => self.version as i64,
        }
    }

    /// Address and fill of the current buffer agree with the per-buffer
    /// registers.
    pub const fn is_consistent(&self) -> bool {
        let (adr, fill) = match self.current_buffer {
            BufferId::A => (self.buffer_adr_a, self.buffer_fill_a),
            BufferId::B => (self.buffer_adr_b, self.buffer_fill_b),
        };
        adr == self.current_buffer_adr
            && fill == self.current_buffer_fill
            && self.current_buffer_fill <= self.buffer_length
            && self.current_index <= self.current_buffer_fill
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StatusRegisters {
        StatusRegisters {
            status: EngineStatus::Active,
            error: ErrorCode::None,
            current_buffer: BufferId::B,
            abort: false,
            _pad: [0; 4],
            axes: 384,
            buffer_length: 100,
            version: 2,
            total_points: 150,
            current_index: 50,
            current_buffer_fill: 80,
            buffer_adr_a: 0,
            buffer_adr_b: 1000,
            current_buffer_adr: 1000,
            buffer_fill_a: 100,
            buffer_fill_b: 80,
            prev_buffer_fill: 100,
        }
    }

    #[test]
    fn access_rules() {
        let writable: Vec<_> = Register::ALL
            .into_iter()
            .filter(|r| r.access() == RegisterAccess::HostWritable)
            .collect();
        assert_eq!(
            writable,
            vec![Register::Abort, Register::Axes, Register::BufferLength]
        );
    }

    #[test]
    fn discriminants_index_all() {
        for (i, r) in Register::ALL.iter().enumerate() {
            assert_eq!(*r as usize, i);
            assert_eq!(Register::from_u8(i as u8), Some(*r));
        }
        assert_eq!(Register::from_u8(16), None);
    }

    #[test]
    fn snapshot_reads() {
        let regs = sample();
        assert_eq!(regs.get(Register::Status), 1);
        assert_eq!(regs.get(Register::CurrentBuffer), 1);
        assert_eq!(regs.get(Register::CurrentBufferAdr), 1000);
        assert_eq!(regs.get(Register::TotalPoints), 150);
        assert!(regs.is_consistent());

        let torn = StatusRegisters {
            current_buffer_adr: 0,
            ..regs
        };
        assert!(!torn.is_consistent());
    }

    #[test]
    fn snapshot_serializes_by_name() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["status"], "Active");
        assert_eq!(json["current_buffer_fill"], 80);
        assert!(json.get("_pad").is_none());
    }
}
