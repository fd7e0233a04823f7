//! Point memory and the field indirection table.
//!
//! Point memory is one preallocated word array holding both buffer blocks
//! followed by a single Blank word. A block is ten sub-arrays of
//! `buffer_length` words: the packed time word, then coordinates X..C.
//!
//! ```text
//! | A: time | A: x | ... | A: c | B: time | B: x | ... | B: c | blank |
//! ```
//!
//! The executor never computes addresses itself. It reads each logical
//! field through an [`Accessor`] that the table rebinds once per point.

use trajscan_common::consts::{AXIS_COUNT, BLOCK_FIELDS, FIELD_SLOTS};
use trajscan_common::engine::axis::Axis;
use trajscan_common::engine::point::{
    TIME_SHIFT, TIME_WIDTH, USER_SHIFT, USER_WIDTH, VEL_MODE_SHIFT, VEL_MODE_WIDTH,
};
use trajscan_common::engine::state::BufferId;

// ─── Point Memory ───────────────────────────────────────────────────

/// Preallocated storage for both buffer blocks plus the Blank word.
#[derive(Debug, Clone)]
pub struct PointMemory {
    words: Box<[i64]>,
    physical_capacity: u32,
}

impl PointMemory {
    /// Allocate memory for two blocks of `physical_capacity` points.
    pub fn new(physical_capacity: u32) -> Self {
        let len = 2 * BLOCK_FIELDS as usize * physical_capacity as usize + 1;
        Self {
            words: vec![0; len].into_boxed_slice(),
            physical_capacity,
        }
    }

    #[inline]
    pub const fn physical_capacity(&self) -> u32 {
        self.physical_capacity
    }

    /// Address of the Blank word (always the last word).
    #[inline]
    pub fn blank_address(&self) -> u32 {
        (self.words.len() - 1) as u32
    }

    /// First word of `id`'s block for the given logical buffer length.
    #[inline]
    pub const fn block_base(id: BufferId, buffer_length: u32) -> u32 {
        id.index() as u32 * BLOCK_FIELDS * buffer_length
    }

    /// Word at `address`. Out-of-range addresses read as zero.
    #[inline]
    pub fn read(&self, address: u32) -> i64 {
        self.words.get(address as usize).copied().unwrap_or(0)
    }

    /// Store `value` at `address`. The Blank word and out-of-range
    /// addresses are never written; returns whether the store happened.
    #[inline]
    pub fn store(&mut self, address: u32, value: i64) -> bool {
        if address >= self.blank_address() {
            return false;
        }
        self.words[address as usize] = value;
        true
    }
}

// ─── Fields & Accessors ─────────────────────────────────────────────

/// Logical fields of a point, one table slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Time,
    Coord(Axis),
    User,
    VelMode,
}

impl Field {
    /// Table slot: time at 0, coordinates at 1..=9, user code, velocity mode.
    #[inline]
    pub const fn slot(self) -> usize {
        match self {
            Self::Time => 0,
            Self::Coord(axis) => 1 + axis.index(),
            Self::User => AXIS_COUNT + 1,
            Self::VelMode => AXIS_COUNT + 2,
        }
    }

    /// Inverse of [`Field::slot`].
    pub const fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            0 => Some(Self::Time),
            s if s >= 1 && s <= AXIS_COUNT => match Axis::from_index(s - 1) {
                Some(axis) => Some(Self::Coord(axis)),
                None => None,
            },
            s if s == AXIS_COUNT + 1 => Some(Self::User),
            s if s == AXIS_COUNT + 2 => Some(Self::VelMode),
            _ => None,
        }
    }

    /// Sub-array of the block the field lives in.
    #[inline]
    pub const fn sub_array(self) -> u32 {
        match self {
            Self::Coord(axis) => 1 + axis.index() as u32,
            Self::Time | Self::User | Self::VelMode => 0,
        }
    }

    /// Bit shift and width inside the addressed word.
    #[inline]
    pub const fn bits(self) -> (u32, u32) {
        match self {
            Self::Time => (TIME_SHIFT, TIME_WIDTH),
            Self::User => (USER_SHIFT, USER_WIDTH),
            Self::VelMode => (VEL_MODE_SHIFT, VEL_MODE_WIDTH),
            Self::Coord(_) => (0, 64),
        }
    }

    /// Fields that are live regardless of the axis selection.
    pub const FIXED_LIVE: [Field; 3] = [Self::Time, Self::User, Self::VelMode];
}

/// A (word address, bit shift, bit width) handle into point memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accessor {
    pub address: u32,
    pub shift: u32,
    pub width: u32,
}

impl Accessor {
    const fn new(address: u32, field: Field) -> Self {
        let (shift, width) = field.bits();
        Self {
            address,
            shift,
            width,
        }
    }

    /// Read the addressed bits. Full-width accessors return the word as is.
    #[inline]
    pub fn read(&self, memory: &PointMemory) -> i64 {
        let word = memory.read(self.address);
        if self.width >= 64 {
            word
        } else {
            ((word as u64 >> self.shift) & ((1u64 << self.width) - 1)) as i64
        }
    }
}

// ─── Indirection Table ──────────────────────────────────────────────

/// One rebindable accessor per logical field.
#[derive(Debug, Clone)]
pub struct IndirectionTable {
    slots: [Accessor; FIELD_SLOTS],
    live: [bool; FIELD_SLOTS],
    blank: u32,
}

impl IndirectionTable {
    /// Table with every field bound to the Blank word at `blank`.
    pub fn new(blank: u32) -> Self {
        let mut table = Self {
            slots: [Accessor::new(blank, Field::Time); FIELD_SLOTS],
            live: [false; FIELD_SLOTS],
            blank,
        };
        table.reset();
        table
    }

    /// Time, user code and velocity mode live; every coordinate bound to
    /// Blank.
    pub fn reset(&mut self) {
        for slot in 0..FIELD_SLOTS {
            if let Some(field) = Field::from_slot(slot) {
                self.slots[slot] = Accessor::new(self.blank, field);
            }
            self.live[slot] = false;
        }
        for field in Field::FIXED_LIVE {
            self.live[field.slot()] = true;
        }
    }

    /// Mark a field live so the next rebind resolves it into a buffer.
    #[inline]
    pub fn enable(&mut self, field: Field) {
        self.live[field.slot()] = true;
    }

    #[inline]
    pub fn is_live(&self, field: Field) -> bool {
        self.live[field.slot()]
    }

    /// Resolve every live field to `base + sub_array * buffer_length + index`.
    /// Non-live fields stay on Blank.
    pub fn rebind(&mut self, base: u32, index: u32, buffer_length: u32) {
        for slot in 0..FIELD_SLOTS {
            let Some(field) = Field::from_slot(slot) else {
                continue;
            };
            let address = if self.live[slot] {
                base + field.sub_array() * buffer_length + index
            } else {
                self.blank
            };
            self.slots[slot] = Accessor::new(address, field);
        }
    }

    #[inline]
    pub fn accessor(&self, field: Field) -> Accessor {
        self.slots[field.slot()]
    }

    /// Read `field` through its current binding.
    #[inline]
    pub fn read(&self, field: Field, memory: &PointMemory) -> i64 {
        self.slots[field.slot()].read(memory)
    }
}
