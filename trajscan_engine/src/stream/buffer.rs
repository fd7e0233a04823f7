//! Ping-pong buffer manager.
//!
//! The host fills the buffer the engine is not draining and publishes its
//! fill level with [`BufferManager::commit_fill`]. The engine consumes the
//! current buffer point by point and swaps to the alternate one only at an
//! exhaustion boundary, and only if the alternate holds data it has not
//! consumed yet.
//!
//! Freshness is tracked with a pair of generation counters per buffer: the
//! host bumps `commit_gen` on every commit, the engine copies it into
//! `consumed_gen` when it swaps the buffer in. A buffer is fresh while the
//! two differ, so a drained buffer is never replayed.
//!
//! Ownership of fields:
//!
//! | Field          | Writer |
//! |----------------|--------|
//! | `staged`, `fill_level`, `filling`, `commit_gen` | host |
//! | `current`, `read_index`, `consumed_gen`, `prev_fill` | engine |

use tracing::{debug, trace};
use trajscan_common::engine::point::TrajectoryPoint;
use trajscan_common::engine::state::BufferId;

use super::indirection::PointMemory;
use crate::error::BufferError;

/// Per-buffer bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BufferSlot {
    /// Published point count.
    fill_level: u32,
    /// Points written since `begin_fill`.
    staged: u32,
    filling: bool,
    commit_gen: u32,
    consumed_gen: u32,
}

impl BufferSlot {
    #[inline]
    const fn is_fresh(&self) -> bool {
        !self.filling && self.fill_level > 0 && self.commit_gen != self.consumed_gen
    }
}

/// Result of [`BufferManager::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// More points remain in the current buffer.
    Continue,
    /// The current buffer ran out and the alternate was swapped in.
    Swapped { from: BufferId, to: BufferId },
    /// The current buffer ran out and the alternate holds nothing fresh.
    Exhausted,
}

/// Result of [`BufferManager::try_resume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Unconsumed points remain in the current buffer.
    Current,
    /// Fresh data was found in the alternate buffer, now current.
    Swapped(BufferId),
    /// Nothing to consume.
    Starved,
}

/// Double-buffer state over a shared [`PointMemory`].
#[derive(Debug, Clone)]
pub struct BufferManager {
    memory: PointMemory,
    buffer_length: u32,
    current: BufferId,
    read_index: u32,
    prev_fill: u32,
    slots: [BufferSlot; 2],
    /// Set once the engine has started draining; cleared on reset.
    started: bool,
}

impl BufferManager {
    /// Preallocate memory for `physical_capacity` points per buffer.
    /// `buffer_length` is clamped into `1..=physical_capacity`.
    pub fn new(physical_capacity: u32, buffer_length: u32) -> Self {
        let physical_capacity = physical_capacity.max(1);
        Self {
            memory: PointMemory::new(physical_capacity),
            buffer_length: buffer_length.clamp(1, physical_capacity),
            current: BufferId::A,
            read_index: 0,
            prev_fill: 0,
            slots: [BufferSlot::default(); 2],
            started: false,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub fn memory(&self) -> &PointMemory {
        &self.memory
    }

    #[inline]
    pub const fn buffer_length(&self) -> u32 {
        self.buffer_length
    }

    #[inline]
    pub const fn physical_capacity(&self) -> u32 {
        self.memory.physical_capacity()
    }

    #[inline]
    pub const fn current(&self) -> BufferId {
        self.current
    }

    #[inline]
    pub const fn read_index(&self) -> u32 {
        self.read_index
    }

    #[inline]
    pub const fn prev_fill(&self) -> u32 {
        self.prev_fill
    }

    #[inline]
    pub const fn fill_level(&self, id: BufferId) -> u32 {
        self.slots[id.index()].fill_level
    }

    #[inline]
    pub const fn address(&self, id: BufferId) -> u32 {
        PointMemory::block_base(id, self.buffer_length)
    }

    #[inline]
    pub const fn current_address(&self) -> u32 {
        self.address(self.current)
    }

    #[inline]
    pub const fn current_fill(&self) -> u32 {
        self.fill_level(self.current)
    }

    /// Unconsumed points left in the current buffer.
    #[inline]
    pub const fn remaining(&self) -> u32 {
        self.current_fill().saturating_sub(self.read_index)
    }

    /// Whether the host has committed data the engine has not swapped in.
    #[inline]
    pub const fn is_fresh(&self, id: BufferId) -> bool {
        self.slots[id.index()].is_fresh()
    }

    #[inline]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    // ─── Host side ──────────────────────────────────────────────────

    fn check_owner(&self, id: BufferId) -> Result<(), BufferError> {
        if self.started && id == self.current {
            return Err(BufferError::Busy(id));
        }
        Ok(())
    }

    /// Claim `id` for writing. Resets its staged count and fill level.
    pub fn begin_fill(&mut self, id: BufferId) -> Result<(), BufferError> {
        self.check_owner(id)?;
        let slot = &mut self.slots[id.index()];
        slot.staged = 0;
        slot.fill_level = 0;
        slot.filling = true;
        trace!(buffer = %id, "fill started");
        Ok(())
    }

    /// Append one point at the staged index of `id`.
    pub fn write_point(&mut self, id: BufferId, point: &TrajectoryPoint) -> Result<(), BufferError> {
        self.check_owner(id)?;
        let slot = self.slots[id.index()];
        if !slot.filling {
            return Err(BufferError::NotFilling(id));
        }
        if slot.staged >= self.buffer_length {
            return Err(BufferError::Overflow {
                buffer: id,
                capacity: self.buffer_length,
            });
        }
        let time_word = point.time_word()?;

        let base = self.address(id) + slot.staged;
        self.memory.store(base, time_word as i64);
        for (i, coordinate) in point.coordinates.iter().enumerate() {
            self.memory
                .store(base + (1 + i as u32) * self.buffer_length, coordinate.raw());
        }
        self.slots[id.index()].staged += 1;
        Ok(())
    }

    /// Publish the staged count of `id` as its fill level. Returns the
    /// published count.
    pub fn commit_fill(&mut self, id: BufferId) -> Result<u32, BufferError> {
        self.check_owner(id)?;
        let slot = &mut self.slots[id.index()];
        if !slot.filling {
            return Err(BufferError::NotFilling(id));
        }
        slot.fill_level = slot.staged;
        slot.filling = false;
        slot.commit_gen = slot.commit_gen.wrapping_add(1);
        debug!(buffer = %id, fill = slot.fill_level, "fill committed");
        Ok(slot.fill_level)
    }

    // ─── Engine side ────────────────────────────────────────────────

    /// Start draining from buffer A. Its current contents count as consumed
    /// from here on.
    pub fn start(&mut self) {
        self.started = true;
        self.current = BufferId::A;
        self.read_index = 0;
        let slot = &mut self.slots[BufferId::A.index()];
        slot.consumed_gen = slot.commit_gen;
    }

    /// Step past the point just executed.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.read_index < self.current_fill() {
            self.read_index += 1;
        }
        if self.read_index < self.current_fill() {
            return AdvanceOutcome::Continue;
        }
        let from = self.current;
        if self.swap_if_fresh() {
            AdvanceOutcome::Swapped {
                from,
                to: self.current,
            }
        } else {
            AdvanceOutcome::Exhausted
        }
    }

    /// Find something to consume after a stop. Calling it again while
    /// starved changes nothing.
    pub fn try_resume(&mut self) -> ResumeOutcome {
        if self.remaining() > 0 {
            return ResumeOutcome::Current;
        }
        if self.swap_if_fresh() {
            ResumeOutcome::Swapped(self.current)
        } else {
            ResumeOutcome::Starved
        }
    }

    fn swap_if_fresh(&mut self) -> bool {
        let next = self.current.other();
        if !self.is_fresh(next) {
            return false;
        }
        self.prev_fill = self.current_fill();
        let slot = &mut self.slots[next.index()];
        slot.consumed_gen = slot.commit_gen;
        // Single write of `current`: address and fill derive from it.
        self.current = next;
        self.read_index = 0;
        debug!(to = %next, prev_fill = self.prev_fill, "buffer swap");
        true
    }

    /// Change the logical buffer length. Drops all fill state.
    pub fn set_buffer_length(&mut self, buffer_length: u32) {
        self.buffer_length = buffer_length.clamp(1, self.physical_capacity());
        self.reset();
    }

    /// Back to the freshly constructed state. Memory contents are kept but
    /// unreachable until refilled.
    pub fn reset(&mut self) {
        self.current = BufferId::A;
        self.read_index = 0;
        self.prev_fill = 0;
        self.slots = [BufferSlot::default(); 2];
        self.started = false;
    }
}
