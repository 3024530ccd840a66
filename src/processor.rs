//! A single processor: its instruction trace, its state machine, and its accounting counters.
//!
//! Grounded on the teacher's `Processor`/`ProcState` (`Idle`/`WaitingForCache`/
//! `ExecutingOtherInstruction`/`Done`), renamed to match section 4.7's naming
//! (`Ready`/`Computing`/`WaitingForCache`). The teacher's `Processor` owned its `Cache` directly;
//! here the scheduler owns all four caches in one `Vec` so the bus can borrow any of them to
//! snoop while a different processor's request is in flight — see `scheduler.rs`.

use std::collections::VecDeque;

use crate::address::Addr;

/// One line of a trace file, already parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEntry {
    Load(Addr),
    Store(Addr),
    /// A compute-only instruction lasting `n` cycles.
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Ready,
    Computing(u32),
    /// Waiting on the processor's own cache — covers both a plain 1-cycle hit and a full
    /// miss resolution; see DESIGN.md's "issue-to-commit latency accounting" for why these
    /// aren't modeled as two separate wait states.
    WaitingForCache,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcStats {
    pub compute_cycles: u64,
    pub idle_cycles: u64,
    pub loads: u64,
    pub stores: u64,
    pub misses: u64,
}

impl ProcStats {
    pub fn accesses(&self) -> u64 {
        self.loads + self.stores
    }

    pub fn miss_rate(&self) -> f64 {
        if self.accesses() == 0 {
            0.0
        } else {
            self.misses as f64 / self.accesses() as f64
        }
    }
}

#[derive(Debug)]
pub struct Processor {
    pub id: usize,
    trace: VecDeque<TraceEntry>,
    pub state: ProcState,
    pub stats: ProcStats,
}

impl Processor {
    pub fn new(id: usize, trace: VecDeque<TraceEntry>) -> Self {
        Processor {
            id,
            trace,
            state: ProcState::Ready,
            stats: ProcStats::default(),
        }
    }

    /// True once this processor has nothing left to do: its trace is exhausted and it isn't
    /// mid-instruction.
    pub fn is_finished(&self) -> bool {
        self.trace.is_empty() && self.state == ProcState::Ready
    }

    pub fn next_entry(&mut self) -> Option<TraceEntry> {
        self.trace.pop_front()
    }

    /// Looks at the next trace entry without consuming it — used to decide whether an access
    /// would need the bus before committing to issuing it, so a processor that must wait for a
    /// contended bus doesn't lose the entry it was about to dispatch.
    pub fn peek_entry(&self) -> Option<TraceEntry> {
        self.trace.front().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_only_once_trace_drained_and_ready() {
        let mut p = Processor::new(0, VecDeque::from([TraceEntry::Other(1)]));
        assert!(!p.is_finished());
        p.next_entry();
        assert!(p.is_finished());
        p.state = ProcState::Computing(1);
        assert!(!p.is_finished());
    }
}
