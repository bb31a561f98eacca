//! Per-thread arena selection.
//!
//! Each thread keeps a sticky preferred arena. Allocation probes the
//! preferred arena and its two circular successors with trylock; if all
//! three are contended the preference jumps past them and the thread takes
//! that arena's lock blockingly. Frees go straight to the owning arena and
//! never probe.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::allocators::buddy::{Arena, SlabList};
use crate::allocators::{NUM_ARENAS, PROBE_DEPTH};
use crate::sync::mutex::MutexGuard;

thread_local! {
    static PREFERRED: Cell<Option<usize>> = const { Cell::new(None) };
}

/// The thread's preferred arena index, seeding it on first use.
pub fn preferred() -> usize {
    PREFERRED.with(|cell| match cell.get() {
        Some(index) => index,
        None => {
            let index = seed();
            cell.set(Some(index));
            index
        }
    })
}

/// Spread first-time threads across the arenas.
///
/// Correctness does not depend on the quality of the source, only on
/// threads not all piling onto one arena.
fn seed() -> usize {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos())
        .unwrap_or(0);
    nanos as usize % NUM_ARENAS
}

/// Lock one arena for the current thread, returning its index and guard.
pub fn lock_arena(arenas: &[Arena; NUM_ARENAS]) -> (usize, MutexGuard<'_, SlabList>) {
    let start = preferred();
    for step in 0..PROBE_DEPTH {
        let index = (start + step) % NUM_ARENAS;
        if let Some(guard) = arenas[index].try_lock() {
            PREFERRED.with(|cell| cell.set(Some(index)));
            return (index, guard);
        }
    }

    let index = (start + PROBE_DEPTH) % NUM_ARENAS;
    PREFERRED.with(|cell| cell.set(Some(index)));
    (index, arenas[index].lock())
}
