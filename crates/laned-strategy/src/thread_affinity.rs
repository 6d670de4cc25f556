use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use laned_core::SelectionStrategy;

/// Routes every call from a given thread to the same lane index, for as
/// long as that thread lives. Threads are never reused by the runtime
/// (`std::thread::ThreadId` is unique for the process's lifetime), so this
/// requires no bookkeeping beyond hashing the calling thread's id.
///
/// `ThreadId` only exposes `Hash`/`Eq` on stable Rust, not a raw integer, so
/// the id is first folded through `DefaultHasher` and the resulting `u64`
/// is run through `fmix64` to avalanche bits that `DefaultHasher` (SipHash)
/// already mixes well, but which would otherwise concentrate in the low
/// bits after the final modulo.
#[derive(Debug, Default)]
pub struct ThreadAffinity;

impl ThreadAffinity {
    pub fn new() -> Self {
        Self
    }
}

/// Murmur3-style 64-bit finalizer mix.
fn fmix64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51afd7ed558ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ceb9fe1a85ec53);
    x ^= x >> 33;
    x
}

fn current_thread_hash() -> u64 {
    let mut hasher = DefaultHasher::new();
    thread::current().id().hash(&mut hasher);
    hasher.finish()
}

impl SelectionStrategy for ThreadAffinity {
    fn name(&self) -> &str {
        "thread-affinity"
    }

    fn select(&self, n: usize) -> usize {
        let mixed = fmix64(current_thread_hash());
        (mixed % n as u64) as usize
    }
}
