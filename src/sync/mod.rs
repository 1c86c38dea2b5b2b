//! Baseline synchronization primitives, created once at context setup. Anything
//! beyond their one-time creation (per-frame fences, timeline semaphores) is the
//! render loop's business, not the negotiation's.

pub mod fence;
pub mod semaphore;
