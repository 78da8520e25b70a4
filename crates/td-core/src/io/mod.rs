//! Low-level file I/O helpers shared by the config/store-root layers.
//!
//! `atomic` provides a platform-specific atomic file swap, used by the
//! best-effort (no-lock) read-modify-write of `config.json`.

pub mod atomic;

pub use atomic::atomic_swap;
