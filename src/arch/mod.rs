//! # Architecture Abstraction Layer
//!
//! Hardware side of the scheduler's port boundary: the `time` traits are
//! implemented here. Currently a Cortex-M4 port; extensible to other
//! targets by adding sibling modules.

pub mod cortex_m4;
