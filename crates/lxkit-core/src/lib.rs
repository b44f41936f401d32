//! # lxkit-core
//!
//! Host-facing primitives for the lxkit runtime.
//!
//! This crate provides safe abstractions over:
//! - **Config files**: the `key = value` container configuration format,
//!   held in memory by [`config::ConfigStore`] and synchronised with disk
//!   on explicit load/save.
//! - **Cgroups**: discovery of a process' cgroup directories from
//!   `/proc/<pid>/cgroup` and read/write access to control files on
//!   both the legacy (v1) and unified (v2) hierarchies.
//!
//! Nothing here knows about container lifecycle; the runtime crate layers
//! the state machine on top.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cgroup;
pub mod config;
