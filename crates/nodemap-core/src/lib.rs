#![forbid(unsafe_code)]

//! Core: identifiers, geometry mapping, label sizing, and gesture events.
//!
//! Everything in this crate is pure data or pure functions. The graph store
//! and the scene engine build on these types without ever depending on a
//! concrete rendering technology.

pub mod event;
pub mod geometry;
pub mod id;
pub mod label;
pub mod projection;

#[cfg(feature = "subscriber")]
pub mod logging;

pub use glam::{DVec3, Quat, Vec2, Vec3};
