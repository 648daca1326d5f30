//! Core type definitions used across the MedShare workspace.

pub mod id;

pub use id::*;
