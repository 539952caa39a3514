//! Plant control shared types.
//!
//! All types shared between the scan engine and its collaborators live here,
//! organized by domain: measurement points, commands and acknowledgements,
//! device and lifecycle state, named safety conditions, I/O values,
//! configuration schema, and contract-violation errors.

pub mod command;
pub mod condition;
pub mod config;
pub mod error;
pub mod io;
pub mod point;
pub mod state;
