//! Plant Common Library
//!
//! Shared data model and configuration schema for the plant scan-cycle
//! control workspace. Everything that crosses a component boundary lives
//! here: measurements, commands and acknowledgements, device and lifecycle
//! state enums, named safety conditions, and the TOML configuration types.
//!
//! # Module Structure
//!
//! - [`control`] - Points, commands, states, conditions and plant config schema
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use plant_common::prelude::*;
//!
//! let p = Point::analog("LT_101", 1.25, 0.0).with_units("m");
//! assert_eq!(p.quality(), Quality::Good);
//! ```

pub mod config;
pub mod consts;
pub mod control;
pub mod prelude;
