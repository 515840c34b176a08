//! Core types and utilities for the USB-CAN adapter UART protocol
//!
//! This crate provides the error type shared by every layer and the
//! transient values that cross the codec boundary: CAN frames, adapter
//! configuration records and controller status reports.

pub mod config;
pub mod error;
pub mod frame;
pub mod status;

pub use config::{CanBaudrate, CanConfig, CanMode};
pub use error::{CanUsbError, CanUsbResult};
pub use frame::{CanFrame, IdKind, EXTENDED_ID_MASK, MAX_DLC, STANDARD_ID_MASK};
pub use status::ControllerStatus;
