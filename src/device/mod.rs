//! The `device` module talks to the TV over Roku's External Control
//! Protocol (ECP): plain HTTP on port 8060.
//!
//! Only [`RokuClient::query_power_mode`] is used by the hub. It never fails;
//! transport and parse problems come back as the [`POWER_OFFLINE`] and
//! [`POWER_UNKNOWN`] sentinels.

pub mod roku;

pub use roku::{POWER_OFFLINE, POWER_UNKNOWN, RokuClient, parse_power_mode};
