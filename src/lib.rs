//! # tvhub
//!
//! `tvhub` is a small WebSocket notification hub for a living-room TV.
//! Clients connect, subscribe to named topics and receive events for them;
//! the `roku_power` topic reports the TV's power mode by polling the device.
//!
//! ## Core Modules
//!
//! - `hub`: connection registry, topic registry and the subscription engine.
//! - `connection`: the hub's handle to a connected client.
//! - `transport`: the JSON protocol, its dispatcher and the WebSocket server.
//! - `topics`: background drivers that feed topics (`roku_power`).
//! - `device`: HTTP client for the Roku External Control Protocol.
//! - `config`: loading server and device configuration.
//! - `utils`: error types and logging setup.

pub mod config;
pub mod connection;
pub mod device;
pub mod hub;
pub mod topics;
pub mod transport;
pub mod utils;
