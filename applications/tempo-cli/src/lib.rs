//! Tempo CLI - composition root for the playback engine
//!
//! Loads configuration, wires a [`tempo_playback::PlayerService`] to a
//! simulated audio device and drives scripted sessions.

pub mod config;
pub mod demo;
pub mod error;
pub mod simulator;
