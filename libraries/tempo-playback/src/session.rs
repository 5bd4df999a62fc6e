//! Session and remote-control handlers
//!
//! Hardware media keys, lock-screen controls, headphone unplugs and phone
//! calls all funnel into plain transport commands.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::transport::Transport;

/// Command from a remote control surface (media keys, lock screen, headset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    /// Scrub to an absolute position
    ChangePlaybackPosition(Duration),
}

impl Transport {
    /// Output route disappeared (headphones unplugged)
    pub fn on_route_lost(&mut self) {
        debug!("audio route lost, pausing");
        self.pause();
    }

    /// Another app or a call took the audio session
    pub fn on_interruption_began(&mut self) {
        debug!("interruption began, pausing");
        self.pause();
    }

    /// Interruption over; resume only if the system says so
    pub fn on_interruption_ended(&mut self, should_resume: bool) {
        debug!(should_resume, "interruption ended");
        if should_resume {
            self.play();
        }
    }

    pub fn handle_remote_command(&mut self, command: RemoteCommand) {
        debug!(?command, "remote command");
        match command {
            RemoteCommand::Play => self.play(),
            RemoteCommand::Pause => self.pause(),
            RemoteCommand::TogglePlayPause => self.toggle_play_pause(),
            RemoteCommand::NextTrack => {
                self.skip_next();
            }
            RemoteCommand::PreviousTrack => {
                self.skip_previous();
            }
            RemoteCommand::ChangePlaybackPosition(position) => self.seek(position),
        }
    }
}
