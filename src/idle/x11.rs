use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::instrument;
use xcb::{
    screensaver::{QueryInfo, QueryInfoReply},
    x::Drawable,
    Connection,
};

use super::IdleSource;

/// Reads idle time from the X screensaver extension of the preferred screen.
pub struct X11IdleSource {
    connection: Connection,
    preferred_screen: i32,
}

impl X11IdleSource {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = Connection::connect_with_extensions(
            None,
            &[xcb::Extension::ScreenSaver],
            &[],
        )?;
        Ok(Self {
            connection,
            preferred_screen,
        })
    }
}

impl IdleSource for X11IdleSource {
    #[instrument(skip(self))]
    fn idle_time(&mut self) -> Result<Duration> {
        let setup = self.connection.get_setup();
        // Currently only 1 x11 screen is supported.
        let root = setup
            .roots()
            .nth(self.preferred_screen.max(0) as usize)
            .ok_or_else(|| anyhow!("Screen {} is not available", self.preferred_screen))?
            .root();
        let idle = self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(root),
        });
        let reply: QueryInfoReply = self.connection.wait_for_reply(idle)?;
        Ok(Duration::from_millis(reply.ms_since_user_input().into()))
    }
}
