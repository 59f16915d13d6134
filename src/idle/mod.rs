//! Sources of system idle time, i.e. how long ago the user last touched a keyboard or mouse.
//! [GenericIdleSource] picks the implementation for the platform the crate was built for.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::time::Duration;

use anyhow::Result;

/// Contract every platform idle sensor implements. Calls are expected to be synchronous and
/// cheap, since the tracker makes one on every poll.
#[cfg_attr(test, mockall::automock)]
pub trait IdleSource: Send {
    fn idle_time(&mut self) -> Result<Duration>;
}

/// Serves as a cross-compatible IdleSource implementation.
pub struct GenericIdleSource {
    inner: Box<dyn IdleSource>,
}

impl GenericIdleSource {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsIdleSource;
                Ok(Self {
                    inner: Box::new(WindowsIdleSource::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::X11IdleSource;
                Ok(Self {
                    inner: Box::new(X11IdleSource::new()?),
                })
            }
            else {
                Err(anyhow::anyhow!(
                    "No idle source was compiled in, enable the `x11` or `win` feature"
                ))
            }
        }
    }
}

impl IdleSource for GenericIdleSource {
    fn idle_time(&mut self) -> Result<Duration> {
        self.inner.idle_time()
    }
}
