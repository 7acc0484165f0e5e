//! Resource monitoring around a run.
//!
//! The pipeline holds a [`MonitorGuard`] for its whole duration. The guard
//! starts the monitor when created and stops it when dropped, so the monitor
//! is stopped on every exit path, including early `?` returns.

pub mod tracker;

pub use tracker::ResourceTracker;

/// Something that observes the process while a run is in progress.
pub trait ResourceMonitor {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Starts a monitor and stops it on drop.
pub struct MonitorGuard<'a> {
    monitor: &'a mut dyn ResourceMonitor,
}

impl<'a> MonitorGuard<'a> {
    pub fn start(monitor: &'a mut dyn ResourceMonitor) -> Self {
        monitor.start();
        Self { monitor }
    }
}

impl Drop for MonitorGuard<'_> {
    fn drop(&mut self) {
        self.monitor.stop();
    }
}
