//! Background sensor poller.
//!
//! Polls the robot's sensors at the idle interval, sharing the serial
//! channel with the command actor through the link's lock. Obstacle
//! sightings are published over a channel; shutdown is cooperative, checked
//! at the top of each iteration, so an in-flight exchange always completes.

use crossbeam_channel::Sender;
use setu_io::{RobotLink, SensorReport, SerialDevice};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Obstacle notification raised by the poller.
#[derive(Clone, Copy, Debug)]
pub struct ObstacleEvent {
    pub bumper: bool,
    pub wall: bool,
    /// Robot-reported position at the time of the sighting (mm)
    pub x: i32,
    pub y: i32,
}

impl From<SensorReport> for ObstacleEvent {
    fn from(report: SensorReport) -> Self {
        ObstacleEvent {
            bumper: report.bumper,
            wall: report.wall,
            x: report.x,
            y: report.y,
        }
    }
}

/// Handle to the running poller thread.
pub struct SensorPoller {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SensorPoller {
    /// Spawn the poller. Events go out over `events` with `try_send`; if
    /// nobody is draining them, dropping a notification is fine because the
    /// next poll will raise it again.
    pub fn spawn<D: SerialDevice + 'static>(
        link: Arc<RobotLink<D>>,
        interval: Duration,
        events: Sender<ObstacleEvent>,
    ) -> std::io::Result<SensorPoller> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("sensor-poller".into())
            .spawn(move || {
                log::debug!("sensor poller started ({:?} interval)", interval);

                while !flag.load(Ordering::Relaxed) {
                    match link.read_sensors() {
                        Ok(report) if report.bumper || report.wall => {
                            log::warn!(
                                "obstacle detected: bumper={} wall={}",
                                report.bumper,
                                report.wall
                            );
                            let _ = events.try_send(report.into());
                        }
                        Ok(_) => {}
                        // A missed poll is not fatal; the robot may be busy
                        // with a command exchange or mid-rotation.
                        Err(e) => log::debug!("sensor poll failed: {}", e),
                    }

                    thread::sleep(interval);
                }

                log::debug!("sensor poller stopped");
            })?;

        Ok(SensorPoller {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Request shutdown and wait for the thread to observe it.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("sensor poller panicked");
            }
        }
    }
}

impl Drop for SensorPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
