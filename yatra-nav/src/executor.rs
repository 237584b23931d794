//! Navigation executor: walks a planned path cell by cell, reacting to
//! obstacles discovered on the way.
//!
//! Each route run is a small state machine. Orienting turns the robot to
//! face the next path cell, Driving covers one cell edge while polling
//! sensors, ObstacleHandling records a blocked cell and retreats, and
//! Replanning asks the pathfinder for a new route with the accumulated
//! obstacle memory intact. The run ends with the robot restored to its
//! canonical forward facing.

use crate::config::RobotTuning;
use crate::error::{NavError, Result};
use crate::pose::Pose;
use marga_grid::{find_path, rotation_between, Direction, GridCoord, GridMap, Sense};
use setu_io::{RobotLink, SerialDevice};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Phases of one route-following run.
#[derive(Clone, Copy, Debug)]
enum RunState {
    Orienting,
    Driving,
    ObstacleHandling { covered_mm: i32 },
    Replanning,
    Done,
}

struct DriveOutcome {
    covered_mm: i32,
}

/// Drives routes over the grid and owns the dead-reckoned pose.
pub struct NavigationExecutor<D: SerialDevice> {
    link: Arc<RobotLink<D>>,
    tuning: RobotTuning,
    pose: Pose,
}

impl<D: SerialDevice> NavigationExecutor<D> {
    pub fn new(link: Arc<RobotLink<D>>, tuning: RobotTuning) -> Self {
        NavigationExecutor {
            link,
            tuning,
            pose: Pose::origin(),
        }
    }

    /// Current dead-reckoned pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Grid cell the dead-reckoned position rounds to.
    pub fn current_cell(&self) -> GridCoord {
        let cell = self.tuning.cell_size_mm;
        let round = |mm: i32| (mm + cell / 2).div_euclid(cell);
        GridCoord::new(round(self.pose.x_mm), round(self.pose.y_mm))
    }

    /// One manual 90° turn, keeping the pose's facing in step. Blocks until
    /// the robot acks.
    pub fn rotate(&mut self, sense: Sense) -> Result<()> {
        match sense {
            Sense::Left => self.link.rotate_left()?,
            Sense::Right => self.link.rotate_right()?,
        }
        self.pose.facing = self.pose.facing.rotated(sense);
        Ok(())
    }

    /// Follow a shortest path from `start` to `goal`, replanning around
    /// obstacles discovered en route. Returns the final cell, or fails with
    /// [`NavError::Unreachable`] once obstacle memory rules out every route,
    /// or [`NavError::RouteTimeout`] when the deadline passes.
    pub fn run_route(
        &mut self,
        map: &mut GridMap,
        start: GridCoord,
        goal: GridCoord,
        timeout: Duration,
    ) -> Result<GridCoord> {
        if self.tuning.drive_rate_mm_s <= 0 {
            return Err(NavError::Config(
                "drive_rate_mm_s must be positive".into(),
            ));
        }

        let deadline = Instant::now() + timeout;
        log::info!("route {} -> {}", start, goal);

        map.initialize(true);
        let mut path = find_path(map, start, goal).ok_or(NavError::Unreachable {
            x: goal.x,
            y: goal.y,
        })?;

        // Last confirmed-safe cell; replans start here.
        let mut at = start;
        // Index of the next path cell to reach.
        let mut step = 1;
        let mut state = RunState::Orienting;

        loop {
            if Instant::now() >= deadline {
                let _ = self.link.drive(0);
                log::warn!("route deadline exceeded at {}", at);
                return Err(NavError::RouteTimeout(timeout));
            }

            state = match state {
                RunState::Orienting => {
                    if step >= path.len() {
                        RunState::Done
                    } else {
                        let target = path[step];
                        let dir = Direction::from_delta(target.x - at.x, target.y - at.y)
                            .ok_or(NavError::PathDiscontinuity { from: at, to: target })?;
                        self.orient(dir)?;
                        RunState::Driving
                    }
                }

                RunState::Driving => {
                    let outcome = self.drive_one_cell()?;
                    if outcome.covered_mm < self.tuning.cell_size_mm / 2 {
                        RunState::ObstacleHandling {
                            covered_mm: outcome.covered_mm,
                        }
                    } else {
                        at = path[step];
                        step += 1;
                        RunState::Orienting
                    }
                }

                RunState::ObstacleHandling { covered_mm } => {
                    let target = path[step];
                    log::warn!(
                        "obstacle short of {}: covered {} of {} mm",
                        target,
                        covered_mm,
                        self.tuning.cell_size_mm
                    );
                    map.set_blocked(target.x, target.y, true)?;
                    self.back_up(covered_mm)?;
                    RunState::Replanning
                }

                RunState::Replanning => {
                    map.initialize(true);
                    path = find_path(map, at, goal).ok_or(NavError::Unreachable {
                        x: goal.x,
                        y: goal.y,
                    })?;
                    log::info!("replanned from {}: {} moves", at, path.len() - 1);
                    step = 1;
                    RunState::Orienting
                }

                RunState::Done => {
                    self.orient(Direction::Forward)?;
                    log::info!("route complete at {}, pose {}", at, self.pose);
                    return Ok(at);
                }
            };
        }
    }

    /// Turn from the current facing to `next`. Each 90° turn is its own
    /// blocking request/ack exchange, and the facing is committed per
    /// confirmed turn so a failure mid-sequence leaves the pose accurate.
    fn orient(&mut self, next: Direction) -> Result<()> {
        let rotation = rotation_between(self.pose.facing, next);
        if rotation.turns > 0 {
            log::debug!(
                "orienting {} -> {}: {} turn(s) {:?}",
                self.pose.facing,
                next,
                rotation.turns,
                rotation.sense
            );
        }
        for _ in 0..rotation.turns {
            self.rotate(rotation.sense)?;
        }
        Ok(())
    }

    /// Drive one cell edge, polling sensors until the nominal travel time
    /// elapses or contact is reported. The pose integrates one tick of
    /// travel per confirmed sensor read.
    fn drive_one_cell(&mut self) -> Result<DriveOutcome> {
        let rate = self.tuning.drive_rate_mm_s;
        let poll = Duration::from_millis(self.tuning.poll_interval_ms);
        let nominal = self.travel_time(self.tuning.cell_size_mm);

        self.link.drive(rate)?;
        let started = Instant::now();
        let mut intervals: u32 = 0;
        let mut contact = false;

        while started.elapsed() < nominal {
            thread::sleep(poll);
            let report = match self.link.read_sensors() {
                Ok(report) => report,
                Err(e) => {
                    let _ = self.link.drive(0);
                    return Err(e.into());
                }
            };
            intervals += 1;
            // Telescoped so integer rounding never accumulates across ticks
            let delta = Self::covered_mm(intervals, poll, rate)
                - Self::covered_mm(intervals - 1, poll, rate);
            self.pose.advance(delta);

            if report.bumper || report.wall {
                log::debug!(
                    "contact while driving: bumper={} wall={}",
                    report.bumper,
                    report.wall
                );
                contact = true;
                break;
            }
        }

        self.link.drive(0)?;
        let covered_mm = Self::covered_mm(intervals, poll, rate);
        log::debug!(
            "drive segment: {} mm in {} polls (contact: {})",
            covered_mm,
            intervals,
            contact
        );
        Ok(DriveOutcome { covered_mm })
    }

    /// Reverse over the distance just covered, returning to the last safe
    /// cell. Contact flags are ignored while reversing; the obstacle is
    /// ahead of the robot, not behind it.
    fn back_up(&mut self, covered_mm: i32) -> Result<()> {
        if covered_mm <= 0 {
            return Ok(());
        }
        let rate = self.tuning.drive_rate_mm_s;
        let poll = Duration::from_millis(self.tuning.poll_interval_ms);
        let duration = self.travel_time(covered_mm);

        log::debug!("backing up {} mm", covered_mm);
        self.link.drive(-rate)?;
        let started = Instant::now();
        let mut intervals: u32 = 0;

        while started.elapsed() < duration {
            thread::sleep(poll);
            if let Err(e) = self.link.read_sensors() {
                let _ = self.link.drive(0);
                return Err(e.into());
            }
            intervals += 1;
            let delta = Self::covered_mm(intervals, poll, rate)
                - Self::covered_mm(intervals - 1, poll, rate);
            self.pose.advance(-delta);
        }

        self.link.drive(0)?;
        Ok(())
    }

    /// Distance estimate after `intervals` completed polls at `rate`.
    fn covered_mm(intervals: u32, poll: Duration, rate: i16) -> i32 {
        (intervals as i64 * poll.as_millis() as i64 * rate as i64 / 1000) as i32
    }

    /// Nominal time to travel `distance_mm` at the configured rate.
    fn travel_time(&self, distance_mm: i32) -> Duration {
        let rate = self.tuning.drive_rate_mm_s.unsigned_abs() as u64;
        Duration::from_millis(distance_mm.unsigned_abs() as u64 * 1000 / rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setu_io::MockDevice;

    fn executor(tuning: RobotTuning) -> NavigationExecutor<MockDevice> {
        let device = MockDevice::new();
        let link = Arc::new(RobotLink::new(device, Duration::from_millis(10)));
        NavigationExecutor::new(link, tuning)
    }

    #[test]
    fn covered_distance_telescopes_exactly() {
        // 15 ms at 100 mm/s is 1.5 mm per tick; per-tick rounding must
        // still sum to the aggregate estimate.
        let poll = Duration::from_millis(15);
        let mut total = 0;
        for n in 1..=40u32 {
            total += NavigationExecutor::<MockDevice>::covered_mm(n, poll, 100)
                - NavigationExecutor::<MockDevice>::covered_mm(n - 1, poll, 100);
        }
        assert_eq!(total, 60);
        assert_eq!(
            NavigationExecutor::<MockDevice>::covered_mm(40, poll, 100),
            60
        );
    }

    #[test]
    fn current_cell_rounds_to_nearest() {
        let mut exec = executor(RobotTuning::default());
        assert_eq!(exec.current_cell(), GridCoord::new(0, 0));

        exec.pose.x_mm = 192;
        exec.pose.y_mm = 2 * 192 - 40; // 40 mm shy of the cell-2 center
        assert_eq!(exec.current_cell(), GridCoord::new(1, 2));

        exec.pose.x_mm = -100;
        assert_eq!(exec.current_cell().x, -1);
    }
}
