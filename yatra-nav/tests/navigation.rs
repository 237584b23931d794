//! End-to-end route execution against a scripted robot.
//!
//! The mock device answers every command with an ack and every sensor poll
//! with a report, optionally firing the bumper at a chosen poll so the
//! executor's obstacle handling and replanning can be observed on the wire.

use marga_grid::{Direction, GridCoord, GridMap};
use setu_io::{Message, MessageId, MockDevice, RobotLink, SensorReport};
use std::sync::Arc;
use std::time::Duration;

use yatra_nav::config::RobotTuning;
use yatra_nav::error::NavError;
use yatra_nav::executor::NavigationExecutor;

/// Mock robot: acks every command, answers sensor polls, and reports a
/// bumper hit on exactly the `bumper_on_read`-th sensor poll.
fn scripted_device(bumper_on_read: Option<u32>) -> MockDevice {
    let device = MockDevice::new();
    let mut sensor_reads = 0u32;
    device.respond_with(move |request: &[u8]| match MessageId::from_u8(request[2]) {
        Some(MessageId::SensorRead) => {
            sensor_reads += 1;
            let bumper = bumper_on_read == Some(sensor_reads);
            Message::SensorData(SensorReport {
                bumper,
                ..Default::default()
            })
            .encode()
        }
        Some(_) => Message::Ack.encode(),
        None => Vec::new(),
    });
    device
}

/// Small cells and a fast poll so a multi-cell route runs in a few seconds
/// of wall clock. The poll interval stays an order of magnitude above
/// scheduler jitter so the covered-distance estimates land where expected.
fn fast_tuning() -> RobotTuning {
    RobotTuning {
        drive_rate_mm_s: 100,
        cell_size_mm: 96,
        poll_interval_ms: 10,
        idle_poll_interval_ms: 1000,
        route_timeout_s: 60,
    }
}

fn setup(device: &MockDevice, tuning: RobotTuning) -> (NavigationExecutor<MockDevice>, GridMap) {
    let link = Arc::new(RobotLink::new(device.clone(), Duration::from_millis(50)));
    let executor = NavigationExecutor::new(link, tuning);
    let map = GridMap::alloc(4, 4).unwrap();
    (executor, map)
}

fn drive_rates(device: &MockDevice) -> Vec<i16> {
    device
        .writes()
        .iter()
        .filter(|frame| frame[2] == MessageId::DriveStraight as u8)
        .map(|frame| i16::from_le_bytes([frame[3], frame[4]]))
        .collect()
}

fn count_id(device: &MockDevice, id: MessageId) -> usize {
    device
        .writes()
        .iter()
        .filter(|frame| frame[2] == id as u8)
        .count()
}

#[test]
fn clear_route_reaches_goal() {
    let device = scripted_device(None);
    let (mut executor, mut map) = setup(&device, fast_tuning());

    let reached = executor
        .run_route(
            &mut map,
            GridCoord::new(0, 0),
            GridCoord::new(2, 0),
            Duration::from_secs(60),
        )
        .unwrap();

    assert_eq!(reached, GridCoord::new(2, 0));
    assert_eq!(executor.current_cell(), GridCoord::new(2, 0));
    assert_eq!(executor.pose().facing, Direction::Forward);

    // One drive/stop pair per cell
    assert_eq!(drive_rates(&device), vec![100, 0, 100, 0]);
    // One turn out to face +x, one turn back to forward at the end
    assert_eq!(count_id(&device, MessageId::RotateRight), 1);
    assert_eq!(count_id(&device, MessageId::RotateLeft), 1);
}

/// Driving 192 mm at 100 mm/s with the bumper firing on the 40th 15 ms
/// poll: the covered-distance estimate is 60 mm, well short of half a
/// cell, so the target cell gets blocked and the robot backs off. The
/// target being the goal itself, the replan then reports it unreachable.
#[test]
fn bumper_short_of_goal_marks_blocked_and_fails_replanning() {
    let device = scripted_device(Some(40));
    let (mut executor, mut map) = setup(&device, RobotTuning::default());

    let result = executor.run_route(
        &mut map,
        GridCoord::new(0, 0),
        GridCoord::new(0, 1),
        Duration::from_secs(60),
    );

    assert!(matches!(result, Err(NavError::Unreachable { x: 0, y: 1 })));
    assert!(map.cell(0, 1).unwrap().blocked);

    // Forward leg, stop on contact, reverse leg, stop
    assert_eq!(drive_rates(&device), vec![100, 0, -100, 0]);

    // 40 polls out, and roughly the same number back over the same distance
    let polls = count_id(&device, MessageId::SensorRead);
    assert!((70..=85).contains(&polls), "unexpected poll count {polls}");

    // Backed up to the last safe cell; facing was never disturbed. The
    // reverse leg can round a few millimeters short, never past the start.
    let pose = executor.pose();
    assert!((0..=15).contains(&pose.y_mm), "pose drifted to {}", pose);
    assert_eq!(pose.facing, Direction::Forward);
}

#[test]
fn bumper_mid_route_replans_around_obstacle() {
    let device = scripted_device(Some(10));
    let (mut executor, mut map) = setup(&device, fast_tuning());

    let reached = executor
        .run_route(
            &mut map,
            GridCoord::new(0, 0),
            GridCoord::new(0, 2),
            Duration::from_secs(60),
        )
        .unwrap();

    assert_eq!(reached, GridCoord::new(0, 2));
    assert!(map.cell(0, 1).unwrap().blocked);
    assert_eq!(executor.current_cell(), GridCoord::new(0, 2));
    assert_eq!(executor.pose().facing, Direction::Forward);

    // Aborted first leg (forward, stop, reverse, stop), then the detour
    // through (1,0) (1,1) (1,2) to (0,2): four full cells
    assert_eq!(
        drive_rates(&device),
        vec![100, 0, -100, 0, 100, 0, 100, 0, 100, 0, 100, 0]
    );
    // Detour turns: out to +x, back to forward, across to -x, and home
    assert_eq!(count_id(&device, MessageId::RotateRight), 2);
    assert_eq!(count_id(&device, MessageId::RotateLeft), 2);
}

#[test]
fn expired_deadline_abandons_route() {
    let device = scripted_device(None);
    let (mut executor, mut map) = setup(&device, fast_tuning());

    let result = executor.run_route(
        &mut map,
        GridCoord::new(0, 0),
        GridCoord::new(3, 3),
        Duration::ZERO,
    );

    assert!(matches!(result, Err(NavError::RouteTimeout(_))));
    // Nothing but the safety stop went out
    assert_eq!(drive_rates(&device), vec![0]);
    assert_eq!(count_id(&device, MessageId::RotateLeft), 0);
    assert_eq!(count_id(&device, MessageId::RotateRight), 0);
}
