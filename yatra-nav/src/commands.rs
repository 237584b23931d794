//! Operator command dispatch.
//!
//! Commands are a line of text, first token the command name, the rest its
//! arguments. Handlers run against an explicit context object, never global
//! state. A failed command is logged and abandoned, leaving the context
//! consistent and the loop accepting input.

use crate::error::{NavError, Result};
use crate::executor::NavigationExecutor;
use crate::poller::ObstacleEvent;
use crossbeam_channel::Receiver;
use marga_grid::{GridCoord, GridMap, Sense};
use setu_io::{RobotLink, SerialDevice};
use std::sync::Arc;
use std::time::Duration;

/// Everything a command handler may touch.
pub struct AppContext<D: SerialDevice> {
    pub link: Arc<RobotLink<D>>,
    pub executor: NavigationExecutor<D>,
    pub map: GridMap,
    pub route_timeout: Duration,
    pub events: Receiver<ObstacleEvent>,
    pub quit: bool,
}

impl<D: SerialDevice> AppContext<D> {
    /// Drain and log pending obstacle notifications from the poller.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            log::warn!(
                "poller obstacle notice: bumper={} wall={} at ({} mm, {} mm)",
                event.bumper,
                event.wall,
                event.x,
                event.y
            );
        }
    }
}

/// One dispatchable command.
pub struct CommandSpec<D: SerialDevice> {
    pub name: &'static str,
    pub usage: &'static str,
    handler: fn(&mut AppContext<D>, &str) -> Result<()>,
}

/// The command table. Built fresh per call; it is a handful of statics.
pub fn command_table<D: SerialDevice>() -> Vec<CommandSpec<D>> {
    vec![
        CommandSpec {
            name: "sensor",
            usage: "sensor                      read and print sensor state",
            handler: cmd_sensor,
        },
        CommandSpec {
            name: "forward",
            usage: "forward <rate-mm-s>         drive at a signed rate (0 stops)",
            handler: cmd_forward,
        },
        CommandSpec {
            name: "left",
            usage: "left                        rotate 90 degrees CCW",
            handler: cmd_left,
        },
        CommandSpec {
            name: "right",
            usage: "right                       rotate 90 degrees CW",
            handler: cmd_right,
        },
        CommandSpec {
            name: "goto",
            usage: "goto <x> <y>                navigate to a grid cell",
            handler: cmd_goto,
        },
        CommandSpec {
            name: "route",
            usage: "route <x> <y> [<x> <y>...]  navigate waypoints in order",
            handler: cmd_route,
        },
        CommandSpec {
            name: "pose",
            usage: "pose                        print the dead-reckoned pose",
            handler: cmd_pose,
        },
        CommandSpec {
            name: "help",
            usage: "help                        list commands",
            handler: cmd_help,
        },
        CommandSpec {
            name: "quit",
            usage: "quit                        exit",
            handler: cmd_quit,
        },
    ]
}

/// Dispatch one input line against the table.
pub fn dispatch<D: SerialDevice>(ctx: &mut AppContext<D>, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let (name, args) = line.split_once(' ').unwrap_or((line, ""));

    let table = command_table::<D>();
    let Some(spec) = table.iter().find(|spec| spec.name == name) else {
        println!("unknown command: {} (try `help`)", name);
        return;
    };

    if let Err(e) = (spec.handler)(ctx, args.trim()) {
        log::error!("{} failed: {}", spec.name, e);
    }
}

fn parse_int<T: std::str::FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| NavError::InvalidArgument(format!("{}: {:?}", what, token)))
}

/// Parse whitespace-separated coordinate pairs.
fn parse_waypoints(args: &str) -> Result<Vec<GridCoord>> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() % 2 != 0 {
        return Err(NavError::InvalidArgument(
            "expected one or more <x> <y> pairs".into(),
        ));
    }
    tokens
        .chunks(2)
        .map(|pair| {
            Ok(GridCoord::new(
                parse_int(pair[0], "x coordinate")?,
                parse_int(pair[1], "y coordinate")?,
            ))
        })
        .collect()
}

fn check_in_bounds<D: SerialDevice>(ctx: &AppContext<D>, c: GridCoord) -> Result<()> {
    if ctx.map.in_bounds(c.x, c.y) {
        Ok(())
    } else {
        Err(NavError::InvalidArgument(format!(
            "{} outside the {}x{} grid",
            c,
            ctx.map.dim_x(),
            ctx.map.dim_y()
        )))
    }
}

fn cmd_sensor<D: SerialDevice>(ctx: &mut AppContext<D>, _args: &str) -> Result<()> {
    let r = ctx.link.read_sensors()?;
    println!(
        "bumper {} wall {} rate {} direction {} at ({}, {})",
        r.bumper as u8, r.wall as u8, r.rate, r.direction, r.x, r.y
    );
    Ok(())
}

fn cmd_forward<D: SerialDevice>(ctx: &mut AppContext<D>, args: &str) -> Result<()> {
    let rate: i16 = parse_int(args, "rate")?;
    ctx.link.drive(rate)?;
    Ok(())
}

fn cmd_left<D: SerialDevice>(ctx: &mut AppContext<D>, _args: &str) -> Result<()> {
    ctx.executor.rotate(Sense::Left)
}

fn cmd_right<D: SerialDevice>(ctx: &mut AppContext<D>, _args: &str) -> Result<()> {
    ctx.executor.rotate(Sense::Right)
}

fn cmd_goto<D: SerialDevice>(ctx: &mut AppContext<D>, args: &str) -> Result<()> {
    let waypoints = parse_waypoints(args)?;
    if waypoints.len() != 1 {
        return Err(NavError::InvalidArgument("expected exactly <x> <y>".into()));
    }
    let goal = waypoints[0];
    check_in_bounds(ctx, goal)?;

    let start = ctx.executor.current_cell();
    let reached = ctx
        .executor
        .run_route(&mut ctx.map, start, goal, ctx.route_timeout)?;
    println!("arrived at {}", reached);
    Ok(())
}

fn cmd_route<D: SerialDevice>(ctx: &mut AppContext<D>, args: &str) -> Result<()> {
    let waypoints = parse_waypoints(args)?;
    for &goal in &waypoints {
        check_in_bounds(ctx, goal)?;
    }

    for goal in waypoints {
        let start = ctx.executor.current_cell();
        let reached = ctx
            .executor
            .run_route(&mut ctx.map, start, goal, ctx.route_timeout)?;
        println!("waypoint {} reached", reached);
    }
    Ok(())
}

fn cmd_pose<D: SerialDevice>(ctx: &mut AppContext<D>, _args: &str) -> Result<()> {
    println!(
        "{} (cell {})",
        ctx.executor.pose(),
        ctx.executor.current_cell()
    );
    Ok(())
}

fn cmd_help<D: SerialDevice>(_ctx: &mut AppContext<D>, _args: &str) -> Result<()> {
    for spec in command_table::<D>() {
        println!("  {}", spec.usage);
    }
    Ok(())
}

fn cmd_quit<D: SerialDevice>(ctx: &mut AppContext<D>, _args: &str) -> Result<()> {
    println!("goodbye");
    ctx.quit = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RobotTuning, YatraConfig};
    use setu_io::{Message, MockDevice, SensorReport};

    fn context() -> (AppContext<MockDevice>, MockDevice) {
        let config = YatraConfig::default();
        let device = MockDevice::new();
        device.respond_with(|request: &[u8]| match request[2] {
            1 => Message::SensorData(SensorReport::default()).encode(),
            _ => Message::Ack.encode(),
        });
        let link = Arc::new(RobotLink::new(device.clone(), Duration::from_millis(10)));
        let executor = NavigationExecutor::new(Arc::clone(&link), RobotTuning::default());
        let (_tx, rx) = crossbeam_channel::bounded(1);
        let ctx = AppContext {
            link,
            executor,
            map: GridMap::alloc(config.grid.dim_x, config.grid.dim_y).unwrap(),
            route_timeout: Duration::from_secs(1),
            events: rx,
            quit: false,
        };
        (ctx, device)
    }

    #[test]
    fn quit_sets_flag() {
        let (mut ctx, _) = context();
        dispatch(&mut ctx, "quit");
        assert!(ctx.quit);
    }

    #[test]
    fn unknown_command_is_ignored() {
        let (mut ctx, device) = context();
        dispatch(&mut ctx, "launch-missiles now");
        assert!(device.writes().is_empty());
        assert!(!ctx.quit);
    }

    #[test]
    fn forward_parses_signed_rate() {
        let (mut ctx, device) = context();
        dispatch(&mut ctx, "forward -100");
        assert_eq!(
            device.writes(),
            vec![Message::DriveStraight { rate: -100 }.encode()]
        );
    }

    #[test]
    fn bad_arguments_abandon_the_command() {
        let (mut ctx, device) = context();
        dispatch(&mut ctx, "forward fast");
        dispatch(&mut ctx, "goto 3");
        dispatch(&mut ctx, "goto 99 99");
        assert!(device.writes().is_empty());
    }

    #[test]
    fn rotation_commands_track_facing() {
        let (mut ctx, _) = context();
        let before = ctx.executor.pose().facing;
        dispatch(&mut ctx, "left");
        dispatch(&mut ctx, "right");
        assert_eq!(ctx.executor.pose().facing, before);
    }

    #[test]
    fn waypoint_parsing() {
        let pts = parse_waypoints("1 2 3 4").unwrap();
        assert_eq!(pts, vec![GridCoord::new(1, 2), GridCoord::new(3, 4)]);
        assert!(parse_waypoints("").is_err());
        assert!(parse_waypoints("1 2 3").is_err());
        assert!(parse_waypoints("one 2").is_err());
    }
}
