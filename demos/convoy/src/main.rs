//! convoy — a small driver for the route_dispatch workspace.
//!
//! Sends a group of ground and hover movers to random goals across the demo
//! map (see `world.rs`) through a `RouteDispatcher`, one barrier per tick.
//! Partway through, the ridge pass is walled off and a new gap is opened
//! further south, so routes through the pass have to be re-planned.
//!
//! ```text
//! cargo run -p convoy                      # demos/convoy/convoy.toml if present
//! cargo run -p convoy -- other.toml -v     # explicit config, debug logging
//! cargo run -p convoy -- --help
//! ```

mod logging;
mod world;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rd_core::{MoverId, MoverKind, MoverProfile, OwnerId, Position, Rect, RouteHandle};
use rd_dispatch::{DispatchConfig, RouteDispatcher};
use rd_engine::{Cell, EngineKind, RouteEngine, RouteRequest, WaypointQuery};

// ── Constants ─────────────────────────────────────────────────────────────────

const MOVER_COUNT:      usize = 16;
const HOVER_EVERY:      usize = 4;    // every 4th mover hovers
const SEED:             u64   = 7;
const MAX_TICKS:        u64   = 400;
const SPEED:            f32   = 3.0;  // world units per tick
const GOAL_RADIUS:      f32   = 6.0;
const WAYPOINT_REACHED: f32   = 2.0;
const RETRIES:          u32   = 2;
const WALL_TICK:        u64   = 60;
/// Ticks standing on the same waypoint before the route counts as finished.
const END_OF_ROUTE:     u32   = 3;
const DEFAULT_CONFIG:   &str  = "demos/convoy/convoy.toml";

type Dispatcher = RouteDispatcher<Box<dyn RouteEngine>>;

#[derive(Parser)]
#[command(author, version, about = "Drive a convoy of movers through the route dispatcher", long_about = None)]
struct Args {
    /// Dispatcher config (TOML).  Defaults to demos/convoy/convoy.toml, then
    /// to built-in settings with the grid engine.
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

// ── Movers ────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Status {
    Idle,
    Travelling(RouteHandle),
    Arrived,
    Stranded,
}

struct Mover {
    profile:   MoverProfile,
    pos:       Position,
    goal:      Position,
    status:    Status,
    stalled:   u32,
    travelled: f32,
}

impl Mover {
    fn owner(&self) -> Option<OwnerId> {
        Some(OwnerId(self.profile.id.0 as u32))
    }

    fn is_done(&self) -> bool {
        matches!(self.status, Status::Arrived | Status::Stranded)
    }
}

/// Move `pos` up to `max` units towards `target`; returns the distance moved.
fn move_towards(pos: &mut Position, target: Position, max: f32) -> f32 {
    let d = pos.distance_2d(target);
    if d <= max {
        *pos = Position::new(target.x, pos.y, target.z);
        return d;
    }
    let k = max / d;
    pos.x += (target.x - pos.x) * k;
    pos.z += (target.z - pos.z) * k;
    max
}

/// One tick of one mover's steering.
fn step(m: &mut Mover, dispatcher: &Dispatcher) {
    let handle = match m.status {
        Status::Idle => {
            let request = RouteRequest {
                mover:       m.profile,
                start:       m.pos,
                goal:        m.goal,
                goal_radius: GOAL_RADIUS,
                owner:       m.owner(),
                synced:      true,
            };
            m.status = Status::Travelling(dispatcher.request_route(request));
            return;
        }
        Status::Travelling(h) => h,
        Status::Arrived | Status::Stranded => return,
    };

    let Some(state) = dispatcher.route_state(handle) else {
        return;
    };
    if state.failed {
        warn!("{}: no route from {} to {}", m.profile.id, m.pos, m.goal);
        dispatcher.delete_route(handle);
        m.status = Status::Stranded;
        return;
    }
    if m.pos.distance_2d(m.goal) <= GOAL_RADIUS {
        dispatcher.delete_route(handle);
        m.status = Status::Arrived;
        return;
    }

    let query = WaypointQuery {
        caller_pos:   m.pos,
        min_distance: WAYPOINT_REACHED,
        retries:      RETRIES,
        owner:        m.owner(),
        synced:       true,
    };
    let target = dispatcher.next_waypoint(handle, query);
    if dispatcher.notify_updated(handle) {
        debug!("{}: route re-planned", m.profile.id);
    }

    let moved = move_towards(&mut m.pos, target, SPEED);
    m.travelled += moved;
    m.stalled = if state.is_resolved() && moved == 0.0 { m.stalled + 1 } else { 0 };
    if m.stalled >= END_OF_ROUTE {
        dispatcher.delete_route(handle);
        m.status = Status::Arrived;
    }
}

// ── Terrain edit ──────────────────────────────────────────────────────────────

fn rect(x0: f32, z0: f32, x1: f32, z1: f32) -> Rect {
    Rect::from_corners(Position::ground(x0, z0), Position::ground(x1, z1))
}

/// Wall off the ridge pass and open a gap at the ridge's southern end.
fn move_the_pass(dispatcher: &Dispatcher) {
    dispatcher.edit_terrain(rect(100.0, 90.0, 108.0, 110.0), Cell::BLOCKED);
    dispatcher.edit_terrain(rect(100.0, 0.0, 108.0, 20.0), Cell::LAND);
    info!("ridge pass closed; new gap opened at the southern end");
}

// ── Config ────────────────────────────────────────────────────────────────────

fn load_config(arg: Option<&Path>) -> Result<DispatchConfig> {
    if let Some(path) = arg {
        return DispatchConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()));
    }
    if Path::new(DEFAULT_CONFIG).exists() {
        return DispatchConfig::from_path(DEFAULT_CONFIG)
            .with_context(|| format!("loading {DEFAULT_CONFIG}"));
    }
    info!("no config file found; using defaults with the grid engine");
    Ok(DispatchConfig { engine: EngineKind::Grid, ..DispatchConfig::default() })
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = load_config(args.config.as_deref())?;
    println!("=== convoy — route_dispatch demo ===");
    println!(
        "Movers: {MOVER_COUNT}  |  Engine: {}  |  Mode: {}  |  Seed: {SEED}",
        config.engine, config.mode
    );

    // 1. World and dispatcher.
    let world = world::build();
    println!(
        "Map: {0} x {0} units, {1} road nodes, {2} road edges",
        world::EXTENT,
        world.graph.node_count(),
        world.graph.edge_count()
    );
    let mut dispatcher = RouteDispatcher::from_config(&config, &world.engine_world())
        .context("starting route dispatcher")?;

    // 2. Movers with random dry-land starts and goals.
    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut movers: Vec<Mover> = {
        let grid = world.grid.read();
        (0..MOVER_COUNT)
            .map(|i| {
                let kind = if i % HOVER_EVERY == 0 { MoverKind::Hover } else { MoverKind::Ground };
                Mover {
                    profile:   MoverProfile::new(MoverId(i as u16), kind, 1.0),
                    pos:       world::random_land(&grid, &mut rng),
                    goal:      world::random_land(&grid, &mut rng),
                    status:    Status::Idle,
                    stalled:   0,
                    travelled: 0.0,
                }
            })
            .collect()
    };

    // 3. Tick loop: steer every mover, then one barrier.
    let started = Instant::now();
    let mut applied = 0usize;
    for tick in 0..MAX_TICKS {
        if tick == WALL_TICK {
            move_the_pass(&dispatcher);
        }
        for m in movers.iter_mut() {
            step(m, &dispatcher);
        }
        let report = dispatcher.synchronize()?;
        applied += report.applied;
        debug!(
            "{}: applied {} results, removed {} routes, {} live",
            report.tick,
            report.applied,
            report.removed,
            dispatcher.live_routes()
        );
        if movers.iter().all(Mover::is_done) {
            info!("all movers finished at {}", report.tick);
            break;
        }
    }
    let elapsed = started.elapsed();

    // 4. Release whatever is still in flight and stop the worker.
    for m in &movers {
        if let Status::Travelling(h) = m.status {
            dispatcher.delete_route(h);
        }
    }
    dispatcher.synchronize()?;
    let engine_routes = dispatcher.with_engine(|e| e.live_routes())?;
    let ticks = dispatcher.synced_ticks();
    dispatcher.shutdown()?;

    // 5. Summary.
    let arrived = movers.iter().filter(|m| m.status == Status::Arrived).count();
    let stranded = movers.iter().filter(|m| m.status == Status::Stranded).count();
    let travelling = movers.len() - arrived - stranded;
    let distance: f32 = movers.iter().map(|m| m.travelled).sum();

    println!();
    println!("Barriers: {ticks}  |  Results applied: {applied}");
    println!("Arrived: {arrived}/{MOVER_COUNT}  |  Stranded: {stranded}  |  Still travelling: {travelling}");
    println!("Distance travelled: {distance:.0} units");
    println!("Routes left in engine: {engine_routes}");
    println!("Wall time: {:.1} ms", elapsed.as_secs_f64() * 1e3);

    Ok(())
}
