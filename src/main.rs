//! Demo driver for the tank game client engine
//!
//! Plays a short scripted match against a pretend server without a
//! renderer: composes orders through pointer gestures, feeds turn
//! result batches through the wire codec and plays them back on the
//! real clock, logging what a UI would draw and play.

use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tank_game_client::audio::{AudioDriver, LoopSound, OneShot};
use tank_game_client::config::{Config, Timings};
use tank_game_client::display::{DisplayDriver, FlatLayout};
use tank_game_client::game::state::tank_by_id;
use tank_game_client::game::GridEvent;
use tank_game_client::hex::{Axial, Vec2};
use tank_game_client::protocol::{
    BoardConfig, HexConfig, MatchOutcome, ServerMsg, SiteConfig, TankConfig, TankId, TurnResult,
};
use tank_game_client::session::TurnSession;
use tank_game_client::util::time::{init_clock, now_ms, Timer};

/// Logs audio cues instead of playing them
#[derive(Default)]
struct TraceAudio {
    active: Vec<LoopSound>,
}

impl AudioDriver for TraceAudio {
    fn start_loop(&mut self, sound: LoopSound) {
        if !self.active.contains(&sound) {
            self.active.push(sound);
            debug!(sound = ?sound, "audio loop on");
        }
    }

    fn stop_loop(&mut self, sound: LoopSound) {
        if self.active.contains(&sound) {
            self.active.retain(|s| *s != sound);
            debug!(sound = ?sound, "audio loop off");
        }
    }

    fn play_once(&mut self, sound: OneShot) {
        info!(sound = ?sound, "audio cue");
    }
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Fix the playback clock origin
    init_clock();

    info!("Starting tank game client demo");
    info!(
        seed = config.seed,
        radius = config.board_radius,
        time_scale = config.time_scale,
        "demo parameters"
    );

    let board = demo_board(config.seed, config.board_radius);
    let mut session = TurnSession::new(&board, Timings::default());
    let mut layout = FlatLayout::default();
    let mut audio = TraceAudio::default();
    let time_scale = config.time_scale;
    let clock = || now_ms() * time_scale;

    session.tick(clock(), &mut layout, &mut audio);

    // Compose a move for the first tank: grab it and sweep the pointer
    // east, cell by cell
    let start = layout.grid_to_screen(Axial::new(-2, 0));
    session.grid.handle_pointer_start(start, &layout);
    session
        .grid
        .handle_pointer_move(layout.grid_to_screen(Axial::new(-1, 0)), &mut layout);
    session
        .grid
        .handle_pointer_move(layout.grid_to_screen(Axial::new(0, 0)), &mut layout);
    session.grid.handle_pointer_end(layout.grid_to_screen(Axial::new(0, 0)));
    session.tick(clock(), &mut layout, &mut audio);

    // Compose a shot for the second tank: press and hold until the
    // gesture turns into aiming, then sweep towards the target
    let anchor = layout.grid_to_screen(Axial::new(-2, 2));
    session.grid.handle_pointer_start(anchor, &layout);
    let hold = Timer::new();
    loop {
        thread::sleep(Duration::from_millis(30));
        session.tick(clock(), &mut layout, &mut audio);
        let aiming = tank_by_id(&session.grid.state.player_tanks, TankId(2))
            .map(|tank| tank.shooting)
            .unwrap_or(false);
        if aiming {
            break;
        }
        if hold.elapsed_ms() > 10_000.0 {
            warn!("hold-to-aim never engaged, composing move only");
            break;
        }
    }
    session
        .grid
        .handle_pointer_move(anchor.add(Vec2::new(120.0, 0.0)), &mut layout);
    session.grid.handle_pointer_end(anchor.add(Vec2::new(120.0, 0.0)));
    session.tick(clock(), &mut layout, &mut audio);

    match session.confirm_turn()? {
        Some(msg) => info!(msg = %msg, "turn sent"),
        None => warn!("send gate closed, nothing sent"),
    }

    // First reply from the pretend server: reveal an enemy, walk it one
    // cell, announce the coming shrink
    deliver(
        &mut session,
        ServerMsg::TurnResults {
            results: vec![
                TurnResult::Visible {
                    id: TankId(11),
                    p: Axial::new(2, 0),
                    visible: true,
                },
                TurnResult::Move2 {
                    id: TankId(11),
                    p1: Axial::new(2, 0),
                    p2: Axial::new(1, 1),
                    start: true,
                },
                TurnResult::Move2 {
                    id: TankId(11),
                    p1: Axial::new(2, 0),
                    p2: Axial::new(1, 1),
                    start: false,
                },
                TurnResult::Shrink {
                    r: config.board_radius,
                    started: false,
                },
            ],
        },
    )?;

    // Play back in real time; partway through, the next batch and the
    // match result arrive while the first batch still runs
    let mut followup_sent = false;
    let runtime = Timer::new();
    loop {
        thread::sleep(Duration::from_millis(16));
        let events = session.tick(clock(), &mut layout, &mut audio);
        for event in &events {
            match event {
                GridEvent::AnimationStarted => debug!("batch playback started"),
                GridEvent::AnimationEnded => info!("batch playback finished"),
                GridEvent::UnknownTank { id } => warn!(tank = ?id, "skipped a bad record"),
                GridEvent::TankSelected { .. } => {}
            }
        }

        if !followup_sent && runtime.elapsed_ms() > 400.0 {
            followup_sent = true;
            deliver(
                &mut session,
                ServerMsg::TurnResults {
                    results: vec![
                        TurnResult::Fire {
                            id: TankId(1),
                            dir: Axial::new(1, 0),
                        },
                        TurnResult::Explosion {
                            p: Axial::new(1, 1),
                            id: Some(TankId(11)),
                            destroyed: true,
                        },
                        TurnResult::Shrink {
                            r: config.board_radius,
                            started: true,
                        },
                    ],
                },
            )?;
            deliver(
                &mut session,
                ServerMsg::GameFinished {
                    result: MatchOutcome::Win,
                },
            )?;
        }

        for notice in session.take_notices() {
            info!(notice = notice.text(), "notice");
        }

        if followup_sent && !session.grid.is_animating() {
            break;
        }
        if runtime.elapsed_ms() > 60_000.0 {
            warn!("demo timed out waiting for playback to finish");
            break;
        }
    }

    let state = &session.grid.state;
    let enemies_left = state.enemy_tanks.iter().filter(|t| t.visible).count();
    info!(
        hexes = state.hexes.len(),
        enemies_visible = enemies_left,
        overlays = state.overlays.len(),
        runtime_ms = runtime.elapsed_ms() as u64,
        "demo complete"
    );
    Ok(())
}

/// Round-trip a server message through the wire codec, as if it had
/// arrived over the socket, then apply it
fn deliver(session: &mut TurnSession, msg: ServerMsg) -> anyhow::Result<()> {
    let raw = serde_json::to_string(&msg)?;
    session.handle_message(ServerMsg::decode(&raw)?);
    Ok(())
}

/// Generate a small symmetric demo board
fn demo_board(seed: u64, radius: u32) -> BoardConfig {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let r = radius as i32;
    let mut hexes = Vec::new();
    for x in -r..=r {
        for y in -r..=r {
            let p = Axial::new(x, y);
            if p.grid_distance(Axial::zero()) <= radius {
                hexes.push(HexConfig {
                    p,
                    variant: rng.gen_range(0..3),
                });
            }
        }
    }

    let player_tanks = vec![
        TankConfig {
            id: TankId(1),
            p: Axial::new(-2, 0),
        },
        TankConfig {
            id: TankId(2),
            p: Axial::new(-2, 2),
        },
    ];
    let enemy_tanks = vec![
        TankConfig {
            id: TankId(11),
            p: Axial::new(2, 0),
        },
        TankConfig {
            id: TankId(12),
            p: Axial::new(3, -1),
        },
    ];

    let occupied: Vec<Axial> = player_tanks
        .iter()
        .chain(enemy_tanks.iter())
        .map(|t| t.p)
        .collect();
    let mut sites = Vec::new();
    for hex in &hexes {
        if hex.p == Axial::zero() || occupied.contains(&hex.p) {
            continue;
        }
        if rng.gen_bool(0.06) {
            sites.push(SiteConfig {
                p: hex.p,
                variant: rng.gen_range(0..2),
            });
        }
    }

    BoardConfig {
        hexes,
        sites,
        player_tanks,
        enemy_tanks,
        drive_range: 3,
        visibility_range: 3,
        center: Axial::zero(),
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
