//! Turn-result playback
//!
//! Each queued turn result is animated by one resolver: a small state
//! machine advanced once per tick with the current timestamp. Instant
//! resolvers finish within the tick they start; timed ones interpolate
//! render state until their duration elapses. Unknown tank references
//! degrade to an error resolver that skips the record.

use tracing::warn;

use crate::audio::{AudioDriver, LoopSound, OneShot};
use crate::config::Timings;
use crate::game::motion::{
    area_under_line, camera_shake, normalize_180, normalize_360, plane_distance,
};
use crate::game::state::{tank_by_id_mut, GameState, Overlay, OverlayKind, Tank};
use crate::game::{BoardRules, GridEvent};
use crate::hex::{interpolate_path, unit_vector_to_idx, Axial, Vec2};
use crate::protocol::{TankId, TurnResult};

/// Camera shake amplitude while firing
const FIRE_SHAKE: f64 = 0.04;
/// Camera shake amplitude for a shell explosion
const EXPLOSION_SHAKE: f64 = 0.1;
/// Explosion fraction at which a destroyed tank vanishes under smoke
const WRECK_MARK_FRAC: f64 = 0.16;
/// Speed-profile floor for a wide (60 degree) turn
const WIDE_TURN_LOW: f64 = 0.7;
/// Speed-profile floor for a sharp (120 degree) turn
const SHARP_TURN_LOW: f64 = 0.3;

/// Outcome of one animate call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Step {
    /// Keep the current resolver for the next tick
    Hold,
    /// Consume the next result and continue within this tick
    Advance,
}

/// Everything a resolver may touch during one animate call
pub(super) struct AnimCtx<'a> {
    pub state: &'a mut GameState,
    pub audio: &'a mut dyn AudioDriver,
    pub events: &'a mut Vec<GridEvent>,
    pub timings: &'a Timings,
    pub rules: &'a BoardRules,
    pub now: f64,
}

/// The per-result animation state machines
pub(super) enum Resolver {
    /// Nothing queued
    Idle,
    /// EndTurn sentinel reached
    Finish,
    /// Skipping a record that could not be resolved
    Error,
    Move2(Move2Anim),
    Move3(Move3Anim),
    Fire(FireAnim),
    Explosion(ExplosionAnim),
    Shrink(ShrinkAnim),
    Rest(RestAnim),
}

impl Resolver {
    /// Build the resolver for the next queued result. Construction
    /// applies the result's instant state changes (position snap, fog
    /// recompute) so interrupted playback still leaves a consistent
    /// board.
    pub(super) fn for_result(result: Option<TurnResult>, ctx: &mut AnimCtx) -> Resolver {
        let Some(result) = result else {
            return Resolver::Idle;
        };
        match result {
            TurnResult::EndTurn => Resolver::Finish,
            TurnResult::Move2 { id, p1, p2, start } => {
                match Move2Anim::new(id, p1, p2, start, ctx) {
                    Some(anim) => Resolver::Move2(anim),
                    None => Self::unresolved(Some(id), ctx),
                }
            }
            TurnResult::Move3 { id, p1, p2, p3 } => match Move3Anim::new(id, p1, p2, p3, ctx) {
                Some(anim) => Resolver::Move3(anim),
                None => Self::unresolved(Some(id), ctx),
            },
            TurnResult::Fire { id, dir } => match FireAnim::new(id, dir, ctx) {
                Some(anim) => Resolver::Fire(anim),
                None => Self::unresolved(Some(id), ctx),
            },
            TurnResult::Explosion { p, id, destroyed } => {
                if destroyed {
                    match id.filter(|tid| ctx.state.tank(*tid).is_some()) {
                        Some(tid) => Resolver::Explosion(ExplosionAnim::new(p, Some(tid), ctx)),
                        None => Self::unresolved(id, ctx),
                    }
                } else {
                    Resolver::Explosion(ExplosionAnim::new(p, None, ctx))
                }
            }
            TurnResult::Shrink { r, started } => Resolver::Shrink(ShrinkAnim::new(r, started, ctx)),
            TurnResult::Destroyed { .. } | TurnResult::Visible { .. } => {
                Resolver::Rest(RestAnim { result })
            }
        }
    }

    fn unresolved(id: Option<TankId>, ctx: &mut AnimCtx) -> Resolver {
        warn!(tank = ?id, "turn result references an unknown tank, skipping");
        ctx.events.push(GridEvent::UnknownTank { id });
        Resolver::Error
    }

    /// Advance this resolver by one tick
    pub(super) fn animate(&mut self, ctx: &mut AnimCtx) -> Step {
        match self {
            Resolver::Idle => Step::Hold,
            Resolver::Finish | Resolver::Error => Step::Advance,
            Resolver::Move2(anim) => anim.animate(ctx),
            Resolver::Move3(anim) => anim.animate(ctx),
            Resolver::Fire(anim) => anim.animate(ctx),
            Resolver::Explosion(anim) => anim.animate(ctx),
            Resolver::Shrink(anim) => anim.animate(ctx),
            Resolver::Rest(anim) => anim.animate(ctx),
        }
    }
}

/// Two-point move fragment: rotate towards the step, then drive half a
/// cell with an accelerating (start) or decelerating (end) profile
pub(super) struct Move2Anim {
    tank: TankId,
    start_t: f64,
    start_angle: f64,
    turret_offset: f64,
    end_angle: f64,
    d_angle: f64,
    t_rotation: f64,
    t_move: f64,
    start_f: Vec2,
    end_f: Vec2,
    aul: f64,
    y1: f64,
    y2: f64,
}

impl Move2Anim {
    fn new(id: TankId, p1: Axial, p2: Axial, start: bool, ctx: &mut AnimCtx) -> Option<Self> {
        let timings = ctx.timings;
        let tank = ctx.state.tank_mut(id)?;
        let start_angle = tank.body_angle;
        let turret_offset = normalize_360(tank.turret_angle - tank.body_angle);
        let end_angle = unit_vector_to_idx(p2.sub(p1)) as f64 * 60.0;
        let d_angle = normalize_180(end_angle - start_angle);
        let t_rotation = if start {
            d_angle.abs() / timings.rotation_speed * 1000.0
        } else {
            0.0
        };

        let mut start_f = p1.to_vec2();
        let mut end_f = p2.to_vec2();
        let mid = start_f.add(end_f).mul(0.5);
        if start {
            end_f = mid;
        } else {
            start_f = mid;
        }
        // The leading half keeps the tank on its origin cell and the
        // trailing half snaps it to the destination at once; only the
        // render position eases
        tank.pos = if start { p1 } else { p2 };
        ctx.state
            .recalculate_visible_hexes(ctx.rules.visibility_range);

        let d = plane_distance(end_f, start_f);
        let aul = area_under_line(0.0, 1.0, 1.0);
        let t_move = d / (aul * timings.travel_speed) * 1000.0;
        let (y1, y2) = if start { (0.0, 1.0) } else { (1.0, 0.0) };

        Some(Self {
            tank: id,
            start_t: ctx.now,
            start_angle,
            turret_offset,
            end_angle,
            d_angle,
            t_rotation,
            t_move,
            start_f,
            end_f,
            aul,
            y1,
            y2,
        })
    }

    fn animate(&mut self, ctx: &mut AnimCtx) -> Step {
        ctx.audio.start_loop(LoopSound::Driving);
        let elapsed = ctx.now - self.start_t;
        let frac_t1 = if self.t_rotation == 0.0 {
            1.0
        } else {
            elapsed / self.t_rotation
        };
        let frac_t2 = (elapsed - self.t_rotation) / self.t_move;

        let Some(tank) = ctx.state.tank_mut(self.tank) else {
            return Step::Advance;
        };
        self.apply_rotation(tank, frac_t1);
        if frac_t2 >= 0.0 {
            let frac = area_under_line(self.y1, self.y2, frac_t2) / self.aul;
            tank.render_pos = self.start_f.lerp(self.end_f, frac);
            if frac >= 1.0 {
                ctx.audio.stop_loop(LoopSound::Driving);
                return Step::Advance;
            }
        }
        Step::Hold
    }

    fn apply_rotation(&self, tank: &mut Tank, frac_t: f64) {
        if frac_t <= 0.0 {
            tank.body_angle = self.start_angle;
            tank.turret_angle = normalize_360(self.start_angle + self.turret_offset);
            return;
        }
        if frac_t >= 1.0 {
            tank.body_angle = self.end_angle;
            tank.turret_angle = normalize_360(self.end_angle + self.turret_offset);
            return;
        }
        tank.body_angle = normalize_360(self.start_angle + frac_t * self.d_angle);
        tank.turret_angle = normalize_360(tank.body_angle + self.turret_offset);
    }
}

/// Three-point move fragment: glide through a cell along a pulled
/// spline, slowing into the turn and accelerating out of it
pub(super) struct Move3Anim {
    tank: TankId,
    start_t: f64,
    low: f64,
    start_angle: f64,
    turret_offset: f64,
    end_angle: f64,
    d_angle: f64,
    duration: f64,
    aul: f64,
    end_pos_f: Vec2,
    points: [Vec2; 5],
    fracs: [f64; 4],
}

impl Move3Anim {
    fn new(id: TankId, p1: Axial, p2: Axial, p3: Axial, ctx: &mut AnimCtx) -> Option<Self> {
        let timings = ctx.timings;
        let v1 = p2.sub(p1);
        let v2 = p3.sub(p2);
        // Straight through, wide 60 degree bend, or a sharp switchback
        let low = if v1 == v2 {
            1.0
        } else if p1.grid_distance(p3) == 1 {
            SHARP_TURN_LOW
        } else {
            WIDE_TURN_LOW
        };
        let start_angle = unit_vector_to_idx(v1) as f64 * 60.0;
        let end_angle = unit_vector_to_idx(v2) as f64 * 60.0;
        let d_angle = normalize_180(end_angle - start_angle);

        let tank = ctx.state.tank_mut(id)?;
        let turret_offset = normalize_360(tank.turret_angle - tank.body_angle);
        tank.pos = p2;
        ctx.state
            .recalculate_visible_hexes(ctx.rules.visibility_range);

        let center = p2.to_vec2();
        let entry_mid = p1.to_vec2().add(center).mul(0.5);
        let exit_mid = p3.to_vec2().add(center).mul(0.5);
        let d = plane_distance(center, entry_mid) + plane_distance(exit_mid, center);
        let aul = area_under_line(1.0, low, 1.0);
        let duration = d / (aul * timings.travel_speed) * 1000.0;

        // Five-point spline pulled towards the cell center
        let q2 = center.add(entry_mid.sub(center).mul(0.7));
        let q4 = center.add(exit_mid.sub(center).mul(0.7));
        let q3 = center.add(entry_mid.sub(center).add(exit_mid.sub(center)).mul(0.25));
        let points = [entry_mid, q2, q3, q4, exit_mid];
        let lengths = [
            q2.sub(entry_mid),
            q3.sub(q2),
            q4.sub(q3),
            exit_mid.sub(q4),
        ]
        .map(|v| v.to_plane().length());
        let sum: f64 = lengths.iter().sum();
        let mut fracs = [0.0; 4];
        let mut cur = 0.0;
        for (i, l) in lengths.iter().enumerate() {
            cur += l / sum;
            fracs[i] = cur;
        }

        Some(Self {
            tank: id,
            start_t: ctx.now,
            low,
            start_angle,
            turret_offset,
            end_angle,
            d_angle,
            duration,
            aul,
            end_pos_f: exit_mid,
            points,
            fracs,
        })
    }

    fn animate(&mut self, ctx: &mut AnimCtx) -> Step {
        ctx.audio.start_loop(LoopSound::Driving);
        let frac_t = (ctx.now - self.start_t) / self.duration;
        // Decelerate over the first half, accelerate back over the second
        let mut area = area_under_line(1.0, self.low, frac_t * 2.0) / 2.0;
        if frac_t >= 0.5 {
            area += area_under_line(self.low, 1.0, (frac_t - 0.5) * 2.0) / 2.0;
        }
        let frac = area / self.aul;

        let Some(tank) = ctx.state.tank_mut(self.tank) else {
            return Step::Advance;
        };
        tank.render_pos = interpolate_path(&self.points, &self.fracs, frac);
        tank.body_angle = normalize_360(self.start_angle + frac_t * self.d_angle);
        tank.turret_angle = normalize_360(tank.body_angle + self.turret_offset);
        if frac_t >= 1.0 {
            ctx.audio.stop_loop(LoopSound::Driving);
            tank.render_pos = self.end_pos_f;
            tank.body_angle = self.end_angle;
            tank.turret_angle = normalize_360(self.end_angle + self.turret_offset);
            return Step::Advance;
        }
        Step::Hold
    }
}

/// Fire sequence: align turret (and hull when the target is behind),
/// pause, then flash the muzzle under camera shake
pub(super) struct FireAnim {
    tank: TankId,
    start_t: f64,
    start_angle: f64,
    turret_offset: f64,
    end_angle: f64,
    d_angle_body: f64,
    d_angle_turret: f64,
    turret_only: bool,
    t_rotation: f64,
    t_firing: f64,
    t_pause: f64,
    p_firing: Vec2,
    played_firing_sound: bool,
}

impl FireAnim {
    fn new(id: TankId, dir: Axial, ctx: &mut AnimCtx) -> Option<Self> {
        let timings = ctx.timings;
        let tank = ctx.state.tank_mut(id)?;
        let start_angle = tank.body_angle;
        let turret_offset = normalize_180(tank.turret_angle - tank.body_angle);
        let end_angle = unit_vector_to_idx(dir) as f64 * 60.0;
        let body_gap = normalize_180(end_angle - tank.body_angle).abs();

        let (d_angle_body, d_angle_turret, turret_only);
        if body_gap < 90.0 {
            d_angle_body = 0.0;
            d_angle_turret = normalize_180(end_angle - tank.turret_angle);
            turret_only = true;
        } else {
            d_angle_body = normalize_180(end_angle - start_angle);
            d_angle_turret = -turret_offset;
            turret_only = false;
        }
        let t_rotation = if turret_only {
            d_angle_turret.abs() / timings.rotation_speed * 1000.0
        } else {
            d_angle_body.abs().max(d_angle_turret.abs()) / timings.rotation_speed * 1000.0
        };
        let p_firing = tank.pos.to_vec2().add(dir.to_vec2().mul(0.3));

        Some(Self {
            tank: id,
            start_t: ctx.now,
            start_angle,
            turret_offset,
            end_angle,
            d_angle_body,
            d_angle_turret,
            turret_only,
            t_rotation,
            t_firing: timings.firing_duration_ms,
            t_pause: timings.firing_pause_ms,
            p_firing,
            played_firing_sound: false,
        })
    }

    fn animate(&mut self, ctx: &mut AnimCtx) -> Step {
        let elapsed = ctx.now - self.start_t;
        let frac_t1 = if self.t_rotation == 0.0 {
            1.0
        } else {
            elapsed / self.t_rotation
        };
        let frac_t2 = (elapsed - self.t_rotation - self.t_pause) / self.t_firing;

        {
            let Some(tank) = ctx.state.tank_mut(self.tank) else {
                return Step::Advance;
            };
            self.apply_rotation(tank, ctx.audio, frac_t1);
        }

        if frac_t2 >= 0.0 {
            if !self.played_firing_sound {
                self.played_firing_sound = true;
                ctx.audio.play_once(OneShot::TankFiring);
            }
            ctx.state.camera_shake = camera_shake(frac_t2).mul(FIRE_SHAKE);
            if frac_t2 >= 1.0 {
                ctx.state.camera_shake = Vec2::zero();
                ctx.state.firing_explosion.frac = 0.0;
                return Step::Advance;
            }
            if frac_t2 <= 0.0 {
                ctx.state.firing_explosion.frac = 0.0;
            } else {
                ctx.state.firing_explosion.frac = frac_t2;
                ctx.state.firing_explosion.pos = self.p_firing;
            }
        }
        Step::Hold
    }

    fn apply_rotation(&self, tank: &mut Tank, audio: &mut dyn AudioDriver, frac: f64) {
        if frac <= 0.0 {
            return;
        }
        if frac >= 1.0 {
            audio.stop_loop(LoopSound::TurretRotation);
            audio.stop_loop(LoopSound::Driving);
            if self.turret_only {
                tank.body_angle = self.start_angle;
                tank.turret_angle = self.end_angle;
            } else {
                tank.body_angle = self.end_angle;
                tank.turret_angle = self.end_angle;
            }
            return;
        }
        if self.turret_only {
            audio.start_loop(LoopSound::TurretRotation);
            tank.body_angle = self.start_angle;
            tank.turret_angle =
                normalize_360(self.start_angle + self.turret_offset + frac * self.d_angle_turret);
            return;
        }
        audio.start_loop(LoopSound::Driving);
        if self.turret_offset.abs() > 1.0 {
            audio.start_loop(LoopSound::TurretRotation);
        }
        tank.body_angle = normalize_360(self.start_angle + frac * self.d_angle_body);
        tank.turret_angle =
            normalize_360(tank.body_angle + self.turret_offset + frac * self.d_angle_turret);
    }
}

/// Shell explosion: a still pause on both sides of the blast, camera
/// shake, and for a destroyed tank a wreck smoke mark partway through
pub(super) struct ExplosionAnim {
    tank: Option<TankId>,
    start_t: f64,
    pos: Axial,
    t_pause: f64,
    t_explosion: f64,
    marked: bool,
    played_explosion_sound: bool,
}

impl ExplosionAnim {
    fn new(p: Axial, tank: Option<TankId>, ctx: &mut AnimCtx) -> Self {
        Self {
            tank,
            start_t: ctx.now,
            pos: p,
            t_pause: ctx.timings.explosion_pause_ms,
            t_explosion: ctx.timings.explosion_duration_ms,
            marked: false,
            played_explosion_sound: false,
        }
    }

    fn animate(&mut self, ctx: &mut AnimCtx) -> Step {
        let frac_explosion = (ctx.now - self.start_t - self.t_pause) / self.t_explosion;
        let frac = (ctx.now - self.start_t) / (self.t_explosion + 2.0 * self.t_pause);
        if !self.played_explosion_sound && frac_explosion >= 0.0 {
            self.played_explosion_sound = true;
            ctx.audio.play_once(OneShot::Explosion);
        }
        self.apply_explosion(ctx, frac_explosion.max(0.0));
        if frac >= 1.0 {
            ctx.state.camera_shake = Vec2::zero();
            ctx.state
                .recalculate_visible_hexes(ctx.rules.visibility_range);
            return Step::Advance;
        }
        Step::Hold
    }

    fn apply_explosion(&mut self, ctx: &mut AnimCtx, frac: f64) {
        ctx.state.camera_shake = camera_shake(frac).mul(EXPLOSION_SHAKE);
        ctx.state.explosion.frac = frac;
        ctx.state.explosion.pos = self.pos.to_vec2();
        if let Some(id) = self.tank {
            if !self.marked && frac >= WRECK_MARK_FRAC {
                self.marked = true;
                let mut wreck = None;
                if let Some(tank) = ctx.state.tank_mut(id) {
                    tank.visible = false;
                    wreck = Some(tank.pos);
                }
                if let Some(pos) = wreck {
                    ctx.state.overlays.push(Overlay {
                        pos,
                        kind: OverlayKind::Smoke,
                    });
                }
            }
        }
        if frac >= 1.0 {
            ctx.state.explosion.frac = 0.0;
        }
    }
}

/// Board shrink: an instant warning ring, or the fade and removal of
/// every cell outside the new radius
pub(super) struct ShrinkAnim {
    r: u32,
    started: bool,
    start_t: f64,
    duration: f64,
}

impl ShrinkAnim {
    fn new(r: u32, started: bool, ctx: &mut AnimCtx) -> Self {
        Self {
            r,
            started,
            start_t: if started { ctx.now } else { 0.0 },
            duration: ctx.timings.shrink_duration_ms,
        }
    }

    fn animate(&mut self, ctx: &mut AnimCtx) -> Step {
        let center = ctx.rules.center;
        if !self.started {
            let ring: Vec<Axial> = ctx
                .state
                .hexes
                .values()
                .filter(|hex| hex.pos.grid_distance(center) == self.r)
                .map(|hex| hex.pos)
                .collect();
            for pos in ring {
                ctx.state.overlays.push(Overlay {
                    pos,
                    kind: OverlayKind::ShrinkWarning,
                });
            }
            return Step::Advance;
        }
        let frac = (ctx.now - self.start_t) / self.duration;
        if frac < 0.0 {
            return Step::Hold;
        }
        if frac >= 1.0 {
            let r = self.r;
            ctx.state
                .hexes
                .retain(|_, hex| hex.pos.grid_distance(center) < r);
            return Step::Advance;
        }
        let opacity = 1.0 - frac;
        for hex in ctx.state.hexes.values_mut() {
            if hex.pos.grid_distance(center) >= self.r {
                hex.opacity = opacity;
            }
        }
        Step::Hold
    }
}

/// Instant catch-all for visibility flips, off-screen kills and a
/// started shrink arriving without its announcement
pub(super) struct RestAnim {
    result: TurnResult,
}

impl RestAnim {
    fn animate(&mut self, ctx: &mut AnimCtx) -> Step {
        match self.result {
            TurnResult::Visible { id, p, visible } => {
                match tank_by_id_mut(&mut ctx.state.enemy_tanks, id) {
                    Some(tank) => {
                        tank.pos = p;
                        tank.render_pos = p.to_vec2();
                        tank.visible = visible;
                    }
                    None => {
                        warn!(tank = id.0, "visibility update for an unknown tank");
                        ctx.events.push(GridEvent::UnknownTank { id: Some(id) });
                    }
                }
            }
            TurnResult::Destroyed { id, p } => {
                match tank_by_id_mut(&mut ctx.state.enemy_tanks, id) {
                    Some(tank) => {
                        tank.visible = false;
                        ctx.state.overlays.push(Overlay {
                            pos: p,
                            kind: OverlayKind::Smoke,
                        });
                    }
                    None => {
                        warn!(tank = id.0, "destruction record for an unknown tank");
                        ctx.events.push(GridEvent::UnknownTank { id: Some(id) });
                    }
                }
            }
            TurnResult::Shrink { r, started } => {
                if started {
                    let center = ctx.rules.center;
                    ctx.state
                        .hexes
                        .retain(|_, hex| hex.pos.grid_distance(center) < r);
                }
            }
            _ => {}
        }
        ctx.state
            .recalculate_visible_hexes(ctx.rules.visibility_range);
        Step::Advance
    }
}
