//! Board and tank state shared by the composer, the playback engine and
//! the renderer

use std::collections::{HashMap, HashSet};

use crate::hex::{Axial, Vec2};
use crate::protocol::{BoardConfig, TankId};

// Starting orientations in degrees, matching the board art
const PLAYER_BODY_ANGLE: f64 = 120.0;
const PLAYER_TURRET_ANGLE: f64 = 134.0;
const ENEMY_BODY_ANGLE: f64 = 304.0;
const ENEMY_TURRET_ANGLE: f64 = 288.0;

/// One board cell
#[derive(Debug, Clone)]
pub struct HexTile {
    pub pos: Axial,
    pub variant: u8,
    /// False for cells blocked by a site
    pub traversable: bool,
    /// Render opacity, faded during board shrink
    pub opacity: f64,
}

/// Impassable landmark
#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub pos: Axial,
    pub variant: u8,
}

/// Ground marker kinds left behind by playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Wreck smoke where a tank died
    Smoke,
    /// Warning ring on cells about to collapse
    ShrinkWarning,
}

/// Persistent ground marker
#[derive(Debug, Clone, Copy)]
pub struct Overlay {
    pub pos: Axial,
    pub kind: OverlayKind,
}

/// A tank, friendly or hostile
#[derive(Debug, Clone)]
pub struct Tank {
    pub id: TankId,
    /// Logical cell, snapped forward at the start of each move fragment
    pub pos: Axial,
    /// Interpolated render position in the fractional axial frame
    pub render_pos: Vec2,
    /// Hull facing in degrees, [0, 360)
    pub body_angle: f64,
    /// Turret facing in degrees, [0, 360)
    pub turret_angle: f64,
    /// Composed move path, origin included once a first step exists
    pub path: Vec<Axial>,
    /// Composed fire order
    pub shooting: bool,
    /// Fire direction index, 0..=5
    pub shooting_dir: u8,
    pub visible: bool,
}

impl Tank {
    fn new(id: TankId, pos: Axial, body_angle: f64, turret_angle: f64, visible: bool) -> Self {
        Self {
            id,
            pos,
            render_pos: pos.to_vec2(),
            body_angle,
            turret_angle,
            path: Vec::new(),
            shooting: false,
            shooting_dir: 0,
            visible,
        }
    }
}

/// Transient screen effect (muzzle flash or shell explosion)
#[derive(Debug, Clone, Copy)]
pub struct EffectState {
    /// Animation fraction, 0 when inactive
    pub frac: f64,
    pub pos: Vec2,
}

impl EffectState {
    fn idle() -> Self {
        Self {
            frac: 0.0,
            pos: Vec2::zero(),
        }
    }
}

/// Find a tank in a roster by id
pub fn tank_by_id(tanks: &[Tank], id: TankId) -> Option<&Tank> {
    tanks.iter().find(|t| t.id == id)
}

/// Find a tank in a roster by id, mutably
pub fn tank_by_id_mut(tanks: &mut [Tank], id: TankId) -> Option<&mut Tank> {
    tanks.iter_mut().find(|t| t.id == id)
}

/// Everything the renderer reads each frame
#[derive(Debug)]
pub struct GameState {
    pub hexes: HashMap<Axial, HexTile>,
    pub sites: Vec<Site>,
    pub player_tanks: Vec<Tank>,
    pub enemy_tanks: Vec<Tank>,
    /// Cells inside some friendly tank's visibility range
    pub visible_hexes: HashSet<Axial>,
    /// Cells reachable for the grabbed tank, occupancy respected
    pub available_hexes: HashSet<Axial>,
    /// Cells reachable if occupying tanks moved away
    pub conditionally_available_hexes: HashSet<Axial>,
    /// Tank ids in the order their orders were last touched
    pub turn_order: Vec<TankId>,
    pub overlays: Vec<Overlay>,
    pub explosion: EffectState,
    pub firing_explosion: EffectState,
    /// Screen shake offset in cell-width units
    pub camera_shake: Vec2,
}

impl GameState {
    pub fn new(config: &BoardConfig) -> Self {
        let mut hexes: HashMap<Axial, HexTile> = config
            .hexes
            .iter()
            .map(|h| {
                (
                    h.p,
                    HexTile {
                        pos: h.p,
                        variant: h.variant,
                        traversable: true,
                        opacity: 1.0,
                    },
                )
            })
            .collect();

        let sites: Vec<Site> = config
            .sites
            .iter()
            .map(|s| Site {
                pos: s.p,
                variant: s.variant,
            })
            .collect();
        for site in &sites {
            if let Some(hex) = hexes.get_mut(&site.pos) {
                hex.traversable = false;
            }
        }

        let player_tanks: Vec<Tank> = config
            .player_tanks
            .iter()
            .map(|t| Tank::new(t.id, t.p, PLAYER_BODY_ANGLE, PLAYER_TURRET_ANGLE, true))
            .collect();
        let mut enemy_tanks: Vec<Tank> = config
            .enemy_tanks
            .iter()
            .map(|t| Tank::new(t.id, t.p, ENEMY_BODY_ANGLE, ENEMY_TURRET_ANGLE, false))
            .collect();

        // Enemies within spotting range start revealed
        for et in &mut enemy_tanks {
            for pt in &player_tanks {
                if pt.pos.grid_distance(et.pos) <= config.visibility_range {
                    et.visible = true;
                    break;
                }
            }
        }

        Self {
            hexes,
            sites,
            player_tanks,
            enemy_tanks,
            visible_hexes: HashSet::new(),
            available_hexes: HashSet::new(),
            conditionally_available_hexes: HashSet::new(),
            turn_order: Vec::new(),
            overlays: Vec::new(),
            explosion: EffectState::idle(),
            firing_explosion: EffectState::idle(),
            camera_shake: Vec2::zero(),
        }
    }

    /// Look a tank up in either roster
    pub fn tank_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        if tank_by_id(&self.player_tanks, id).is_some() {
            return tank_by_id_mut(&mut self.player_tanks, id);
        }
        tank_by_id_mut(&mut self.enemy_tanks, id)
    }

    /// Shared-reference lookup in either roster
    pub fn tank(&self, id: TankId) -> Option<&Tank> {
        tank_by_id(&self.player_tanks, id).or_else(|| tank_by_id(&self.enemy_tanks, id))
    }

    /// Recompute the fog set from visible friendly tanks
    pub fn recalculate_visible_hexes(&mut self, visibility_range: u32) {
        self.visible_hexes.clear();
        for tank in &self.player_tanks {
            if !tank.visible {
                continue;
            }
            for hex in self.hexes.values() {
                if tank.pos.grid_distance(hex.pos) <= visibility_range {
                    self.visible_hexes.insert(hex.pos);
                }
            }
        }
    }
}
