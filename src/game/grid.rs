//! Pointer-driven order composition and the playback tick loop
//!
//! The grid owns the board state, interprets pointer gestures into tank
//! orders between turns, and plays queued turn results through the
//! resolver chain. While playback runs the pointer only pans the
//! camera.

use std::collections::HashSet;

use tracing::debug;

use crate::audio::AudioDriver;
use crate::config::Timings;
use crate::display::DisplayDriver;
use crate::game::resolver::{AnimCtx, Resolver, Step};
use crate::game::state::{tank_by_id, tank_by_id_mut, GameState, Tank};
use crate::game::{BoardRules, GridEvent};
use crate::hex::{idx_to_unit_vector, Axial, Vec2};
use crate::protocol::{BoardConfig, TankAction, TankId, TurnResult};

/// What the current pointer gesture means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// No gesture in progress
    Idle,
    /// Pointer went down on empty ground: pan the camera
    Drag,
    /// Extending the grabbed tank's path cell by cell
    PathBuilding,
    /// Sweeping the aim direction around the grabbed tank
    Aiming,
    /// Turn results are playing; gestures only pan
    Animation,
}

pub struct Grid {
    pub state: GameState,
    pub rules: BoardRules,
    timings: Timings,
    mode: Mode,
    cur_tank: Option<TankId>,
    last_point: Vec2,
    cur_t: f64,
    pointer_start_t: f64,
    pointer_down: bool,
    results: Vec<TurnResult>,
    cursor: usize,
    resolver: Resolver,
    pending_events: Vec<GridEvent>,
}

impl Grid {
    pub fn new(config: &BoardConfig, timings: Timings) -> Self {
        let state = GameState::new(config);
        let rules = BoardRules::from_config(config);
        let mut grid = Self {
            state,
            rules,
            timings,
            mode: Mode::Idle,
            cur_tank: None,
            last_point: Vec2::zero(),
            cur_t: 0.0,
            pointer_start_t: 0.0,
            pointer_down: false,
            results: Vec::new(),
            cursor: 0,
            resolver: Resolver::Idle,
            pending_events: Vec::new(),
        };
        grid.state
            .recalculate_visible_hexes(grid.rules.visibility_range);
        debug!(
            hexes = grid.state.hexes.len(),
            tanks = grid.state.player_tanks.len(),
            "grid ready"
        );
        grid
    }

    /// True while queued turn results are still being played
    pub fn is_animating(&self) -> bool {
        !matches!(self.resolver, Resolver::Idle)
    }

    /// Queue a batch of turn results for playback. A batch arriving
    /// while the previous one still plays is appended and played back
    /// to back; otherwise the spent queue is replaced. Composed paths
    /// and aims are wiped either way, selection order survives.
    pub fn push_results(&mut self, results: Vec<TurnResult>) {
        self.clear_composed_orders();
        if self.cursor >= self.results.len() {
            self.results = results;
            self.cursor = 0;
        } else {
            self.results.extend(results);
        }
        self.results.push(TurnResult::EndTurn);
        debug!(queued = self.results.len() - self.cursor, "turn results queued");
    }

    /// Collect the composed orders in the order tanks were grabbed.
    /// Tanks with neither a path nor an aim are skipped.
    pub fn actions(&self) -> Vec<TankAction> {
        let mut actions = Vec::new();
        for id in &self.state.turn_order {
            let Some(tank) = tank_by_id(&self.state.player_tanks, *id) else {
                continue;
            };
            if tank.shooting {
                let Some(dir) = idx_to_unit_vector(tank.shooting_dir) else {
                    continue;
                };
                actions.push(TankAction::Fire { id: *id, dir });
            } else if !tank.path.is_empty() {
                actions.push(TankAction::Move {
                    id: *id,
                    path: tank.path.clone(),
                });
            }
        }
        actions
    }

    /// Advance playback to `now` and drain the events this produced.
    /// Instant resolvers chain within a single call; a held pointer is
    /// re-interpreted so a motionless press can still become an aim.
    pub fn tick(
        &mut self,
        now: f64,
        display: &mut dyn DisplayDriver,
        audio: &mut dyn AudioDriver,
    ) -> Vec<GridEvent> {
        self.cur_t = now;
        loop {
            match self.step_resolver(audio, now) {
                Step::Hold => break,
                Step::Advance => self.advance_resolver(audio, now),
            }
        }
        if self.pointer_down && self.mode == Mode::PathBuilding {
            self.handle_pointer_move(self.last_point, display);
        }
        std::mem::take(&mut self.pending_events)
    }

    pub fn handle_pointer_start(&mut self, p: Vec2, display: &dyn DisplayDriver) {
        self.last_point = p;
        self.pointer_down = true;
        self.pointer_start_t = self.cur_t;
        if self.mode == Mode::Animation {
            return;
        }
        if let Some(id) = self.colliding_tank(p, display) {
            self.pending_events.push(GridEvent::TankSelected { id });
            self.mode = Mode::PathBuilding;
            if let Some(tank) = tank_by_id_mut(&mut self.state.player_tanks, id) {
                tank.path.clear();
                tank.shooting = false;
                tank.shooting_dir = 0;
            }
            self.cur_tank = Some(id);
            self.recalculate_traversable();
            self.save_order(id);
            return;
        }
        self.mode = Mode::Drag;
    }

    pub fn handle_pointer_move(&mut self, p: Vec2, display: &mut dyn DisplayDriver) {
        if !self.pointer_down {
            return;
        }
        match self.mode {
            Mode::Idle => {}
            Mode::Drag => self.handle_drag(p, display),
            Mode::PathBuilding => {
                let path_empty = self
                    .cur_tank_ref()
                    .map(|tank| tank.path.is_empty())
                    .unwrap_or(false);
                let held = self.cur_t - self.pointer_start_t > self.timings.hold_to_aim_ms;
                let on_own_cell = self
                    .cur_tank_ref()
                    .map(|tank| tank.pos == display.screen_to_grid(p))
                    .unwrap_or(false);
                if path_empty && held && on_own_cell {
                    self.mode = Mode::Aiming;
                    if let Some(tank) = self.cur_tank_mut() {
                        tank.shooting = true;
                        tank.shooting_dir = 0;
                    }
                    self.state.available_hexes.clear();
                    self.state.conditionally_available_hexes.clear();
                    self.handle_aim(p, display);
                } else {
                    self.handle_path_step(p, display);
                }
            }
            Mode::Aiming => self.handle_aim(p, display),
            Mode::Animation => self.handle_drag(p, display),
        }
        self.last_point = p;
    }

    pub fn handle_pointer_end(&mut self, _p: Vec2) {
        self.pointer_down = false;
        if self.mode == Mode::Animation {
            return;
        }
        if self.mode == Mode::PathBuilding || self.mode == Mode::Aiming {
            self.finish_order_gesture();
        }
        self.mode = Mode::Idle;
        self.cur_tank = None;
        self.recalculate_traversable();
    }

    /// A grabbed tank released with nothing composed drops out of the
    /// turn order again
    fn finish_order_gesture(&mut self) {
        let Some(id) = self.cur_tank else {
            return;
        };
        if self.mode == Mode::PathBuilding
            && self
                .cur_tank_ref()
                .map(|tank| tank.path.is_empty())
                .unwrap_or(false)
        {
            self.remove_order(id);
        }
    }

    fn handle_drag(&mut self, p: Vec2, display: &mut dyn DisplayDriver) {
        display.add_camera_offset(p.sub(self.last_point));
    }

    fn handle_aim(&mut self, p: Vec2, display: &dyn DisplayDriver) {
        let Some(tank_pos) = self.cur_tank_ref().map(|tank| tank.pos) else {
            return;
        };
        let v = p.sub(display.grid_to_screen(tank_pos));
        let dir = (((v.angle() + 30.0) / 60.0).floor() as u8) % 6;
        if let Some(tank) = self.cur_tank_mut() {
            tank.shooting_dir = dir;
        }
    }

    fn handle_path_step(&mut self, p: Vec2, display: &dyn DisplayDriver) {
        let Some(id) = self.cur_tank else {
            return;
        };
        let grid_p = display.screen_to_grid(p);
        let Some(tank) = tank_by_id(&self.state.player_tanks, id) else {
            return;
        };
        if tank.path.len() > self.rules.drive_range as usize {
            return;
        }
        if grid_p == tank.pos {
            return;
        }
        let last_on_path = tank.path.last().copied().unwrap_or(tank.pos);
        if !last_on_path.is_neighbor(grid_p) {
            return;
        }
        if tank.path.contains(&grid_p) {
            return;
        }
        match self.state.hexes.get(&grid_p) {
            Some(hex) if hex.traversable => {}
            _ => return,
        }
        let start_pos = tank.pos;
        let Some(tank) = tank_by_id_mut(&mut self.state.player_tanks, id) else {
            return;
        };
        if tank.path.is_empty() {
            tank.path.push(start_pos);
        }
        tank.path.push(grid_p);
        self.recalculate_traversable();
    }

    fn colliding_tank(&self, p: Vec2, display: &dyn DisplayDriver) -> Option<TankId> {
        let grid_p = display.screen_to_grid(p);
        self.state
            .player_tanks
            .iter()
            .find(|tank| tank.visible && tank.pos == grid_p)
            .map(|tank| tank.id)
    }

    fn cur_tank_ref(&self) -> Option<&Tank> {
        self.cur_tank
            .and_then(|id| tank_by_id(&self.state.player_tanks, id))
    }

    fn cur_tank_mut(&mut self) -> Option<&mut Tank> {
        self.cur_tank
            .and_then(|id| tank_by_id_mut(&mut self.state.player_tanks, id))
    }

    fn save_order(&mut self, id: TankId) {
        self.remove_order(id);
        self.state.turn_order.push(id);
    }

    fn remove_order(&mut self, id: TankId) {
        self.state.turn_order.retain(|&t| t != id);
    }

    fn clear_composed_orders(&mut self) {
        for tank in &mut self.state.player_tanks {
            tank.path.clear();
            tank.shooting = false;
            tank.shooting_dir = 0;
        }
    }

    /// Recompute both reachability overlays for the grabbed tank
    fn recalculate_traversable(&mut self) {
        self.state.available_hexes = self.reachable_set(false);
        self.state.conditionally_available_hexes = self.reachable_set(true);
    }

    /// Ring-by-ring flood fill of cells the grabbed tank can still
    /// reach from the end of its composed path. Visible tanks block
    /// unless `conditional`; a composed path running through a blocked
    /// cell voids the whole set.
    fn reachable_set(&self, conditional: bool) -> HashSet<Axial> {
        let mut set = HashSet::new();
        let Some(tank) = self.cur_tank_ref() else {
            return set;
        };
        let mut start = tank.pos;
        let mut range = self.rules.drive_range as i64;
        if let Some(last) = tank.path.last() {
            start = *last;
            range -= tank.path.len() as i64 - 1;
        }
        if range <= 0 {
            return set;
        }

        let mut unavailable: HashSet<Axial> = HashSet::new();
        if !conditional {
            for other in &self.state.player_tanks {
                if other.visible && other.id != tank.id {
                    unavailable.insert(other.pos);
                }
            }
            for other in &self.state.enemy_tanks {
                if other.visible {
                    unavailable.insert(other.pos);
                }
            }
        }
        for i in 0..tank.path.len().saturating_sub(1) {
            if !conditional && unavailable.contains(&tank.path[i]) {
                return HashSet::new();
            }
            unavailable.insert(tank.path[i]);
        }
        if let Some(last) = tank.path.last() {
            if !conditional && unavailable.contains(last) {
                return HashSet::new();
            }
        }

        set.insert(start);
        let mut frontier = vec![start];
        for _ in 0..range {
            let mut next_frontier = Vec::new();
            for p in frontier {
                for n in p.neighbors() {
                    if set.contains(&n) {
                        continue;
                    }
                    match self.state.hexes.get(&n) {
                        Some(hex) if hex.traversable => {}
                        _ => continue,
                    }
                    if unavailable.contains(&n) {
                        continue;
                    }
                    set.insert(n);
                    next_frontier.push(n);
                }
            }
            frontier = next_frontier;
        }
        set.remove(&start);
        set
    }

    fn peek_result(&self) -> Option<&TurnResult> {
        self.results.get(self.cursor)
    }

    fn next_result(&mut self) -> Option<TurnResult> {
        let result = self.results.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(result)
    }

    fn step_resolver(&mut self, audio: &mut dyn AudioDriver, now: f64) -> Step {
        if matches!(self.resolver, Resolver::Idle) {
            if self.peek_result().is_none() {
                return Step::Hold;
            }
            self.start_animation();
            return Step::Advance;
        }
        if matches!(self.resolver, Resolver::Finish) {
            self.end_animation();
            return Step::Advance;
        }
        let mut ctx = AnimCtx {
            state: &mut self.state,
            audio,
            events: &mut self.pending_events,
            timings: &self.timings,
            rules: &self.rules,
            now,
        };
        self.resolver.animate(&mut ctx)
    }

    /// Consume the next queued result and build its resolver. When a
    /// finished batch runs straight into an appended one, playback
    /// freezes the composer again before the new batch starts.
    fn advance_resolver(&mut self, audio: &mut dyn AudioDriver, now: f64) {
        let result = self.next_result();
        let mut ctx = AnimCtx {
            state: &mut self.state,
            audio,
            events: &mut self.pending_events,
            timings: &self.timings,
            rules: &self.rules,
            now,
        };
        self.resolver = Resolver::for_result(result, &mut ctx);
        if !matches!(self.resolver, Resolver::Idle) && self.mode != Mode::Animation {
            self.start_animation();
        }
    }

    fn start_animation(&mut self) {
        self.handle_pointer_end(Vec2::zero());
        self.mode = Mode::Animation;
        self.pending_events.push(GridEvent::AnimationStarted);
    }

    fn end_animation(&mut self) {
        self.handle_pointer_end(Vec2::zero());
        self.mode = Mode::Idle;
        self.pending_events.push(GridEvent::AnimationEnded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::display::FlatLayout;
    use crate::protocol::{HexConfig, SiteConfig, TankConfig};

    fn board() -> BoardConfig {
        let mut hexes = Vec::new();
        for x in -5..=5i32 {
            for y in -5..=5i32 {
                let p = Axial::new(x, y);
                if p.grid_distance(Axial::zero()) <= 5 {
                    hexes.push(HexConfig { p, variant: 0 });
                }
            }
        }
        BoardConfig {
            hexes,
            sites: vec![SiteConfig {
                p: Axial::new(0, -2),
                variant: 0,
            }],
            player_tanks: vec![
                TankConfig {
                    id: TankId(1),
                    p: Axial::new(0, 0),
                },
                TankConfig {
                    id: TankId(2),
                    p: Axial::new(-2, 0),
                },
            ],
            enemy_tanks: vec![TankConfig {
                id: TankId(7),
                p: Axial::new(3, 0),
            }],
            drive_range: 2,
            visibility_range: 3,
            center: Axial::zero(),
        }
    }

    fn rig() -> (Grid, FlatLayout, NullAudio) {
        (
            Grid::new(&board(), Timings::default()),
            FlatLayout::default(),
            NullAudio::default(),
        )
    }

    fn cell(layout: &FlatLayout, x: i32, y: i32) -> Vec2 {
        layout.grid_to_screen(Axial::new(x, y))
    }

    fn player_tank(grid: &Grid, id: u32) -> &Tank {
        tank_by_id(&grid.state.player_tanks, TankId(id)).unwrap()
    }

    #[test]
    fn test_tap_selects_then_drops_empty_order() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.tick(0.0, &mut layout, &mut audio);
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);
        assert_eq!(grid.state.turn_order, vec![TankId(1)]);
        assert!(!grid.state.available_hexes.is_empty());

        let events = grid.tick(1.0, &mut layout, &mut audio);
        assert!(events.contains(&GridEvent::TankSelected { id: TankId(1) }));

        grid.handle_pointer_end(cell(&layout, 0, 0));
        assert!(grid.state.turn_order.is_empty());
        assert!(grid.state.available_hexes.is_empty());
    }

    #[test]
    fn test_path_steps_validated() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.tick(0.0, &mut layout, &mut audio);
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);

        grid.handle_pointer_move(cell(&layout, 1, 0), &mut layout);
        assert_eq!(
            player_tank(&grid, 1).path,
            vec![Axial::new(0, 0), Axial::new(1, 0)]
        );

        // Jumping two cells at once is ignored
        grid.handle_pointer_move(cell(&layout, 3, 0), &mut layout);
        assert_eq!(player_tank(&grid, 1).path.len(), 2);

        grid.handle_pointer_move(cell(&layout, 2, 0), &mut layout);
        assert_eq!(player_tank(&grid, 1).path.len(), 3);

        // Two steps exhaust the drive range; neither a revisited cell
        // nor a fresh one extends the path now
        grid.handle_pointer_move(cell(&layout, 1, 0), &mut layout);
        assert_eq!(player_tank(&grid, 1).path.len(), 3);
        grid.handle_pointer_move(cell(&layout, 3, 0), &mut layout);
        assert_eq!(player_tank(&grid, 1).path.len(), 3);

        grid.handle_pointer_end(cell(&layout, 3, 0));
        assert_eq!(grid.state.turn_order, vec![TankId(1)]);
        assert_eq!(
            grid.actions(),
            vec![TankAction::Move {
                id: TankId(1),
                path: vec![Axial::new(0, 0), Axial::new(1, 0), Axial::new(2, 0)],
            }]
        );
    }

    #[test]
    fn test_path_rejects_sites() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.tick(0.0, &mut layout, &mut audio);
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);

        grid.handle_pointer_move(cell(&layout, 0, -1), &mut layout);
        assert_eq!(player_tank(&grid, 1).path.len(), 2);
        // The site cell is not traversable
        grid.handle_pointer_move(cell(&layout, 0, -2), &mut layout);
        assert_eq!(player_tank(&grid, 1).path.len(), 2);
    }

    #[test]
    fn test_path_rejects_loops() {
        let mut config = board();
        config.drive_range = 3;
        let mut grid = Grid::new(&config, Timings::default());
        let mut layout = FlatLayout::default();
        let mut audio = NullAudio::default();
        grid.tick(0.0, &mut layout, &mut audio);
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);

        grid.handle_pointer_move(cell(&layout, 1, 0), &mut layout);
        grid.handle_pointer_move(cell(&layout, 0, 1), &mut layout);
        assert_eq!(player_tank(&grid, 1).path.len(), 3);

        // Curling back onto a cell the path already holds is ignored,
        // a fresh neighbor still extends
        grid.handle_pointer_move(cell(&layout, 1, 0), &mut layout);
        assert_eq!(player_tank(&grid, 1).path.len(), 3);
        grid.handle_pointer_move(cell(&layout, 0, 2), &mut layout);
        assert_eq!(
            player_tank(&grid, 1).path,
            vec![
                Axial::new(0, 0),
                Axial::new(1, 0),
                Axial::new(0, 1),
                Axial::new(0, 2),
            ]
        );
    }

    #[test]
    fn test_regrab_clears_previous_path() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.tick(0.0, &mut layout, &mut audio);
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);
        grid.handle_pointer_move(cell(&layout, 1, 0), &mut layout);
        grid.handle_pointer_end(cell(&layout, 1, 0));
        assert_eq!(player_tank(&grid, 1).path.len(), 2);

        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);
        assert!(player_tank(&grid, 1).path.is_empty());
        assert_eq!(grid.state.turn_order, vec![TankId(1)]);
    }

    #[test]
    fn test_hold_on_tank_switches_to_aiming() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.tick(0.0, &mut layout, &mut audio);
        let origin = cell(&layout, 0, 0);
        grid.handle_pointer_start(origin, &layout);

        // The pointer never moves; the tick re-interpretation alone
        // flips the gesture into aiming once the hold matures
        grid.tick(800.0, &mut layout, &mut audio);
        let tank = player_tank(&grid, 1);
        assert!(tank.shooting);
        assert_eq!(tank.shooting_dir, 0);
        assert!(grid.state.available_hexes.is_empty());
        assert!(grid.state.conditionally_available_hexes.is_empty());

        // Sweep south-east on screen: sector index 2
        grid.handle_pointer_move(origin.add(Vec2::new(0.0, 100.0)), &mut layout);
        assert_eq!(player_tank(&grid, 1).shooting_dir, 2);

        grid.handle_pointer_end(origin.add(Vec2::new(0.0, 100.0)));
        assert_eq!(
            grid.actions(),
            vec![TankAction::Fire {
                id: TankId(1),
                dir: Axial::new(-1, 1),
            }]
        );
    }

    #[test]
    fn test_quick_release_does_not_aim() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.tick(0.0, &mut layout, &mut audio);
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);
        grid.tick(300.0, &mut layout, &mut audio);
        assert!(!player_tank(&grid, 1).shooting);
        grid.handle_pointer_end(cell(&layout, 0, 0));
        assert!(grid.actions().is_empty());
    }

    #[test]
    fn test_drag_pans_camera() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.tick(0.0, &mut layout, &mut audio);
        // (4, 0) is inside the board but holds no tank
        let p = cell(&layout, 4, 0);
        grid.handle_pointer_start(p, &layout);
        grid.handle_pointer_move(p.add(Vec2::new(12.0, -7.0)), &mut layout);
        assert_eq!(layout.camera_offset(), Vec2::new(12.0, -7.0));
        grid.handle_pointer_move(p.add(Vec2::new(20.0, -7.0)), &mut layout);
        assert_eq!(layout.camera_offset(), Vec2::new(20.0, -7.0));
    }

    #[test]
    fn test_actions_follow_selection_order() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.tick(0.0, &mut layout, &mut audio);

        grid.handle_pointer_start(cell(&layout, -2, 0), &layout);
        grid.handle_pointer_move(cell(&layout, -1, 0), &mut layout);
        grid.handle_pointer_end(cell(&layout, -1, 0));

        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);
        grid.handle_pointer_move(cell(&layout, 1, -1), &mut layout);
        grid.handle_pointer_end(cell(&layout, 1, -1));

        assert_eq!(grid.state.turn_order, vec![TankId(2), TankId(1)]);
        let actions = grid.actions();
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], TankAction::Move { id: TankId(2), .. }));
        assert!(matches!(actions[1], TankAction::Move { id: TankId(1), .. }));

        // Re-grabbing and releasing empty drops the order again
        grid.handle_pointer_start(cell(&layout, -2, 0), &layout);
        grid.handle_pointer_end(cell(&layout, -2, 0));
        assert_eq!(grid.state.turn_order, vec![TankId(1)]);
        assert_eq!(grid.actions().len(), 1);
    }

    #[test]
    fn test_reachability_excludes_occupied_cells() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.state.enemy_tanks[0].pos = Axial::new(1, 0);
        grid.tick(0.0, &mut layout, &mut audio);
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);

        // The occupied cell and anything only reachable through it are
        // out; conditionally they are in
        assert!(!grid.state.available_hexes.contains(&Axial::new(1, 0)));
        assert!(!grid.state.available_hexes.contains(&Axial::new(2, 0)));
        assert!(grid
            .state
            .conditionally_available_hexes
            .contains(&Axial::new(1, 0)));
        assert!(grid
            .state
            .conditionally_available_hexes
            .contains(&Axial::new(2, 0)));

        // The friendly tank at (-2, 0) blocks the same way
        assert!(!grid.state.available_hexes.contains(&Axial::new(-2, 0)));
        assert!(grid
            .state
            .conditionally_available_hexes
            .contains(&Axial::new(-2, 0)));
    }

    #[test]
    fn test_path_onto_occupied_cell_voids_available_set() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.state.enemy_tanks[0].pos = Axial::new(1, 0);
        grid.tick(0.0, &mut layout, &mut audio);
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);

        // Stepping onto the occupied cell is allowed while composing
        grid.handle_pointer_move(cell(&layout, 1, 0), &mut layout);
        assert_eq!(player_tank(&grid, 1).path.len(), 2);
        assert!(grid.state.available_hexes.is_empty());
        assert!(!grid.state.conditionally_available_hexes.is_empty());
    }

    #[test]
    fn test_push_results_appends_then_replaces() {
        let (mut grid, mut layout, mut audio) = rig();
        let reveal = TurnResult::Visible {
            id: TankId(7),
            p: Axial::new(3, 0),
            visible: true,
        };

        grid.push_results(vec![reveal]);
        assert_eq!(grid.results.len(), 2);
        // Nothing consumed yet: a second push appends
        grid.push_results(vec![reveal]);
        assert_eq!(grid.results.len(), 4);
        assert_eq!(grid.cursor, 0);

        let events = grid.tick(0.0, &mut layout, &mut audio);
        assert_eq!(
            events,
            vec![
                GridEvent::AnimationStarted,
                GridEvent::AnimationEnded,
                GridEvent::AnimationStarted,
                GridEvent::AnimationEnded,
            ]
        );
        assert!(!grid.is_animating());
        assert_eq!(grid.cursor, 4);

        // Queue fully played: the next push starts a fresh queue
        grid.push_results(vec![reveal]);
        assert_eq!(grid.results.len(), 2);
        assert_eq!(grid.cursor, 0);
    }

    #[test]
    fn test_push_results_wipes_paths_but_keeps_order() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.tick(0.0, &mut layout, &mut audio);
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);
        grid.handle_pointer_move(cell(&layout, 1, 0), &mut layout);
        grid.handle_pointer_end(cell(&layout, 1, 0));
        assert_eq!(player_tank(&grid, 1).path.len(), 2);

        grid.push_results(Vec::new());
        assert!(player_tank(&grid, 1).path.is_empty());
        assert_eq!(grid.state.turn_order, vec![TankId(1)]);
    }

    #[test]
    fn test_playback_freezes_composer_and_allows_pan() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.push_results(vec![TurnResult::Move2 {
            id: TankId(1),
            p1: Axial::new(0, 0),
            p2: Axial::new(1, 0),
            start: true,
        }]);

        let events = grid.tick(0.0, &mut layout, &mut audio);
        assert_eq!(events, vec![GridEvent::AnimationStarted]);
        assert!(grid.is_animating());

        // Grabbing a tank is ignored, panning still works
        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);
        assert!(grid.state.turn_order.is_empty());
        grid.handle_pointer_move(cell(&layout, 0, 0).add(Vec2::new(10.0, 5.0)), &mut layout);
        assert_eq!(layout.camera_offset(), Vec2::new(10.0, 5.0));
        grid.handle_pointer_end(cell(&layout, 0, 0));
        assert!(grid.is_animating());

        let events = grid.tick(5000.0, &mut layout, &mut audio);
        assert_eq!(events, vec![GridEvent::AnimationEnded]);
        assert!(!grid.is_animating());
        assert_eq!(player_tank(&grid, 1).pos, Axial::new(0, 0));
        assert_eq!(player_tank(&grid, 1).render_pos, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn test_append_mid_playback_refreezes_composer() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.push_results(vec![TurnResult::Move2 {
            id: TankId(1),
            p1: Axial::new(0, 0),
            p2: Axial::new(1, 0),
            start: true,
        }]);
        grid.tick(0.0, &mut layout, &mut audio);
        grid.tick(1000.0, &mut layout, &mut audio);
        assert!(grid.is_animating());

        grid.push_results(vec![TurnResult::Visible {
            id: TankId(7),
            p: Axial::new(2, 1),
            visible: true,
        }]);

        // The move finishes, its batch closes, and the appended batch
        // opens and plays within the same tick
        let events = grid.tick(5000.0, &mut layout, &mut audio);
        assert_eq!(
            events,
            vec![
                GridEvent::AnimationEnded,
                GridEvent::AnimationStarted,
                GridEvent::AnimationEnded,
            ]
        );
        assert_eq!(grid.state.enemy_tanks[0].pos, Axial::new(2, 1));
        assert!(!grid.is_animating());
    }

    #[test]
    fn test_unknown_reference_skips_to_next_record() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.push_results(vec![
            TurnResult::Move2 {
                id: TankId(99),
                p1: Axial::new(0, 0),
                p2: Axial::new(1, 0),
                start: true,
            },
            TurnResult::Visible {
                id: TankId(7),
                p: Axial::new(3, -1),
                visible: false,
            },
        ]);
        let events = grid.tick(0.0, &mut layout, &mut audio);
        assert_eq!(
            events,
            vec![
                GridEvent::AnimationStarted,
                GridEvent::UnknownTank { id: Some(TankId(99)) },
                GridEvent::AnimationEnded,
            ]
        );
        // The record after the bad one still applied
        assert!(!grid.state.enemy_tanks[0].visible);
        assert_eq!(grid.state.enemy_tanks[0].pos, Axial::new(3, -1));
    }

    #[test]
    fn test_pointer_start_during_playback_is_remembered_for_pan_only() {
        let (mut grid, mut layout, mut audio) = rig();
        grid.push_results(vec![TurnResult::Move2 {
            id: TankId(1),
            p1: Axial::new(0, 0),
            p2: Axial::new(1, 0),
            start: true,
        }]);
        grid.tick(0.0, &mut layout, &mut audio);

        grid.handle_pointer_start(cell(&layout, 0, 0), &layout);
        grid.tick(100.0, &mut layout, &mut audio);
        // Playback ends with the pointer still down; the press does not
        // turn into a grab retroactively
        grid.tick(5000.0, &mut layout, &mut audio);
        assert!(grid.state.turn_order.is_empty());
        assert!(player_tank(&grid, 1).path.is_empty());
    }
}
