//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Build the next frame into the `front` buffer
//!   2. Compare each cell with the `back` buffer (previous frame)
//!   3. Only emit terminal commands for cells that changed
//!   4. Batch everything with `queue!` and flush once
//!   5. Swap front/back
//!
//! One world tile is drawn as `CELL_W` terminal columns by one row. The
//! actor is drawn in whichever half of its tile holds its centre pixel.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::economy::Skill;
use crate::domain::grid::TILE_SIZE;
use crate::domain::item::ItemId;
use crate::domain::physics::Facing;
use crate::domain::tile::Tile;
use crate::sim::world::{Camera, Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" terminal cell. Using the same
    /// RGB for `Clear` and cell backgrounds hides the inter-row gaps some
    /// VTE terminals draw.
    pub const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Differs from any real cell, so every position gets diffed.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    pub fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

pub struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies one column.
    pub fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Paint a whole row with `bg`, then write `s` on it.
    pub fn bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Layout ──

/// Terminal columns per world tile.
pub const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const INV_ROW: usize = 1;
const MAP_ROW: usize = 3;
/// HUD + inventory + gap + message + help.
const RESERVED_ROWS: usize = MAP_ROW + 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const SKY_BG: Color = Color::Rgb { r: 70, g: 120, b: 190 };
const CAVE_BG: Color = Color::Rgb { r: 45, g: 32, b: 22 };
const FOG_BG: Color = Color::Rgb { r: 10, g: 10, b: 14 };
const DIRT_BG: Color = Color::Rgb { r: 120, g: 80, b: 40 };
const STONE_BG: Color = Color::Rgb { r: 100, g: 100, b: 105 };

/// Glyph pair and colours for a revealed tile.
fn tile_style(tile: Tile, above_surface: bool) -> (&'static str, Color, Color) {
    let ore = |fg| ("<>", fg, STONE_BG);
    match tile {
        Tile::Empty if above_surface => ("  ", Color::White, SKY_BG),
        Tile::Empty   => ("  ", Color::White, CAVE_BG),
        Tile::Grass   => ("ww", Color::Rgb { r: 60, g: 200, b: 60 }, DIRT_BG),
        Tile::Dirt    => (". ", Color::Rgb { r: 90, g: 60, b: 30 }, DIRT_BG),
        Tile::Stone   => ("▒▒", Color::Rgb { r: 130, g: 130, b: 135 }, STONE_BG),
        Tile::Coal    => ore(Color::Rgb { r: 20, g: 20, b: 20 }),
        Tile::Copper  => ore(Color::Rgb { r: 184, g: 115, b: 51 }),
        Tile::Iron    => ore(Color::Rgb { r: 220, g: 220, b: 230 }),
        Tile::Gold    => ore(Color::Rgb { r: 255, g: 215, b: 0 }),
        Tile::Emerald => ore(Color::Rgb { r: 80, g: 220, b: 120 }),
        Tile::Diamond => ore(Color::Rgb { r: 150, g: 235, b: 255 }),
        Tile::Bedrock => ("██", Color::Rgb { r: 40, g: 40, b: 40 }, Color::Rgb { r: 25, g: 25, b: 25 }),
    }
}

/// Overlay glyph for a tile being mined, by completed fraction.
fn progress_glyph(fraction: f32) -> &'static str {
    if fraction < 1.0 / 3.0 {
        "··"
    } else if fraction < 2.0 / 3.0 {
        "░░"
    } else {
        "▓▓"
    }
}

/// Text meter like `██████░░░░`.
fn meter(value: f32, max: f32, width: usize) -> String {
    let filled = if max > 0.0 {
        ((value / max).clamp(0.0, 1.0) * width as f32).round() as usize
    } else {
        0
    };
    let mut s = "█".repeat(filled);
    s.push_str(&"░".repeat(width - filled));
    s
}

/// View size in tiles for a terminal of `term_w` x `term_h`.
fn view_tiles(term_w: usize, term_h: usize) -> (usize, usize) {
    (term_w / CELL_W, term_h.saturating_sub(RESERVED_ROWS).max(1))
}

/// Map a terminal cell to a view pixel at the centre of the tile drawn
/// there. `None` outside the map area.
pub fn cell_to_view_px(camera: &Camera, col: u16, row: u16) -> Option<(i32, i32)> {
    let (col, row) = (col as usize, row as usize);
    if row < MAP_ROW {
        return None;
    }
    let (vx, vy) = ((col / CELL_W) as i32, (row - MAP_ROW) as i32);
    if vx * TILE_SIZE >= camera.view_w || vy * TILE_SIZE >= camera.view_h {
        return None;
    }
    let sx = vx * TILE_SIZE + TILE_SIZE / 2 - camera.x.rem_euclid(TILE_SIZE);
    let sy = vy * TILE_SIZE + TILE_SIZE / 2 - camera.y.rem_euclid(TILE_SIZE);
    Some((sx, sy))
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size(true)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Force a full repaint on the next frame.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    fn sync_size(&mut self, force: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if force || tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }
        Ok(())
    }

    /// Compose a frame with `compose` and emit the difference.
    pub fn present(&mut self, compose: impl FnOnce(&mut FrameBuffer)) -> io::Result<()> {
        self.sync_size(false)?;
        self.front.clear();
        compose(&mut self.front);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        self.sync_size(false)?;

        let (tiles_w, tiles_h) = view_tiles(self.term_w, self.term_h);
        world.camera.view_w = tiles_w as i32 * TILE_SIZE;
        world.camera.view_h = tiles_h as i32 * TILE_SIZE;
        world.update_camera();

        if self.last_phase != Some(world.phase) {
            self.invalidate();
            self.last_phase = Some(world.phase);
        }

        let w: &WorldState = world;
        self.present(|buf| {
            compose_hud(buf, w);
            compose_map(buf, w, tiles_w, tiles_h);
            compose_footer(buf, w, tiles_h);
            if w.phase == Phase::Paused {
                compose_pause_overlay(buf, tiles_w, tiles_h);
            }
        })
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the
        // terminal default and show line artifacts.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

// ══════════════════════════════════════════════════════════════
// Compose: build front buffer content
// ══════════════════════════════════════════════════════════════

fn compose_hud(buf: &mut FrameBuffer, w: &WorldState) {
    let eco = &w.economy;
    let skills = &eco.skills;
    let tool = eco.effective_tool();
    let durability = match eco.tools.durability(tool).zip(tool.max_durability()) {
        Some((d, max)) => format!(" {d:.0}/{max:.0}"),
        None => String::new(),
    };
    let depth = (w.actor_tile().1 - w.surface_level as i32).max(0);

    let hud = format!(
        " HP {} {:>3.0}  ST {} {:>3.0}  ${:<5} {}{}  Bag {}/{}  Depth {} ",
        meter(eco.hp.value, skills.max_hp(), 8),
        eco.hp.value,
        meter(eco.stamina.value, skills.max_stamina(), 8),
        eco.stamina.value,
        eco.coins,
        tool.label(),
        durability,
        eco.inventory.total_resources(),
        skills.capacity(),
        depth,
    );
    buf.bar(HUD_ROW, &hud, Color::White, HUD_BG);

    let mut inv: Vec<String> = ItemId::ALL
        .iter()
        .filter(|&&i| eco.inventory.count(i) > 0)
        .map(|&i| format!("{} {}", i.label(), eco.inventory.count(i)))
        .collect();
    if inv.is_empty() {
        inv.push("empty bag".to_string());
    }
    let skill_line = [Skill::Strength, Skill::Endurance, Skill::Speed]
        .iter()
        .map(|&s| format!("{} {}", &s.label()[..3], skills.level(s)))
        .collect::<Vec<_>>()
        .join(" ");
    let points = if skills.points > 0 { format!("  +{} pts", skills.points) } else { String::new() };
    let line = format!(" {}  │ {}{} ", inv.join(", "), skill_line, points);
    buf.bar(INV_ROW, &line, Color::Rgb { r: 200, g: 200, b: 200 }, Color::Reset);
}

fn compose_map(buf: &mut FrameBuffer, w: &WorldState, tiles_w: usize, tiles_h: usize) {
    let origin_x = w.camera.x.div_euclid(TILE_SIZE);
    let origin_y = w.camera.y.div_euclid(TILE_SIZE);
    let surface = w.surface_level as i32;

    for vy in 0..tiles_h {
        let row = MAP_ROW + vy;
        if row >= buf.height() { break; }
        let ty = origin_y + vy as i32;

        for vx in 0..tiles_w {
            let col = vx * CELL_W;
            if col + 1 >= buf.width() { break; }
            let tx = origin_x + vx as i32;

            let (glyph, fg, bg) = match w.grid.tile_at(tx, ty) {
                None => ("  ", Color::White, Cell::BASE_BG),
                Some(_) if !w.visibility.is_revealed(tx, ty) => ("  ", Color::White, FOG_BG),
                Some(tile) => tile_style(tile, ty < surface),
            };
            let glyph = if tx == w.shop_door_x && ty == surface - 1 { "⌂⌂" } else { glyph };
            for (i, ch) in glyph.chars().take(CELL_W).enumerate() {
                buf.set(col + i, row, Cell::from_char(ch, fg, bg));
            }
        }
    }

    for (tx, ty, fraction) in w.mining.progress() {
        let (vx, vy) = (tx - origin_x, ty - origin_y);
        if vx < 0 || vy < 0 || vx as usize >= tiles_w || vy as usize >= tiles_h { continue; }
        let (col, row) = (vx as usize * CELL_W, MAP_ROW + vy as usize);
        let bg = w.grid.tile_at(tx, ty).map_or(Cell::BASE_BG, |t| tile_style(t, false).2);
        for (i, ch) in progress_glyph(fraction).chars().enumerate() {
            buf.set(col + i, row, Cell::from_char(ch, Color::Rgb { r: 255, g: 80, b: 60 }, bg));
        }
    }

    compose_actor(buf, w, origin_x, origin_y, tiles_w, tiles_h);
}

fn compose_actor(buf: &mut FrameBuffer, w: &WorldState, origin_x: i32, origin_y: i32, tiles_w: usize, tiles_h: usize) {
    let (cx, cy) = w.actor.aabb().center();
    let (tx, ty) = (cx.div_euclid(TILE_SIZE), cy.div_euclid(TILE_SIZE));
    let (vx, vy) = (tx - origin_x, ty - origin_y);
    if vx < 0 || vy < 0 || vx as usize >= tiles_w || vy as usize >= tiles_h { return; }

    let half = if cx.rem_euclid(TILE_SIZE) < TILE_SIZE / 2 { 0 } else { 1 };
    let col = vx as usize * CELL_W + half;
    let row = MAP_ROW + vy as usize;
    let glyph = match w.actor.facing {
        Facing::Left => '◄',
        Facing::Right => '►',
    };
    let bg = if ty < w.surface_level as i32 { SKY_BG } else { CAVE_BG };
    buf.set(col, row, Cell::from_char(glyph, Color::Rgb { r: 255, g: 240, b: 80 }, bg));
}

fn compose_footer(buf: &mut FrameBuffer, w: &WorldState, tiles_h: usize) {
    let msg_row = MAP_ROW + tiles_h;
    if msg_row < buf.height() && !w.message.is_empty() {
        buf.bar(msg_row, &format!(" ◈ {} ", w.message), Color::Black, MSG_BG);
    }

    let help_row = msg_row + 1;
    if help_row < buf.height() {
        let help = " A/D move  W/Space jump  click or IJKL mine  E shop  1-6 equip  H/G drink  F5-F7 skills  P pause  Q quit";
        buf.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
    }
}

fn compose_pause_overlay(buf: &mut FrameBuffer, tiles_w: usize, tiles_h: usize) {
    let dim = Color::Rgb { r: 40, g: 40, b: 40 };
    let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
    let key_c = Color::Rgb { r: 100, g: 200, b: 255 };

    let view_cols = tiles_w * CELL_W;
    let box_w = 30_usize.min(view_cols);
    let box_h = 6_usize.min(tiles_h);
    let box_x = view_cols.saturating_sub(box_w) / 2;
    let box_y = MAP_ROW + tiles_h.saturating_sub(box_h) / 2;

    for y in box_y..box_y + box_h {
        for x in box_x..box_x + box_w {
            buf.set(x, y, Cell::from_char(' ', Color::Reset, dim));
        }
    }
    buf.put_str(box_x + 11, box_y + 1, "PAUSED", hdr, dim);
    buf.put_str(box_x + 2, box_y + 3, "P   Resume", key_c, dim);
    buf.put_str(box_x + 2, box_y + 4, "Q   Quit", key_c, dim);
}
