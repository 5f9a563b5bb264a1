//! Gamepad input tracker using gilrs.
//!
//! Button mapping comes from the `[gamepad]` table via `load_button_config()`.
//! Default mapping:
//!   D-pad / Left Stick    →  Walk, aim mining, shop cursor
//!   A                     →  Jump
//!   X / R1                →  Mine toward the aimed direction
//!   Y                     →  Enter the shop
//!   Start                 →  Confirm / Pause
//!   Select / B            →  Cancel / Leave shop

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Face, shoulder and menu buttons. The d-pad is tracked as a direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    /// Accepts Xbox-style labels, gilrs compass names and LB/RB aliases.
    fn from_name(s: &str) -> Option<Btn> {
        let btn = match s.trim().to_ascii_uppercase().as_str() {
            "A" | "SOUTH" => Btn::A,
            "B" | "EAST" => Btn::B,
            "X" | "WEST" => Btn::X,
            "Y" | "NORTH" => Btn::Y,
            "L1" | "LB" | "LEFTTRIGGER" => Btn::L1,
            "R1" | "RB" | "RIGHTTRIGGER" => Btn::R1,
            "L2" | "LT" | "LEFTTRIGGER2" => Btn::L2,
            "R2" | "RT" | "RIGHTTRIGGER2" => Btn::R2,
            "START" | "MENU" => Btn::Start,
            "SELECT" | "BACK" | "VIEW" => Btn::Select,
            _ => return None,
        };
        Some(btn)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Dir {
    Up,
    Down,
    Left,
    Right,
}

#[cfg(feature = "gamepad")]
enum Input {
    Button(Btn),
    Pad(Dir),
}

#[cfg(feature = "gamepad")]
fn classify(button: Button) -> Option<Input> {
    let input = match button {
        Button::South => Input::Button(Btn::A),
        Button::East => Input::Button(Btn::B),
        Button::West => Input::Button(Btn::X),
        Button::North => Input::Button(Btn::Y),
        Button::LeftTrigger => Input::Button(Btn::L1),
        Button::RightTrigger => Input::Button(Btn::R1),
        Button::LeftTrigger2 => Input::Button(Btn::L2),
        Button::RightTrigger2 => Input::Button(Btn::R2),
        Button::Start => Input::Button(Btn::Start),
        Button::Select => Input::Button(Btn::Select),
        Button::DPadUp => Input::Pad(Dir::Up),
        Button::DPadDown => Input::Pad(Dir::Down),
        Button::DPadLeft => Input::Pad(Dir::Left),
        Button::DPadRight => Input::Pad(Dir::Right),
        _ => return None,
    };
    Some(input)
}

/// Held (continuous) and pressed (edge, cleared every update).
#[derive(Clone, Copy, Debug, Default)]
struct Latch {
    held: bool,
    pressed: bool,
}

impl Latch {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.pressed = true;
        }
        self.held = held;
    }
}

/// Four directions from one source (d-pad or stick), indexed by `Dir`.
#[derive(Clone, Copy, Debug, Default)]
struct DirPad([Latch; 4]);

impl DirPad {
    fn get(&self, dir: Dir) -> Latch {
        self.0[dir as usize]
    }

    fn set(&mut self, dir: Dir, held: bool) {
        self.0[dir as usize].set(held);
    }

    fn clear_edges(&mut self) {
        for l in &mut self.0 {
            l.pressed = false;
        }
    }
}

/// Which buttons trigger each game action.
#[derive(Debug, PartialEq)]
struct ActionMap {
    jump: Vec<Btn>,
    mine: Vec<Btn>,
    interact: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump: vec![Btn::A],
            mine: vec![Btn::X, Btn::R1],
            interact: vec![Btn::Y],
            confirm: vec![Btn::Start],
            cancel: vec![Btn::Select, Btn::B],
        }
    }
}

impl ActionMap {
    /// Override each action whose configured list names at least one
    /// known button. Unknown names are skipped.
    fn apply(&mut self, cfg: &GamepadConfig) {
        for (slot, names) in [
            (&mut self.jump, &cfg.jump),
            (&mut self.mine, &cfg.mine),
            (&mut self.interact, &cfg.interact),
            (&mut self.confirm, &cfg.confirm),
            (&mut self.cancel, &cfg.cancel),
        ] {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *slot = parsed;
            } else if !names.is_empty() {
                log::warn!("gamepad: no known buttons in {names:?}, keeping defaults");
            }
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [Latch; BTN_COUNT],
    dpad: DirPad,
    stick: DirPad,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_pos: (f32, f32),

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let any = g.gamepads().next().is_some();
                if any {
                    log::info!("gamepad detected");
                }
                (Some(g), any)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [Latch::default(); BTN_COUNT],
            dpad: DirPad::default(),
            stick: DirPad::default(),
            stick_pos: (0.0, 0.0),
            action_map: ActionMap::default(),
            connected,
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map.apply(cfg);
    }

    /// Poll once per frame. Edge flags only live until the next call.
    pub fn update(&mut self) {
        for b in &mut self.buttons {
            b.pressed = false;
        }
        self.dpad.clear_edges();
        self.stick.clear_edges();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else { return };
        let events: Vec<EventType> = std::iter::from_fn(|| gilrs.next_event()).map(|e| e.event).collect();

        for event in events {
            match event {
                EventType::ButtonPressed(b, _) => self.on_button(b, true),
                EventType::ButtonReleased(b, _) => self.on_button(b, false),
                EventType::AxisChanged(Axis::LeftStickX, v, _) => self.stick_pos.0 = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => self.stick_pos.1 = v,
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        let (x, y) = self.stick_pos;
        self.stick.set(Dir::Left, x < -STICK_DEADZONE);
        self.stick.set(Dir::Right, x > STICK_DEADZONE);
        self.stick.set(Dir::Up, y > STICK_DEADZONE);
        self.stick.set(Dir::Down, y < -STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn on_button(&mut self, button: Button, held: bool) {
        self.connected = true;
        match classify(button) {
            Some(Input::Button(b)) => self.buttons[b as usize].set(held),
            Some(Input::Pad(d)) => self.dpad.set(d, held),
            None => {}
        }
    }

    #[cfg(feature = "gamepad")]
    fn release_all(&mut self) {
        self.buttons = [Latch::default(); BTN_COUNT];
        self.dpad = DirPad::default();
        self.stick = DirPad::default();
        self.stick_pos = (0.0, 0.0);
    }

    // ── Actions ──

    fn action(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].pressed)
    }

    pub fn jump_pressed(&self) -> bool {
        self.action(&self.action_map.jump)
    }
    pub fn mine_pressed(&self) -> bool {
        self.action(&self.action_map.mine)
    }
    pub fn interact_pressed(&self) -> bool {
        self.action(&self.action_map.interact)
    }
    pub fn confirm_pressed(&self) -> bool {
        self.action(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.action(&self.action_map.cancel)
    }

    // ── Directions ──

    fn held(&self, dir: Dir) -> bool {
        self.dpad.get(dir).held || self.stick.get(dir).held
    }

    fn pressed(&self, dir: Dir) -> bool {
        self.dpad.get(dir).pressed || self.stick.get(dir).pressed
    }

    /// Direction to mine in: held down/up wins over left/right. `None`
    /// means the caller falls back to the facing direction.
    pub fn aim(&self) -> Option<(i32, i32)> {
        [(Dir::Down, (0, 1)), (Dir::Up, (0, -1)), (Dir::Left, (-1, 0)), (Dir::Right, (1, 0))]
            .into_iter()
            .find(|(d, _)| self.held(*d))
            .map(|(_, v)| v)
    }

    pub fn left_held(&self) -> bool {
        self.held(Dir::Left)
    }
    pub fn right_held(&self) -> bool {
        self.held(Dir::Right)
    }

    pub fn up_pressed(&self) -> bool {
        self.pressed(Dir::Up)
    }
    pub fn down_pressed(&self) -> bool {
        self.pressed(Dir::Down)
    }
    pub fn left_pressed(&self) -> bool {
        self.pressed(Dir::Left)
    }
    pub fn right_pressed(&self) -> bool {
        self.pressed(Dir::Right)
    }
}
