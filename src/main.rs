//! Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::economy::Skill;
use domain::item::{ItemId, ToolId};
use domain::physics::Facing;
use sim::event::GameEvent;
use sim::scene;
use sim::step::{self, FrameInput, MineIntent};
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{self as render, Renderer};
use ui::shop_view::TerminalShop;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "deepdig.log";
const MESSAGE_SECS: f32 = 2.5;

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char(' '), KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_MINE_UP: &[KeyCode] = &[KeyCode::Char('i'), KeyCode::Char('I')];
const KEYS_MINE_LEFT: &[KeyCode] = &[KeyCode::Char('j'), KeyCode::Char('J')];
const KEYS_MINE_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('k'), KeyCode::Char('K'), KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_MINE_RIGHT: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('L')];
const KEYS_INTERACT: &[KeyCode] = &[KeyCode::Char('e'), KeyCode::Char('E')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::F(1)];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_POTION: &[KeyCode] = &[KeyCode::Char('h'), KeyCode::Char('H')];
const KEYS_TONIC: &[KeyCode] = &[KeyCode::Char('g'), KeyCode::Char('G')];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = GameConfig::load();
    let seed = config.world.resolved_seed();
    let mut world = WorldState::new(&config, seed)?;

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        return Err(format!("terminal init failed: {e}").into());
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!();
    println!("Thanks for playing Deepdig!");
    println!(
        "Coins: {}   Blocks mined: {}   Seed: {}",
        world.economy.coins,
        world.mining.total_mined(),
        world.seed
    );
    Ok(())
}

/// Log to a file: the terminal belongs to the renderer.
fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    match File::create(LOG_FILE) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let frame = Duration::from_millis(config.timing.frame_ms.max(1));
    let mut last_tick = Instant::now();

    // One-shot intents collected between ticks.
    let mut pending = FrameInput::default();
    let mut pending_from_drag = false;
    let mut pad_connected = gp.connected;

    loop {
        kb.drain_events();
        gp.update();
        if gp.connected != pad_connected {
            pad_connected = gp.connected;
            let msg = if pad_connected { "Gamepad connected" } else { "Gamepad disconnected" };
            world.set_message(msg, MESSAGE_SECS);
        }

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
            break;
        }
        if kb.any_pressed(KEYS_PAUSE) || gp.confirm_pressed() {
            toggle_pause(world);
        }

        if world.phase == Phase::Playing {
            collect_one_shots(world, &kb, &gp, &mut pending, &mut pending_from_drag);
        }

        if last_tick.elapsed() >= frame {
            let dt = last_tick.elapsed().as_secs_f32();
            last_tick = Instant::now();

            if world.phase == Phase::Playing {
                let mut input = std::mem::take(&mut pending);
                input.horizontal = detect_horizontal(&kb, &gp);
                let events = step::step(world, input, dt);
                let wants_shop = report_events(world, &events, pending_from_drag);
                pending_from_drag = false;

                if wants_shop {
                    let mut shop = TerminalShop::new(&mut *renderer, &mut kb, &mut gp, frame);
                    if let Some(ret) = scene::enter_shop(world, &mut shop) {
                        report_events(world, &ret.cancelled, false);
                        if !ret.grounded {
                            log::warn!("shop exit left the actor airborne");
                        }
                        if ret.coins_delta != 0 {
                            world.set_message(&format!("Shop visit: {:+} coins", ret.coins_delta), MESSAGE_SECS);
                        }
                    }
                    last_tick = Instant::now();
                }
            } else {
                world.tick_message(dt);
            }
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn toggle_pause(world: &mut WorldState) {
    world.phase = match world.phase {
        Phase::Playing => Phase::Paused,
        Phase::Paused => Phase::Playing,
        other => other,
    };
}

fn detect_horizontal(kb: &InputState, gp: &GamepadState) -> i8 {
    let left = kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) || gp.left_held();
    let right = kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) || gp.right_held();
    right as i8 - left as i8
}

/// Merge this frame's edge-triggered input into `pending`. Later requests
/// of the same kind replace earlier ones.
fn collect_one_shots(
    world: &WorldState,
    kb: &InputState,
    gp: &GamepadState,
    pending: &mut FrameInput,
    from_drag: &mut bool,
) {
    pending.jump |= kb.any_pressed(KEYS_JUMP) || gp.jump_pressed();
    pending.interact |= kb.any_pressed(KEYS_INTERACT) || gp.interact_pressed();

    if let Some(intent) = detect_mine(world, kb, gp) {
        pending.mine = Some(intent);
        *from_drag = false;
    } else if pending.mine.is_none() {
        if let Some((col, row)) = kb.held_cell() {
            if let Some((sx, sy)) = render::cell_to_view_px(&world.camera, col, row) {
                pending.mine = Some(MineIntent::Screen { sx, sy });
                *from_drag = true;
            }
        }
    }

    for (i, tool) in ToolId::ALL.iter().enumerate() {
        let key = char::from_digit(i as u32 + 1, 10).unwrap_or('0');
        if kb.was_pressed(KeyCode::Char(key)) {
            pending.equip = Some(*tool);
        }
    }

    if kb.any_pressed(KEYS_POTION) {
        pending.use_item = Some(ItemId::HealthPotion);
    } else if kb.any_pressed(KEYS_TONIC) {
        pending.use_item = Some(ItemId::StaminaTonic);
    }

    for (key, skill) in [(5, Skill::Strength), (6, Skill::Endurance), (7, Skill::Speed)] {
        if kb.was_pressed(KeyCode::F(key)) {
            pending.spend_skill = Some(skill);
        }
    }
}

fn detect_mine(world: &WorldState, kb: &InputState, gp: &GamepadState) -> Option<MineIntent> {
    if let Some((col, row)) = kb.clicked_cell() {
        let (sx, sy) = render::cell_to_view_px(&world.camera, col, row)?;
        return Some(MineIntent::Screen { sx, sy });
    }
    let (dx, dy) = if kb.any_pressed(KEYS_MINE_UP) {
        (0, -1)
    } else if kb.any_pressed(KEYS_MINE_LEFT) {
        (-1, 0)
    } else if kb.any_pressed(KEYS_MINE_DOWN) {
        (0, 1)
    } else if kb.any_pressed(KEYS_MINE_RIGHT) {
        (1, 0)
    } else if gp.mine_pressed() {
        gp.aim().unwrap_or(match world.actor.facing {
            Facing::Left => (-1, 0),
            Facing::Right => (1, 0),
        })
    } else {
        return None;
    };
    Some(MineIntent::Adjacent(dx, dy))
}

/// Turn events into message-bar text. Returns true if the shop was requested.
fn report_events(world: &mut WorldState, events: &[GameEvent], quiet_rejections: bool) -> bool {
    let mut wants_shop = false;
    for event in events {
        let msg = match event {
            GameEvent::MiningRejected(why) if !quiet_rejections => Some(format!("Can't mine: {why}")),
            GameEvent::ItemCollected(item) => Some(format!("+1 {}", item.label())),
            GameEvent::InventoryFull(item) => Some(format!("Bag full, {} lost", item.label())),
            GameEvent::ToolBroke(tool) => Some(format!("Your {} broke!", tool.label())),
            GameEvent::ToolEquipped(tool) => Some(format!("Equipped {}", tool.label())),
            GameEvent::SkillPointEarned { points } => {
                Some(format!("Skill point earned ({points} unspent, F5-F7 to spend)"))
            }
            GameEvent::SkillLeveled { skill, level } => Some(format!("{} is now {level}", skill.label())),
            GameEvent::ConsumableUsed(item) => Some(format!("Used {}", item.label())),
            GameEvent::MiningCancelled { refund, .. } => {
                Some(format!("Mining interrupted, {refund:.0} stamina refunded"))
            }
            GameEvent::Damaged { amount } => Some(format!("Ouch! -{amount:.0} HP")),
            GameEvent::Fainted => Some(step::FAINT_MESSAGE.to_string()),
            GameEvent::ShopRequested => {
                wants_shop = true;
                None
            }
            _ => None,
        };
        if let Some(msg) = msg {
            world.set_message(&msg, MESSAGE_SECS);
        }
    }
    wants_shop
}
