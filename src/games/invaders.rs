use crate::input::{self, ShooterIntent};
use crate::sound::SoundPlayer;
use crate::surface::{Rgb, Surface, TerminalGuard, TerminalSurface};
use anyhow::{Result, bail};
use crossterm::cursor::MoveTo;
use crossterm::event;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use rand::Rng;
use std::io::{Stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const MISSILE_STEP: Duration = Duration::from_millis(100);
const ALIEN_STEP: Duration = Duration::from_millis(800);
const EXPLOSION_DELAY: Duration = Duration::from_millis(500);
const HIT_REWARD: u32 = 100;
const TICK_MS: u64 = 33;
const HEADER_LINES: u16 = 3;
const ALIEN_ROW: usize = 0;

pub const DEFAULT_WIDTH: usize = 9;
pub const DEFAULT_HEIGHT: usize = 5;

const BLANK: &str = "blank";
const SHIP: &str = "ship";
const MISSILE: &str = "missile";
const ALIEN: &str = "alien";
const EXPLOSION: &str = "explosion";
const EXPLOSION_SOUND: &str = "explosion";

const PALETTE: &[(&str, char, Rgb)] = &[
    (BLANK, ' ', Rgb { r: 30, g: 30, b: 30 }),
    (SHIP, 'A', Rgb { r: 0, g: 255, b: 0 }),
    (MISSILE, '|', Rgb { r: 255, g: 255, b: 0 }),
    (ALIEN, 'M', Rgb { r: 255, g: 0, b: 255 }),
    (EXPLOSION, '*', Rgb { r: 255, g: 128, b: 0 }),
];

struct Alien
{
    col: usize,
    dir: i32,
}

struct Missile
{
    row: usize,
    col: usize,
    next_step: Instant,
}

struct Explosion
{
    col: usize,
    clear_at: Instant,
}

pub struct InvadersEngine
{
    width: usize,
    height: usize,
    ship_col: usize,
    alien: Option<Alien>,
    alien_next_step: Instant,
    missile: Option<Missile>,
    explosion: Option<Explosion>,
    score: u32,
    game_over: bool,
}

impl InvadersEngine
{
    pub fn new(
        width: usize,
        height: usize,
        now: Instant,
        rng: &mut impl Rng,
        surface: &mut impl Surface,
    ) -> Self
    {
        let mut engine = Self {
            width,
            height,
            ship_col: width / 2,
            alien: None,
            alien_next_step: now + ALIEN_STEP,
            missile: None,
            explosion: None,
            score: 0,
            game_over: false,
        };
        surface.set_cell(engine.ship_row(), engine.ship_col, SHIP);
        engine.spawn_alien(rng, surface);
        engine
    }

    fn ship_row(&self) -> usize
    {
        self.height - 1
    }

    fn spawn_alien(&mut self, rng: &mut impl Rng, surface: &mut impl Surface)
    {
        let col = rng.gen_range(0..self.width);
        let dir = if rng.gen_bool(0.5) { 1 } else { -1 };
        surface.set_cell(ALIEN_ROW, col, ALIEN);
        self.alien = Some(Alien { col, dir });
    }

    pub fn move_ship(&mut self, direction: i32, surface: &mut impl Surface)
    {
        if self.game_over {
            return;
        }
        let target = self.ship_col as i32 + direction;
        if target < 0 || target >= self.width as i32 {
            return;
        }
        surface.set_cell(self.ship_row(), self.ship_col, BLANK);
        self.ship_col = target as usize;
        surface.set_cell(self.ship_row(), self.ship_col, SHIP);
    }

    pub fn launch(&mut self, now: Instant, surface: &mut impl Surface, sound: &SoundPlayer)
    {
        if self.game_over || self.missile.is_some() {
            return;
        }
        let Some(row) = self.ship_row().checked_sub(1) else {
            return;
        };
        let col = self.ship_col;
        self.missile = Some(Missile {
            row,
            col,
            next_step: now + MISSILE_STEP,
        });
        surface.set_cell(row, col, MISSILE);
        self.check_collision(now, surface, sound);
    }

    pub fn tick(
        &mut self,
        now: Instant,
        rng: &mut impl Rng,
        surface: &mut impl Surface,
        sound: &SoundPlayer,
    )
    {
        if self.game_over {
            return;
        }

        if let Some(explosion) = &self.explosion {
            if now >= explosion.clear_at {
                surface.set_cell(ALIEN_ROW, explosion.col, BLANK);
                self.explosion = None;
                self.spawn_alien(rng, surface);
            }
        }

        if let Some(alien) = &mut self.alien {
            if now >= self.alien_next_step {
                let target = alien.col as i32 + alien.dir;
                if target < 0 || target >= self.width as i32 {
                    // Bounce: turn around, stay put for this tick
                    alien.dir = -alien.dir;
                } else {
                    surface.set_cell(ALIEN_ROW, alien.col, BLANK);
                    alien.col = target as usize;
                    surface.set_cell(ALIEN_ROW, alien.col, ALIEN);
                }
                self.alien_next_step = now + ALIEN_STEP;
            }
        }

        if let Some(missile) = self.missile.take() {
            if now < missile.next_step {
                self.missile = Some(missile);
            } else {
                surface.set_cell(missile.row, missile.col, BLANK);
                if missile.row > 0 {
                    let advanced = Missile {
                        row: missile.row - 1,
                        col: missile.col,
                        next_step: now + MISSILE_STEP,
                    };
                    surface.set_cell(advanced.row, advanced.col, MISSILE);
                    self.missile = Some(advanced);
                    self.check_collision(now, surface, sound);
                }
            }
        }
    }

    fn check_collision(&mut self, now: Instant, surface: &mut impl Surface, sound: &SoundPlayer)
    {
        let hit = match (&self.missile, &self.alien) {
            (Some(missile), Some(alien)) => missile.row == ALIEN_ROW && missile.col == alien.col,
            _ => false,
        };
        if !hit {
            return;
        }

        let col = self.alien.take().map(|alien| alien.col).unwrap_or(0);
        self.missile = None;
        self.score += HIT_REWARD;
        surface.set_cell(ALIEN_ROW, col, EXPLOSION);
        sound.play(EXPLOSION_SOUND);
        self.explosion = Some(Explosion {
            col,
            clear_at: now + EXPLOSION_DELAY,
        });
        debug!(score = self.score, "hostile destroyed");
    }

    pub fn end(&mut self)
    {
        self.game_over = true;
    }

    pub fn score(&self) -> u32
    {
        self.score
    }

    pub fn width(&self) -> usize
    {
        self.width
    }
}

pub struct InvadersConfig
{
    pub width: usize,
    pub height: usize,
}

impl Default for InvadersConfig
{
    fn default() -> Self
    {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

pub fn run(config: InvadersConfig) -> Result<()>
{
    if config.width < 2 {
        bail!("width must be at least 2");
    }
    if config.height < 2 {
        bail!("height must be at least 2");
    }
    info!(width = config.width, height = config.height, "starting invaders");

    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();

    let mut surface = TerminalSurface::new(config.height, config.width, BLANK, HEADER_LINES, 0);
    for (asset, glyph, color) in PALETTE {
        surface.register(*asset, *glyph, *color);
    }

    let mut engine = InvadersEngine::new(
        config.width,
        config.height,
        Instant::now(),
        &mut rng,
        &mut surface,
    );
    let sound = SoundPlayer::new();

    let mut last_tick = Instant::now();

    loop {
        let now = Instant::now();
        let mut quit = false;

        while event::poll(Duration::from_millis(0))? {
            let raw = event::read()?;
            let Some(intent) = input::shooter_intent(&raw, surface.geometry()) else {
                continue;
            };
            match intent {
                ShooterIntent::Quit => quit = true,
                ShooterIntent::MoveLeft => engine.move_ship(-1, &mut surface),
                ShooterIntent::MoveRight => engine.move_ship(1, &mut surface),
                ShooterIntent::Launch => engine.launch(now, &mut surface, &sound),
            }
        }
        if quit {
            engine.end();
            break;
        }

        engine.tick(now, &mut rng, &mut surface, &sound);

        if last_tick.elapsed() >= Duration::from_millis(TICK_MS) {
            draw_ui(term.stdout(), &surface, &engine)?;
            last_tick = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    info!(score = engine.score(), "invaders session over");
    Ok(())
}

fn draw_ui(stdout: &mut Stdout, surface: &TerminalSurface, engine: &InvadersEngine) -> Result<()>
{
    let mut lines = Vec::new();
    lines.push("Grid Arcade - Invaders".to_string());
    lines.push(format!("Score : {}", engine.score()));
    lines.push(String::new());
    lines.extend(surface.render_lines(None));
    lines.push("=".repeat(engine.width() * 2));
    lines.push("Controls: arrows move, space/up fires, click thirds, ESC quits".to_string());

    let output = format!("{}\r\n", lines.join("\r\n"));
    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
