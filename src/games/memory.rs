use crate::input::{self, MemoryIntent};
use crate::surface::{Rgb, Surface, TerminalGuard, TerminalSurface};
use anyhow::{Result, bail};
use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use rand::Rng;
use rand::seq::SliceRandom;
use std::io::{Stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const FLIP_DELAY: Duration = Duration::from_millis(1000);
const VICTORY_DELAY: Duration = Duration::from_millis(500);
const TICK_MS: u64 = 33;
const HEADER_LINES: u16 = 3;
const GRID_COLS: usize = 4;

const EMPTY: &str = "empty";
const CARD_BACK: &str = "card-back";

const FACES: &[(&str, char, Rgb)] = &[
    ("star", '*', Rgb { r: 255, g: 215, b: 0 }),
    ("moon", ')', Rgb { r: 176, g: 196, b: 222 }),
    ("sun", 'o', Rgb { r: 255, g: 140, b: 0 }),
    ("leaf", '%', Rgb { r: 50, g: 205, b: 50 }),
    ("drop", '!', Rgb { r: 30, g: 144, b: 255 }),
    ("bolt", 'z', Rgb { r: 255, g: 255, b: 102 }),
    ("ring", '@', Rgb { r: 186, g: 85, b: 211 }),
    ("fish", 'f', Rgb { r: 102, g: 205, b: 170 }),
];

pub const MIN_PAIRS: usize = 2;
pub const MAX_PAIRS: usize = FACES.len();

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CardState
{
    Hidden,
    FaceUp,
    Matched,
}

#[derive(Clone, Copy)]
struct Card
{
    label: &'static str,
    state: CardState,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase
{
    Idle,
    OneSelected,
    Resolving
    {
        until: Instant,
    },
    VictoryPending
    {
        at: Instant,
    },
    Won,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemoryEvent
{
    Victory,
}

pub struct MemoryEngine
{
    cards: Vec<Card>,
    selection: Vec<usize>,
    matched_pairs: usize,
    phase: Phase,
    cols: usize,
}

impl MemoryEngine
{
    pub fn new(pairs: usize, cols: usize, rng: &mut impl Rng) -> Self
    {
        let mut engine = Self {
            cards: Vec::new(),
            selection: Vec::new(),
            matched_pairs: 0,
            phase: Phase::Idle,
            cols,
        };
        engine.deal(pairs, rng);
        engine
    }

    #[cfg(test)]
    fn from_layout(labels: &[&'static str], cols: usize) -> Self
    {
        Self {
            cards: labels
                .iter()
                .copied()
                .map(|label| Card {
                    label,
                    state: CardState::Hidden,
                })
                .collect(),
            selection: Vec::new(),
            matched_pairs: 0,
            phase: Phase::Idle,
            cols,
        }
    }

    fn deal(&mut self, pairs: usize, rng: &mut impl Rng)
    {
        let mut labels: Vec<&'static str> = FACES
            .iter()
            .take(pairs)
            .flat_map(|(label, _, _)| [*label, *label])
            .collect();
        labels.shuffle(rng);
        self.cards = labels
            .into_iter()
            .map(|label| Card {
                label,
                state: CardState::Hidden,
            })
            .collect();
    }

    pub fn select(&mut self, index: usize, now: Instant, surface: &mut impl Surface)
    {
        match self.phase {
            Phase::Idle | Phase::OneSelected => {}
            Phase::Resolving { .. } | Phase::VictoryPending { .. } | Phase::Won => return,
        }
        if self.selection.len() == 2 {
            return;
        }
        let Some(card) = self.cards.get(index) else {
            return;
        };
        if card.state != CardState::Hidden {
            return;
        }

        self.cards[index].state = CardState::FaceUp;
        self.paint_card(index, surface);
        self.selection.push(index);

        if self.selection.len() == 2 {
            self.resolve(now);
        } else {
            self.phase = Phase::OneSelected;
        }
    }

    fn resolve(&mut self, now: Instant)
    {
        let (first, second) = (self.selection[0], self.selection[1]);
        if self.cards[first].label == self.cards[second].label {
            self.cards[first].state = CardState::Matched;
            self.cards[second].state = CardState::Matched;
            self.matched_pairs += 1;
            self.selection.clear();
            self.phase = if self.matched_pairs == self.total_pairs() {
                Phase::VictoryPending {
                    at: now + VICTORY_DELAY,
                }
            } else {
                Phase::Idle
            };
        } else {
            debug!(first, second, "mismatch, input locked until revert");
            self.phase = Phase::Resolving {
                until: now + FLIP_DELAY,
            };
        }
    }

    pub fn tick(&mut self, now: Instant, surface: &mut impl Surface) -> Option<MemoryEvent>
    {
        match self.phase {
            Phase::Resolving { until } if now >= until => {
                let pending = std::mem::take(&mut self.selection);
                for index in pending {
                    self.cards[index].state = CardState::Hidden;
                    self.paint_card(index, surface);
                }
                self.phase = Phase::Idle;
                None
            }
            Phase::VictoryPending { at } if now >= at => {
                self.phase = Phase::Won;
                Some(MemoryEvent::Victory)
            }
            _ => None,
        }
    }

    pub fn reset(&mut self, rng: &mut impl Rng, surface: &mut impl Surface)
    {
        let pairs = self.total_pairs();
        self.selection.clear();
        self.matched_pairs = 0;
        self.phase = Phase::Idle;
        self.deal(pairs, rng);
        self.paint_all(surface);
    }

    pub fn paint_all(&self, surface: &mut impl Surface)
    {
        for index in 0..self.cards.len() {
            self.paint_card(index, surface);
        }
    }

    fn paint_card(&self, index: usize, surface: &mut impl Surface)
    {
        let card = &self.cards[index];
        let asset = match card.state {
            CardState::Hidden => CARD_BACK,
            CardState::FaceUp | CardState::Matched => card.label,
        };
        surface.set_cell(index / self.cols, index % self.cols, asset);
    }

    pub fn card_count(&self) -> usize
    {
        self.cards.len()
    }

    pub fn total_pairs(&self) -> usize
    {
        self.cards.len() / 2
    }

    pub fn matched_pairs(&self) -> usize
    {
        self.matched_pairs
    }

    pub fn cols(&self) -> usize
    {
        self.cols
    }

    pub fn rows(&self) -> usize
    {
        self.cards.len().div_ceil(self.cols)
    }
}

pub struct MemoryConfig
{
    pub pairs: usize,
}

impl Default for MemoryConfig
{
    fn default() -> Self
    {
        Self { pairs: 4 }
    }
}

pub fn run(config: MemoryConfig) -> Result<()>
{
    if !(MIN_PAIRS..=MAX_PAIRS).contains(&config.pairs) {
        bail!("pairs must be between {MIN_PAIRS} and {MAX_PAIRS}");
    }
    info!(pairs = config.pairs, "starting memory");

    let mut term = TerminalGuard::enter()?;
    let mut rng = rand::thread_rng();
    let mut engine = MemoryEngine::new(config.pairs, GRID_COLS, &mut rng);

    let mut surface = TerminalSurface::new(engine.rows(), engine.cols(), EMPTY, HEADER_LINES, 0);
    register_palette(&mut surface);
    engine.paint_all(&mut surface);

    let mut cursor: usize = 0;
    let mut last_tick = Instant::now();

    loop {
        let now = Instant::now();
        let mut quit = false;

        while event::poll(Duration::from_millis(0))? {
            let raw = event::read()?;
            let Some(intent) = input::memory_intent(&raw, surface.geometry()) else {
                continue;
            };
            match intent {
                MemoryIntent::Quit => quit = true,
                MemoryIntent::CursorLeft => {
                    cursor = step_cursor(cursor, engine.card_count(), -1);
                }
                MemoryIntent::CursorRight => {
                    cursor = step_cursor(cursor, engine.card_count(), 1);
                }
                MemoryIntent::CursorUp => {
                    cursor = step_cursor(cursor, engine.card_count(), -(engine.cols() as isize));
                }
                MemoryIntent::CursorDown => {
                    cursor = step_cursor(cursor, engine.card_count(), engine.cols() as isize);
                }
                MemoryIntent::Select => engine.select(cursor, now, &mut surface),
                MemoryIntent::SelectCell { row, col } => {
                    let index = row * engine.cols() + col;
                    engine.select(index, now, &mut surface);
                    if index < engine.card_count() {
                        cursor = index;
                    }
                }
            }
        }
        if quit {
            break;
        }

        if let Some(MemoryEvent::Victory) = engine.tick(now, &mut surface) {
            info!(pairs = engine.matched_pairs(), "board solved");
            if play_again(term.stdout(), &engine)? {
                engine.reset(&mut rng, &mut surface);
                cursor = 0;
            } else {
                break;
            }
        }

        if last_tick.elapsed() >= Duration::from_millis(TICK_MS) {
            draw_ui(term.stdout(), &surface, &engine, cursor)?;
            last_tick = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    Ok(())
}

fn register_palette(surface: &mut TerminalSurface)
{
    surface.register(EMPTY, ' ', Rgb { r: 0, g: 0, b: 0 });
    surface.register(CARD_BACK, '#', Rgb { r: 90, g: 90, b: 110 });
    for (label, glyph, color) in FACES {
        surface.register(*label, *glyph, *color);
    }
}

fn step_cursor(cursor: usize, count: usize, delta: isize) -> usize
{
    let target = cursor as isize + delta;
    if target < 0 || target >= count as isize {
        cursor
    } else {
        target as usize
    }
}

fn draw_ui(
    stdout: &mut Stdout,
    surface: &TerminalSurface,
    engine: &MemoryEngine,
    cursor: usize,
) -> Result<()>
{
    let highlight = (cursor / engine.cols(), cursor % engine.cols());
    let mut lines = Vec::new();
    lines.push("Grid Arcade - Memory".to_string());
    lines.push(format!(
        "Score : {} / {}",
        engine.matched_pairs(),
        engine.total_pairs()
    ));
    lines.push(String::new());
    lines.extend(surface.render_lines(Some(highlight)));
    lines.push(String::new());
    lines.push("Controls: arrows move, space/enter flips, click flips, ESC quits".to_string());

    let output = format!("{}\r\n", lines.join("\r\n"));
    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn play_again(stdout: &mut Stdout, engine: &MemoryEngine) -> Result<bool>
{
    let mut lines = Vec::new();
    lines.push("You matched every pair!".to_string());
    lines.push(format!("Score : {}", engine.matched_pairs()));
    lines.push(String::new());
    lines.push("Play again? (y/n)".to_string());

    let output = format!("{}\r\n", lines.join("\r\n"));
    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    while event::poll(Duration::from_millis(0))? {
        let _ = event::read()?;
    }

    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(KeyEvent { code, .. }) = event::read()? {
                match code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(true),
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Ok(false),
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::surface::RecordingSurface;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn surface_for(engine: &MemoryEngine) -> RecordingSurface
    {
        RecordingSurface::new(engine.rows(), engine.cols())
    }

    #[test]
    fn matching_two_cards_marks_them_and_scores()
    {
        let mut engine = MemoryEngine::from_layout(&["star", "star", "moon", "moon"], GRID_COLS);
        let mut surface = surface_for(&engine);
        let start = Instant::now();

        engine.select(0, start, &mut surface);
        assert_eq!(engine.selection, vec![0]);
        assert_eq!(engine.phase, Phase::OneSelected);

        engine.select(1, start, &mut surface);
        assert_eq!(engine.cards[0].state, CardState::Matched);
        assert_eq!(engine.cards[1].state, CardState::Matched);
        assert_eq!(engine.matched_pairs(), 1);
        assert!(engine.selection.is_empty());
        assert_eq!(engine.phase, Phase::Idle);
        assert_eq!(surface.asset_at(0, 0), Some("star"));
        assert_eq!(surface.asset_at(0, 1), Some("star"));
    }

    #[test]
    fn mismatch_reverts_after_the_flip_delay()
    {
        let mut engine = MemoryEngine::from_layout(&["star", "moon", "star", "moon"], GRID_COLS);
        let mut surface = surface_for(&engine);
        let start = Instant::now();

        engine.select(0, start, &mut surface);
        engine.select(1, start, &mut surface);
        assert_eq!(engine.cards[0].state, CardState::FaceUp);
        assert_eq!(engine.cards[1].state, CardState::FaceUp);

        // Input is locked while the mismatch is on display
        engine.select(2, start, &mut surface);
        assert_eq!(engine.cards[2].state, CardState::Hidden);

        assert_eq!(engine.tick(start + FLIP_DELAY - Duration::from_millis(1), &mut surface), None);
        assert_eq!(engine.cards[0].state, CardState::FaceUp);

        engine.tick(start + FLIP_DELAY, &mut surface);
        assert_eq!(engine.cards[0].state, CardState::Hidden);
        assert_eq!(engine.cards[1].state, CardState::Hidden);
        assert!(engine.selection.is_empty());
        assert_eq!(engine.matched_pairs(), 0);
        assert_eq!(surface.asset_at(0, 0), Some(CARD_BACK));
        assert_eq!(surface.asset_at(0, 1), Some(CARD_BACK));
    }

    #[test]
    fn selecting_a_face_up_card_again_is_ignored()
    {
        let mut engine = MemoryEngine::from_layout(&["star", "star", "moon", "moon"], GRID_COLS);
        let mut surface = surface_for(&engine);
        let start = Instant::now();

        engine.select(0, start, &mut surface);
        engine.select(0, start, &mut surface);
        assert_eq!(engine.selection, vec![0]);
    }

    #[test]
    fn out_of_range_selection_is_ignored()
    {
        let mut engine = MemoryEngine::from_layout(&["star", "star", "moon", "moon"], GRID_COLS);
        let mut surface = surface_for(&engine);

        engine.select(99, Instant::now(), &mut surface);
        assert!(engine.selection.is_empty());
        assert_eq!(engine.phase, Phase::Idle);
    }

    #[test]
    fn victory_fires_exactly_once_after_the_delay()
    {
        // Spec scenario: deck [A,B,A,B], match A via 0+2, then B via 1+3
        let mut engine = MemoryEngine::from_layout(&["star", "moon", "star", "moon"], GRID_COLS);
        let mut surface = surface_for(&engine);
        let start = Instant::now();

        engine.select(0, start, &mut surface);
        assert_eq!(engine.selection, vec![0]);
        engine.select(2, start, &mut surface);
        assert_eq!(engine.matched_pairs(), 1);
        assert_eq!(engine.tick(start, &mut surface), None);

        engine.select(1, start, &mut surface);
        engine.select(3, start, &mut surface);
        assert_eq!(engine.matched_pairs(), 2);

        let early = start + VICTORY_DELAY - Duration::from_millis(1);
        assert_eq!(engine.tick(early, &mut surface), None);
        assert_eq!(
            engine.tick(start + VICTORY_DELAY, &mut surface),
            Some(MemoryEvent::Victory)
        );
        assert_eq!(
            engine.tick(start + VICTORY_DELAY + Duration::from_secs(1), &mut surface),
            None
        );
    }

    #[test]
    fn selection_buffer_never_exceeds_two()
    {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut engine = MemoryEngine::new(4, GRID_COLS, &mut rng);
        let mut surface = surface_for(&engine);
        let start = Instant::now();

        for step in 0u64..500 {
            let now = start + Duration::from_millis(step * 7);
            let index = rng.gen_range(0..engine.card_count());
            engine.select(index, now, &mut surface);
            assert!(engine.selection.len() <= 2);
            if step % 5 == 0 {
                engine.tick(now, &mut surface);
            }
        }
    }

    #[test]
    fn reset_rebuilds_a_hidden_shuffled_deck()
    {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut engine = MemoryEngine::new(2, GRID_COLS, &mut rng);
        let mut surface = surface_for(&engine);
        let start = Instant::now();

        // Solve the board by label lookup
        for label in ["star", "moon"] {
            let indices: Vec<usize> = engine
                .cards
                .iter()
                .enumerate()
                .filter(|(_, card)| card.label == label)
                .map(|(index, _)| index)
                .collect();
            engine.select(indices[0], start, &mut surface);
            engine.select(indices[1], start, &mut surface);
        }
        assert_eq!(engine.matched_pairs(), 2);

        surface.take_writes();
        engine.reset(&mut rng, &mut surface);

        assert_eq!(engine.matched_pairs(), 0);
        assert!(engine.selection.is_empty());
        assert_eq!(engine.phase, Phase::Idle);
        assert!(engine.cards.iter().all(|card| card.state == CardState::Hidden));
        let writes = surface.take_writes();
        assert_eq!(writes.len(), engine.card_count());
        assert!(writes.iter().all(|(_, _, asset)| *asset == CARD_BACK));
    }

    #[test]
    fn shuffle_arrangements_are_uniform()
    {
        const RUNS: u32 = 6000;
        let mut counts: HashMap<String, u32> = HashMap::new();
        for seed in 0..RUNS as u64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let engine = MemoryEngine::new(2, GRID_COLS, &mut rng);
            let key: String = engine
                .cards
                .iter()
                .map(|card| card.label.chars().next().unwrap())
                .collect();
            *counts.entry(key).or_insert(0) += 1;
        }

        // 4 cards of 2 labels: 6 distinguishable arrangements
        assert_eq!(counts.len(), 6);
        let expected = RUNS / 6;
        for (arrangement, count) in counts {
            let deviation = (count as i64 - expected as i64).abs();
            assert!(
                deviation < expected as i64 / 5,
                "arrangement {arrangement} occurred {count} times, expected about {expected}"
            );
        }
    }

    proptest! {
        #[test]
        fn shuffled_deck_is_a_permutation(seed in any::<u64>(), pairs in MIN_PAIRS..=MAX_PAIRS)
        {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let engine = MemoryEngine::new(pairs, GRID_COLS, &mut rng);

            let mut labels: Vec<&str> = engine.cards.iter().map(|card| card.label).collect();
            labels.sort_unstable();
            let mut expected: Vec<&str> = FACES
                .iter()
                .take(pairs)
                .flat_map(|(label, _, _)| [*label, *label])
                .collect();
            expected.sort_unstable();

            prop_assert_eq!(labels, expected);
            prop_assert!(engine.cards.iter().all(|card| card.state == CardState::Hidden));
        }
    }

    #[test]
    fn cursor_steps_stay_on_the_board()
    {
        assert_eq!(step_cursor(0, 8, -1), 0);
        assert_eq!(step_cursor(0, 8, 1), 1);
        assert_eq!(step_cursor(7, 8, 1), 7);
        assert_eq!(step_cursor(3, 8, 4), 7);
        assert_eq!(step_cursor(3, 8, -4), 3);
        assert_eq!(step_cursor(4, 8, -4), 0);
    }
}
