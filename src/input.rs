use crate::surface::{GridGeometry, Third};
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemoryIntent
{
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    Select,
    SelectCell
    {
        row: usize,
        col: usize,
    },
    Quit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShooterIntent
{
    MoveLeft,
    MoveRight,
    Launch,
    Quit,
}

pub fn memory_intent(event: &Event, grid: GridGeometry) -> Option<MemoryIntent>
{
    match event {
        Event::Key(KeyEvent { code, modifiers, .. }) => match code {
            KeyCode::Esc | KeyCode::Char('q') => Some(MemoryIntent::Quit),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(MemoryIntent::Quit)
            }
            KeyCode::Left => Some(MemoryIntent::CursorLeft),
            KeyCode::Right => Some(MemoryIntent::CursorRight),
            KeyCode::Up => Some(MemoryIntent::CursorUp),
            KeyCode::Down => Some(MemoryIntent::CursorDown),
            KeyCode::Char(' ') | KeyCode::Enter => Some(MemoryIntent::Select),
            _ => None,
        },
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            ..
        }) => grid
            .cell_at(*column, *row)
            .map(|(row, col)| MemoryIntent::SelectCell { row, col }),
        _ => None,
    }
}

pub fn shooter_intent(event: &Event, grid: GridGeometry) -> Option<ShooterIntent>
{
    match event {
        Event::Key(KeyEvent { code, modifiers, .. }) => match code {
            KeyCode::Esc | KeyCode::Char('q') => Some(ShooterIntent::Quit),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(ShooterIntent::Quit)
            }
            KeyCode::Left => Some(ShooterIntent::MoveLeft),
            KeyCode::Right => Some(ShooterIntent::MoveRight),
            KeyCode::Up | KeyCode::Char(' ') => Some(ShooterIntent::Launch),
            _ => None,
        },
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            ..
        }) => match grid.third_at(*column)? {
            Third::Left => Some(ShooterIntent::MoveLeft),
            Third::Middle => Some(ShooterIntent::Launch),
            Third::Right => Some(ShooterIntent::MoveRight),
        },
        _ => None,
    }
}
