mod games;
mod input;
mod sound;
mod surface;

use anyhow::Result;
use clap::{Parser, Subcommand};
use games::invaders::{self, InvadersConfig};
use games::memory::{self, MemoryConfig};

#[derive(Parser)]
#[command(name = "grid-arcade")]
#[command(about = "Two tiny real-time arcade games for the terminal", long_about = None)]
struct Cli
{
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command
{
    /// List the available games
    List,
    /// Matching pairs: flip two cards at a time, match them all
    Memory
    {
        /// Number of pairs in the deck
        #[arg(long, default_value_t = 4)]
        pairs: usize,
    },
    /// Grid shooter: one ship, one hostile, one missile
    Invaders
    {
        /// Board width in cells
        #[arg(long, default_value_t = invaders::DEFAULT_WIDTH)]
        width: usize,
        /// Board height in cells
        #[arg(long, default_value_t = invaders::DEFAULT_HEIGHT)]
        height: usize,
    },
}

fn main()
{
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()>
{
    init_logging()?;
    let cli = Cli::parse();
    match cli.command {
        None => interactive_menu(),
        Some(Command::List) => {
            list_games();
            Ok(())
        }
        Some(Command::Memory { pairs }) => memory::run(MemoryConfig { pairs }),
        Some(Command::Invaders { width, height }) => {
            invaders::run(InvadersConfig { width, height })
        }
    }
}

fn init_logging() -> Result<()>
{
    // The games own the terminal in raw mode, so logs go to a file
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("grid-arcade.log")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn run_game(name: &str) -> Result<()>
{
    match name {
        "memory" => memory::run(MemoryConfig::default()),
        "invaders" => invaders::run(InvadersConfig::default()),
        other => anyhow::bail!("unknown game '{other}'"),
    }
}

fn interactive_menu() -> Result<()>
{
    let registry = games::registry();
    println!("Grid Arcade");
    println!();
    println!("Select a game:");
    for (idx, game) in registry.iter().enumerate() {
        println!("  {}. {} - {}", idx + 1, game.name, game.description);
    }
    println!();
    print!("Enter number or name (default 1, q to quit): ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let choice = input.trim();

    if choice.is_empty() {
        return run_game(registry[0].name);
    }
    if choice.eq_ignore_ascii_case("q") {
        return Ok(());
    }
    if let Ok(index) = choice.parse::<usize>() {
        if index >= 1 && index <= registry.len() {
            return run_game(registry[index - 1].name);
        }
    }

    for game in registry {
        if game.name.eq_ignore_ascii_case(choice) {
            return run_game(game.name);
        }
    }

    anyhow::bail!("invalid selection")
}

fn list_games()
{
    println!("Available games:");
    for game in games::registry() {
        println!("  {:<10} - {}", game.name, game.description);
    }
}
