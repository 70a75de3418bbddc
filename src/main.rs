//! Quadrixtui — quad-sliding block puzzle in the terminal.

mod app;
mod game;
mod grid;
mod input;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use grid::Direction;

/// Options derived from CLI that affect game behaviour (grid dimensions,
/// spawn cadence, spawn edges, gridlines).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub cells: u16,
    pub grid_size: u16,
    pub spawn_delay_ms: u64,
    pub spawn_edges: Vec<Direction>,
    pub gridlines: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        cells: args.cells,
        grid_size: args.grid_size,
        spawn_delay_ms: args.spawn_delay_ms,
        spawn_edges: args.spawn_edges.clone(),
        gridlines: !args.no_gridlines,
    };
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Quad-sliding block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "quadrixtui",
    version,
    about = "Quad-sliding block puzzle in the terminal. Slide the whole field; isolated blocks crumble away.",
    long_about = "Quadrixtui is a terminal puzzle game about a square field of blocks.\n\n\
        Every few seconds a 2x2 quad slides in from one of the edges. Shift the whole \
        field with the arrow keys to make room and to strand blocks on their own: a block \
        with no orthogonal neighbours crumbles away. The pale anchor quad in the middle \
        never breaks. The game ends when no quad fits anywhere.\n\n\
        CONTROLS:\n  Left/Right/Up/Down or h/l/k/j  Slide the field\n  P  Pause      R  Restart (game over)      Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Grid dimension in cells (the field is cells x cells).
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u16).range(4..=64))]
    pub cells: u16,

    /// Grid size in pixels; the cell size is grid-size / cells, truncated.
    #[arg(long, default_value = "20", value_name = "PX")]
    pub grid_size: u16,

    /// Generator wait time between quad spawns, in ms.
    #[arg(long, default_value = "3000", value_name = "MS")]
    pub spawn_delay_ms: u64,

    /// Edges quads may slide in from (comma separated: top,right,bottom,left).
    #[arg(long, value_delimiter = ',', default_values_t = Direction::ALL)]
    pub spawn_edges: Vec<Direction>,

    /// Path to theme file (btop-style theme[key]="value"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Hide the interior gridlines (the border is always drawn).
    #[arg(long)]
    pub no_gridlines: bool,

    /// Disable the cleanup fade animation (blocks vanish instantly).
    #[arg(long)]
    pub no_animation: bool,

    /// Skip the start menu and begin playing immediately.
    #[arg(long)]
    pub no_menu: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
