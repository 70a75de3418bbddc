//! Layout and drawing: menu, grid surface, gridlines, blocks, overlays.

use crate::app::Screen;
use crate::game::{BlockKind, GameState};
use crate::grid::{Coord, Direction, Point};
use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells are about twice as tall as wide; one grid pixel is one row
/// tall and X_SCALE columns wide so cells read square.
pub const X_SCALE: u16 = 2;

/// Duration of the cleanup fade (TachyonFX).
const CLEANUP_FADE_MS: u32 = 400;

/// Canvas size in grid pixels for a terminal of `term_cols` x `term_rows`.
pub fn canvas_size_for_terminal(term_cols: u16, term_rows: u16) -> (i32, i32) {
    ((term_cols / X_SCALE) as i32, term_rows as i32)
}

/// Buffer rect covering a pixel rect of `w_px` x `h_px` at `top_left`,
/// clipped to the drawable area.
fn px_rect(area: Rect, top_left: Point, w_px: i32, h_px: i32) -> Rect {
    let x0 = area.x as i32 + top_left.x * X_SCALE as i32;
    let y0 = area.y as i32 + top_left.y;
    let x1 = x0 + w_px * X_SCALE as i32;
    let y1 = y0 + h_px;
    let ax1 = (area.x + area.width) as i32;
    let ay1 = (area.y + area.height) as i32;
    let cx0 = x0.clamp(area.x as i32, ax1);
    let cy0 = y0.clamp(area.y as i32, ay1);
    let cx1 = x1.clamp(area.x as i32, ax1);
    let cy1 = y1.clamp(area.y as i32, ay1);
    Rect {
        x: cx0 as u16,
        y: cy0 as u16,
        width: (cx1 - cx0).max(0) as u16,
        height: (cy1 - cy0).max(0) as u16,
    }
}

/// Buffer rect of the grid square (no border).
fn grid_rect(area: Rect, state: &GameState) -> Rect {
    let side = state.grid.side_px();
    px_rect(area, state.grid.offset(), side, side)
}

/// Draw current screen (menu, game, game over), with optional pause overlay.
/// While `cleared` is non-empty the vacated cells are drawn as ghosts and,
/// unless `no_animation`, faded to the background via TachyonFX.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    paused: bool,
    gridlines: bool,
    area: Rect,
    cleared: &[(Coord, BlockKind)],
    cleanup_effect: &mut Option<Effect>,
    cleanup_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
) {
    match screen {
        Screen::Menu => draw_menu(frame, state, area),
        Screen::Playing => {
            draw_game(frame, state, area, gridlines, cleared);
            if paused {
                draw_pause_overlay(frame, state, area);
            }
            if !cleared.is_empty() && !no_animation {
                apply_cleanup_effect(
                    frame,
                    state,
                    area,
                    cleared,
                    cleanup_effect,
                    cleanup_process_time,
                    now,
                );
            }
        }
        Screen::GameOver => {
            draw_game(frame, state, area, gridlines, &[]);
            draw_game_over(frame, state, area);
        }
    }
}

fn block_color(state: &GameState, kind: BlockKind) -> Color {
    match kind {
        BlockKind::Level(i) => state.theme.level_color(i),
        BlockKind::Anchor => state.theme.anchor,
    }
}

/// Fill a one-cell pixel square at `coord` with `color`.
fn fill_cell(buf: &mut ratatui::buffer::Buffer, area: Rect, state: &GameState, coord: Coord, color: Color) {
    let p = state.grid.coord_to_point(coord);
    let cell = state.grid.cell_size();
    let r = px_rect(area, p, cell, cell);
    for y in r.y..r.y + r.height {
        for x in r.x..r.x + r.width {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(color));
        }
    }
}

/// Grid surface: one-cell border around the grid square, background fill,
/// interior gridlines when enabled, then the blocks on top.
fn draw_game(
    frame: &mut Frame,
    state: &GameState,
    area: Rect,
    gridlines: bool,
    cleared: &[(Coord, BlockKind)],
) {
    let board = grid_rect(area, state);
    let n = state.grid.num_cells() as i32;
    let cell = state.grid.cell_size();

    // Border around the whole grid.
    let border = Rect {
        x: board.x.saturating_sub(1).max(area.x),
        y: board.y.saturating_sub(1).max(area.y),
        width: board.width + 2,
        height: board.height + 2,
    }
    .intersection(area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(state.theme.grid_line))
        .title(Span::styled(" Quadrixtui ", state.theme.title));
    block.render(border, frame.buffer_mut());

    let buf = frame.buffer_mut();

    // Background.
    for y in board.y..board.y + board.height {
        for x in board.x..board.x + board.width {
            buf[(x, y)]
                .set_symbol(" ")
                .set_style(Style::default().bg(state.theme.bg));
        }
    }

    // Interior gridlines between cells.
    if gridlines {
        let line_style = Style::default().fg(state.theme.grid_line).bg(state.theme.bg);
        for i in 1..n {
            let vx = board.x + (i * cell) as u16 * X_SCALE;
            if vx < board.x + board.width {
                for y in board.y..board.y + board.height {
                    buf[(vx, y)].set_symbol("│").set_style(line_style);
                }
            }
        }
        for i in 1..n {
            let hy = board.y + (i * cell) as u16;
            if hy < board.y + board.height {
                for x in board.x..board.x + board.width {
                    let symbol = if buf[(x, hy)].symbol() == "│" {
                        "┼"
                    } else {
                        "─"
                    };
                    buf[(x, hy)].set_symbol(symbol).set_style(line_style);
                }
            }
        }
    }

    // Blocks, then ghosts of freshly cleared cells (the fade runs over them).
    let draws: Vec<(Coord, BlockKind)> = state
        .grid
        .blocks()
        .filter_map(|(coord, id)| state.block_kind(id).map(|kind| (coord, kind)))
        .collect();
    for (coord, kind) in draws {
        fill_cell(buf, area, state, coord, block_color(state, kind));
    }
    for &(coord, kind) in cleared {
        fill_cell(buf, area, state, coord, block_color(state, kind));
    }

    // One marker per allowed spawn edge, one cell outside the grid, pointing
    // the way quads enter.
    let marker_style = Style::default().fg(state.theme.grid_line);
    for &edge in state.bag.edges() {
        let glyph = match edge {
            Direction::Top => "▾",
            Direction::Right => "◂",
            Direction::Bottom => "▴",
            Direction::Left => "▸",
        };
        let p = state.grid.direction_to_point(edge, n / 2, 1);
        let r = px_rect(area, p, cell, cell);
        if r.width > 0 && r.height > 0 {
            let cx = r.x + r.width / 2;
            let cy = r.y + r.height / 2;
            buf[(cx, cy)].set_symbol(glyph).set_style(marker_style);
        }
    }

    // Footer hints on the bottom row.
    let footer = Rect {
        x: area.x,
        y: (area.y + area.height).saturating_sub(1),
        width: area.width,
        height: 1,
    };
    Paragraph::new(Line::from(vec![
        Span::styled(
            format!("Blocks: {}   ", state.blocks.alive()),
            Style::default().fg(state.theme.main_fg),
        ),
        Span::styled("←↑↓→/hjkl", Style::default().fg(state.theme.title)),
        Span::styled(" slide   ", Style::default().fg(state.theme.main_fg)),
        Span::styled("p", Style::default().fg(state.theme.title)),
        Span::styled(" pause   ", Style::default().fg(state.theme.main_fg)),
        Span::styled("q", Style::default().fg(state.theme.title)),
        Span::styled(" quit", Style::default().fg(state.theme.main_fg)),
    ]))
    .alignment(Alignment::Center)
    .render(footer, frame.buffer_mut());
}

fn draw_menu(frame: &mut Frame, state: &GameState, area: Rect) {
    let popup_w = 46u16;
    let popup_h = 16u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    let title = Line::from(vec![
        Span::styled(" Quadrix ", Style::default().fg(Color::Rgb(255, 120, 120)).bold()),
        Span::styled(" tui ", Style::default().fg(state.theme.main_fg).bold()),
    ]);

    let edges: Vec<String> = state.bag.edges().iter().map(Direction::to_string).collect();
    let n = state.grid.num_cells();

    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(Span::styled(
            " Quads slide in from the edges. ",
            Style::default().fg(state.theme.main_fg),
        )),
        Line::from(Span::styled(
            " Shift the field; lone blocks crumble away. ",
            Style::default().fg(state.theme.main_fg),
        )),
        Line::from(Span::styled(
            " The pale quad in the middle never breaks. ",
            Style::default().fg(state.theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Field {}×{} ", n, n),
            Style::default().fg(state.theme.title).bold(),
        )),
        Line::from(Span::styled(
            format!(" Spawn edges: {} ", edges.join(", ")),
            Style::default().fg(state.theme.main_fg),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ENTER ", Style::default().fg(state.theme.level_color(3))),
            Span::from("START   "),
            Span::styled(" Q ", Style::default().fg(Color::Rgb(255, 80, 80))),
            Span::from("QUIT"),
        ]),
    ];

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.grid_line).bg(state.theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, state: &GameState, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(state.theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.grid_line).bg(state.theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, area: Rect) {
    let popup_w = 32u16;
    let popup_h = 8u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Field jammed ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Blocks cleared: {} ", state.removed),
            Style::default().fg(state.theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R — Restart    Q — Quit ",
            Style::default().fg(state.theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(state.theme.grid_line).bg(state.theme.bg))
            .title(Span::styled(" Quadrixtui ", state.theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Buffer positions covered by the cleared cells' pixel squares.
fn cleared_buffer_positions(
    area: Rect,
    state: &GameState,
    cleared: &[(Coord, BlockKind)],
) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    let cell = state.grid.cell_size();
    for &(coord, _) in cleared {
        let r = px_rect(area, state.grid.coord_to_point(coord), cell, cell);
        for x in r.x..r.x + r.width {
            for y in r.y..r.y + r.height {
                set.insert((x, y));
            }
        }
    }
    set
}

/// Create or update the cleanup fade effect and process it (TachyonFX: fade
/// the ghost cells to the background).
fn apply_cleanup_effect(
    frame: &mut Frame,
    state: &GameState,
    area: Rect,
    cleared: &[(Coord, BlockKind)],
    cleanup_effect: &mut Option<Effect>,
    cleanup_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let board = grid_rect(area, state);
    let delta = cleanup_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *cleanup_process_time = Some(now);

    if cleanup_effect.is_none() {
        let fading_set = cleared_buffer_positions(area, state, cleared);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            fading_set.contains(&(pos.x, pos.y))
        }));
        let bg = state.theme.bg;
        let effect = fx::fade_to(bg, bg, (CLEANUP_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        *cleanup_effect = Some(effect);
    }

    if let Some(effect) = cleanup_effect {
        frame.render_effect(effect, board, tfx_delta);
    }
}
