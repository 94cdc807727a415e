use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    cell::Cell as SharedCell,
    fs::File,
    io::stdout,
    path::PathBuf,
    rc::Rc,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::filter::LevelFilter;

use powertris::catalog::{color_of, Cell, Rgb, EMPTY};
use powertris::config::GameConfig;
use powertris::game::{Game, GameEvent, GameState};
use powertris::powerup::{PowerUpEffect, PowerUpKind};

// ============================================================================
// Command Line
// ============================================================================

/// Falling-block puzzle with score-unlocked power-ups.
#[derive(Debug, Parser)]
#[command(name = "powertris", version)]
struct Cli {
    /// TOML config file (falls back to $POWERTRIS_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, help = "Board width in cells")]
    width: Option<usize>,

    #[arg(long, help = "Board height in cells")]
    height: Option<usize>,

    #[arg(long, help = "Disable power-ups")]
    no_power_ups: bool,

    #[arg(long, help = "Seed for pieces and power-up targets")]
    seed: Option<u64>,

    #[arg(long, help = "Write logs to this file")]
    log_file: Option<PathBuf>,

    #[arg(short = 'v', long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v INFO, -vv DEBUG, -vvv TRACE)")]
    verbose: u8,
}

impl Cli {
    fn game_config(&self) -> anyhow::Result<GameConfig> {
        let mut config = GameConfig::resolve(self.config.as_deref())?;
        if let Some(width) = self.width {
            config.board_width = width;
        }
        if let Some(height) = self.height {
            config.board_height = height;
        }
        if self.no_power_ups {
            config.power_ups_enabled = false;
        }
        Ok(config)
    }
}

/// The terminal belongs to the UI, so logs only go to a file when asked.
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(level)
        .init();
    Ok(())
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const PREVIEW_SIZE: usize = 4;
const FRAME_MS: u64 = 16;
const MESSAGE_MS: u64 = 2000;

fn cell_color(cell: Cell) -> Color {
    match color_of(cell) {
        Some(Rgb(r, g, b)) => Color::Rgb(r, g, b),
        None => Color::Reset,
    }
}

fn power_up_key(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::ClearRow => "1",
        PowerUpKind::ClearColumn => "2",
        PowerUpKind::SlowTime => "3",
        PowerUpKind::DoublePoints => "*",
    }
}

// ============================================================================
// App
// ============================================================================

/// Host-side state: the session plus a transient banner.
struct App {
    game: Game,
    message: Option<(String, u64)>,
    last_final_score: Rc<SharedCell<Option<u32>>>,
}

impl App {
    fn new(mut game: Game) -> Self {
        let last_final_score = Rc::new(SharedCell::new(None));
        let sink = Rc::clone(&last_final_score);
        game.on_game_over(move |score| sink.set(Some(score)));
        Self {
            game,
            message: None,
            last_final_score,
        }
    }

    fn advance(&mut self, elapsed_ms: u64) {
        self.game.advance(elapsed_ms);
        if let Some((_, remaining)) = self.message.as_mut() {
            *remaining = remaining.saturating_sub(elapsed_ms);
        }
        if matches!(self.message, Some((_, 0))) {
            self.message = None;
        }
        self.collect_messages();
    }

    fn collect_messages(&mut self) {
        for event in self.game.take_events() {
            let text = match event {
                GameEvent::PowerUpUnlocked(kind) => format!("New power-up: {}!", kind.name()),
                GameEvent::PowerUpUsed(PowerUpEffect::RowCleared(_)) => "Row cleared!".into(),
                GameEvent::PowerUpUsed(PowerUpEffect::ColumnCleared(_)) => {
                    "Column cleared!".into()
                }
                GameEvent::PowerUpUsed(PowerUpEffect::TimeSlowed { .. }) => "Time slowed!".into(),
                GameEvent::LevelUp(level) => format!("Level {level}"),
                _ => continue,
            };
            self.message = Some((text, MESSAGE_MS));
        }
    }

    fn new_game(&mut self) {
        self.last_final_score.set(None);
        self.message = None;
        self.game.start_new_game();
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, app: &App) {
    let area = frame.size();

    match app.game.state() {
        GameState::Playing => render_game(frame, app, area),
        GameState::Paused => render_paused(frame, app, area),
        GameState::GameOver => render_game_over(frame, app, area),
    }
}

fn render_game(frame: &mut Frame, app: &App, area: Rect) {
    let board = app.game.board();
    let grid_display_width = (board.width() as u16 * CELL_WIDTH) + 2;
    let grid_display_height = board.height() as u16 + 2;
    let preview_width = 12;
    let info_width = 18;
    let total_width = grid_display_width + preview_width + info_width + 4;
    let total_height = grid_display_height + 3;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    // Layout: [Grid][Preview][Info]
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(preview_width),
        Constraint::Length(info_width),
    ])
    .split(game_row);

    render_grid(frame, app, horizontal[0]);
    render_preview(frame, app, horizontal[1]);
    render_info(frame, app, horizontal[2]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let hint = match &app.message {
            Some((text, _)) => Line::from(Span::styled(text.clone(), Style::default().fg(Color::White))),
            None => Line::from(
                "←→: Move | ↑/Z: Rotate | ↓: Drop | Space: Hard drop | 1-3: Power-up | P: Pause | Q: Quit",
            ),
        };
        let controls = Paragraph::new(vec![hint])
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Powertris ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = app
        .game
        .render_grid()
        .into_iter()
        .map(|row| {
            Line::from(
                row.into_iter()
                    .map(|cell| {
                        if cell == EMPTY {
                            Span::raw(EMPTY_CHAR)
                        } else {
                            Span::styled(BLOCK_CHAR, Style::default().fg(cell_color(cell)))
                        }
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_preview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = vec![Line::from("")];

    if let Some(shape) = app.game.preview_piece() {
        for row in shape.rows().iter().filter(|row| row.iter().any(|&c| c != EMPTY)) {
            let mut spans: Vec<Span> = vec![Span::raw(" ")];
            for x in 0..PREVIEW_SIZE {
                match row.get(x) {
                    Some(&cell) if cell != EMPTY => {
                        spans.push(Span::styled(BLOCK_CHAR, Style::default().fg(cell_color(cell))))
                    }
                    _ => spans.push(Span::raw(EMPTY_CHAR)),
                }
            }
            lines.push(Line::from(spans));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let game = &app.game;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", game.score())),
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", game.lines())),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", game.level())),
        Line::from(""),
        Line::from(Span::styled("Power-ups", Style::default().fg(Color::Magenta))),
    ];

    let power_ups = game.active_power_ups();
    if power_ups.is_empty() {
        lines.push(Line::from("None"));
    }
    for kind in power_ups {
        lines.push(Line::from(format!("{} {}", power_up_key(kind), kind.name())));
    }
    if let Some(remaining) = game.power_ups().slow_remaining_ms() {
        lines.push(Line::from(Span::styled(
            format!("Slow {}s", remaining.div_ceil(1000)),
            Style::default().fg(Color::Blue),
        )));
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_game_over(frame: &mut Frame, app: &App, area: Rect) {
    render_game(frame, app, area);

    let final_score = app.last_final_score.get().unwrap_or(app.game.score());
    render_popup(
        frame,
        area,
        " Game Over ",
        vec![
            Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
            Line::from(""),
            Line::from(format!("Score: {}", final_score)),
            Line::from(format!("Lines: {}", app.game.lines())),
            Line::from(format!("Level: {}", app.game.level())),
            Line::from(""),
            hint_line("R to play again"),
            hint_line("ESC to quit"),
        ],
    );
}

fn render_paused(frame: &mut Frame, app: &App, area: Rect) {
    render_game(frame, app, area);

    render_popup(
        frame,
        area,
        " Paused ",
        vec![
            Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
            Line::from(""),
            hint_line("P to continue"),
            hint_line("ESC to quit"),
        ],
    );
}

fn hint_line(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

/// Bordered box centered over the game, sized to its content.
fn render_popup(frame: &mut Frame, area: Rect, title: &'static str, body: Vec<Line<'static>>) {
    let height = body.len() as u16 + 4;
    let mut text = vec![Line::from("")];
    text.extend(body);

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(24, height, area));
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Input
// ============================================================================

/// Returns false when the player asked to quit.
fn handle_key(app: &mut App, code: KeyCode) -> bool {
    match code {
        // Always allow quit
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return false,
        KeyCode::Char('p') | KeyCode::Char('P') => app.game.toggle_pause(),
        KeyCode::Char('r') | KeyCode::Char('R') if app.game.is_game_over() => app.new_game(),
        // Only process game controls when playing
        _ if app.game.state() == GameState::Playing => {
            let game = &mut app.game;
            match code {
                KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
                    game.move_left();
                }
                KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
                    game.move_right();
                }
                KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => game.soft_drop(),
                KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
                    game.rotate_cw();
                }
                KeyCode::Char('z') | KeyCode::Char('Z') => {
                    game.rotate_ccw();
                }
                KeyCode::Char(' ') => game.hard_drop(),
                KeyCode::Char('1') => {
                    game.activate_power_up(PowerUpKind::ClearRow);
                }
                KeyCode::Char('2') => {
                    game.activate_power_up(PowerUpKind::ClearColumn);
                }
                KeyCode::Char('3') => {
                    game.activate_power_up(PowerUpKind::SlowTime);
                }
                _ => {}
            }
        }
        _ => {}
    }
    app.collect_messages();
    true
}

// ============================================================================
// Main Loop
// ============================================================================

fn run(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> anyhow::Result<()> {
    let frame_duration = Duration::from_millis(FRAME_MS);
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, app))?;

        let timeout = frame_duration
            .checked_sub(last_frame.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !handle_key(app, key.code) {
                    return Ok(());
                }
            }
        }

        // Time only moves forward through the delta between frames.
        let now = Instant::now();
        let elapsed = now.duration_since(last_frame);
        if elapsed >= frame_duration {
            app.advance(elapsed.as_millis() as u64);
            last_frame = now;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = cli.game_config().context("failed to load game config")?;
    let game = match cli.seed {
        Some(seed) => Game::seeded(config, seed),
        None => Game::new(config),
    }
    .context("invalid game config")?;
    let mut app = App::new(game);

    enable_raw_mode().context("failed to enable raw mode")?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    if let Some(score) = app.last_final_score.get() {
        tracing::info!(score, "last game ended");
    }
    result
}
