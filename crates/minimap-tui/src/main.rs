//! Minimap viewer demo
//!
//! A read-only terminal viewer that mounts a `minimap-core` minimap next to each open file.
//! The minimap surface is sampled into half-block cells (`▀`), so one terminal cell shows two
//! 8×8 px blocks of the raster.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p minimap-tui -- notes.md other.md
//! ```
//!
//! Settings are read from `$MINIMAP_SETTINGS` if set, otherwise from
//! `<config dir>/minimap/settings.json`. A `minimap.log` file is written next to them; set
//! `MINIMAP_LOG` (e.g. `debug`) to change the log filter.
//!
//! # Shortcuts
//!
//! - Up/Down, mouse wheel: scroll one line
//! - PageUp/PageDown: scroll one page
//! - Left click / drag on the minimap: jump / follow the pointer
//! - Right click on the minimap: scale and opacity menu
//! - Tab: next file
//! - m: toggle the minimap for the current file
//! - s: toggle the minimap globally
//! - + / -: widen / narrow the minimap
//! - Esc: close the menu
//! - q / Ctrl+C: quit

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use minimap_core::menu::MenuRowKind;
use minimap_core::{
    Color as RgbColor, ContextMenu, DocumentView, EngineResponse, JsonSettingsStore, MemoryHost,
    MemoryView, MenuClick, MinimapController, MinimapEvent, RasterSurface, SettingKey,
    SettingValue, ViewHost, ViewId,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;
use std::time::Duration;

/// Terminal cell size in surface pixels.
const CELL_WIDTH: f32 = 8.0;
const CELL_HEIGHT: f32 = 16.0;

/// Each text row is one document line of this height.
const LINE_HEIGHT: f32 = CELL_HEIGHT;

const WIDTH_STEP: f32 = 20.0;
const MENU_COLUMNS: u16 = 14;

struct App {
    host: MemoryHost,
    controller: MinimapController<JsonSettingsStore>,
    views: Vec<ViewId>,
    should_quit: bool,
    status_message: String,
    minimap_area: Option<Rect>,
    menu_area: Option<Rect>,
}

impl App {
    fn new(paths: &[PathBuf], settings_path: PathBuf) -> io::Result<Self> {
        let mut host = MemoryHost::new();
        let mut controller = MinimapController::new(JsonSettingsStore::new(settings_path));
        let mut views = Vec::with_capacity(paths.len());

        for (index, path) in paths.iter().enumerate() {
            let text = fs::read_to_string(path)?;
            let id = ViewId::new(index as u64 + 1);
            let document_id = path.to_string_lossy().into_owned();
            let view = MemoryView::new(id, document_id, &text, 0.0).with_line_height(LINE_HEIGHT);
            host.insert(view);
            if !controller.on_view_opened(&mut host, id) {
                tracing::warn!(path = %path.display(), "minimap could not attach");
            }
            views.push(id);
        }

        tracing::info!(
            files = views.len(),
            settings = %controller.store().path().display(),
            "viewer started"
        );

        Ok(Self {
            host,
            controller,
            views,
            should_quit: false,
            status_message: String::new(),
            minimap_area: None,
            menu_area: None,
        })
    }

    fn active(&self) -> Option<ViewId> {
        self.host.active_view_id()
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let page = self
            .active()
            .and_then(|id| self.host.view(id))
            .map(|view| view.client_height())
            .unwrap_or(LINE_HEIGHT);

        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Esc, _) => {
                if self.controller.close_context_menu() {
                    self.status_message.clear();
                }
            }
            (KeyCode::Up, _) => self.scroll_by(-LINE_HEIGHT),
            (KeyCode::Down, _) => self.scroll_by(LINE_HEIGHT),
            (KeyCode::PageUp, _) => self.scroll_by(-page),
            (KeyCode::PageDown, _) => self.scroll_by(page),
            (KeyCode::Tab, _) => self.next_file(),
            (KeyCode::Char('m'), _) => match self.controller.toggle_active_document(&mut self.host)
            {
                Some(true) => self.status_message = "Minimap enabled for this file".to_string(),
                Some(false) => self.status_message = "Minimap disabled for this file".to_string(),
                None => {}
            },
            (KeyCode::Char('s'), _) => {
                let show = !self.controller.settings().show_minimap;
                self.apply_setting(SettingKey::ShowMinimap, SettingValue::Bool(show));
            }
            (KeyCode::Char('+'), _) | (KeyCode::Char('='), _) => {
                let width = self.controller.settings().width + WIDTH_STEP;
                self.apply_setting(SettingKey::Width, SettingValue::Number(width));
            }
            (KeyCode::Char('-'), _) => {
                let width = self.controller.settings().width - WIDTH_STEP;
                self.apply_setting(SettingKey::Width, SettingValue::Number(width));
            }
            _ => {}
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        let Some(id) = self.active() else {
            return;
        };

        if self.controller.context_menu().is_some() {
            if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                self.click_menu(mouse.column, mouse.row);
            }
            return;
        }

        match mouse.kind {
            MouseEventKind::ScrollUp => self.scroll_by(-LINE_HEIGHT),
            MouseEventKind::ScrollDown => self.scroll_by(LINE_HEIGHT),
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some((_, y)) = self.surface_point(mouse.column, mouse.row) {
                    self.controller
                        .handle_event(&mut self.host, id, MinimapEvent::PointerDown { y });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                // Dragging may leave the pane; keep following the pointer row.
                if let Some(area) = self.minimap_area {
                    let y = (f32::from(mouse.row) - f32::from(area.y)) * CELL_HEIGHT
                        + CELL_HEIGHT / 2.0;
                    self.controller
                        .handle_event(&mut self.host, id, MinimapEvent::PointerMove { y });
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.controller
                    .handle_event(&mut self.host, id, MinimapEvent::PointerUp);
            }
            MouseEventKind::Down(MouseButton::Right) => {
                if let Some((x, y)) = self.surface_point(mouse.column, mouse.row) {
                    let response = self.controller.handle_event(
                        &mut self.host,
                        id,
                        MinimapEvent::ContextMenu { x, y },
                    );
                    if let EngineResponse::OpenContextMenu { .. } = response {
                        self.status_message = "Choose a scale or opacity".to_string();
                    }
                }
            }
            _ => {}
        }
    }

    /// Map a terminal cell inside the minimap pane to surface pixels (cell centers).
    fn surface_point(&self, column: u16, row: u16) -> Option<(f32, f32)> {
        let area = self.minimap_area?;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        if !inside {
            return None;
        }
        let x = f32::from(column - area.x) * CELL_WIDTH + CELL_WIDTH / 2.0;
        let y = f32::from(row - area.y) * CELL_HEIGHT + CELL_HEIGHT / 2.0;
        Some((x, y))
    }

    fn click_menu(&mut self, column: u16, row: u16) {
        // Rows of the popup map one-to-one to menu rows; anything else lands outside the menu.
        let target = self
            .menu_area
            .zip(self.controller.context_menu())
            .and_then(|(area, menu)| {
                let inner = Block::default().borders(Borders::ALL).inner(area);
                let inside = column >= inner.x
                    && column < inner.x + inner.width
                    && row >= inner.y
                    && row < inner.y + inner.height;
                if !inside {
                    return None;
                }
                let row = menu.rows().get(usize::from(row - inner.y))?;
                Some((row.rect.x + 1.0, row.rect.center_y()))
            });
        let (x, y) = target.unwrap_or((-1.0, -1.0));

        match self.controller.menu_click(&mut self.host, x, y) {
            MenuClick::Chosen(choice) => {
                self.status_message = format!("Applied {choice:?}");
            }
            MenuClick::Closed => self.status_message.clear(),
            MenuClick::Ignored | MenuClick::NoMenu => {}
        }
    }

    fn scroll_by(&mut self, delta: f32) {
        let Some(id) = self.active() else {
            return;
        };
        if let Some(view) = self.host.view_mut(id) {
            let top = view.scroll_top();
            view.set_scroll_top(top + delta);
        }
        self.controller
            .handle_event(&mut self.host, id, MinimapEvent::Scroll);
    }

    fn next_file(&mut self) {
        let Some(current) = self.active() else {
            return;
        };
        let Some(index) = self.views.iter().position(|id| *id == current) else {
            return;
        };
        let next = self.views[(index + 1) % self.views.len()];
        if self.host.set_active(next) {
            self.controller.close_context_menu();
            self.controller.on_active_document_changed(&mut self.host);
        }
    }

    fn apply_setting(&mut self, key: SettingKey, value: SettingValue) {
        match self.controller.apply_setting(&mut self.host, key, value) {
            Ok(stored) => self.status_message = format!("{} = {stored:?}", key.as_str()),
            Err(err) => {
                tracing::warn!(key = key.as_str(), "setting rejected: {err}");
                self.status_message = format!("{err}");
            }
        }
    }

    /// Keep every view's viewport height in step with the text pane.
    fn sync_client_height(&mut self, rows: u16) {
        let client_height = f32::from(rows) * LINE_HEIGHT;
        for id in self.views.clone() {
            let Some(view) = self.host.view_mut(id) else {
                continue;
            };
            if view.client_height() == client_height {
                continue;
            }
            view.set_client_height(client_height);
            self.controller.on_view_resized(&mut self.host, id);
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // text pane
                Constraint::Length(1), // status line
                Constraint::Length(1), // shortcuts
            ])
            .split(size);

        let text_area = chunks[0];
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(text_area);
        self.sync_client_height(inner.height);

        self.render_text(frame, text_area, block);
        self.minimap_area = self.render_minimap(frame.buffer_mut(), inner);
        self.menu_area = self.render_menu(frame, size);
        self.render_status_line(frame, chunks[1]);
        self.render_shortcuts(frame, chunks[2]);
    }

    fn render_text(&self, frame: &mut Frame, area: Rect, block: Block) {
        let Some(view) = self.active().and_then(|id| self.host.view(id)) else {
            frame.render_widget(Paragraph::new("No file").block(block), area);
            return;
        };

        let background = to_terminal(view.theme());
        let first = (view.scroll_top() / LINE_HEIGHT).floor() as usize;
        let rows = usize::from(area.height.saturating_sub(2));
        let lines: Vec<Line> = (first..first + rows)
            .map_while(|line| view.line_text(line))
            .map(|text| Line::from(Span::raw(text)))
            .collect();

        let title = format!(" {} ", view.document_id());
        let paragraph = Paragraph::new(lines)
            .block(block.title(title))
            .style(Style::default().bg(background).fg(Color::Gray));
        frame.render_widget(paragraph, area);
    }

    /// Paint the active minimap into the right edge of `inner`. Returns the pane area.
    fn render_minimap(&self, buffer: &mut Buffer, inner: Rect) -> Option<Rect> {
        let id = self.active()?;
        let engine = self.controller.engine(id)?;
        if !engine.is_visible() {
            return None;
        }
        let surface = engine.surface()?;
        let background = self.host.view(id)?.theme();
        let flat = surface.flattened(background);

        let columns = ((surface.css_width() / CELL_WIDTH).ceil() as u16).min(inner.width);
        let rows = ((surface.css_height() / CELL_HEIGHT).ceil() as u16).min(inner.height);
        if columns == 0 || rows == 0 {
            return None;
        }
        let area = Rect::new(inner.x + inner.width - columns, inner.y, columns, rows);

        for row in 0..rows {
            for column in 0..columns {
                let x = f32::from(column) * CELL_WIDTH;
                let y = f32::from(row) * CELL_HEIGHT;
                let top = sample(&flat, x, y, background);
                let bottom = sample(&flat, x, y + CELL_HEIGHT / 2.0, background);
                if let Some(cell) = buffer.cell_mut((area.x + column, area.y + row)) {
                    cell.set_char('▀')
                        .set_fg(to_terminal(top))
                        .set_bg(to_terminal(bottom));
                }
            }
        }
        Some(area)
    }

    fn render_menu(&self, frame: &mut Frame, screen: Rect) -> Option<Rect> {
        let menu = self.controller.context_menu()?;
        let pane = self.minimap_area?;
        let area = menu_popup_area(menu, pane, screen);

        let lines: Vec<Line> = menu
            .rows()
            .iter()
            .map(|row| match &row.kind {
                MenuRowKind::Heading(_) => Line::from(Span::styled(
                    row.label.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                MenuRowKind::Item { checked, .. } => {
                    let mark = if *checked { "●" } else { " " };
                    Line::from(format!("{mark} {}", row.label))
                }
            })
            .collect();

        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Minimap ")),
            area,
        );
        Some(area)
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let settings = self.controller.settings();
        let status_text = match self.active().and_then(|id| self.host.view(id)) {
            Some(view) => {
                let first = (view.scroll_top() / LINE_HEIGHT).floor() as usize + 1;
                let enabled = if self.controller.is_minimap_enabled_for_file(view.document_id()) {
                    "on"
                } else {
                    "off"
                };
                let message = if self.status_message.is_empty() {
                    String::new()
                } else {
                    format!(" | {}", self.status_message)
                };
                format!(
                    " {} | Line {}/{} | minimap {} | width {} | scale {:.0}% | opacity {:.0}%{}",
                    view.document_id(),
                    first,
                    view.line_count(),
                    enabled,
                    settings.width,
                    settings.minimap_scaling * 100.0,
                    settings.minimap_opacity * 100.0,
                    message
                )
            }
            None => " No file".to_string(),
        };

        let status = Paragraph::new(status_text).style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status, area);
    }

    fn render_shortcuts(&self, frame: &mut Frame, area: Rect) {
        let shortcuts = if self.controller.context_menu().is_some() {
            "Click:choose  Esc:close"
        } else {
            "q:quit  ↑↓/PgUp/PgDn:scroll  Tab:next file  m:file on/off  s:show/hide  +/-:width  Right-click:menu"
        };

        let shortcuts_line =
            Paragraph::new(shortcuts).style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_widget(shortcuts_line, area);
    }

    fn shutdown(&mut self) {
        self.controller.shutdown(&mut self.host);
    }
}

/// Place the popup at the menu origin, shifted to stay on screen.
fn menu_popup_area(menu: &ContextMenu, pane: Rect, screen: Rect) -> Rect {
    let bounds = menu.bounds();
    let width = MENU_COLUMNS.min(screen.width);
    let height = (menu.rows().len() as u16 + 2).min(screen.height);
    let x = pane.x + (bounds.x / CELL_WIDTH) as u16;
    let y = pane.y + (bounds.y / CELL_HEIGHT) as u16;
    let x = x.min(screen.x + screen.width - width);
    let y = y.min(screen.y + screen.height - height);
    Rect::new(x, y, width, height)
}

/// Average an 8×8 px block at `(x, y)` in surface pixels of a flattened surface.
///
/// Blocks outside the surface take the `background` color.
fn sample(surface: &RasterSurface, x: f32, y: f32, background: RgbColor) -> RgbColor {
    let scale = surface.size().device_pixel_ratio;
    let x0 = (x * scale) as u32;
    let y0 = (y * scale) as u32;
    let span = ((CELL_WIDTH * scale) as u32).max(1);

    let (mut r, mut g, mut b, mut count) = (0u32, 0u32, 0u32, 0u32);
    for py in y0..y0 + span {
        for px in x0..x0 + span {
            if let Some(pixel) = surface.pixel(px, py) {
                r += u32::from(pixel.r);
                g += u32::from(pixel.g);
                b += u32::from(pixel.b);
                count += 1;
            }
        }
    }
    if count == 0 {
        return background;
    }
    RgbColor::rgb((r / count) as u8, (g / count) as u8, (b / count) as u8)
}

fn to_terminal(color: RgbColor) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

fn settings_path() -> PathBuf {
    if let Some(path) = env::var_os("MINIMAP_SETTINGS") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("minimap").join("settings.json"))
        .unwrap_or_else(|| PathBuf::from("minimap-settings.json"))
}

/// Log to a file beside the settings; the terminal belongs to the UI.
fn setup_tracing(settings_path: &Path) {
    let log_path = settings_path
        .parent()
        .map(|dir| dir.join("minimap.log"))
        .unwrap_or_else(|| PathBuf::from("minimap.log"));
    if let Some(dir) = log_path.parent() {
        let _ = fs::create_dir_all(dir);
    }

    let file: io::Result<File> = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);
    let Ok(file) = file else {
        return;
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("MINIMAP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file_path>...", args[0]);
        eprintln!("\nExample:");
        eprintln!("  {} notes.md", args[0]);
        process::exit(1);
    }
    let paths: Vec<PathBuf> = args[1..].iter().map(PathBuf::from).collect();

    let settings_path = settings_path();
    setup_tracing(&settings_path);

    // Load files before touching the terminal so read errors print normally.
    let mut app = App::new(&paths, settings_path)?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!("viewer failed: {err}");
        eprintln!("Error: {}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => app.handle_key_event(key),
                Event::Mouse(mouse) => app.handle_mouse_event(mouse),
                // The next draw picks up the new pane height.
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    Ok(())
}
