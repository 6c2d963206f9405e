use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use fleet_core::{
    command::{parse_days, parse_rate},
    FleetError, FleetHandle, Quote, Vehicle,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::report;

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 48;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            danger: Color::Red,
        }
    }
}

/// Single-line text field with a byte cursor (ASCII input only).
#[derive(Debug, Clone)]
struct TextInput {
    label: &'static str,
    input: String,
    cursor: usize,
}

impl TextInput {
    fn new(label: &'static str, default: &str) -> Self {
        Self {
            label,
            input: default.to_string(),
            cursor: default.len(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_INPUT_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.input.insert(self.cursor, ch);
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }

    fn value(&self) -> String {
        self.input.trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormKind {
    Rent { vehicle_id: String },
    Add,
}

#[derive(Debug, Clone)]
struct Form {
    kind: FormKind,
    title: String,
    fields: Vec<TextInput>,
    focus: usize,
}

impl Form {
    fn rent(vehicle: &Vehicle) -> Self {
        Self {
            kind: FormKind::Rent {
                vehicle_id: vehicle.id.clone(),
            },
            title: format!("Rent {} ({})", vehicle.display_name(), vehicle.id),
            fields: vec![
                TextInput::new("Customer name", ""),
                TextInput::new("Rental days", "1"),
            ],
            focus: 0,
        }
    }

    fn add() -> Self {
        Self {
            kind: FormKind::Add,
            title: "Add a Car".to_string(),
            fields: vec![
                TextInput::new("Car ID", ""),
                TextInput::new("Brand", ""),
                TextInput::new("Model", ""),
                TextInput::new("Price per day", ""),
            ],
            focus: 0,
        }
    }

    fn focused(&mut self) -> &mut TextInput {
        &mut self.fields[self.focus]
    }

    fn move_focus(&mut self, delta: isize) {
        let len = self.fields.len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    fn on_last_field(&self) -> bool {
        self.focus + 1 == self.fields.len()
    }

    fn value(&self, idx: usize) -> String {
        self.fields.get(idx).map(TextInput::value).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
enum Modal {
    Form(Form),
    ConfirmRent { quote: Quote, renter_name: String },
    ConfirmReturn { vehicle_id: String, renter_name: String },
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Interactive rental desk.
pub struct FleetApp {
    fleet: FleetHandle,
    state: UiState,
    modal: Option<Modal>,
    theme: Theme,
}

impl FleetApp {
    pub fn new(fleet: FleetHandle) -> Self {
        Self {
            fleet,
            state: UiState::default(),
            modal: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.reload();
        let (total, available) = {
            let fleet = self.fleet.lock();
            (fleet.vehicles().len(), fleet.list_available().len())
        };
        self.state
            .set_status(format!("Loaded {total} cars ({available} available)"));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(Event::Key(key))) => {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
                Some(AppEvent::Input(_)) => {}
                Some(AppEvent::Tick) => self.handle_tick(),
                None => break,
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn reload(&mut self) {
        let fleet = self.fleet.lock();
        let vehicles = if self.state.available_only {
            fleet.list_available()
        } else {
            fleet.vehicles().to_vec()
        };
        drop(fleet);
        self.state.set_vehicles(vehicles);
    }

    fn handle_tick(&mut self) {
        self.state.clock = Local::now().format("%H:%M:%S").to_string();
    }

    fn report_error(&mut self, err: &FleetError) {
        error!(error = %err, "Operation failed");
        self.state.set_status(report::error(err));
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return;
        }
        match self.modal.take() {
            Some(Modal::Form(form)) => self.handle_form_key(form, key),
            Some(Modal::ConfirmRent { quote, renter_name }) => {
                self.handle_confirm_rent_key(quote, renter_name, key)
            }
            Some(Modal::ConfirmReturn {
                vehicle_id,
                renter_name,
            }) => self.handle_confirm_return_key(vehicle_id, renter_name, key),
            None => self.handle_browse_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1),
            KeyCode::Char('g') | KeyCode::Home => self.state.move_to(0),
            KeyCode::Char('G') | KeyCode::End => self.state.move_to_end(),
            KeyCode::PageDown => self.state.move_cursor(self.state.list_height as isize),
            KeyCode::PageUp => self.state.move_cursor(-(self.state.list_height as isize)),
            KeyCode::Char('a') => {
                self.state.available_only = !self.state.available_only;
                self.reload();
                self.state.set_status(if self.state.available_only {
                    "Showing available cars".to_string()
                } else {
                    "Showing all cars".to_string()
                });
            }
            KeyCode::Char('r') => self.begin_rent(),
            KeyCode::Char('t') => self.begin_return(),
            KeyCode::Char('n') => {
                self.modal = Some(Modal::Form(Form::add()));
                self.state.set_status("Enter the new car's details".to_string());
            }
            _ => {}
        }
    }

    fn begin_rent(&mut self) {
        let Some(vehicle) = self.state.current_vehicle().cloned() else {
            self.state.set_status("No car selected".to_string());
            return;
        };
        if !vehicle.available {
            self.report_error(&FleetError::NotAvailable(vehicle.id));
            return;
        }
        self.modal = Some(Modal::Form(Form::rent(&vehicle)));
        self.state.set_status("Enter customer name and rental days".to_string());
    }

    fn begin_return(&mut self) {
        let Some(vehicle) = self.state.current_vehicle().cloned() else {
            self.state.set_status("No car selected".to_string());
            return;
        };
        let renter_name = self
            .fleet
            .lock()
            .active_rental_for(&vehicle.id)
            .map(|rental| rental.renter.name.clone());
        match renter_name {
            Some(renter_name) => {
                self.modal = Some(Modal::ConfirmReturn {
                    vehicle_id: vehicle.id,
                    renter_name,
                });
            }
            None => self.report_error(&FleetError::NotRented(vehicle.id)),
        }
    }

    fn handle_form_key(&mut self, mut form: Form, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.state.set_status(match form.kind {
                    FormKind::Rent { .. } => "Rental canceled.".to_string(),
                    FormKind::Add => "Add canceled.".to_string(),
                });
                return;
            }
            KeyCode::Enter if form.on_last_field() => {
                self.submit_form(form);
                return;
            }
            KeyCode::Enter | KeyCode::Tab | KeyCode::Down => form.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(-1),
            KeyCode::Left => form.focused().move_cursor(-1),
            KeyCode::Right => form.focused().move_cursor(1),
            KeyCode::Home => form.focused().move_home(),
            KeyCode::End => form.focused().move_end(),
            KeyCode::Backspace => form.focused().backspace(),
            KeyCode::Delete => form.focused().delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    form.focused().insert(ch);
                }
            }
            _ => {}
        }
        self.modal = Some(Modal::Form(form));
    }

    fn submit_form(&mut self, form: Form) {
        match &form.kind {
            FormKind::Rent { vehicle_id } => {
                let renter_name = form.value(0);
                let days = match parse_days(&form.value(1)) {
                    Ok(days) => days,
                    Err(err) => {
                        self.state.set_status(format!("{err}"));
                        self.modal = Some(Modal::Form(form));
                        return;
                    }
                };
                let quote = self.fleet.lock().quote(vehicle_id, days);
                match quote {
                    Ok(quote) => {
                        self.state.set_status("Confirm rental (Y/N)".to_string());
                        self.modal = Some(Modal::ConfirmRent { quote, renter_name });
                    }
                    Err(err) => self.report_error(&err),
                }
            }
            FormKind::Add => {
                let rate = match parse_rate(&form.value(3)) {
                    Ok(rate) => rate,
                    Err(err) => {
                        self.state.set_status(format!("{err}"));
                        self.modal = Some(Modal::Form(form));
                        return;
                    }
                };
                let vehicle = Vehicle::new(form.value(0), form.value(1), form.value(2), rate);
                let id = vehicle.id.clone();
                let result = self.fleet.lock().add_vehicle(vehicle);
                match result {
                    Ok(()) => {
                        info!(vehicle_id = %id, "Car added from desk");
                        self.reload();
                        self.state.select(&id);
                        self.state.set_status(format!("Car {id} added successfully"));
                    }
                    Err(err) => self.report_error(&err),
                }
            }
        }
    }

    fn handle_confirm_rent_key(&mut self, quote: Quote, renter_name: String, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let result = self
                    .fleet
                    .lock()
                    .rent(&quote.vehicle_id, &renter_name, quote.days);
                match result {
                    Ok(receipt) => {
                        self.reload();
                        self.state.set_status(format!(
                            "Car rented successfully to {} ({}), total {:.2}",
                            receipt.renter.name, receipt.renter.id, receipt.total
                        ));
                    }
                    Err(err) => self.report_error(&err),
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state.set_status("Rental canceled.".to_string());
            }
            _ => self.modal = Some(Modal::ConfirmRent { quote, renter_name }),
        }
    }

    fn handle_confirm_return_key(&mut self, vehicle_id: String, renter_name: String, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let result = self.fleet.lock().return_vehicle(&vehicle_id);
                match result {
                    Ok(renter) => {
                        self.reload();
                        self.state
                            .set_status(report::returned(&vehicle_id, &renter).trim_end().to_string());
                    }
                    Err(err) => self.report_error(&err),
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state.set_status("Return canceled.".to_string());
            }
            _ => {
                self.modal = Some(Modal::ConfirmReturn {
                    vehicle_id,
                    renter_name,
                })
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(size);

        self.render_header(frame, chunks[0]);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        self.render_vehicle_list(frame, body[0]);
        self.render_vehicle_info(frame, body[1]);
        self.render_status(frame, chunks[2]);
        self.render_help(frame, chunks[3]);

        match &self.modal {
            Some(Modal::Form(form)) => self.render_form(frame, form),
            Some(Modal::ConfirmRent { quote, renter_name }) => {
                let text = report::quote(quote, Some(renter_name));
                self.render_confirm(frame, "Rental Information", &text, "Confirm rental");
            }
            Some(Modal::ConfirmReturn {
                vehicle_id,
                renter_name,
            }) => {
                let text = format!("Car {vehicle_id} is rented by {renter_name}.\n");
                self.render_confirm(frame, "Return a Car", &text, "Confirm return");
            }
            None => {}
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let fleet = self.fleet.lock();
        let total = fleet.vehicles().len();
        let rented = fleet.active_rentals().len();
        drop(fleet);

        let line = Line::from(vec![
            Span::styled(
                "Car Rental System",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  {total} cars · {rented} rented · {} available",
                    total.saturating_sub(rented)
                ),
                Style::default().fg(self.theme.muted),
            ),
            Span::raw(format!("  {}", self.state.clock)),
        ]);
        let header = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        frame.render_widget(header, area);
    }

    fn render_vehicle_list(&mut self, frame: &mut Frame, area: Rect) {
        self.state.list_height = area.height.saturating_sub(2) as usize;
        self.state.clamp_cursor();
        self.state.ensure_cursor_visible();

        let mut list_state = ListState::default();
        let vehicles = self.state.visible_vehicles();
        if !vehicles.is_empty() {
            let selected = self
                .state
                .cursor
                .saturating_sub(self.state.offset)
                .min(vehicles.len().saturating_sub(1));
            list_state.select(Some(selected));
        }

        let items: Vec<ListItem> = vehicles
            .iter()
            .enumerate()
            .map(|(idx, vehicle)| {
                let is_selected = self.state.cursor == self.state.offset + idx;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let (badge, color) = if vehicle.available {
                    ("available", self.theme.success)
                } else {
                    ("rented   ", self.theme.danger)
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::styled(badge, Style::default().fg(color)),
                    Span::styled(
                        format!(" {:<8}", vehicle.id),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(" {:<24}", vehicle.display_name())),
                    Span::styled(
                        format!("{:>9.2}/day", vehicle.base_rate_per_day),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();

        let title = if self.state.available_only {
            "Available Cars"
        } else {
            "All Cars"
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_vehicle_info(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(vehicle) = self.state.current_vehicle() else {
            let paragraph = Paragraph::new("No cars yet. Press n to add one.").block(block);
            frame.render_widget(paragraph, area);
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                vehicle.display_name(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Car ID: {}", vehicle.id)),
            Line::from(format!("Price per day: {:.2}", vehicle.base_rate_per_day)),
        ];
        let fleet = self.fleet.lock();
        match fleet.active_rental_for(&vehicle.id) {
            Some(rental) => {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Rented",
                    Style::default().fg(self.theme.danger),
                )));
                lines.push(Line::from(format!(
                    "Customer: {} ({})",
                    rental.renter.name, rental.renter.id
                )));
                lines.push(Line::from(format!("Days: {}", rental.days)));
                lines.push(Line::from(format!(
                    "Since: {}",
                    rental
                        .opened_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M")
                )));
            }
            None => {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Available",
                    Style::default().fg(self.theme.success),
                )));
            }
        }
        drop(fleet);

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(Line::from(self.state.status.clone()))
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let keys = [
            ("j/k", "move"),
            ("r", "rent"),
            ("t", "return"),
            ("n", "add car"),
            ("a", "available only"),
            ("q", "quit"),
        ];
        let mut spans = Vec::new();
        for (key, action) in keys {
            spans.push(Span::styled(key, Style::default().add_modifier(Modifier::BOLD)));
            spans.push(Span::styled(
                format!(" {action}  "),
                Style::default().fg(self.theme.muted),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_form(&self, frame: &mut Frame, form: &Form) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(60_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let height = (form.fields.len() as u16 + 4).min(frame_area.height);
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let label_width = form
            .fields
            .iter()
            .map(|field| field.label.len())
            .max()
            .unwrap_or(0);
        let mut lines: Vec<Line> = form
            .fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let style = if idx == form.focus {
                    Style::default().fg(self.theme.accent)
                } else {
                    Style::default().fg(self.theme.muted)
                };
                Line::from(vec![
                    Span::styled(format!("{:<label_width$}: ", field.label), style),
                    Span::raw(field.input.clone()),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" next/submit  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(form.title.clone()));
        frame.render_widget(paragraph, area);

        let field = &form.fields[form.focus];
        let cursor_x = (area.x + 1 + label_width as u16 + 2 + field.cursor as u16)
            .min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 1 + form.focus as u16;
        frame.set_cursor(cursor_x, cursor_y);
    }

    fn render_confirm(&self, frame: &mut Frame, title: &str, body: &str, prompt: &str) {
        let frame_area = frame.size();
        let mut lines: Vec<Line> = body.lines().map(|line| Line::from(line.to_string())).collect();
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw(format!("{prompt} ")),
            Span::styled("(Y/N)", Style::default().add_modifier(Modifier::BOLD)),
        ]));

        let width = cmp::max(cmp::min(50_u16, frame_area.width.saturating_sub(4)), 24_u16);
        let area = centered_rect(width, lines.len() as u16 + 2, frame_area);
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

struct UiState {
    vehicles: Vec<Vehicle>,
    cursor: usize,
    offset: usize,
    list_height: usize,
    available_only: bool,
    status: String,
    clock: String,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            vehicles: Vec::new(),
            cursor: 0,
            offset: 0,
            list_height: 1,
            available_only: false,
            status: "Ready".to_string(),
            clock: String::new(),
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) {
        let selected = self.current_vehicle().map(|vehicle| vehicle.id.clone());
        self.vehicles = vehicles;
        if let Some(id) = selected {
            self.select(&id);
        }
        self.clamp_cursor();
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn current_vehicle(&self) -> Option<&Vehicle> {
        self.vehicles.get(self.cursor)
    }

    fn select(&mut self, id: &str) -> bool {
        match self.vehicles.iter().position(|vehicle| vehicle.id == id) {
            Some(idx) => {
                self.cursor = idx;
                self.ensure_cursor_visible();
                true
            }
            None => false,
        }
    }

    fn visible_vehicles(&self) -> &[Vehicle] {
        let end = cmp::min(self.offset + self.list_height.max(1), self.vehicles.len());
        &self.vehicles[self.offset.min(end)..end]
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.vehicles.is_empty() {
            return;
        }
        let last = self.vehicles.len() as isize - 1;
        self.cursor = (self.cursor as isize + delta).clamp(0, last) as usize;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize) {
        self.cursor = index;
        self.clamp_cursor();
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        self.move_to(self.vehicles.len().saturating_sub(1));
    }

    fn clamp_cursor(&mut self) {
        if self.vehicles.is_empty() {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= self.vehicles.len() {
            self.cursor = self.vehicles.len() - 1;
        }
    }

    fn ensure_cursor_visible(&mut self) {
        if self.vehicles.is_empty() || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = self.vehicles.len().saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{AppConfig, FleetService};
    use tempfile::tempdir;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut FleetApp, text: &str) {
        for ch in text.chars() {
            app.handle_key(press(KeyCode::Char(ch)));
        }
    }

    fn app_with_corolla(dir: &std::path::Path) -> Result<FleetApp> {
        let mut service = FleetService::open(&AppConfig::default().with_data_dir(dir))?;
        service.add_vehicle(Vehicle::new("C001", "Toyota", "Corolla", 30.0))?;
        let mut app = FleetApp::new(FleetHandle::new(service));
        app.reload();
        Ok(app)
    }

    #[test]
    fn text_input_edits_at_the_cursor() {
        let mut input = TextInput::new("Name", "Alce");
        input.move_cursor(-2);
        input.insert('i');
        assert_eq!(input.input, "Alice");
        input.move_end();
        input.backspace();
        input.move_home();
        input.delete();
        assert_eq!(input.value(), "lic");
        input.move_cursor(-10);
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn rent_flow_asks_for_confirmation() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_with_corolla(dir.path())?;

        app.handle_key(press(KeyCode::Char('r')));
        type_text(&mut app, "Alice");
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Backspace));
        type_text(&mut app, "3");
        app.handle_key(press(KeyCode::Enter));

        match &app.modal {
            Some(Modal::ConfirmRent { quote, renter_name }) => {
                assert_eq!(renter_name, "Alice");
                assert_eq!(quote.total, 90.0);
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
        assert!(app.fleet.lock().active_rentals().is_empty());

        app.handle_key(press(KeyCode::Char('y')));
        assert!(app.modal.is_none());
        assert!(app.fleet.lock().list_available().is_empty());
        assert!(app.state.status.contains("CUS1"), "{}", app.state.status);
        Ok(())
    }

    #[test]
    fn declining_leaves_the_car_available() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_with_corolla(dir.path())?;

        app.handle_key(press(KeyCode::Char('r')));
        type_text(&mut app, "Bob");
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Char('n')));

        assert_eq!(app.state.status, "Rental canceled.");
        assert_eq!(app.fleet.lock().list_available().len(), 1);
        assert!(app.fleet.lock().renters().is_empty());
        Ok(())
    }

    #[test]
    fn return_names_the_renter_and_errors_surface() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_with_corolla(dir.path())?;

        app.handle_key(press(KeyCode::Char('t')));
        assert_eq!(app.state.status, "Car C001 was not rented.");
        assert!(app.modal.is_none());

        app.fleet
            .lock()
            .rent("C001", "Alice", std::num::NonZeroU32::new(2).expect("non-zero"))?;
        app.reload();
        app.handle_key(press(KeyCode::Char('r')));
        assert_eq!(app.state.status, "Car C001 is not available for rent.");

        app.handle_key(press(KeyCode::Char('t')));
        app.handle_key(press(KeyCode::Char('y')));
        assert_eq!(app.state.status, "Car C001 returned successfully by Alice.");
        assert_eq!(app.fleet.lock().list_available().len(), 1);
        Ok(())
    }

    #[test]
    fn add_form_rejects_duplicates() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_with_corolla(dir.path())?;

        app.handle_key(press(KeyCode::Char('n')));
        for field in ["C002", "Honda", "Civic", "45.5"] {
            type_text(&mut app, field);
            app.handle_key(press(KeyCode::Enter));
        }
        assert_eq!(app.state.status, "Car C002 added successfully");
        assert_eq!(app.state.current_vehicle().map(|v| v.id.as_str()), Some("C002"));

        app.handle_key(press(KeyCode::Char('n')));
        for field in ["C001", "Ford", "Focus", "60"] {
            type_text(&mut app, field);
            app.handle_key(press(KeyCode::Enter));
        }
        assert_eq!(app.state.status, "A car with ID C001 already exists.");
        assert_eq!(app.fleet.lock().vehicles().len(), 2);
        Ok(())
    }

    #[test]
    fn available_filter_hides_rented_cars() -> Result<()> {
        let dir = tempdir()?;
        let mut app = app_with_corolla(dir.path())?;
        app.fleet
            .lock()
            .rent("C001", "Alice", std::num::NonZeroU32::new(1).expect("non-zero"))?;

        app.handle_key(press(KeyCode::Char('a')));
        assert!(app.state.available_only);
        assert!(app.state.vehicles.is_empty());
        app.handle_key(press(KeyCode::Char('a')));
        assert_eq!(app.state.vehicles.len(), 1);
        Ok(())
    }
}
