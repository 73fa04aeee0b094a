use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use rental_core::{
    Customer, RecordKind, SharedRegistry, TransactionOutcome, Vehicle, VehicleKind, VehicleStatus,
};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::command::{self, Command, USAGE};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_COMMAND_LEN: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Vehicles,
    Customers,
    History,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Vehicles, Tab::Customers, Tab::History];

    fn title(&self) -> &'static str {
        match self {
            Tab::Vehicles => "Vehicles",
            Tab::Customers => "Customers",
            Tab::History => "History",
        }
    }

    fn index(&self) -> usize {
        Tab::ALL.iter().position(|tab| tab == self).unwrap_or(0)
    }

    fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }
}

/// Single-line command input with a cursor.
#[derive(Debug, Clone)]
struct CommandPrompt {
    input: String,
    cursor: usize,
}

impl CommandPrompt {
    fn new(seed: String) -> Self {
        let cursor = seed.len();
        Self {
            input: seed,
            cursor,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, self.input.len() as isize) as usize;
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_COMMAND_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.input.insert(self.cursor, ch);
            self.cursor += 1;
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
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front end over a shared registry.
pub struct RentalApp {
    registry: SharedRegistry,
    tab: Tab,
    status_filter: Option<VehicleStatus>,
    cursor: usize,
    list_height: usize,
    prompt: Option<CommandPrompt>,
    status: String,
    should_quit: bool,
}

impl RentalApp {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            tab: Tab::Vehicles,
            status_filter: None,
            cursor: 0,
            list_height: 1,
            prompt: None,
            status: "Ready".to_string(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let (vehicles, customers, records) = self.registry.read(|registry| {
            (
                registry.vehicle_count(),
                registry.customer_count(),
                registry.history_len(),
            )
        });
        self.set_status(format!(
            "Loaded {vehicles} vehicles, {customers} customers, {records} records • ':' for commands, '?' for help"
        ));

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
            if self.should_quit {
                break;
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(Event::Key(key))) => {
                    if let Err(err) = self.handle_key(key) {
                        self.set_status(format!("Error: {err}"));
                    }
                }
                Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => {}
                None => break,
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Tab => self.switch_tab(self.tab.next()),
            KeyCode::Char('1') => self.switch_tab(Tab::Vehicles),
            KeyCode::Char('2') => self.switch_tab(Tab::Customers),
            KeyCode::Char('3') => self.switch_tab(Tab::History),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::PageDown => self.move_cursor(self.list_height as isize),
            KeyCode::PageUp => self.move_cursor(-(self.list_height as isize)),
            KeyCode::Char('f') if self.tab == Tab::Vehicles => self.cycle_filter(),
            KeyCode::Char(':') => self.prompt = Some(CommandPrompt::new(String::new())),
            KeyCode::Char('r') => self.prompt_for("rent"),
            KeyCode::Char('t') => self.prompt_for("return"),
            KeyCode::Char('?') => self.set_status(USAGE.to_string()),
            _ => {}
        }
        Ok(())
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.set_status("Command cancelled".to_string());
            }
            KeyCode::Enter => {
                let line = prompt.input.trim().to_string();
                self.prompt = None;
                if !line.is_empty() {
                    let message = self.execute(&line)?;
                    self.set_status(message);
                }
            }
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.input.len(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    prompt.insert(ch);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Open the prompt seeded with `verb` and the selected vehicle's plate.
    fn prompt_for(&mut self, verb: &str) {
        let seed = match self.selected_plate() {
            Some(plate) => format!("{verb} {plate} "),
            None => format!("{verb} "),
        };
        self.prompt = Some(CommandPrompt::new(seed));
    }

    fn selected_plate(&self) -> Option<String> {
        if self.tab != Tab::Vehicles {
            return None;
        }
        self.registry
            .vehicles(self.status_filter)
            .get(self.cursor)
            .map(|vehicle| vehicle.plate().to_string())
    }

    fn execute(&mut self, line: &str) -> Result<String> {
        let command = command::parse(line)?;
        info!(command = line, "Executing command");
        let today = Local::now().date_naive();
        let message = match command {
            Command::AddVehicle {
                plate,
                kind,
                make,
                model,
                year,
            } => {
                let vehicle = Vehicle::new(plate.clone(), kind, &make, &model, year)?;
                if self.registry.add_vehicle(vehicle) {
                    format!("Vehicle {plate} added")
                } else {
                    format!("A vehicle with plate {plate} already exists")
                }
            }
            Command::AddCustomer { id, name } => {
                if self.registry.add_customer(Customer::new(id, &name)?) {
                    format!("Customer {id} added")
                } else {
                    format!("A customer with id {id} already exists")
                }
            }
            Command::Rent {
                plate,
                customer_id,
                amount,
                date,
            } => {
                let outcome = self.registry.rent_vehicle(
                    &plate,
                    customer_id,
                    date.unwrap_or(today),
                    amount,
                );
                self.describe(outcome, customer_id)
            }
            Command::Return {
                plate,
                customer_id,
                extra_fees,
                date,
            } => {
                let outcome = self.registry.return_vehicle(
                    &plate,
                    customer_id,
                    date.unwrap_or(today),
                    extra_fees,
                );
                self.describe(outcome, customer_id)
            }
            Command::SetStatus { plate, status } => match self.registry.set_status(&plate, status) {
                Some(previous) => format!(
                    "{} status changed from {} to {}",
                    plate.to_uppercase(),
                    previous.label(),
                    status.label()
                ),
                None => format!("No vehicle with plate {}", plate.to_uppercase()),
            },
        };
        Ok(message)
    }

    fn describe(&self, outcome: TransactionOutcome, customer_id: i32) -> String {
        let customer = self
            .registry
            .customer(customer_id)
            .map(|customer| customer.name().to_string())
            .unwrap_or_default();
        match outcome {
            TransactionOutcome::Completed(record) => match record.kind() {
                RecordKind::Rent => {
                    format!("Vehicle {} rented to {customer}", record.plate())
                }
                RecordKind::Return => {
                    format!("Vehicle {} returned by {customer}", record.plate())
                }
            },
            TransactionOutcome::NotAvailable(status) => {
                format!("Vehicle is not available for renting ({})", status.label())
            }
            TransactionOutcome::NotRented(status) => {
                format!("Vehicle is not rented ({})", status.label())
            }
            TransactionOutcome::VehicleNotFound | TransactionOutcome::CustomerNotFound => {
                "Vehicle or customer not found".to_string()
            }
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.cursor = 0;
    }

    fn cycle_filter(&mut self) {
        self.status_filter = match self.status_filter {
            None => Some(VehicleStatus::ALL[0]),
            Some(current) => VehicleStatus::ALL
                .iter()
                .position(|status| *status == current)
                .and_then(|index| VehicleStatus::ALL.get(index + 1))
                .copied(),
        };
        self.cursor = 0;
        let label = self
            .status_filter
            .map(|status| status.label())
            .unwrap_or("All");
        self.set_status(format!("Showing: {label}"));
    }

    fn row_count(&self) -> usize {
        let filter = self.status_filter;
        self.registry.read(|registry| match self.tab {
            Tab::Vehicles => registry.list_vehicles(filter).count(),
            Tab::Customers => registry.customer_count(),
            Tab::History => registry.list_history().count(),
        })
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.row_count();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, len as isize - 1) as usize;
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(size);

        let titles: Vec<Line> = Tab::ALL.iter().map(|tab| Line::from(tab.title())).collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Rental Desk"))
            .select(self.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, chunks[0]);

        self.render_rows(frame, chunks[1]);
        self.render_status(frame, chunks[2]);
        if let Some(prompt) = &self.prompt {
            render_prompt(frame, prompt);
        }
    }

    fn render_rows(&mut self, frame: &mut Frame, area: Rect) {
        self.list_height = area.height.saturating_sub(2) as usize;
        let filter = self.status_filter;
        let (title, rows): (String, Vec<String>) = self.registry.read(|registry| match self.tab {
            Tab::Vehicles => {
                let label = filter.map(|status| status.label()).unwrap_or("All");
                (
                    format!("Vehicles · {label}"),
                    registry.list_vehicles(filter).map(vehicle_row).collect(),
                )
            }
            Tab::Customers => (
                "Customers".to_string(),
                registry.list_customers().map(customer_row).collect(),
            ),
            Tab::History => (
                "Rental History".to_string(),
                registry
                    .list_history()
                    .map(|entry| {
                        format!(
                            "{:<7} {:<7} {:<20} {} {:>10}",
                            entry.record.kind().as_str(),
                            entry.vehicle.plate(),
                            entry.customer.name(),
                            entry.record.date(),
                            format!("${:.2}", entry.record.amount())
                        )
                    })
                    .collect(),
            ),
        });

        if rows.is_empty() {
            let empty = match self.tab {
                Tab::Vehicles => "No vehicles found.",
                Tab::Customers => "No customers found.",
                Tab::History => "No rental history found.",
            };
            let paragraph =
                Paragraph::new(empty).block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(paragraph, area);
            return;
        }

        self.cursor = cmp::min(self.cursor, rows.len() - 1);
        let items: Vec<ListItem> = rows
            .into_iter()
            .map(|row| ListItem::new(Line::from(Span::raw(row))))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        let mut state = ListState::default();
        state.select(Some(self.cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let hints = "Tab/1-3 switch  j/k move  f filter  r rent  t return  : command  q quit";
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn vehicle_row(vehicle: &Vehicle) -> String {
    let details = match vehicle.kind() {
        VehicleKind::Car { seats } => format!("{seats} seats"),
        VehicleKind::Minibus { accessible } => {
            if *accessible {
                "accessible".to_string()
            } else {
                "not accessible".to_string()
            }
        }
        VehicleKind::PickupTruck {
            cargo_size,
            has_trailer,
        } => format!(
            "cargo {cargo_size}{}",
            if *has_trailer { ", trailer" } else { "" }
        ),
    };
    format!(
        "{:<13} {:<7} {:<12} {:<12} {:<5} {:<18} {details}",
        vehicle.kind().label(),
        vehicle.plate(),
        vehicle.make(),
        vehicle.model(),
        vehicle.year(),
        vehicle.status().label(),
    )
}

fn customer_row(customer: &Customer) -> String {
    format!("{:>6}  {}", customer.id(), customer.name())
}

fn render_prompt(frame: &mut Frame, prompt: &CommandPrompt) {
    let frame_area = frame.size();
    let width = cmp::max(cmp::min(90_u16, frame_area.width.saturating_sub(4)), 24);
    let height = 5_u16.min(frame_area.height);
    let x = frame_area.x + frame_area.width.saturating_sub(width) / 2;
    let y = frame_area.y + frame_area.height.saturating_sub(height) / 2;
    let area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(": ", Style::default().fg(Color::Cyan)),
            Span::raw(prompt.input.clone()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" run  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Command"));
    frame.render_widget(paragraph, area);

    let cursor_x = (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
    frame.set_cursor(cursor_x, area.y + 1);
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
                Err(err) => {
                    error!(?err, "Terminal input failed");
                    break;
                }
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(err) => {
                error!(?err, "Terminal poll failed");
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use rental_core::{FlatFileStore, Registry};
    use tempfile::tempdir;

    fn test_registry(dir: &Path) -> SharedRegistry {
        SharedRegistry::new(Registry::open(FlatFileStore::new(dir)))
    }

    #[test]
    fn commands_drive_the_registry() -> Result<()> {
        let dir = tempdir()?;
        let mut app = RentalApp::new(test_registry(dir.path()));

        assert_eq!(
            app.execute("car abc123 toyota corolla 2020 5")?,
            "Vehicle ABC123 added"
        );
        assert_eq!(
            app.execute("car ABC123 ford focus 2015 5")?,
            "A vehicle with plate ABC123 already exists"
        );
        assert_eq!(app.execute("customer 1 Jane")?, "Customer 1 added");
        assert_eq!(
            app.execute("rent abc123 1 50 2024-01-01")?,
            "Vehicle ABC123 rented to Jane"
        );
        assert_eq!(
            app.execute("rent ABC123 1 50")?,
            "Vehicle is not available for renting (Rented)"
        );
        assert_eq!(
            app.execute("return ABC123 1 10 2024-01-05")?,
            "Vehicle ABC123 returned by Jane"
        );
        assert_eq!(
            app.execute("return ABC123 9 0")?,
            "Vehicle or customer not found"
        );
        assert_eq!(app.registry.read(|registry| registry.history_len()), 2);
        Ok(())
    }

    #[test]
    fn filter_cycles_through_every_status() -> Result<()> {
        let dir = tempdir()?;
        let mut app = RentalApp::new(test_registry(dir.path()));
        let mut seen = Vec::new();
        for _ in 0..=VehicleStatus::ALL.len() {
            app.cycle_filter();
            seen.push(app.status_filter);
        }
        assert_eq!(seen.first(), Some(&Some(VehicleStatus::Available)));
        assert_eq!(seen.last(), Some(&None));
        Ok(())
    }

    #[test]
    fn prompt_is_seeded_with_selected_plate() -> Result<()> {
        let dir = tempdir()?;
        let mut app = RentalApp::new(test_registry(dir.path()));
        app.execute("minibus MIN001 ford transit 2018 true")?;
        app.prompt_for("rent");
        assert_eq!(
            app.prompt.as_ref().map(|prompt| prompt.input.as_str()),
            Some("rent MIN001 ")
        );
        Ok(())
    }
}
