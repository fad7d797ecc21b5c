use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use webbrowser::Browser;

use crate::app::{App, Screen};
use crate::clock::ClockState;
use crate::settings_editor::{fields, SettingsEditor};
use crate::update::{APP_VERSION, RELEASES_PAGE};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const LABEL_WIDTH: u16 = 28;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.screen {
            Screen::Timer => render_timer(self, area, buf),
            Screen::Settings(editor) => render_settings(editor, area, buf),
            Screen::UpdatePrompt { version } => render_update_prompt(version, area, buf),
        }
    }
}

fn render_timer(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1), // temperature
            Constraint::Length(1),
            Constraint::Length(1), // clock
            Constraint::Length(1),
            Constraint::Length(1), // progress
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let temp_style = match app.clock.state() {
        ClockState::Complete => Style::default().patch(bold_style).fg(Color::Green),
        _ => Style::default().patch(bold_style).fg(Color::Yellow),
    };
    Paragraph::new(Span::styled(app.temp_label.clone(), temp_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let clock_style = if app.clock.is_running() {
        bold_style
    } else {
        bold_style.add_modifier(Modifier::DIM)
    };
    Paragraph::new(Span::styled(app.timer_label(), clock_style))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    let end_secs = app.config.time4.max(1) * 60;
    let ratio = (app.clock.elapsed_secs() as f64 / end_secs as f64).clamp(0.0, 1.0);
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .label(format!("Stage {}", app.clock.current_stage()))
        .ratio(ratio)
        .render(chunks[5], buf);

    let legend = if app.clock.is_running() {
        "(space) stop / (r)eset / (q)uit"
    } else {
        "(space) start / (o)ptions / (q)uit"
    };
    Paragraph::new(Span::styled(legend, italic_style))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);
}

fn render_settings(editor: &SettingsEditor, area: Rect, buf: &mut Buffer) {
    let shown = fields();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Settings ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    block.render(area, buf);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(shown.len() as u16),
            Constraint::Length(1),
            Constraint::Min(1), // error
            Constraint::Length(2), // legend
        ])
        .split(inner);

    let focused = editor.focused();
    let lines: Vec<Line> = shown
        .iter()
        .map(|&field| {
            let value_style = if field == focused {
                Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(format!("{:<width$}", field.label(), width = LABEL_WIDTH as usize)),
                Span::styled(format!(" {} ", editor.value(field)), value_style),
            ])
        })
        .collect();
    Paragraph::new(lines).render(chunks[0], buf);

    if let Some(error) = &editor.error {
        Paragraph::new(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);
    }

    Paragraph::new(Span::styled(
        "(↑/↓) move / (←/→/space) change / (0-9) type\n(enter/esc) save / (ctrl+d) defaults",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[3], buf);
}

fn render_update_prompt(version: &str, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(vec![
        Line::from(Span::styled("Update Available", bold_style)),
        Line::from(format!("{version} is out, you are running {APP_VERSION}.")),
        Line::from("Would you like to download it?"),
    ])
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let legend = if Browser::is_available() {
        "(y)es / (n)o, skip this version / (a) never ask".to_string()
    } else {
        format!("{RELEASES_PAGE}  (n)o, skip this version / (a) never ask")
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[3], buf);
}
