//! TUI rendering. Orchestrates all panes.

pub mod lead_detail;
pub mod lead_list;

use chrono::Local;
use prospect_core::lifecycle::LeadStatus;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::{App, CriteriaForm, Field, Mode, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);

  // Modal prompts draw over everything else.
  match &app.mode {
    Mode::Criteria(form) => draw_criteria(f, area, form),
    Mode::ConfirmSend(id) => {
      let to = app
        .selected_lead()
        .map(|r| format!("{} <{}>", r.lead.name, r.lead.email))
        .unwrap_or_else(|| id.to_string());
      draw_confirm(f, area, " Send email ", &format!("Send this email to {to}?"));
    }
    Mode::ConfirmDelete(id) => {
      let name = app
        .selected_lead()
        .map(|r| r.lead.name.clone())
        .unwrap_or_else(|| id.to_string());
      draw_confirm(f, area, " Delete lead ", &format!("Delete {name} and its draft?"));
    }
    _ => {}
  }
}

/// Colour used for a status everywhere it appears.
pub fn status_color(status: LeadStatus) -> Color {
  match status {
    LeadStatus::NoEmail => Color::DarkGray,
    LeadStatus::EmailGenerated => Color::Yellow,
    LeadStatus::EmailSent => Color::Green,
  }
}

pub fn status_label(status: LeadStatus) -> &'static str {
  match status {
    LeadStatus::NoEmail => "no email",
    LeadStatus::EmailGenerated => "draft",
    LeadStatus::EmailSent => "sent",
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " prospect  [g] find leads  [/] search  [f] filter  [q] quit",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{}  {date} ", app.session.user()),
    Style::default().fg(Color::Gray),
  );

  // Simple left-right header: pad the middle.
  let left_width = left.width() as u16;
  let right_width = right.width() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  // Split into left list pane (40%) and right detail pane (60%).
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  lead_list::draw(f, cols[0], app);

  if app.screen == Screen::LeadDetail {
    lead_detail::draw(f, cols[1], app);
  } else {
    draw_empty_detail(f, cols[1], app);
  }
}

fn draw_empty_detail(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Detail ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let hint = if app.records.is_empty() {
    "No leads yet. Press g to describe who you are looking for."
  } else {
    "Select a lead and press Enter."
  };
  f.render_widget(
    Paragraph::new(Line::from(vec![Span::styled(
      hint,
      Style::default().fg(Color::DarkGray),
    )])),
    inner,
  );
}

// ─── Modals ───────────────────────────────────────────────────────────────────

fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Length(height)])
    .flex(Flex::Center)
    .areas(area);
  let [cell] = Layout::horizontal([Constraint::Length(width)])
    .flex(Flex::Center)
    .areas(row);
  cell
}

fn field_line(label: &str, value: &str, active: bool) -> Line<'static> {
  let (label_style, cursor) = if active {
    (Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD), "_")
  } else {
    (Style::default().fg(Color::DarkGray), "")
  };
  Line::from(vec![
    Span::styled(format!("{label:<10}"), label_style),
    Span::raw(format!("{value}{cursor}")),
  ])
}

fn draw_criteria(f: &mut Frame, area: Rect, form: &CriteriaForm) {
  let popup = centered(area, area.width.saturating_sub(8).min(72), 7);
  let block = Block::default()
    .title(" Find leads ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(popup);
  f.render_widget(Clear, popup);
  f.render_widget(block, popup);

  let lines = vec![
    field_line("Looking for", &form.criteria, form.field == Field::First),
    Line::from(""),
    field_line("How many", &form.count, form.field == Field::Second),
    Line::from(""),
    Line::from(Span::styled(
      "Tab switch field  Enter search  Esc cancel",
      Style::default().fg(Color::DarkGray),
    )),
  ];
  f.render_widget(Paragraph::new(lines), inner);
}

fn draw_confirm(f: &mut Frame, area: Rect, title: &str, question: &str) {
  let width = (question.chars().count() as u16 + 6).clamp(30, area.width.max(30));
  let popup = centered(area, width, 5);
  let block = Block::default()
    .title(title.to_owned())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));
  let inner = block.inner(popup);
  f.render_widget(Clear, popup);
  f.render_widget(block, popup);

  let lines = vec![
    Line::from(question.to_owned()),
    Line::from(""),
    Line::from(Span::styled(
      "y confirm  any other key cancels",
      Style::default().fg(Color::DarkGray),
    )),
  ];
  f.render_widget(Paragraph::new(lines), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = match (&app.mode, &app.screen) {
    (Mode::Search, _) => ("SEARCH", "Type to filter  Esc clear  Enter done"),
    (Mode::Criteria(_), _) => ("FIND", "Describe the leads you want"),
    (Mode::Edit(_), _) => ("EDIT", "Tab switch field  Ctrl-S save  Esc discard"),
    (Mode::ConfirmSend(_) | Mode::ConfirmDelete(_), _) => ("CONFIRM", "y to confirm"),
    (Mode::Normal, Screen::LeadList) => (
      "LIST",
      "↑↓/jk move  ←→/np page  Enter open  / search  f filter  g find leads  q quit",
    ),
    (Mode::Normal, Screen::LeadDetail) => (
      "LEAD",
      "g generate  t tone  e edit  s send  d delete  [ ] prev/next  Esc back",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::Gray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
