//! Lead detail pane (right panel): the lead, its draft and the draft editor.

use prospect_core::lifecycle::LeadRecord;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use super::{status_color, status_label};
use crate::app::{App, EditForm, Field, Mode};

// ─── Public entry ─────────────────────────────────────────────────────────────

/// Render the detail pane into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(record) = app.selected_lead() else {
    let block = Block::default()
      .title(" Detail ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
      Paragraph::new("This lead no longer exists.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  };

  let block = Block::default()
    .title(format!(" {} ", record.lead.name))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Gray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = lead_lines(&record);
  lines.push(Line::from(""));

  match &app.mode {
    Mode::Edit(form) => lines.extend(edit_lines(form)),
    _ => lines.extend(draft_lines(app, &record)),
  }

  let para = Paragraph::new(lines)
    .wrap(Wrap { trim: false })
    .scroll((app.detail_scroll as u16, 0));
  f.render_widget(para, inner);
}

// ─── Sections ─────────────────────────────────────────────────────────────────

fn label(text: &str) -> Span<'static> {
  Span::styled(
    format!("{text:<10}"),
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  )
}

fn lead_lines(record: &LeadRecord) -> Vec<Line<'static>> {
  let lead = &record.lead;
  let mut lines = Vec::new();

  let role = match (lead.title.trim(), lead.company_name()) {
    ("", Some(company)) => company.to_owned(),
    (title, Some(company)) => format!("{title} at {company}"),
    (title, None) => title.to_owned(),
  };
  if !role.is_empty() {
    lines.push(Line::from(vec![label("role"), Span::raw(role)]));
  }
  lines.push(Line::from(vec![label("email"), Span::raw(lead.email.clone())]));

  let optional = [
    ("location", &lead.location),
    ("linkedin", &lead.linkedin_url),
    ("domain", &lead.company_domain),
  ];
  for (name, value) in optional {
    if let Some(value) = value {
      lines.push(Line::from(vec![label(name), Span::raw(value.clone())]));
    }
  }
  if let Some(snippet) = &lead.snippet {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      snippet.clone(),
      Style::default().fg(Color::Gray),
    )));
  }
  lines
}

fn draft_lines(app: &App, record: &LeadRecord) -> Vec<Line<'static>> {
  let status = record.status();
  let mut status_spans = vec![
    label("status"),
    Span::styled(status_label(status), Style::default().fg(status_color(status))),
  ];
  if let Some(sent_at) = record.sent_at {
    status_spans.push(Span::styled(
      format!("  {}", sent_at.format("%Y-%m-%d %H:%M UTC")),
      Style::default().fg(Color::DarkGray),
    ));
  }
  let mut lines = vec![Line::from(status_spans)];

  let pending = app.session.pending(&record.lead.id);
  if let Some(pending) = pending {
    lines.push(Line::from(vec![
      label(""),
      Span::styled(format!("{pending}…"), Style::default().fg(Color::Cyan)),
    ]));
  }

  if !record.is_sent() {
    lines.push(Line::from(vec![label("tone"), Span::raw(app.tone.to_string())]));
  }
  lines.push(Line::from(""));

  match &record.draft {
    Some(draft) => {
      lines.push(Line::from(vec![
        label("subject"),
        Span::styled(
          draft.content.subject.clone(),
          Style::default().add_modifier(Modifier::BOLD),
        ),
      ]));
      lines.push(Line::from(""));
      for body_line in draft.content.body.lines() {
        lines.push(Line::from(body_line.to_owned()));
      }
    }
    None => lines.push(Line::from(Span::styled(
      "No email yet.",
      Style::default().fg(Color::DarkGray),
    ))),
  }

  lines.push(Line::from(""));
  lines.push(action_hints(record, pending.is_some()));
  lines
}

/// Available actions; all of them are greyed out while one is running.
fn action_hints(record: &LeadRecord, busy: bool) -> Line<'static> {
  let on = Style::default().fg(Color::Gray);
  let off = Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM);

  if record.is_sent() {
    return Line::from(Span::styled("Sent. This lead is done.", on));
  }
  let has_draft = record.draft.is_some();
  let generate = if has_draft { "g regenerate" } else { "g generate" };

  let hints = [
    (generate, !busy),
    ("t tone", true),
    ("e edit", !busy && has_draft),
    ("s send", !busy && has_draft),
    ("d delete", !busy),
  ];
  let mut spans = Vec::new();
  for (text, enabled) in hints {
    spans.push(Span::styled(format!("{text}  "), if enabled { on } else { off }));
  }
  Line::from(spans)
}

fn edit_lines(form: &EditForm) -> Vec<Line<'static>> {
  let active = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
  let idle = Style::default().fg(Color::DarkGray);
  let (subject_style, body_style) = match form.field {
    Field::First => (active, idle),
    Field::Second => (idle, active),
  };
  let cursor = |field: Field| if form.field == field { "_" } else { "" };

  let mut lines = vec![
    Line::from(Span::styled("subject", subject_style)),
    Line::from(format!("{}{}", form.subject, cursor(Field::First))),
    Line::from(""),
    Line::from(Span::styled("body", body_style)),
  ];
  let body = format!("{}{}", form.body, cursor(Field::Second));
  for body_line in body.split('\n') {
    lines.push(Line::from(body_line.to_owned()));
  }
  lines
}
