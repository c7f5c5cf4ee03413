//! Lead list pane (left panel).

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::{status_color, status_label};
use crate::app::{App, Mode, Screen};

/// Render the lead list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let page = app.current_page();
  let total = app.records.len();
  let filtering = !app.view.search().is_empty() || page.total != total;

  // Title with count and the active filter.
  let title = if filtering {
    format!(" Leads ({}/{}) · {} ", page.total, total, app.view.status())
  } else {
    format!(" Leads ({total}) ")
  };

  let border = if app.screen == Screen::LeadList {
    Color::Gray
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  // Footer: page indicator, plus the search box when in use.
  if inner_area.height > 2 {
    inner_area.height -= 1;
    let footer = Rect { y: inner_area.y + inner_area.height, height: 1, ..inner_area };

    let mut spans = vec![Span::styled(
      format!("page {}/{}", page.page, page.total_pages.max(1)),
      Style::default().fg(Color::DarkGray),
    )];
    if app.mode == Mode::Search || !app.view.search().is_empty() {
      let cursor = if app.mode == Mode::Search { "_" } else { "" };
      spans.push(Span::styled(
        format!("  /{}{cursor}", app.view.search()),
        Style::default().fg(Color::Yellow),
      ));
    }
    if app.searching {
      spans.push(Span::styled("  searching…", Style::default().fg(Color::Cyan)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), footer);
  }

  if page.is_empty() {
    let message = if total == 0 {
      "No leads yet."
    } else {
      "No leads match."
    };
    f.render_widget(
      Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
      inner_area,
    );
    return;
  }

  let items: Vec<ListItem> = page
    .items
    .iter()
    .map(|record| {
      let status = record.status();
      let busy = app.session.pending(&record.lead.id).is_some();

      let mut spans = vec![
        Span::styled("● ", Style::default().fg(status_color(status))),
        Span::raw(record.lead.name.clone()),
      ];
      if let Some(company) = record.lead.company_name() {
        spans.push(Span::styled(
          format!(" · {company}"),
          Style::default().fg(Color::DarkGray),
        ));
      }
      spans.push(Span::styled(
        format!("  {}", status_label(status)),
        Style::default().fg(status_color(status)),
      ));
      if busy {
        spans.push(Span::styled(" …", Style::default().fg(Color::Cyan)));
      }
      ListItem::new(Line::from(spans))
    })
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol(""),
    inner_area,
    &mut state,
  );
}
