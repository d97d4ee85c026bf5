use crate::task_list::ListStats;
use crate::ui::view::Shortcut;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use url::Url;

/// Draw the header bar: title, backend host, list figures and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  api_url: &Url,
  stats: Option<ListStats>,
  shortcuts: &[Shortcut],
) {
  let separator = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(format!(" {} ", title), Style::default().fg(Color::Cyan).bold()),
    separator(),
    Span::styled(format!(" {} ", api_host(api_url)), Style::default().fg(Color::White)),
  ];

  if let Some(stats) = stats {
    spans.push(separator());
    spans.push(Span::styled(
      format!(" {} of {} tasks ", stats.loaded, stats.total),
      Style::default().fg(Color::Yellow).bold(),
    ));
  }

  let mut shortcuts = shortcuts.to_vec();
  shortcuts.sort_by_key(|s| s.priority);
  spans.push(Span::raw(" "));
  for shortcut in &shortcuts {
    spans.push(Span::styled(format!(" <{}>", shortcut.key), Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Host and port of the backend, or the whole URL when it has no host
fn api_host(url: &Url) -> String {
  match (url.host_str(), url.port()) {
    (Some(host), Some(port)) => format!("{}:{}", host, port),
    (Some(host), None) => host.to_string(),
    _ => url.to_string(),
  }
}
