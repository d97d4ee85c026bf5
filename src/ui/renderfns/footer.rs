use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar with the view breadcrumb
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String]) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i + 1 == breadcrumb.len() {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };
    spans.push(Span::styled(part.as_str(), style));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Draw the status line: the last error in red, or nothing
pub fn draw_status(frame: &mut Frame, area: Rect, error: Option<&str>) {
  let Some(error) = error else {
    return;
  };
  let line = Line::from(vec![
    Span::styled(" error ", Style::default().fg(Color::Black).bg(Color::Red).bold()),
    Span::styled(format!(" {}", error), Style::default().fg(Color::Red)),
  ]);
  frame.render_widget(Paragraph::new(line), area);
}
