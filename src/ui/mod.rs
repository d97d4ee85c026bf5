pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let [header_area, content_area, status_area, footer_area] = Layout::vertical([
    Constraint::Length(1), // Header
    Constraint::Min(1),    // Current view
    Constraint::Length(1), // Last error
    Constraint::Length(1), // Breadcrumb
  ])
  .areas(frame.area());

  renderfns::draw_header(
    frame,
    header_area,
    app.title(),
    app.api_url(),
    app.list_stats(),
    &app.shortcuts(),
  );

  let status = app.status_message();
  let breadcrumb = app.view_breadcrumb();

  if let Some(view) = app.current_view_mut() {
    view.render(frame, content_area);
  }
  app.command_input().render_overlay(frame, content_area);

  renderfns::draw_status(frame, status_area, status.as_deref());
  renderfns::draw_footer(frame, footer_area, &breadcrumb);
}
