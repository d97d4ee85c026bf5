pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, draw_status};
pub use header::draw_header;
pub use utils::{format_date, priority_color, truncate, wrap};
