// UI and formatting module

pub mod host_view;
pub mod progress;
pub mod report_view;

// Re-export commonly used items for cleaner imports
pub use host_view::print_host_info;
pub use progress::{clear_line, show_progress_bar, show_run_progress};
pub use report_view::{colorize_state, print_report};
