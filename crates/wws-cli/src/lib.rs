//! CLI interface for the Water Works Supply Chain assistant

mod assistant;
mod ui;


pub use assistant::{Answer, Assistant, render_prompt};
pub use ui::{
    InputCommand, PROMPT, display_banner, handle_input_with_history, parse_input, print_answer,
    print_help, print_stats,
};

// Re-export core types
pub use wws_core::{Error, Result};
