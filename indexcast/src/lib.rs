// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    RunOptions, expand_path, format_result_line, load_registry, write_sample_config,
};

pub use indexcast_core::report::ReportFormat;
