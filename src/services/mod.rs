pub mod llm_service;
pub mod output_service;
pub mod structured;

pub use llm_service::{LlmBackend, LlmService};
pub use output_service::{FileOutputManager, OutputManager};
pub use structured::{format_instructions, parse_structured, request_structured};
