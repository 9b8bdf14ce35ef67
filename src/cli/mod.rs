pub mod image;
pub mod output;

pub use image::{execute, CommandName, ImageArgs};
pub use output::{print_failure, print_result, FailureRecord, OutputFormat};
