//! Client-side uploader logic
//!
//! Everything a client needs before and after talking to the server:
//! local validation, the preview/submit/result state machine, and display
//! helpers. Nothing here performs I/O; the caller owns the HTTP request and
//! drives the [`Uploader`] through its transitions.

mod display;
mod state;
mod validation;

pub use display::format_file_size;
pub use state::{Notice, OptimizedResult, Preview, Submission, Uploader, UploaderState};
pub use validation::{
    validate_file, SelectedFile, UploaderConfig, UploaderError, MAX_FILE_SIZE, NOTICE_TTL,
    RESULT_TTL,
};
