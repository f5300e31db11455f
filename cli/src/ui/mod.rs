//! UI utilities for terminal output.

mod banner;
mod qr;
mod record;

pub use banner::print_banner;
pub use qr::print_qr_code;
pub use record::{print_record, print_warnings};
