//! CLI command implementations.

mod batch;
mod decode;
mod encode;
mod scan;
mod template;

pub use batch::batch;
pub use decode::decode;
pub use encode::encode;
pub use scan::scan;
pub use template::template;
