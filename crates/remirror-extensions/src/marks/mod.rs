//! Mark extensions

mod bold;
mod italic;
mod link;

pub use bold::BoldExtension;
pub use italic::ItalicExtension;
pub use link::LinkExtension;
