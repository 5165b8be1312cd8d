//! Node extensions

mod doc;
mod heading;
mod paragraph;
mod text;

pub use doc::DocExtension;
pub use heading::HeadingExtension;
pub use paragraph::ParagraphExtension;
pub use text::TextExtension;
