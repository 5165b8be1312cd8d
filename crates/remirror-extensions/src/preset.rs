//! Ready-made extension lists.

use remirror_core::Extension;

use crate::behavior::GapCursorExtension;
use crate::nodes::{DocExtension, ParagraphExtension, TextExtension};

/// The minimum an editor needs: `doc`, `text`, `paragraph` and the gap
/// cursor. Append feature extensions to the returned list.
pub fn core_preset() -> Vec<Box<dyn Extension>> {
    vec![
        Box::new(DocExtension::new()),
        Box::new(TextExtension::new()),
        Box::new(ParagraphExtension::new()),
        Box::new(GapCursorExtension::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_preset_names() {
        let names: Vec<String> = core_preset().iter().map(|e| e.descriptor().name).collect();
        assert_eq!(names, ["doc", "text", "paragraph", "gapCursor"]);
    }
}
