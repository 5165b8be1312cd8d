//! Headings with a configurable set of levels.

use remirror_core::commands::{is_node_active, toggle_block_type};
use remirror_core::{
    CommandSpec, Extension, ExtensionContext, ExtensionDescriptor, InputRule, KeyBinding,
    NodeExtension, Tag,
};
use remirror_model::{AttributeDef, Attrs, DomOutput, NodeSpec, ParseRule};
use serde_json::{Value, json};

const ALL_LEVELS: [u64; 6] = [1, 2, 3, 4, 5, 6];

/// Contributes `heading` with a `level` attribute.
///
/// The static `levels` option limits which levels exist; commands, key
/// bindings and the `# ` input rule only produce those levels.
pub struct HeadingExtension;

impl HeadingExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeadingExtension {
    fn default() -> Self {
        Self::new()
    }
}

/// Configured levels, ignoring anything outside 1..=6
fn levels(cx: &ExtensionContext<'_>) -> Vec<u64> {
    let configured: Vec<u64> = cx
        .options
        .get("levels")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_u64)
                .filter(|l| ALL_LEVELS.contains(l))
                .collect()
        })
        .unwrap_or_default();
    if configured.is_empty() {
        ALL_LEVELS.to_vec()
    } else {
        configured
    }
}

fn level_attrs(level: u64) -> Attrs {
    Attrs::from([("level".to_string(), json!(level))])
}

fn render(attrs: &Attrs) -> DomOutput {
    match attrs.get("level").and_then(Value::as_u64) {
        Some(level) if ALL_LEVELS.contains(&level) => DomOutput::new(format!("h{level}")),
        _ => DomOutput::new("h1"),
    }
}

impl Extension for HeadingExtension {
    fn descriptor(&self) -> ExtensionDescriptor {
        ExtensionDescriptor::new("heading")
            .static_option("levels", json!(ALL_LEVELS))
            .tag(Tag::BlockNode)
            .tag(Tag::TextBlock)
            .tag(Tag::FormattingNode)
    }

    fn as_node(&self) -> Option<&dyn NodeExtension> {
        Some(self)
    }

    fn commands(&self, cx: &ExtensionContext<'_>) -> Vec<CommandSpec> {
        let levels = levels(cx);
        let default = levels[0];
        let requested = move |args: &Value| {
            let level = args.get("level").and_then(Value::as_u64).unwrap_or(default);
            levels.contains(&level).then_some(level)
        };
        let active = requested.clone();
        vec![
            CommandSpec::new("toggleHeading", move |props, args| match requested(args) {
                Some(level) => toggle_block_type(props, "heading", level_attrs(level), "paragraph"),
                None => false,
            })
            .with_active(move |state, args| {
                active(args).is_some_and(|level| is_node_active(state, "heading", &level_attrs(level)))
            }),
        ]
    }

    fn keymap(&self, cx: &ExtensionContext<'_>) -> Vec<KeyBinding> {
        levels(cx)
            .into_iter()
            .map(|level| {
                KeyBinding::new(format!("Mod-Shift-{level}"), move |props| {
                    toggle_block_type(props, "heading", level_attrs(level), "paragraph")
                })
            })
            .collect()
    }

    fn input_rules(&self, cx: &ExtensionContext<'_>) -> Vec<InputRule> {
        let levels = levels(cx);
        vec![InputRule::new(r"^(#{1,6})\s$", move |tr, m| {
            let level = m.capture(1).map_or(0, |hashes| hashes.len() as u64);
            if !levels.contains(&level) {
                return false;
            }
            tr.delete(m.from, m.to)
                .and_then(|tr| tr.set_block_type(m.from, m.from, "heading", level_attrs(level)))
                .is_ok()
        })]
    }
}

impl NodeExtension for HeadingExtension {
    fn node_spec(&self, cx: &ExtensionContext<'_>) -> NodeSpec {
        let levels = levels(cx);
        let mut spec = NodeSpec::new()
            .content("inline*")
            .attr("level", AttributeDef::with_default(json!(levels[0])))
            .to_dom(render);
        for level in levels {
            spec = spec.parse_rule(ParseRule::tag(format!("h{level}")).with_attr("level", json!(level)));
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remirror_core::{Options, Priority};

    fn context_levels(value: Value) -> Vec<u64> {
        let descriptor = HeadingExtension.descriptor();
        let mut options = Options::from_descriptor(&descriptor);
        let update = serde_json::Map::from_iter([("levels".to_string(), value)]);
        options.update(&update).unwrap();
        let cx = ExtensionContext::new("heading", &options, Priority::DEFAULT, &descriptor.tags, None);
        levels(&cx)
    }

    #[test]
    fn test_levels_default_to_all() {
        assert_eq!(context_levels(json!(ALL_LEVELS)), ALL_LEVELS.to_vec());
    }

    #[test]
    fn test_levels_outside_range_are_ignored() {
        assert_eq!(context_levels(json!([0, 2, 3, 9])), vec![2, 3]);
        assert_eq!(context_levels(json!([])), ALL_LEVELS.to_vec());
    }

    #[test]
    fn test_render_uses_level() {
        assert_eq!(render(&level_attrs(3)).tag, "h3");
        assert_eq!(render(&Attrs::new()).tag, "h1");
    }
}
