use std::collections::BTreeMap;

use crate::host::{Host, LayerId};
use crate::{log_info, log_warn};

/// Label → step group, ordered by label.
pub type LabelMap = BTreeMap<i64, LayerId>;

/// Parse the label out of a `#<integer>#<free text>` group name.
///
/// Whitespace around the number is ignored, as for the `step` marker.
/// Returns `None` when the name does not start with `#`, has no closing `#`,
/// or the part between the two is not a base-10 integer.
pub fn parse_label(name: &str) -> Option<i64> {
    let rest = name.strip_prefix('#')?;
    let end = rest.find('#')?;
    rest[..end].trim().parse().ok()
}

/// Collect the step groups among the document's top-level layers.
///
/// Nested groups are not searched. When two groups share a label the one
/// enumerated later wins.
pub fn extract_labels<H: Host + ?Sized>(host: &H) -> LabelMap {
    let mut groups = LabelMap::new();
    for layer in host.top_level_layers() {
        if !layer.is_group() || !layer.name.starts_with('#') {
            continue;
        }
        match parse_label(&layer.name) {
            Some(label) => {
                if let Some(prev) = groups.insert(label, layer.id) {
                    log_warn!(
                        "Duplicate step label {} (layers {} and {}), keeping layer {}",
                        label,
                        prev,
                        layer.id,
                        layer.id
                    );
                }
            }
            None => {
                log_info!("Group '{}' is not a step group, skipped", layer.name);
            }
        }
    }
    groups
}
