use crate::host::{Host, HostError, LayerId, LayerKind};

/// Auxiliary overlay shown only while its step is current.
pub const HINT_PREFIX: &str = "hint";
/// Drawable flooded with the recency highlight colour.
pub const COLOR_PREFIX: &str = "color";

/// First direct child of `group` that is not itself a group and whose name
/// starts with `prefix`, in the order the host reports children.
pub fn find_member<H: Host + ?Sized>(
    host: &H,
    group: LayerId,
    prefix: &str,
) -> Result<Option<LayerId>, HostError> {
    Ok(host
        .children(group)?
        .into_iter()
        .find(|c| c.kind != LayerKind::Group && c.name.starts_with(prefix))
        .map(|c| c.id))
}
