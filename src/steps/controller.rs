use super::StepError;
use super::adjacent::{Direction, adjacent};
use super::labels::extract_labels;
use super::visibility::apply;
use crate::host::{Host, LayerId};
use crate::log_info;

/// Reserved name of the text layer that holds the current step.
pub const MARKER_NAME: &str = "step";

/// First top-level text layer named exactly [`MARKER_NAME`].
pub fn find_marker<H: Host + ?Sized>(host: &H) -> Result<LayerId, StepError> {
    host.top_level_layers()
        .into_iter()
        .find(|l| l.is_text() && l.name == MARKER_NAME)
        .map(|l| l.id)
        .ok_or(StepError::MissingMarker)
}

/// Locate the marker and parse its integer content.
pub fn read_marker<H: Host + ?Sized>(host: &H) -> Result<(LayerId, i64), StepError> {
    let marker = find_marker(host)?;
    let text = host.text(marker)?;
    let step = text
        .trim()
        .parse()
        .map_err(|_| StepError::InvalidMarker(text.clone()))?;
    Ok((marker, step))
}

/// Move the marker one step in `direction` and re-render the document.
///
/// Every precondition is checked before the first mutation. Returns the new step.
pub fn step<H: Host + ?Sized>(host: &mut H, direction: Direction) -> Result<i64, StepError> {
    let (marker, current) = read_marker(&*host)?;
    let groups = extract_labels(&*host);
    let new_step = adjacent(groups.keys().copied(), current, direction)?;

    log_info!(
        "Step {} -> {} ({}, {} step groups)",
        current,
        new_step,
        direction.label(),
        groups.len()
    );

    host.set_text(marker, &new_step.to_string())?;
    apply(host, &groups, new_step)?;
    Ok(new_step)
}

/// Advance to the next step and redraw.
pub fn advance<H: Host + ?Sized>(host: &mut H) -> Result<i64, StepError> {
    let new_step = step(host, Direction::Next)?;
    host.flush();
    Ok(new_step)
}

/// Go back to the previous step and redraw.
pub fn retreat<H: Host + ?Sized>(host: &mut H) -> Result<i64, StepError> {
    let new_step = step(host, Direction::Previous)?;
    host.flush();
    Ok(new_step)
}
