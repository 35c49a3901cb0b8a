use super::StepError;

/// Which way to move through the step sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Previous => "previous",
        }
    }
}

/// Find the label adjacent to `reference` in `direction`.
///
/// `Next` yields the smallest label strictly greater than `reference`, or the
/// largest label when there is none. `Previous` yields the largest label
/// strictly smaller, or the smallest label when there is none. The labels
/// need not be sorted; duplicates are harmless.
pub fn adjacent<I>(labels: I, reference: i64, direction: Direction) -> Result<i64, StepError>
where
    I: IntoIterator<Item = i64>,
{
    let mut sorted: Vec<i64> = labels.into_iter().collect();
    if sorted.is_empty() {
        return Err(StepError::NoStepGroups);
    }
    sorted.sort_unstable();

    let found = match direction {
        Direction::Next => sorted.iter().copied().find(|&l| l > reference),
        Direction::Previous => sorted.iter().rev().copied().find(|&l| l < reference),
    };
    Ok(found.unwrap_or_else(|| match direction {
        Direction::Next => sorted[sorted.len() - 1],
        Direction::Previous => sorted[0],
    }))
}
