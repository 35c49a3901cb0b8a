use super::StepError;
use super::adjacent::{Direction, adjacent};
use super::labels::LabelMap;
use super::members::{COLOR_PREFIX, HINT_PREFIX, find_member};
use super::style::{FULL_OPACITY, Recency, TOPMOST_OPACITY};
use crate::host::Host;

/// The two most recent steps before `step`, if they exist.
///
/// Walking "previous" saturates at the smallest label, so a repeat of the
/// value walked from means there is no true predecessor.
pub fn predecessors(groups: &LabelMap, step: i64) -> Result<(Option<i64>, Option<i64>), StepError> {
    let second = adjacent(groups.keys().copied(), step, Direction::Previous)?;
    let third = adjacent(groups.keys().copied(), second, Direction::Previous)?;

    let third = (third != second).then_some(third);
    let second = (second != step).then_some(second);
    Ok((second, third))
}

/// Render `step` into the document: hide later groups, show and style the
/// rest. Re-running with the same inputs leaves the same state.
pub fn apply<H: Host + ?Sized>(host: &mut H, groups: &LabelMap, step: i64) -> Result<(), StepError> {
    let (second, third) = predecessors(groups, step)?;

    for (&label, &group) in groups {
        if label > step {
            host.set_visible(group, false)?;
            continue;
        }

        let current = label == step;
        host.set_visible(group, true)?;
        host.set_opacity(group, if current { TOPMOST_OPACITY } else { FULL_OPACITY })?;

        if let Some(hint) = find_member(&*host, group, HINT_PREFIX)? {
            host.set_visible(hint, current)?;
        }

        if let Some(color) = find_member(&*host, group, COLOR_PREFIX)? {
            host.set_foreground(Recency::classify(label, step, second, third).color());
            host.fill_foreground(color)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::host::LayerId;
    use crate::steps::labels::extract_labels;
    use crate::steps::style::FADING_COLORS;
    use image::Rgba;
    use proptest::prelude::*;

    struct Deck {
        doc: Document,
        groups: Vec<(i64, LayerId, LayerId, LayerId)>,
    }

    fn deck(labels: &[i64]) -> Deck {
        let mut doc = Document::new(2, 2);
        let mut groups = Vec::new();
        for &l in labels {
            let g = doc.add_group(None, &format!("#{}#slide", l)).unwrap();
            let color = doc.add_plain(Some(g), "color").unwrap();
            let hint = doc.add_plain(Some(g), "hint").unwrap();
            groups.push((l, g, hint, color));
        }
        Deck { doc, groups }
    }

    fn color_of(doc: &mut Document, id: LayerId) -> Rgba<u8> {
        *doc.pixels_mut(id).unwrap().get_pixel(0, 0)
    }

    #[test]
    fn predecessors_at_top_of_sequence() {
        let d = deck(&[10, 30, 50]);
        let map = extract_labels(&d.doc);
        assert_eq!(predecessors(&map, 50), Ok((Some(30), Some(10))));
        assert_eq!(predecessors(&map, 30), Ok((Some(10), None)));
        assert_eq!(predecessors(&map, 10), Ok((None, None)));
    }

    #[test]
    fn last_step_colours_three_most_recent() {
        let mut d = deck(&[10, 30, 50]);
        let map = extract_labels(&d.doc);
        apply(&mut d.doc, &map, 50).unwrap();

        let expected = [(10, FADING_COLORS[3]), (30, FADING_COLORS[2]), (50, FADING_COLORS[1])];
        for ((label, g, hint, color), (l, c)) in d.groups.clone().into_iter().zip(expected) {
            assert_eq!(label, l);
            assert!(d.doc.visible(g).unwrap());
            assert_eq!(d.doc.opacity(g).unwrap(), if label == 50 { TOPMOST_OPACITY } else { 100.0 });
            assert_eq!(d.doc.visible(hint).unwrap(), label == 50);
            assert_eq!(color_of(&mut d.doc, color), c);
        }
    }

    #[test]
    fn first_step_hides_everything_after_it() {
        let mut d = deck(&[10, 30, 50]);
        let map = extract_labels(&d.doc);
        apply(&mut d.doc, &map, 10).unwrap();

        let (_, g10, hint10, color10) = d.groups[0];
        assert!(d.doc.visible(g10).unwrap());
        assert!(d.doc.visible(hint10).unwrap());
        assert_eq!(d.doc.opacity(g10).unwrap(), TOPMOST_OPACITY);
        assert_eq!(color_of(&mut d.doc, color10), FADING_COLORS[1]);
        assert!(!d.doc.visible(d.groups[1].1).unwrap());
        assert!(!d.doc.visible(d.groups[2].1).unwrap());
    }

    #[test]
    fn older_steps_fade_to_grey() {
        let mut d = deck(&[1, 2, 3, 4, 5]);
        let map = extract_labels(&d.doc);
        apply(&mut d.doc, &map, 5).unwrap();
        let colors: Vec<Rgba<u8>> = d
            .groups
            .clone()
            .into_iter()
            .map(|(_, _, _, c)| color_of(&mut d.doc, c))
            .collect();
        assert_eq!(
            colors,
            vec![
                FADING_COLORS[0],
                FADING_COLORS[0],
                FADING_COLORS[3],
                FADING_COLORS[2],
                FADING_COLORS[1]
            ]
        );
    }

    #[test]
    fn hidden_groups_are_not_restyled() {
        let mut d = deck(&[1, 2]);
        let map = extract_labels(&d.doc);
        let (_, g2, hint2, color2) = d.groups[1];
        d.doc.set_opacity(g2, 40.0).unwrap();
        apply(&mut d.doc, &map, 1).unwrap();
        assert!(!d.doc.visible(g2).unwrap());
        assert_eq!(d.doc.opacity(g2).unwrap(), 40.0);
        assert!(d.doc.visible(hint2).unwrap());
        assert_eq!(color_of(&mut d.doc, color2), crate::document::TRANSPARENT);
    }

    #[test]
    fn groups_without_members_are_fine() {
        let mut doc = Document::new(2, 2);
        let g = doc.add_group(None, "#1#bare").unwrap();
        let map = extract_labels(&doc);
        apply(&mut doc, &map, 1).unwrap();
        assert!(doc.visible(g).unwrap());
    }

    #[test]
    fn marker_value_outside_label_set() {
        let mut d = deck(&[10, 30, 50]);
        let map = extract_labels(&d.doc);
        apply(&mut d.doc, &map, 40).unwrap();
        // 40 is not a label: 30 is the 2nd most recent, 10 the 3rd, nothing is current.
        assert_eq!(color_of(&mut d.doc, d.groups[1].3), FADING_COLORS[2]);
        assert_eq!(color_of(&mut d.doc, d.groups[0].3), FADING_COLORS[3]);
        assert!(!d.doc.visible(d.groups[2].1).unwrap());
        assert!(!d.doc.visible(d.groups[1].2).unwrap());
    }

    #[test]
    fn empty_map_is_an_error() {
        let mut doc = Document::new(1, 1);
        assert_eq!(apply(&mut doc, &LabelMap::new(), 1), Err(StepError::NoStepGroups));
    }

    proptest! {
        #[test]
        fn apply_is_idempotent(
            labels in prop::collection::btree_set(-20i64..20, 1..8),
            pick in any::<prop::sample::Index>(),
        ) {
            let labels: Vec<i64> = labels.into_iter().collect();
            let step = labels[pick.index(labels.len())];
            let mut d = deck(&labels);
            let map = extract_labels(&d.doc);

            apply(&mut d.doc, &map, step).unwrap();
            let once = d.doc.clone();
            apply(&mut d.doc, &map, step).unwrap();
            prop_assert_eq!(once, d.doc);
        }
    }
}
