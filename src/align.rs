use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::annotation::AlignGroup;
use crate::output::Line;

/// Pad anchored tokens so every member of an alignment group starts in the
/// same column. A group with fewer than two lines, or with two anchors on
/// one line, is left alone.
pub fn align(lines: &mut [Line], indent_width: usize) {
    let mut groups: BTreeMap<AlignGroup, SmallVec<[usize; 8]>> = BTreeMap::new();
    for (index, line) in lines.iter().enumerate() {
        for anchor in &line.anchors {
            groups.entry(anchor.group).or_default().push(index);
        }
    }

    for (group, members) in groups {
        if members.len() < 2 || members.windows(2).any(|w| w[0] == w[1]) {
            continue;
        }
        let target = members
            .iter()
            .filter_map(|&i| anchor_column(&lines[i], group, indent_width))
            .max()
            .unwrap_or(0);
        for &i in &members {
            pad_to(&mut lines[i], group, target, indent_width);
        }
    }
}

fn anchor_column(line: &Line, group: AlignGroup, indent_width: usize) -> Option<usize> {
    line.anchors
        .iter()
        .find(|a| a.group == group)
        .map(|a| line.column(a.offset, indent_width))
}

fn pad_to(line: &mut Line, group: AlignGroup, target: usize, indent_width: usize) {
    let Some(anchor) = line.anchors.iter().find(|a| a.group == group).copied() else {
        return;
    };
    let column = line.column(anchor.offset, indent_width);
    if column >= target {
        return;
    }
    let pad = target - column;
    line.text
        .insert_str(anchor.offset, &" ".repeat(pad));
    for other in line.anchors.iter_mut() {
        if other.offset >= anchor.offset {
            other.offset += pad;
        }
    }
}
