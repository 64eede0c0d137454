use crate::{
    consts::{DEFAULT_SECTION_TITLE, SECTION_HEADING_MARKERS},
    model::SectionMap,
};

/// Split `text` into titled sections using heading markers.
///
/// Lines are taken in order. A line whose lowercase form contains a marker
/// becomes the title of a new, empty section (replacing the body of an earlier
/// section with the same title, which keeps its original position). Every
/// other line is appended to the current section's body, each preceded by a
/// single space. Text before the first heading lands in `"General"`.
pub fn segment_sections(text: &str) -> SectionMap {
    segment_sections_with(text, &SECTION_HEADING_MARKERS)
}

pub fn segment_sections_with(text: &str, markers: &[&str]) -> SectionMap {
    let mut sections = SectionMap::new();
    let mut current = sections.insert(DEFAULT_SECTION_TITLE, String::new());

    for line in text.split('\n') {
        if is_heading(line, markers) {
            current = sections.insert(line.trim(), String::new());
        } else if let Some(body) = sections.value_at_mut(current) {
            body.push(' ');
            body.push_str(line);
        }
    }

    sections
}

fn is_heading(line: &str, markers: &[&str]) -> bool {
    let lower = line.to_lowercase();
    markers.iter().any(|marker| lower.contains(marker))
}
