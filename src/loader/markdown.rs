//! Line-based markdown structure extraction
//!
//! Produces typed elements with heading context: `#` headings maintain a
//! section stack, bullet and numbered lines become list items, and runs of
//! other non-blank lines become paragraphs.

use regex::Regex;

use crate::chunker::{DocumentElement, ElementType};

pub fn parse_elements(text: &str) -> Vec<DocumentElement> {
    let heading_re = Regex::new(r"^(#{1,6})\s+(.*\S)\s*$").unwrap();
    let list_re = Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(.*\S)\s*$").unwrap();

    let mut elements: Vec<DocumentElement> = Vec::new();
    let mut section_stack: Vec<String> = Vec::new();
    let mut current_heading = String::new();
    let mut current_level = 0usize;
    let mut paragraph: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = heading_re.captures(line) {
            flush_paragraph(
                &mut paragraph,
                &mut elements,
                &current_heading,
                current_level,
                &section_stack,
            );

            let level = caps[1].len();
            let title = caps[2].to_string();

            // Trim the stack to the parent depth, then push this heading.
            section_stack.truncate(level - 1);
            section_stack.push(title.clone());
            current_heading = title.clone();
            current_level = level;

            elements.push(DocumentElement {
                text: title.clone(),
                heading: title,
                heading_level: level,
                section_path: section_stack.clone(),
                element_type: ElementType::Heading,
            });
        } else if let Some(caps) = list_re.captures(line) {
            flush_paragraph(
                &mut paragraph,
                &mut elements,
                &current_heading,
                current_level,
                &section_stack,
            );

            elements.push(DocumentElement {
                text: caps[1].to_string(),
                heading: current_heading.clone(),
                heading_level: current_level,
                section_path: section_stack.clone(),
                element_type: ElementType::ListItem,
            });
        } else if line.trim().is_empty() {
            flush_paragraph(
                &mut paragraph,
                &mut elements,
                &current_heading,
                current_level,
                &section_stack,
            );
        } else {
            paragraph.push(line.trim());
        }
    }

    flush_paragraph(
        &mut paragraph,
        &mut elements,
        &current_heading,
        current_level,
        &section_stack,
    );

    elements
}

fn flush_paragraph(
    paragraph: &mut Vec<&str>,
    elements: &mut Vec<DocumentElement>,
    heading: &str,
    heading_level: usize,
    section_path: &[String],
) {
    if paragraph.is_empty() {
        return;
    }
    elements.push(DocumentElement {
        text: paragraph.join(" "),
        heading: heading.to_string(),
        heading_level,
        section_path: section_path.to_vec(),
        element_type: ElementType::Paragraph,
    });
    paragraph.clear();
}

/// Treat plain text as paragraphs separated by blank lines, with no
/// heading structure.
pub fn parse_plain_elements(text: &str) -> Vec<DocumentElement> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| DocumentElement {
            text: p.split_whitespace().collect::<Vec<_>>().join(" "),
            heading: String::new(),
            heading_level: 0,
            section_path: Vec::new(),
            element_type: ElementType::Paragraph,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_build_section_stack() {
        let text = "# Top\n\nintro text\n\n## Sub\n\nnested text\n";
        let elements = parse_elements(text);

        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0].element_type, ElementType::Heading);
        assert_eq!(elements[0].section_path, vec!["Top"]);

        assert_eq!(elements[1].text, "intro text");
        assert_eq!(elements[1].heading, "Top");

        assert_eq!(elements[2].section_path, vec!["Top", "Sub"]);
        assert_eq!(elements[3].heading, "Sub");
        assert_eq!(elements[3].section_path, vec!["Top", "Sub"]);
    }

    #[test]
    fn test_sibling_heading_replaces_stack_tail() {
        let text = "# A\n## B\nbody\n## C\nmore\n";
        let elements = parse_elements(text);

        let c_body = elements.iter().find(|e| e.text == "more").unwrap();
        assert_eq!(c_body.section_path, vec!["A", "C"]);
    }

    #[test]
    fn test_list_items() {
        let text = "# L\n- first\n- second\n1. third\n";
        let elements = parse_elements(text);

        let items: Vec<_> = elements
            .iter()
            .filter(|e| e.element_type == ElementType::ListItem)
            .collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].text, "first");
        assert_eq!(items[2].text, "third");
        assert!(items.iter().all(|e| e.heading == "L"));
    }

    #[test]
    fn test_multiline_paragraph_joined() {
        let text = "line one\nline two\n\nnext paragraph\n";
        let elements = parse_elements(text);

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text, "line one line two");
        assert_eq!(elements[1].text, "next paragraph");
    }

    #[test]
    fn test_plain_elements() {
        let elements = parse_plain_elements("first block\nstill first\n\nsecond block\n");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text, "first block still first");
        assert!(elements[0].heading.is_empty());
    }
}
