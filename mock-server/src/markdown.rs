//! Heading-relative insertion and tag scanning over markdown text.

/// Where a `PATCH` places its content relative to the target heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Beginning,
    End,
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with(' ') {
        return None;
    }
    Some((level, rest.trim()))
}

/// Insert `content` under the heading named by `path` (outermost first).
///
/// Returns `None` when the heading chain does not exist in `document`.
pub fn insert_under_heading(
    document: &str,
    path: &[&str],
    content: &str,
    position: Position,
) -> Option<String> {
    let lines: Vec<&str> = document.lines().collect();

    let mut level = 0;
    let mut found = None;
    let mut search_from = 0;
    for name in path {
        let (index, matched_level) = lines
            .iter()
            .enumerate()
            .skip(search_from)
            .find_map(|(i, line)| match heading(line) {
                Some((lvl, text)) if lvl > level && text == *name => Some((i, lvl)),
                _ => None,
            })?;
        level = matched_level;
        found = Some(index);
        search_from = index + 1;
    }
    let heading_index = found?;

    let insert_at = match position {
        Position::Beginning => heading_index + 1,
        Position::End => lines
            .iter()
            .enumerate()
            .skip(heading_index + 1)
            .find(|(_, line)| heading(line).is_some_and(|(lvl, _)| lvl <= level))
            .map(|(i, _)| i)
            .unwrap_or(lines.len()),
    };

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 1);
    out.extend_from_slice(&lines[..insert_at]);
    out.extend(content.lines());
    out.extend_from_slice(&lines[insert_at..]);
    let mut text = out.join("\n");
    if document.ends_with('\n') {
        text.push('\n');
    }
    Some(text)
}

/// Collect `#tag` tokens, skipping heading markers.
pub fn tags(document: &str) -> Vec<String> {
    let mut found = Vec::new();
    for line in document.lines() {
        if heading(line).is_some() {
            continue;
        }
        for word in line.split_whitespace() {
            if let Some(tag) = word.strip_prefix('#') {
                let tag: String = tag
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '/'))
                    .collect();
                if !tag.is_empty() && !found.contains(&tag) {
                    found.push(tag);
                }
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Day\n\n## Tasks\n- a\n\n## Notes\ntext\n";

    #[test]
    fn appends_at_end_of_section() {
        let out = insert_under_heading(DOC, &["Tasks"], "- b", Position::End).unwrap();
        assert_eq!(out, "# Day\n\n## Tasks\n- a\n\n- b\n## Notes\ntext\n");
    }

    #[test]
    fn prepends_after_heading_line() {
        let out = insert_under_heading(DOC, &["Day", "Notes"], "first", Position::Beginning).unwrap();
        assert_eq!(out, "# Day\n\n## Tasks\n- a\n\n## Notes\nfirst\ntext\n");
    }

    #[test]
    fn missing_heading_is_none() {
        assert!(insert_under_heading(DOC, &["Nope"], "x", Position::End).is_none());
        assert!(insert_under_heading(DOC, &["Notes", "Day"], "x", Position::End).is_none());
    }

    #[test]
    fn tags_skip_headings() {
        assert_eq!(tags("# Title\nsome #work and #home/kids.\n#work"), vec!["work", "home/kids"]);
    }
}
