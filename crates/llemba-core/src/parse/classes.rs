/// Returns the index of the single class label mentioned in `text`.
///
/// Matching is a case-insensitive substring search. Zero or several matching
/// labels both yield `None`.
pub fn parse_class<S: AsRef<str>>(text: &str, labels: &[S]) -> Option<usize> {
    let haystack = text.to_lowercase();
    let mut found = None;

    for (idx, label) in labels.iter().enumerate() {
        if !haystack.contains(&label.as_ref().to_lowercase()) {
            continue;
        }
        if found.is_some() {
            tracing::warn!(answer = text, "two classes found in answer");
            return None;
        }
        found = Some(idx);
    }

    found
}
