use crate::error::{ExpressionError, ExpressionErrorKind as Kind};

const ALLOWED_ROOTS: [&str; 4] = ["params", "env", "selectors", "steps"];
const FORBIDDEN_SEGMENTS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// A dotted path such as `params.credentials.password`, split into its
/// root scope and remaining segments, with every segment validated against
/// the forbidden-property blocklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub root: String,
    pub segments: Vec<String>,
}

/// Parse one `${...}` body into a [`Path`]. `offset` is the byte offset of
/// the path text within the original template/expression, used to anchor
/// any error produced here.
pub fn parse_path(text: &str, offset: usize) -> Result<Path, ExpressionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExpressionError::new(Kind::EmptyPath, offset));
    }
    let mut parts = text.split('.');
    let root = parts.next().unwrap().to_string();
    if !ALLOWED_ROOTS.contains(&root.as_str()) {
        return Err(ExpressionError::new(Kind::UnknownRoot(root), offset));
    }
    let segments: Vec<String> = parts.map(str::to_string).collect();
    for seg in &segments {
        if FORBIDDEN_SEGMENTS.contains(&seg.as_str()) {
            return Err(ExpressionError::new(
                Kind::ForbiddenSegment(seg.clone()),
                offset,
            ));
        }
    }
    Ok(Path { root, segments })
}
