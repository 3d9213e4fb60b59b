//! Dotted symbolic paths such as `datans.data.acme.demo`.

use std::fmt;

use crate::error::PathError;

/// A non-empty sequence of identifier segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolicPath {
    segments: Vec<String>,
}

impl SymbolicPath {
    /// Parse a dotted string. Every segment must be an identifier
    /// (`[A-Za-z_][A-Za-z0-9_]*`).
    pub fn parse(input: &str) -> Result<Self, PathError> {
        if input.is_empty() {
            return Err(PathError::Empty);
        }

        let segments = input
            .split('.')
            .map(|part| {
                if is_identifier(part) {
                    Ok(part.to_string())
                } else {
                    Err(PathError::InvalidSegment {
                        path: input.to_string(),
                        segment: part.to_string(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    /// Build a path from already-validated segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
            return Err(PathError::InvalidSegment {
                path: segments.join("."),
                segment: bad.clone(),
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// Remove `root` from the front of this path.
    ///
    /// Returns `None` if this path does not start with `root` or if nothing
    /// is left once it is removed.
    pub fn strip_prefix(&self, root: &SymbolicPath) -> Option<SymbolicPath> {
        if self.segments.len() <= root.segments.len() {
            return None;
        }
        if !self.segments.starts_with(&root.segments) {
            return None;
        }
        Some(SymbolicPath {
            segments: self.segments[root.segments.len()..].to_vec(),
        })
    }

    /// The first `depth` segments, or `None` if `depth` is zero or exceeds this path.
    pub fn truncate(&self, depth: usize) -> Option<SymbolicPath> {
        if depth == 0 || depth > self.segments.len() {
            return None;
        }
        Some(SymbolicPath {
            segments: self.segments[..depth].to_vec(),
        })
    }

    /// Replace the first segment. The caller guarantees `segment` is an identifier.
    pub(crate) fn with_first(mut self, segment: &str) -> SymbolicPath {
        self.segments[0] = segment.to_string();
        self
    }

    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for SymbolicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
