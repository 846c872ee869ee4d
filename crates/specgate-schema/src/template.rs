//! Path templates (`/user/{id}`, `/files/{name}.json`) and matching.

/// One `/`-separated piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{name}` with optional literal text around it inside the segment.
    Param {
        name: String,
        prefix: String,
        suffix: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub(crate) fn parse(raw: &str) -> Self {
        let segments = split(raw)
            .map(|seg| match (seg.find('{'), seg.rfind('}')) {
                (Some(open), Some(close)) if open < close => Segment::Param {
                    name: seg[open + 1..close].to_string(),
                    prefix: seg[..open].to_string(),
                    suffix: seg[close + 1..].to_string(),
                },
                _ => Segment::Literal(seg.to_string()),
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of literal segments; more literals means a more specific match.
    pub(crate) fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Match `path` and return the captured `(name, raw value)` pairs.
    /// A trailing `/` on either side is ignored.
    pub(crate) fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let parts: Vec<&str> = split(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut captures = Vec::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param {
                    name,
                    prefix,
                    suffix,
                } => {
                    let value = part
                        .strip_prefix(prefix.as_str())?
                        .strip_suffix(suffix.as_str())?;
                    if value.is_empty() {
                        return None;
                    }
                    captures.push((name.clone(), value.to_string()));
                }
            }
        }
        Some(captures)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.trim_matches('/').split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_template_matches_exactly() {
        let t = PathTemplate::parse("/user");
        assert_eq!(t.matches("/user"), Some(vec![]));
        assert_eq!(t.matches("/user/"), Some(vec![]));
        assert_eq!(t.matches("/users"), None);
        assert_eq!(t.matches("/user/1"), None);
    }

    #[test]
    fn captures_params() {
        let t = PathTemplate::parse("/user/{id}/orders/{orderId}");
        let caps = t.matches("/user/42/orders/abc").unwrap();
        assert_eq!(
            caps,
            vec![
                ("id".to_string(), "42".to_string()),
                ("orderId".to_string(), "abc".to_string())
            ]
        );
        assert_eq!(t.literal_count(), 2);
    }

    #[test]
    fn params_with_surrounding_text() {
        let t = PathTemplate::parse("/files/{name}.json");
        assert_eq!(
            t.matches("/files/report.json"),
            Some(vec![("name".to_string(), "report".to_string())])
        );
        assert_eq!(t.matches("/files/report.xml"), None);
        assert_eq!(t.matches("/files/.json"), None);
    }

    #[test]
    fn root_template() {
        let t = PathTemplate::parse("/");
        assert_eq!(t.matches("/"), Some(vec![]));
        assert_eq!(t.matches(""), Some(vec![]));
        assert_eq!(t.matches("/x"), None);
    }
}
