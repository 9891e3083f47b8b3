use crate::parser::{ParsedSource, normalize_section};

/// Parsed sources in precedence order: index 0 is the most recently added,
/// highest-priority source.
#[derive(Debug, Clone, Default)]
pub struct MergedSources {
    parsed: Vec<ParsedSource>,
}

impl MergedSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source on top of all earlier ones.
    pub fn add(&mut self, source: ParsedSource) {
        self.parsed.insert(0, source);
    }

    /// Sources from highest to lowest priority.
    pub fn sources(&self) -> impl Iterator<Item = &ParsedSource> {
        self.parsed.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }

    /// Look up `(section, key)` candidates, the first being the preferred name
    /// and the rest aliases. Sections are compared in normalized form.
    ///
    /// Single-valued: the value list of the highest-priority source holding any
    /// candidate. Multi-valued: the lists of every source holding a candidate,
    /// lowest priority first. `None` when no source matches.
    pub fn lookup(&self, names: &[(String, String)], multi: bool) -> Option<Vec<String>> {
        let names: Vec<(String, &str)> = names
            .iter()
            .map(|(section, key)| (normalize_section(section), key.as_str()))
            .collect();

        if !multi {
            return self
                .parsed
                .iter()
                .find_map(|src| find_in(src, &names))
                .map(<[String]>::to_vec);
        }

        let mut found = false;
        let mut merged = Vec::new();
        for src in self.parsed.iter().rev() {
            if let Some(values) = find_in(src, &names) {
                found = true;
                merged.extend_from_slice(values);
            }
        }
        found.then_some(merged)
    }
}

fn find_in<'a>(src: &'a ParsedSource, names: &[(String, &str)]) -> Option<&'a [String]> {
    names.iter().find_map(|(section, key)| {
        src.normalized
            .get(section)
            .and_then(|keys| keys.get(*key))
            .map(Vec::as_slice)
    })
}
