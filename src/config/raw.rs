use template::Template;

use super::Error;

/// Config values merged from one or more files, before interpretation.
/// Sections and keys keep the order they were first seen in.
#[derive(Debug, Default)]
pub struct RawConfig {
    sections: Vec<RawSection>,
}

#[derive(Debug)]
struct RawSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl RawConfig {
    /// Parse `text` and merge it in; keys already present are overwritten.
    pub fn merge_text(&mut self, text: &str) -> Result<(), syntax::Error> {
        for section in syntax::parse_conf(text)? {
            // an empty section still counts as present (e.g. `[input.obs]` with defaults):
            self.section_mut(section.name);
            for entry in section.entries {
                self.set(section.name, entry.key, entry.value);
            }
        }
        Ok(())
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let entries = &mut self.section_mut(section).entries;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_owned(),
            None => entries.push((key.to_owned(), value.to_owned())),
        }
    }

    fn section_mut(&mut self, name: &str) -> &mut RawSection {
        let idx = match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(RawSection {
                    name: name.to_owned(),
                    entries: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    /// View of the named section; empty if it was never given.
    pub fn section<'a>(&'a self, name: &'a str) -> SectionView<'a> {
        let entries = self
            .sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.entries[..])
            .unwrap_or(&[]);
        SectionView { name, entries }
    }

    /// Sections named `<prefix>.<suffix>`, in order, paired with their suffix.
    pub fn subsections<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, SectionView<'a>)> + 'a {
        self.sections.iter().filter_map(move |s| {
            let suffix = s.name.strip_prefix(prefix)?.strip_prefix('.')?;
            Some((
                suffix,
                SectionView {
                    name: &s.name,
                    entries: &s.entries,
                },
            ))
        })
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }
}

/// Typed accessors over the entries of one section.
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    name: &'a str,
    entries: &'a [(String, String)],
}

impl<'a> SectionView<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Value of `key`; empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&'a str, Error> {
        self.get(key)
            .ok_or_else(|| Error::MissingKey(self.name.to_owned(), key.to_owned()))
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, Error> {
        match self.get(key).map(str::to_ascii_lowercase).as_deref() {
            None => Ok(default),
            Some("true" | "yes" | "1") => Ok(true),
            Some("false" | "no" | "0") => Ok(false),
            Some(_) => Err(self.invalid(key, "expected true or false")),
        }
    }

    /// Comma-separated list; blank items are dropped.
    pub fn list(&self, key: &str) -> Vec<&'a str> {
        self.get(key)
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn template(&self, key: &str) -> Result<Option<Template>, Error> {
        self.get(key).map(|v| self.parse_template(key, v)).transpose()
    }

    pub fn parse_template(&self, key: &str, text: &str) -> Result<Template, Error> {
        Template::parse(text)
            .map_err(|e| Error::Template(self.name.to_owned(), key.to_owned(), e))
    }

    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> Error {
        Error::InvalidValue {
            section: self.name.to_owned(),
            key: key.to_owned(),
            value: self.get(key).unwrap_or_default().to_owned(),
            reason: reason.into(),
        }
    }

    /// Warn about keys this section doesn't use (usually typos).
    pub fn warn_unknown_keys(&self, known: &[&str]) {
        for (key, _) in self.entries() {
            if !known.contains(&key) {
                log::warn!("Ignoring unknown key '{key}' in [{}]", self.name);
            }
        }
    }
}
