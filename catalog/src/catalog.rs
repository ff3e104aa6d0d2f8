use std::path::Path;

use template::Template;
use time::TimeContext;
use util::{HashMap, IdVec};

use super::{discover, Error, FileRecord, RecordId};

/// Files discovered for one input category, in discovery order.
///
/// Records are grouped by time context so subsetting only compares each
/// distinct context once; the paths it returns are still in insertion order.
#[derive(Debug, Default)]
pub struct FileCatalog {
    records: IdVec<RecordId, FileRecord>,
    by_context: HashMap<TimeContext, Vec<RecordId>>,
}

impl FileCatalog {
    /// Discover files under `root` for each template in turn.
    /// Results are concatenated in template order; overlapping templates
    /// may contribute the same path more than once.
    pub fn build(root: &Path, templates: &[Template]) -> Result<Self, Error> {
        let mut catalog = Self::default();
        for template in templates {
            catalog.extend(discover(root, template)?);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, record: FileRecord) -> RecordId {
        let context = record.context().clone();
        let id = self.records.push(record);
        self.by_context.entry(context).or_default().push(id);
        id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct time contexts among the records.
    pub fn context_count(&self) -> usize {
        self.by_context.len()
    }

    pub fn get(&self, id: RecordId) -> &FileRecord {
        self.records.get(id)
    }

    pub fn records(&self) -> &[FileRecord] {
        self.records.as_slice()
    }

    /// Ids of the records matching `target`, in insertion order.
    ///
    /// An axis matches if either side is a wildcard or both are equal;
    /// a record matches if all three axes do.
    pub fn subset_ids(&self, target: &TimeContext) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self
            .by_context
            .iter()
            .filter(|(context, _)| context.matches(target))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Paths of the records matching `target`, in insertion order.
    /// Empty if nothing matches.
    pub fn subset(&self, target: &TimeContext) -> Vec<&Path> {
        self.subset_ids(target)
            .into_iter()
            .map(|id| self.get(id).path())
            .collect()
    }
}

impl Extend<FileRecord> for FileCatalog {
    fn extend<I: IntoIterator<Item = FileRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}
