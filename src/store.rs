//! Keyed storage for visit records.
//!
//! [`RecordStore`] is the seam between the aggregation code and wherever the
//! records live. [`MemoryStore`] keeps them in a `Vec`; [`CsvRecordStore`]
//! wraps a `MemoryStore` and rewrites a CSV file after every mutation.

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::Result;
use crate::records::{NewVisit, VisitRecord};
use crate::stats::DateRange;

/// Order of the rows returned by [`RecordStore::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    #[default]
    DateDescending,
    ScoreDescending,
    ScoreAscending,
}

/// Criteria for [`RecordStore::list`]. Every criterion that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub restaurant: Option<String>,
    pub date_range: Option<DateRange>,
    pub order: ListOrder,
}

/// Insert, delete and query access to a set of visit records.
pub trait RecordStore {
    /// Validates `visit`, assigns it the next id and stores it.
    fn insert(&mut self, visit: NewVisit) -> Result<VisitRecord>;

    /// Deletes by id when `identifier` is all digits, otherwise every record
    /// whose name equals `identifier`. Returns the removed records.
    fn delete(&mut self, identifier: &str) -> Result<Vec<VisitRecord>>;

    /// Every record, newest visit date first.
    fn all(&self) -> Vec<VisitRecord>;

    fn get(&self, id: u64) -> Option<VisitRecord> {
        self.all().into_iter().find(|r| r.id == id)
    }

    fn query(&self, predicate: &dyn Fn(&VisitRecord) -> bool) -> Vec<VisitRecord> {
        self.all().into_iter().filter(|r| predicate(r)).collect()
    }

    /// Substring match on the name, ignoring ASCII case.
    fn search_by_name(&self, keyword: &str) -> Vec<VisitRecord> {
        let keyword = keyword.to_ascii_lowercase();
        self.query(&|r: &VisitRecord| r.name.to_ascii_lowercase().contains(&keyword))
    }

    fn filter_by_type(&self, category: &str) -> Vec<VisitRecord> {
        self.query(&|r: &VisitRecord| r.category == category)
    }

    fn by_restaurant(&self, name: &str) -> Vec<VisitRecord> {
        self.query(&|r: &VisitRecord| r.name == name)
    }

    fn by_date_range(&self, range: &DateRange) -> Vec<VisitRecord> {
        self.query(&|r: &VisitRecord| range.contains(&r.date))
    }

    fn sorted_by_score(&self, descending: bool) -> Vec<VisitRecord> {
        let mut records = self.all();
        if descending {
            records.sort_by(|a, b| b.score.total_cmp(&a.score));
        } else {
            records.sort_by(|a, b| a.score.total_cmp(&b.score));
        }
        records
    }

    /// Distinct types, sorted.
    fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.all().into_iter().map(|r| r.category).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Records matching every criterion of `query`, in `query.order`.
    fn list(&self, query: &ListQuery) -> Vec<VisitRecord> {
        let mut selections = Vec::new();
        if let Some(keyword) = &query.search {
            selections.push(self.search_by_name(keyword));
        }
        if let Some(category) = &query.category {
            selections.push(self.filter_by_type(category));
        }
        if let Some(name) = &query.restaurant {
            selections.push(self.by_restaurant(name));
        }
        if let Some(range) = &query.date_range {
            selections.push(self.by_date_range(range));
        }

        let mut records = match query.order {
            ListOrder::DateDescending => self.all(),
            ListOrder::ScoreDescending => self.sorted_by_score(true),
            ListOrder::ScoreAscending => self.sorted_by_score(false),
        };
        for selection in selections {
            let ids: HashSet<u64> = selection.iter().map(|r| r.id).collect();
            records.retain(|r| ids.contains(&r.id));
        }
        records
    }
}

/// In-memory store. Ids start at 1 and are never reused.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: Vec<VisitRecord>,
    next_id: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuilds a store from existing records. `next_id` is raised past the
    /// largest id present if it is stale.
    pub fn from_records(records: Vec<VisitRecord>, next_id: u64) -> Self {
        let floor = records.iter().map(|r| r.id + 1).max().unwrap_or(1);
        Self {
            records,
            next_id: next_id.max(floor),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[VisitRecord] {
        &self.records
    }
}

impl RecordStore for MemoryStore {
    fn insert(&mut self, visit: NewVisit) -> Result<VisitRecord> {
        let record = visit.validate()?.into_record(self.next_id);
        self.next_id += 1;
        self.records.push(record.clone());

        info!(id = record.id, name = %record.name, "Visit recorded");
        Ok(record)
    }

    fn delete(&mut self, identifier: &str) -> Result<Vec<VisitRecord>> {
        let by_id = !identifier.is_empty() && identifier.chars().all(|c| c.is_ascii_digit());
        let target_id = if by_id { identifier.parse::<u64>().ok() } else { None };

        let (removed, kept): (Vec<_>, Vec<_>) = self.records.drain(..).partition(|r| {
            if by_id {
                Some(r.id) == target_id
            } else {
                r.name == identifier
            }
        });
        self.records = kept;

        info!(identifier, by_id, removed = removed.len(), "Delete processed");
        Ok(removed)
    }

    fn all(&self) -> Vec<VisitRecord> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreMeta {
    next_id: u64,
}

/// A [`MemoryStore`] persisted to a CSV file.
///
/// The file has the header `id,name,type,date,score,comment,image_path` and
/// is replaced wholesale (temp file + rename) after each mutation. The id
/// counter lives next to it in `<file>.meta.json`.
#[derive(Debug)]
pub struct CsvRecordStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl CsvRecordStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = if path.exists() {
            let mut rdr = csv::Reader::from_reader(File::open(&path)?);
            let mut records = Vec::new();
            for result in rdr.deserialize() {
                let record: VisitRecord = result?;
                records.push(record);
            }
            records
        } else {
            Vec::new()
        };

        let meta_path = meta_path(&path);
        let meta: StoreMeta = if meta_path.exists() {
            serde_json::from_str(&fs::read_to_string(&meta_path)?)?
        } else {
            StoreMeta::default()
        };

        debug!(
            path = %path.display(),
            count = records.len(),
            next_id = meta.next_id,
            "Loaded visit records"
        );

        Ok(Self {
            inner: MemoryStore::from_records(records, meta.next_id),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Writes `staged` to disk. The in-memory state is only replaced by the
    /// caller once this succeeds.
    fn save(&self, staged: &MemoryStore) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = sibling(&self.path, "tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for record in staged.records() {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        let meta = StoreMeta {
            next_id: staged.next_id(),
        };
        fs::write(meta_path(&self.path), serde_json::to_string(&meta)?)?;

        debug!(
            path = %self.path.display(),
            count = staged.len(),
            "Saved visit records"
        );
        Ok(())
    }
}

impl RecordStore for CsvRecordStore {
    fn insert(&mut self, visit: NewVisit) -> Result<VisitRecord> {
        let mut staged = self.inner.clone();
        let record = staged.insert(visit)?;
        self.save(&staged)?;
        self.inner = staged;
        Ok(record)
    }

    fn delete(&mut self, identifier: &str) -> Result<Vec<VisitRecord>> {
        let mut staged = self.inner.clone();
        let removed = staged.delete(identifier)?;
        if !removed.is_empty() {
            self.save(&staged)?;
            self.inner = staged;
        }
        Ok(removed)
    }

    fn all(&self) -> Vec<VisitRecord> {
        self.inner.all()
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn meta_path(path: &Path) -> PathBuf {
    sibling(path, "meta.json")
}
