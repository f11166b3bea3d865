/*!
Interval-Partition Planner (spec.md §4.5): groups a bucket's data files
into sections of sorted runs by key-range interval containment.
*/
use std::cmp::Ordering;

use crate::model::data_file::DataFileMeta;
use crate::model::value::GenericRow;

/// A key-ordered, non-overlapping sequence of files (spec.md §3,
/// "SortedRun"). Invariant: for any two consecutive files `f_i`, `f_{i+1}`,
/// `f_i.max_key < f_{i+1}.min_key` under the comparator used to build it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedRun {
    pub files: Vec<DataFileMeta>,
}

impl SortedRun {
    fn max_key(&self) -> Option<&GenericRow> {
        self.files.last().map(|f| &f.max_key)
    }
}

/// A maximal group of sorted runs whose key ranges mutually overlap
/// (spec.md §3, "Section"). A single-run section is non-overlapping and
/// admits value-predicate pushdown; a multi-run section is overlapping and
/// must restrict pushdown to key-only predicates (spec.md §4.5, §4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub runs: Vec<SortedRun>,
}

impl Section {
    /// Whether this section has more than one run, and therefore must
    /// restrict predicate pushdown to key-only filters.
    pub fn is_overlapping(&self) -> bool {
        self.runs.len() > 1
    }
}

/// Groups `files` into sections of sorted runs (spec.md §4.5).
///
/// Algorithm: sort by `(min_key, max_key)`. Sweep left-to-right, extending
/// the current section's interval while the next file's `min_key <=` the
/// running `max_key`; otherwise close the section. Within a section,
/// greedily first-fit each file into the earliest run whose current
/// `max_key < file.min_key`, else start a new run. Deterministic given a
/// fixed comparator and input order.
pub fn plan_sections(
    mut files: Vec<DataFileMeta>,
    cmp: impl Fn(&GenericRow, &GenericRow) -> Ordering + Copy,
) -> Vec<Section> {
    files.sort_by(|a, b| cmp(&a.min_key, &b.min_key).then_with(|| cmp(&a.max_key, &b.max_key)));

    let mut sections = Vec::new();
    let mut current: Vec<DataFileMeta> = Vec::new();
    let mut running_max: Option<GenericRow> = None;

    for file in files {
        let starts_new_section = match &running_max {
            Some(max) => cmp(&file.min_key, max) == Ordering::Greater,
            None => false,
        };
        if starts_new_section {
            sections.push(pack_into_runs(std::mem::take(&mut current), cmp));
            running_max = None;
        }
        running_max = Some(match running_max {
            Some(max) if cmp(&max, &file.max_key) == Ordering::Greater => max,
            _ => file.max_key.clone(),
        });
        current.push(file);
    }
    if !current.is_empty() {
        sections.push(pack_into_runs(current, cmp));
    }
    sections
}

fn pack_into_runs(
    files: Vec<DataFileMeta>,
    cmp: impl Fn(&GenericRow, &GenericRow) -> Ordering,
) -> Section {
    let mut runs: Vec<SortedRun> = Vec::new();
    for file in files {
        let target = runs
            .iter_mut()
            .find(|run| matches!(run.max_key(), Some(max) if cmp(max, &file.min_key) == Ordering::Less));
        match target {
            Some(run) => run.files.push(file),
            None => runs.push(SortedRun { files: vec![file] }),
        }
    }
    Section { runs }
}
