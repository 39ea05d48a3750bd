//! Ordered collections of uniform rows
//!
//! A [`RowGroup`] owns an immutable snapshot (`Arc<Vec<Arc<Row<F>>>>`) that
//! is swapped on every applied change, so a caller holding an older snapshot
//! can detect changes with [`Arc::ptr_eq`] instead of a deep comparison.
//! Rows are shared between snapshots; a change copies only the rows it
//! touches.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

/// Default maximum number of rows in a group
pub const DEFAULT_MAX_ROWS: usize = 5;

/// Local identity of a row inside its group
///
/// Ids are process-wide, monotonic and never reused. They are never sent to
/// the backend, which assigns its own identifiers on first save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

impl RowId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        Self(NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

/// Field set carried by one row
///
/// Updates are a closed set of variants per row type, so a row can only be
/// changed through operations its type declares.
pub trait RowFields: Clone + Send + Sync + 'static {
    /// Tagged update operation for this row type
    type Update;

    /// Apply one update in place
    fn apply(&mut self, update: Self::Update);

    /// Re-derive position-dependent fields (0-based position)
    fn relabel(&mut self, _position: usize) {}
}

/// One row of a group
#[derive(Debug, Clone, PartialEq)]
pub struct Row<F> {
    pub id: RowId,
    pub fields: F,
}

impl<F> Row<F> {
    pub fn new(fields: F) -> Self {
        Self { id: RowId::next(), fields }
    }
}

/// Outcome of a group operation
///
/// Rejections are ordinary outcomes rather than errors: the group is left
/// unchanged and no observer is notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChange {
    /// The change was applied and observers were notified
    Applied,
    /// The group already holds its maximum number of rows
    AtCapacity,
    /// Deleting would leave the group empty
    LastRow,
    /// No row has the given id
    UnknownRow,
}

impl RowChange {
    pub fn is_applied(self) -> bool {
        self == RowChange::Applied
    }
}

/// Observer receiving the full collection after every applied change
pub type RowObserver<F> = Arc<dyn Fn(&[Arc<Row<F>>]) + Send + Sync>;

/// Repeatable field group
pub struct RowGroup<F: RowFields> {
    rows: Arc<Vec<Arc<Row<F>>>>,
    template: F,
    max_rows: usize,
    observers: Vec<RowObserver<F>>,
}

impl<F: RowFields> RowGroup<F> {
    /// Create a group holding one row built from `template`
    pub fn new(template: F) -> Self {
        Self::with_max_rows(template, DEFAULT_MAX_ROWS)
    }

    /// Create a group with a custom capacity (at least one row)
    pub fn with_max_rows(template: F, max_rows: usize) -> Self {
        let mut first = template.clone();
        first.relabel(0);
        Self {
            rows: Arc::new(vec![Arc::new(Row::new(first))]),
            template,
            max_rows: max_rows.max(1),
            observers: Vec::new(),
        }
    }

    /// Build a group from existing field sets, falling back to one template
    /// row when `fields` is empty
    ///
    /// Rows beyond `max_rows` are kept; the capacity only limits additions.
    pub fn from_fields<I>(template: F, max_rows: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
    {
        let mut group = Self::with_max_rows(template, max_rows);
        let mut rows: Vec<_> = fields.into_iter().map(|f| Arc::new(Row::new(f))).collect();
        if !rows.is_empty() {
            relabel_from(&mut rows, 0);
            group.rows = Arc::new(rows);
        }
        group
    }

    /// Register an observer
    pub fn on_change<O>(&mut self, observer: O)
    where
        O: Fn(&[Arc<Row<F>>]) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(observer));
    }

    pub fn rows(&self) -> &[Arc<Row<F>>] {
        &self.rows
    }

    /// Shared snapshot of the current collection
    pub fn snapshot(&self) -> Arc<Vec<Arc<Row<F>>>> {
        Arc::clone(&self.rows)
    }

    pub fn fields(&self) -> impl Iterator<Item = &F> {
        self.rows.iter().map(|row| &row.fields)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.max_rows
    }

    pub fn template(&self) -> &F {
        &self.template
    }

    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    pub fn get(&self, id: RowId) -> Option<&Row<F>> {
        self.rows.iter().find(|row| row.id == id).map(Arc::as_ref)
    }

    /// Insert a template row immediately after `after_index`
    ///
    /// An index past the end appends.
    pub fn add_row(&mut self, after_index: usize) -> RowChange {
        if self.is_full() {
            log::debug!("add_row ignored: group already holds {} rows", self.max_rows);
            return RowChange::AtCapacity;
        }

        let at = after_index.saturating_add(1).min(self.rows.len());
        let mut rows = self.rows.as_ref().clone();
        rows.insert(at, Arc::new(Row::new(self.template.clone())));
        relabel_from(&mut rows, at);
        self.commit(rows);
        RowChange::Applied
    }

    /// Remove the row with the given id; the last row always stays
    pub fn delete_row(&mut self, id: RowId) -> RowChange {
        let Some(at) = self.position(id) else {
            return RowChange::UnknownRow;
        };
        if self.rows.len() <= 1 {
            return RowChange::LastRow;
        }

        let mut rows = self.rows.as_ref().clone();
        rows.remove(at);
        relabel_from(&mut rows, at);
        self.commit(rows);
        RowChange::Applied
    }

    /// Apply one update to the row with the given id
    pub fn update_field(&mut self, id: RowId, update: F::Update) -> RowChange {
        let Some(at) = self.position(id) else {
            return RowChange::UnknownRow;
        };

        let mut rows = self.rows.as_ref().clone();
        Arc::make_mut(&mut rows[at]).fields.apply(update);
        self.commit(rows);
        RowChange::Applied
    }

    /// Back to a single template row
    pub fn reset(&mut self) {
        let mut first = self.template.clone();
        first.relabel(0);
        self.commit(vec![Arc::new(Row::new(first))]);
    }

    fn commit(&mut self, rows: Vec<Arc<Row<F>>>) {
        self.rows = Arc::new(rows);
        for observer in &self.observers {
            observer(&self.rows);
        }
    }
}

/// Re-derive labels of the rows whose position may have changed
fn relabel_from<F: RowFields>(rows: &mut [Arc<Row<F>>], start: usize) {
    for (position, row) in rows.iter_mut().enumerate().skip(start) {
        Arc::make_mut(row).fields.relabel(position);
    }
}

impl<F: RowFields> Clone for RowGroup<F> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            template: self.template.clone(),
            max_rows: self.max_rows,
            observers: self.observers.clone(),
        }
    }
}

impl<F: RowFields + fmt::Debug> fmt::Debug for RowGroup<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowGroup")
            .field("rows", &self.rows)
            .field("max_rows", &self.max_rows)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Line {
        code: String,
        qty: u32,
    }

    enum LineUpdate {
        Code(String),
        Qty(u32),
    }

    impl RowFields for Line {
        type Update = LineUpdate;

        fn apply(&mut self, update: LineUpdate) {
            match update {
                LineUpdate::Code(code) => self.code = code,
                LineUpdate::Qty(qty) => self.qty = qty,
            }
        }
    }

    #[test]
    fn test_new_group_has_one_row() {
        let group = RowGroup::new(Line::default());
        assert_eq!(group.len(), 1);
        assert!(!group.is_empty());
    }

    #[test]
    fn test_delete_last_row_is_rejected() {
        let mut group = RowGroup::new(Line::default());
        let only = group.rows()[0].id;

        assert_eq!(group.delete_row(only), RowChange::LastRow);
        assert_eq!(group.len(), 1);
        assert_eq!(group.rows()[0].id, only);
    }

    #[test]
    fn test_add_row_inserts_after_index() {
        let mut group = RowGroup::new(Line::default());
        let first = group.rows()[0].id;
        group.update_field(first, LineUpdate::Code("A".into()));
        group.add_row(0);
        let last = group.rows()[1].id;
        group.update_field(last, LineUpdate::Code("C".into()));

        assert_eq!(group.add_row(0), RowChange::Applied);

        let codes: Vec<_> = group.fields().map(|line| line.code.clone()).collect();
        assert_eq!(codes, vec!["A", "", "C"]);
    }

    #[test]
    fn test_add_row_past_end_appends() {
        let mut group = RowGroup::new(Line::default());
        group.add_row(42);
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_add_row_at_capacity_is_noop() {
        let mut group = RowGroup::with_max_rows(Line::default(), 3);
        group.add_row(0);
        group.add_row(1);
        assert_eq!(group.len(), 3);

        let before = group.snapshot();
        assert_eq!(group.add_row(2), RowChange::AtCapacity);
        assert_eq!(group.len(), 3);
        assert!(Arc::ptr_eq(&before, &group.snapshot()));
    }

    #[test]
    fn test_update_field_produces_new_snapshot() {
        let mut group = RowGroup::new(Line::default());
        group.add_row(0);
        let target = group.rows()[1].id;
        let before = group.snapshot();

        group.update_field(target, LineUpdate::Qty(7));

        assert!(!Arc::ptr_eq(&before, &group.snapshot()));
        assert_eq!(before[1].fields.qty, 0);
        assert_eq!(group.rows()[1].fields.qty, 7);
        assert!(Arc::ptr_eq(&group.rows()[0], &before[0]));
    }

    #[test]
    fn test_changes_copy_only_touched_rows() {
        let mut group = RowGroup::new(Line::default());
        group.add_row(0);
        group.add_row(1);
        let before = group.snapshot();

        group.update_field(before[2].id, LineUpdate::Code("X".into()));
        let after = group.snapshot();
        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert!(Arc::ptr_eq(&before[1], &after[1]));
        assert!(!Arc::ptr_eq(&before[2], &after[2]));
        assert!(before[2].fields.code.is_empty());

        group.add_row(0);
        assert!(Arc::ptr_eq(&after[0], &group.rows()[0]));
    }

    #[test]
    fn test_unknown_row_is_reported() {
        let mut group = RowGroup::new(Line::default());
        let stranger = RowId::next();
        assert_eq!(group.update_field(stranger, LineUpdate::Qty(1)), RowChange::UnknownRow);
        assert_eq!(group.delete_row(stranger), RowChange::UnknownRow);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut group = RowGroup::new(Line::default());
        group.add_row(0);
        let removed = group.rows()[1].id;
        group.delete_row(removed);
        group.add_row(0);

        assert_ne!(group.rows()[1].id, removed);
    }

    #[test]
    fn test_observer_receives_full_collection() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut group = RowGroup::new(Line::default());
        group.on_change(move |rows| sink.lock().unwrap().push(rows.len()));

        group.add_row(0);
        group.add_row(0);
        let id = group.rows()[0].id;
        group.delete_row(id);
        group.delete_row(RowId::next());

        assert_eq!(*seen.lock().unwrap(), vec![2, 3, 2]);
    }

    #[test]
    fn test_from_fields_falls_back_to_one_row() {
        let group = RowGroup::from_fields(Line::default(), 5, Vec::new());
        assert_eq!(group.len(), 1);

        let group = RowGroup::from_fields(
            Line::default(),
            5,
            vec![Line { code: "KG".into(), qty: 1 }, Line { code: "G".into(), qty: 1000 }],
        );
        assert_eq!(group.len(), 2);
        assert_eq!(group.rows()[1].fields.code, "G");
    }
}
