use crate::filter;
use crate::model::{Catalog, Entry};

/// Per-window state: the shared catalog, this session's query and the view
/// derived from them. The view is recomputed on every query change.
pub struct Session {
    catalog: Catalog,
    query: String,
    view: Vec<usize>,
    pub selected_index: usize,
    /// Set when the catalog failed to load; stays for the whole session.
    pub catalog_notice: Option<String>,
    /// Result of the last copy; cleared by the next query change.
    pub copy_status: Option<String>,
}

impl Session {
    pub fn new(catalog: Catalog) -> Self {
        let view = (0..catalog.len()).collect();
        Self {
            catalog,
            query: String::new(),
            view,
            selected_index: 0,
            catalog_notice: None,
            copy_status: None,
        }
    }

    /// Installs the catalog once it has finished loading.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        self.refresh();
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.refresh();
    }

    pub fn push_str(&mut self, text: &str) {
        let mut query = self.query.clone();
        query.push_str(text);
        self.set_query(&query);
    }

    pub fn pop_char(&mut self) {
        let mut query = self.query.clone();
        if query.pop().is_some() {
            self.set_query(&query);
        }
    }

    fn refresh(&mut self) {
        self.view = filter::filter_indices(self.catalog.get_all(), &self.query);
        log::info!("Session: query='{}', filtered_count={}", self.query, self.view.len());
        self.selected_index = 0;
        self.copy_status = None;
    }

    /// Text for the status line: a pending copy result, else the catalog
    /// notice, else the live match count.
    pub fn status_line(&self) -> String {
        match (&self.copy_status, &self.catalog_notice) {
            (Some(status), _) => status.clone(),
            (None, Some(notice)) => notice.clone(),
            (None, None) => format!("{} of {} servers", self.view.len(), self.catalog.len()),
        }
    }

    /// The filtered view, in catalog order.
    pub fn filtered(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.view.iter().filter_map(|&idx| self.catalog.get(idx))
    }

    pub fn filtered_len(&self) -> usize {
        self.view.len()
    }

    pub fn filtered_get(&self, position: usize) -> Option<&Entry> {
        self.view.get(position).and_then(|&idx| self.catalog.get(idx))
    }

    pub fn move_selection(&mut self, delta: i32) {
        if self.view.is_empty() {
            self.selected_index = 0;
            return;
        }

        let len = self.view.len() as i32;
        let new_index = (self.selected_index as i32 + delta).rem_euclid(len);
        self.selected_index = new_index as usize;
    }

    /// Moves `rows` rows up or down in a grid of `columns`, wrapping within
    /// the current column so a partial last row never shifts the column.
    pub fn move_vertical(&mut self, rows: i32, columns: usize) {
        let len = self.view.len();
        if len == 0 {
            self.selected_index = 0;
            return;
        }

        let columns = columns.max(1);
        let column = self.selected_index % columns;
        let column_len = (len - column).div_ceil(columns);
        let row = (self.selected_index / columns) as i32;
        let new_row = (row + rows).rem_euclid(column_len as i32) as usize;
        self.selected_index = column + new_row * columns;
    }

    pub fn select(&mut self, position: usize) {
        if position < self.view.len() {
            self.selected_index = position;
        }
    }

    pub fn get_selected(&self) -> Option<&Entry> {
        self.filtered_get(self.selected_index)
    }
}
