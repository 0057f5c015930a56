use arboard::Clipboard;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::aggregate::Aggregates;
use crate::domain::{DashboardConfig, FilterColumn, HELP_TEXT, Message, SurveyError};
use crate::export::{self, ExportSite};
use crate::filter::{self, Branch, Selections};
use crate::source::RecordSource;
use crate::table::Table;
use crate::ui::{
    CHART_HEIGHT, COLUMN_WIDTH_MARGIN, SIDEBAR_WIDTH, STATUSLINE_HEIGHT, TABLE_HEADER_HEIGHT,
    TITLE_HEIGHT,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    DASHBOARD,
    POPUP,
}

/// Which rows the table panel shows, and what a download of it produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableMode {
    Filtered,
    Interested,
    Survey,
}

impl TableMode {
    fn next(&self) -> Self {
        match self {
            TableMode::Filtered => TableMode::Interested,
            TableMode::Interested => TableMode::Survey,
            TableMode::Survey => TableMode::Filtered,
        }
    }

    pub fn site(&self) -> ExportSite {
        match self {
            TableMode::Filtered => ExportSite::ConstituencyData,
            TableMode::Interested => ExportSite::InterestedConstituencyData,
            TableMode::Survey => ExportSite::SurveyData,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptionView {
    pub value: String,
    pub selected: bool,
    // Selected, but no longer offered by the stage this filter reads from.
    pub stale: bool,
}

#[derive(Clone, Debug)]
pub struct SelectorView {
    pub column: FilterColumn,
    pub options: Vec<OptionView>,
    pub cursor: usize,
    pub focused: bool,
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub sidebar_width: usize,
    pub table_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let sidebar_width = std::cmp::min(SIDEBAR_WIDTH, ui_width / 3);
        // Two chart rows, the table borders and its header share the remaining height.
        let table_height = ui_height
            .saturating_sub(TITLE_HEIGHT + 2 * CHART_HEIGHT + STATUSLINE_HEIGHT)
            .saturating_sub(TABLE_HEADER_HEIGHT + 2);
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            sidebar_width,
            table_height,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct UIData {
    pub title: String,
    pub source_name: String,
    pub selectors: Vec<SelectorView>,
    pub aggregates: Aggregates,
    pub branch: Branch,
    pub table_mode: TableMode,
    pub table_name: String,
    pub table: Vec<ColumnView>,
    pub nrows: usize,
    pub total_rows: usize,
    pub selected_row: usize,
    pub abs_selected_row: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub layout: UILayout,
    pub status_message: String,
    pub last_status_message_update: Instant,
}

pub struct Model {
    config: DashboardConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    source: Box<dyn RecordSource>,
    table: Table,
    selections: Selections,
    focus: FilterColumn,
    cursors: [usize; 4],
    options: [Vec<OptionView>; 4],
    branch: Branch,
    rows: Vec<usize>,
    aggregates: Aggregates,
    table_mode: TableMode,
    curser_row: usize,
    offset_row: usize,
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    /// Fetch the records once and build the first dashboard. A failing source is fatal here.
    pub fn init(
        config: &DashboardConfig,
        source: Box<dyn RecordSource>,
        ui_width: usize,
        ui_height: usize,
    ) -> Result<Self, SurveyError> {
        let documents = source.fetch_all()?;
        let table = Table::project(&documents);
        let aggregates = Aggregates::build(&table, &[]);
        let uilayout = UILayout::from_values(ui_width, ui_height);

        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::DASHBOARD,
            previous_modus: Modus::DASHBOARD,
            source,
            table,
            selections: Selections::default(),
            focus: FilterColumn::Constituency,
            cursors: [0; 4],
            options: Default::default(),
            branch: Branch::Unfiltered,
            rows: Vec::new(),
            uidata: UIData {
                title: config.title.clone(),
                source_name: String::new(),
                selectors: Vec::new(),
                aggregates: aggregates.clone(),
                branch: Branch::Unfiltered,
                table_mode: TableMode::Filtered,
                table_name: String::new(),
                table: Vec::new(),
                nrows: 0,
                total_rows: 0,
                selected_row: 0,
                abs_selected_row: 0,
                show_popup: false,
                popup_message: String::new(),
                layout: uilayout.clone(),
                status_message: String::new(),
                last_status_message_update: Instant::now(),
            },
            aggregates,
            table_mode: TableMode::Filtered,
            curser_row: 0,
            offset_row: 0,
            uilayout,
            clipboard: None,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        if model.table.is_empty() {
            warn!("No survey records in {}", model.source.name());
        }
        model.recompute(false);
        let loaded = format!("Loaded {} records from {}", model.table.len(), model.source.name());
        model.set_status_message(loaded);
        Ok(model)
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
    }

    // One full pass: (re)fetch, filter, aggregate, rebuild the view data.
    // Returns false when the refetch failed and the previous records were kept.
    fn recompute(&mut self, refetch: bool) -> bool {
        let start_time = Instant::now();
        let mut fetched = true;
        if refetch {
            match self.source.fetch_all() {
                Ok(documents) => self.table = Table::project(&documents),
                Err(e) => {
                    error!("Reloading records failed: {e}");
                    self.set_status_message(format!("Reload failed, showing previous data: {e}"));
                    fetched = false;
                }
            }
        }

        let resolution = filter::resolve(&self.table, &self.selections);
        let all = self.table.all_rows();
        for column in FilterColumn::CASCADE {
            let input = resolution.stages.input_of(column, &all);
            let selection = self.selections.get(column);
            let mut options: Vec<OptionView> =
                filter::options(&self.table, input, column.column())
                    .into_iter()
                    .map(|value| OptionView {
                        selected: selection.contains(&value),
                        stale: false,
                        value,
                    })
                    .collect();
            for value in selection.values() {
                if !options.iter().any(|o| &o.value == value) {
                    options.push(OptionView {
                        value: value.clone(),
                        selected: true,
                        stale: true,
                    });
                }
            }
            let cursor = &mut self.cursors[column.idx()];
            *cursor = std::cmp::min(*cursor, options.len().saturating_sub(1));
            self.options[column.idx()] = options;
        }

        self.branch = resolution.branch;
        self.rows = resolution.rows;
        self.aggregates = Aggregates::build(&self.table, &self.rows);

        debug!(
            "Recomputed dashboard: {:?}, {} of {} rows in {}ms",
            self.branch,
            self.rows.len(),
            self.table.len(),
            start_time.elapsed().as_millis()
        );
        self.clamp_table_selection();
        self.update_uidata();
        fetched
    }

    fn current_rows(&self) -> Vec<usize> {
        self.rows_for(self.table_mode.site())
    }

    fn visible_rows(&self) -> usize {
        std::cmp::max(self.uilayout.table_height, 1)
    }

    fn clamp_table_selection(&mut self) {
        let nrows = self.current_rows().len();
        if nrows == 0 {
            self.offset_row = 0;
            self.curser_row = 0;
            return;
        }
        if self.offset_row >= nrows {
            self.offset_row = nrows.saturating_sub(self.visible_rows());
        }
        let remaining = nrows - self.offset_row;
        self.curser_row = std::cmp::min(
            self.curser_row,
            std::cmp::min(self.visible_rows(), remaining) - 1,
        );
    }

    fn render_cell(value: Option<&str>) -> String {
        match value {
            Some(s) => s.replace("\r\n", " ↵ ").replace('\n', " ↵ "),
            None => String::from("∅"),
        }
    }

    fn build_table_view(&self, rows: &[usize]) -> Vec<ColumnView> {
        let rbegin = std::cmp::min(self.offset_row, rows.len());
        let rend = std::cmp::min(rbegin + self.visible_rows(), rows.len());
        self.table
            .columns()
            .iter()
            .map(|column| {
                let width = std::cmp::min(
                    std::cmp::max(column.name().len(), column.max_width) + COLUMN_WIDTH_MARGIN,
                    self.config.max_column_width,
                );
                ColumnView {
                    name: column.name().to_string(),
                    width,
                    data: rows[rbegin..rend]
                        .iter()
                        .map(|&r| Self::render_cell(column.data[r].as_deref()))
                        .collect(),
                }
            })
            .collect()
    }

    fn update_uidata(&mut self) {
        let rows = self.current_rows();
        let selectors = FilterColumn::CASCADE
            .iter()
            .map(|&column| SelectorView {
                column,
                options: self.options[column.idx()].clone(),
                cursor: self.cursors[column.idx()],
                focused: column == self.focus,
            })
            .collect();

        self.uidata.title = self.config.title.clone();
        self.uidata.source_name = self.source.name();
        self.uidata.selectors = selectors;
        self.uidata.aggregates = self.aggregates.clone();
        self.uidata.branch = self.branch;
        self.uidata.table_mode = self.table_mode;
        self.uidata.table_name = self.table_mode.site().title().to_string();
        self.uidata.table = self.build_table_view(&rows);
        self.uidata.nrows = rows.len();
        self.uidata.total_rows = self.table.len();
        self.uidata.selected_row = self.curser_row;
        self.uidata.abs_selected_row = self.offset_row + self.curser_row;
        self.uidata.layout = self.uilayout.clone();
        self.uidata.status_message = self.status_message.clone();
        self.uidata.last_status_message_update = self.last_status_message_update;
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.clamp_table_selection();
        self.update_uidata();
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), SurveyError> {
        if let Some(msg) = message {
            match self.modus {
                Modus::DASHBOARD => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.show_help(),
                    Message::FocusNext => self.move_focus(self.focus.next()),
                    Message::FocusPrevious => self.move_focus(self.focus.previous()),
                    Message::MoveUp => self.move_option_cursor(-1),
                    Message::MoveDown => self.move_option_cursor(1),
                    Message::ToggleOption => self.toggle_option(),
                    Message::ClearSelection => self.clear_selection(),
                    Message::ClearAllSelections => self.clear_all_selections(),
                    Message::CycleTableView => self.cycle_table_view(),
                    Message::ScrollUp => self.move_table_selection_up(self.visible_rows()),
                    Message::ScrollDown => self.move_table_selection_down(self.visible_rows()),
                    Message::ScrollBeginning => self.move_table_selection_beginning(),
                    Message::ScrollEnd => self.move_table_selection_end(),
                    Message::Download => self.download_current(),
                    Message::DownloadAll => self.download_all(),
                    Message::CopyRow => self.copy_table_row(),
                    Message::Reload => self.reload(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Exit => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Exit | Message::Help => self.exit(),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
    }

    fn exit(&mut self) {
        if self.modus == Modus::POPUP {
            trace!("Close popup ...");
            self.modus = self.previous_modus;
            self.previous_modus = Modus::POPUP;
            self.uidata.show_popup = false;
        }
    }

    fn move_focus(&mut self, column: FilterColumn) {
        self.focus = column;
        self.update_uidata();
    }

    fn move_option_cursor(&mut self, step: i32) {
        let idx = self.focus.idx();
        let noptions = self.options[idx].len();
        if noptions == 0 {
            return;
        }
        let cursor = &mut self.cursors[idx];
        if step < 0 {
            *cursor = cursor.saturating_sub(step.unsigned_abs() as usize);
        } else {
            *cursor = std::cmp::min(*cursor + step as usize, noptions - 1);
        }
        self.update_uidata();
    }

    fn toggle_option(&mut self) {
        let idx = self.focus.idx();
        let Some(option) = self.options[idx].get(self.cursors[idx]) else {
            return;
        };
        let value = option.value.clone();
        self.selections.get_mut(self.focus).toggle(&value);
        info!("Toggled {:?} = {}", self.focus, value);
        self.recompute(true);
    }

    fn clear_selection(&mut self) {
        self.selections.get_mut(self.focus).clear();
        self.recompute(true);
    }

    fn clear_all_selections(&mut self) {
        self.selections.clear();
        self.recompute(true);
    }

    fn reload(&mut self) {
        if self.recompute(true) {
            let message = format!("Reloaded {} records", self.table.len());
            self.set_status_message(message);
        }
    }

    fn cycle_table_view(&mut self) {
        self.table_mode = self.table_mode.next();
        self.offset_row = 0;
        self.curser_row = 0;
        self.update_uidata();
    }

    fn export_dir(&self) -> PathBuf {
        self.config.export_dir.clone()
    }

    fn rows_for(&self, site: ExportSite) -> Vec<usize> {
        match site {
            ExportSite::ConstituencyData => self.rows.clone(),
            ExportSite::InterestedConstituencyData => self.aggregates.interested_rows.clone(),
            ExportSite::SurveyData => self.table.all_rows(),
        }
    }

    fn download(&self, site: ExportSite) -> Result<PathBuf, SurveyError> {
        let rows = self.rows_for(site);
        export::export(&self.table, &rows, site)
            .and_then(|artifact| artifact.download(&self.export_dir()))
            .map_err(|e| SurveyError::ExportFailed(format!("{}: {e}", site.file_name())))
    }

    fn download_current(&mut self) {
        let site = self.table_mode.site();
        match self.download(site) {
            Ok(path) => self.set_status_message(format!("Saved {}", path.display())),
            Err(e) => {
                error!("Download of {:?} failed: {e}", site);
                self.set_status_message(format!("Download failed: {e}"));
            }
        }
    }

    fn download_all(&mut self) {
        let mut failed: Vec<SurveyError> = Vec::new();
        for site in ExportSite::ALL {
            if let Err(e) = self.download(site) {
                error!("Download of {:?} failed: {e}", site);
                failed.push(e);
            }
        }
        let message = match failed.last() {
            None => format!("Saved all exports into {}", self.export_dir().display()),
            Some(e) => format!(
                "Download failed for {} of {} exports: {e}",
                failed.len(),
                ExportSite::ALL.len()
            ),
        };
        self.set_status_message(message);
    }

    /// The selected row as one CSV record, quoted like the file exports.
    fn selected_row_as_csv(&self) -> Result<Option<String>, SurveyError> {
        let rows = self.current_rows();
        let Some(&row) = rows.get(self.offset_row + self.curser_row) else {
            return Ok(None);
        };
        trace!("Copying record {}", self.table.id(row));
        let content = export::to_csv(&self.table, &[row])?;
        let text = String::from_utf8_lossy(&content);
        let record = text
            .split_once('\n')
            .map(|(_header, record)| record)
            .unwrap_or_default();
        let record = record.strip_suffix('\n').unwrap_or(record);
        Ok(Some(record.strip_suffix('\r').unwrap_or(record).to_string()))
    }

    fn copy_table_row(&mut self) {
        let row_content = match self.selected_row_as_csv() {
            Ok(Some(content)) => content,
            Ok(None) => {
                self.set_status_message("Nothing to copy");
                return;
            }
            Err(e) => {
                error!("Could not serialize row: {e}");
                self.set_status_message(format!("Copy failed: {e}"));
                return;
            }
        };
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(cb) => self.clipboard = Some(cb),
                Err(e) => {
                    warn!("Clipboard unavailable: {:?}", e);
                    self.set_status_message("Clipboard unavailable");
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(row_content) {
                Ok(_) => {
                    trace!("Copied row content to clipboard.");
                    self.set_status_message("Copied row to clipboard");
                }
                Err(e) => {
                    warn!("Error copying to clipboard: {:?}", e);
                    self.set_status_message(format!("Copy failed: {e}"));
                }
            }
        }
    }

    fn move_table_selection_beginning(&mut self) {
        self.curser_row = 0;
        self.offset_row = 0;
        self.update_uidata();
    }

    fn move_table_selection_end(&mut self) {
        let nrows = self.current_rows().len();
        if nrows == 0 {
            return;
        }
        if nrows < self.visible_rows() {
            self.offset_row = 0;
            self.curser_row = nrows - 1;
        } else {
            self.offset_row = nrows - self.visible_rows();
            self.curser_row = self.visible_rows() - 1;
        }
        self.update_uidata();
    }

    fn move_table_selection_up(&mut self, size: usize) {
        if self.curser_row > 0 {
            self.curser_row = self.curser_row.saturating_sub(size);
        } else if self.offset_row > 0 {
            self.offset_row = self.offset_row.saturating_sub(size);
        }
        self.update_uidata();
    }

    fn move_table_selection_down(&mut self, size: usize) {
        let nrows = self.current_rows().len();
        if self.curser_row + self.offset_row + 1 < nrows {
            if self.curser_row < self.visible_rows() - 1 {
                // Somewhere in the middle of the table
                self.curser_row = std::cmp::min(
                    self.curser_row + size,
                    std::cmp::min(self.visible_rows(), nrows - self.offset_row) - 1,
                );
            } else {
                // At the bottom of the table, need to shift table down
                self.offset_row = std::cmp::min(self.offset_row + size, nrows - 1);
                self.curser_row =
                    std::cmp::min(self.visible_rows() - 1, nrows - self.offset_row - 1);
            }
            self.update_uidata();
        }
    }
}
