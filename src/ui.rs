use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Cell, Clear, List, ListItem, ListState, Paragraph, Row,
        Table as TableWidget, TableState, Wrap,
    },
};

use crate::aggregate::FrequencyTable;
use crate::domain::DashboardConfig;
use crate::model::{Model, SelectorView, UIData};

pub const SIDEBAR_WIDTH: usize = 32;
pub const TITLE_HEIGHT: usize = 1;
pub const CHART_HEIGHT: usize = 10;
pub const STATUSLINE_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;

const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);
const BAR_WIDTH: u16 = 7;

#[derive(Debug)]
pub struct DashboardUI {
    status_timeout: Duration,
}

impl DashboardUI {
    pub fn new(_cfg: &DashboardConfig) -> Self {
        Self {
            status_timeout: STATUS_MESSAGE_TIMEOUT,
        }
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [sidebar, main] = Layout::horizontal([
            Constraint::Length(uidata.layout.sidebar_width as u16),
            Constraint::Min(0),
        ])
        .areas(frame.area());

        self.draw_sidebar(uidata, frame, sidebar);

        let [title, charts_top, charts_bottom, table, statusline] = Layout::vertical([
            Constraint::Length(TITLE_HEIGHT as u16),
            Constraint::Length(CHART_HEIGHT as u16),
            Constraint::Length(CHART_HEIGHT as u16),
            Constraint::Min(0),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(main);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                " 📊 ".into(),
                uidata.title.clone().bold(),
            ])),
            title,
        );

        let [top_left, top_right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(charts_top);
        let [bottom_left, bottom_right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(charts_bottom);

        let aggregates = &uidata.aggregates;
        frame.render_widget(
            count_chart("Constituency wise People", &aggregates.constituency),
            top_left,
        );
        frame.render_widget(
            share_chart("Gender wise People", &aggregates.gender),
            top_right,
        );
        frame.render_widget(
            share_chart("Occupation wise People", &aggregates.occupation),
            bottom_left,
        );
        frame.render_widget(
            count_chart(
                "Interested People in Constituency",
                &aggregates.interested_constituency,
            ),
            bottom_right,
        );

        self.draw_table(uidata, frame, table);
        self.draw_statusline(uidata, frame, statusline);

        if uidata.show_popup {
            let area = popup_area(frame.area(), 60, 70);
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(uidata.popup_message.clone())
                    .wrap(Wrap { trim: false })
                    .block(
                        Block::bordered()
                            .title(Line::from(" Help ".bold()).centered())
                            .title_bottom(Line::from(" <Esc> close ").centered())
                            .border_set(border::THICK),
                    ),
                area,
            );
        }
    }

    fn draw_sidebar(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let outer = Block::bordered().title(Line::from(" Choose your filter: ".bold()));
        let inner = outer.inner(area);
        frame.render_widget(outer, area);

        let areas = Layout::vertical([Constraint::Ratio(1, 4); 4]).split(inner);
        for (selector, area) in uidata.selectors.iter().zip(areas.iter()) {
            self.draw_selector(selector, frame, *area);
        }
    }

    fn draw_selector(&self, selector: &SelectorView, frame: &mut Frame, area: Rect) {
        let nselected = selector.options.iter().filter(|o| o.selected).count();
        let items: Vec<ListItem> = selector
            .options
            .iter()
            .map(|o| {
                let mark = if o.selected { "[x] " } else { "[ ] " };
                let mut spans = vec![Span::raw(mark), Span::raw(o.value.clone())];
                if o.stale {
                    spans.push(" (gone)".dark_gray());
                }
                let style = if o.selected {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(spans)).style(style)
            })
            .collect();

        let border_style = if selector.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::bordered()
            .title(Line::from(format!(
                " {} ({}) ",
                selector.column.prompt(),
                nselected
            )))
            .border_style(border_style);

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("›");
        let mut state = if selector.focused {
            ListState::default().with_selected(Some(selector.cursor))
        } else {
            ListState::default()
        };
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let header = Row::new(
            uidata
                .table
                .iter()
                .map(|c| Cell::from(c.name.clone().bold())),
        );
        let nvisible = uidata.table.first().map(|c| c.data.len()).unwrap_or(0);
        let rows = (0..nvisible).map(|ridx| {
            Row::new(
                uidata
                    .table
                    .iter()
                    .map(|c| Cell::from(c.data[ridx].clone())),
            )
        });
        let widths = uidata
            .table
            .iter()
            .map(|c| Constraint::Length(c.width as u16));

        let title = Line::from(vec![
            format!(" {} ", uidata.table_name).bold(),
            format!("{}/{} rows ", uidata.nrows, uidata.total_rows).yellow(),
        ]);
        let position = if uidata.nrows > 0 {
            format!(" row {} ", uidata.abs_selected_row + 1)
        } else {
            String::from(" no rows ")
        };
        let footer = Line::from(vec![
            position.into(),
            format!("<d> {} ", uidata.table_mode.site().file_name()).dark_gray(),
        ]);
        let table = TableWidget::new(rows, widths)
            .header(header)
            .block(Block::bordered().title(title).title_bottom(footer))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = TableState::default().with_selected(if nvisible > 0 {
            Some(uidata.selected_row)
        } else {
            None
        });
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let message = if uidata.last_status_message_update.elapsed() < self.status_timeout {
            uidata.status_message.clone()
        } else {
            String::from("Press ? for help")
        };
        let line = Line::from(vec![
            format!(" {} ", uidata.source_name).blue().bold(),
            format!("{:?} ", uidata.branch).dark_gray(),
            message.into(),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn chart_title(title: &str, counts: &FrequencyTable) -> Line<'static> {
    if counts.is_empty() {
        Line::from(vec![format!(" {title} ").bold(), "(no data) ".dark_gray()])
    } else {
        Line::from(format!(" {title} ")).bold()
    }
}

/// Names the key and count columns under the chart.
fn chart_legend(counts: &FrequencyTable) -> Line<'static> {
    Line::from(format!(" {} / {} ", counts.key_name, counts.count_name))
        .dark_gray()
        .right_aligned()
}

fn bar_label(value: &str) -> Line<'static> {
    Line::from(value.chars().take(BAR_WIDTH as usize).collect::<String>())
}

/// Vertical bars, one per value, labelled with the count.
fn count_chart<'a>(title: &'a str, counts: &FrequencyTable) -> BarChart<'a> {
    let title = chart_title(title, counts);
    let bars: Vec<Bar> = counts
        .rows
        .iter()
        .map(|(k, c)| {
            Bar::default()
                .value(*c as u64)
                .label(bar_label(k))
                .text_value(c.to_string())
        })
        .collect();
    BarChart::default()
        .block(
            Block::bordered()
                .title(title)
                .title_bottom(chart_legend(counts)),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(BAR_WIDTH)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
}

/// Horizontal bars with each value's share of the total.
fn share_chart<'a>(title: &'a str, counts: &FrequencyTable) -> BarChart<'a> {
    let title = chart_title(title, counts);
    let bars: Vec<Bar> = counts
        .shares()
        .into_iter()
        .zip(counts.rows.iter())
        .map(|((k, share), (_, c))| {
            Bar::default()
                .value(*c as u64)
                .label(Line::from(k))
                .text_value(format!("{share:.0}% {c}"))
        })
        .collect();
    BarChart::default()
        .block(
            Block::bordered()
                .title(title)
                .title_bottom(chart_legend(counts)),
        )
        .data(BarGroup::default().bars(&bars))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(Style::default().fg(Color::White))
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;
    use crate::fixtures::{StaticSource, survey_documents};
    use ratatui::{Terminal, backend::TestBackend};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn renders_dashboard_panels() {
        let cfg = DashboardConfig::default();
        let mut model = Model::init(
            &cfg,
            Box::new(StaticSource::new(survey_documents())),
            160,
            60,
        )
        .unwrap();
        let ui = DashboardUI::new(&cfg);
        let mut terminal = Terminal::new(TestBackend::new(160, 60)).unwrap();
        terminal.draw(|f| ui.draw(&model, f)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Political Survey in Jharkhand 2024"));
        assert!(text.contains("Constituency wise People"));
        assert!(text.contains("Pick the Gender"));
        assert!(text.contains("Constituency Data"));
        assert!(text.contains("Constituency / Number of People"));
        assert!(text.contains("Occupation / Count"));

        model.update(Some(Message::Help)).unwrap();
        terminal.draw(|f| ui.draw(&model, f)).unwrap();
        assert!(buffer_text(&terminal).contains("Help"));
    }

    #[test]
    fn renders_in_a_tiny_terminal() {
        let cfg = DashboardConfig::default();
        let model = Model::init(&cfg, Box::new(StaticSource::new(Vec::new())), 20, 8).unwrap();
        let ui = DashboardUI::new(&cfg);
        let mut terminal = Terminal::new(TestBackend::new(20, 8)).unwrap();
        terminal.draw(|f| ui.draw(&model, f)).unwrap();
    }
}
