use crate::api::StatsSource;
use crate::app::App;
use crate::braille::{BrailleCanvas, Layer};
use crate::map::Label;
use crate::stats::format::format_magnitude;
use crate::stats::{CaseType, Popup};
use crate::view::{chart_series, status_line, summary_cards, table_rows, SummaryCard};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, List, ListItem, ListState,
        Paragraph, Row, Table, TableState, Widget,
    },
    Frame,
};

const SIDE_PANEL_WIDTH: u16 = 38;
const CHART_HEIGHT: u16 = 12;
const CARD_HEIGHT: u16 = 4;

/// Screen regions, computed from the terminal size alone so the app can map
/// mouse positions without waiting for a draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Areas {
    pub header: Rect,
    pub cards: [Rect; 3],
    pub map: Rect,
    pub map_inner: Rect,
    pub table: Rect,
    pub chart: Rect,
    pub status: Rect,
}

impl Areas {
    pub fn compute(area: Rect) -> Self {
        let [header, cards_row, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(CARD_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(area);

        let cards = Layout::horizontal([Constraint::Ratio(1, 3); 3]).areas(cards_row);
        let [map, side] =
            Layout::horizontal([Constraint::Min(20), Constraint::Length(SIDE_PANEL_WIDTH)])
                .areas(body);
        let [table, chart] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(CHART_HEIGHT)]).areas(side);

        Self {
            header,
            cards,
            map,
            map_inner: map_block().inner(map),
            table,
            chart,
            status,
        }
    }

    /// Braille pixel size of the map canvas.
    pub fn map_pixels(&self) -> (usize, usize) {
        (
            self.map_inner.width as usize * 2,
            self.map_inner.height as usize * 4,
        )
    }
}

fn case_color(case_type: CaseType) -> Color {
    let c = case_type.color();
    Color::Rgb(c.r, c.g, c.b)
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

/// Render the UI
pub fn render<S: StatsSource>(frame: &mut Frame, app: &App<S>) {
    let areas = &app.areas;

    render_header(frame, app, areas.header);
    for (card, area) in summary_cards(app.state()).iter().zip(areas.cards) {
        render_card(frame, card, area);
    }
    render_map(frame, app, areas.map);
    render_table(frame, app, areas.table);
    render_chart(frame, app, areas.chart);
    render_status_bar(frame, app, areas.status);

    if app.picker.is_some() {
        render_picker(frame, app, frame.area());
    }
}

fn render_header<S: StatsSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let state = app.state();
    let region = state
        .display_name(&state.selected_region)
        .map(str::to_string)
        .unwrap_or_else(|| state.selected_region.to_string());

    let header = Line::from(vec![
        Span::styled(
            " COVID-19 Tracker ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(region, Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            state.selected_case_type.label(),
            Style::default().fg(case_color(state.selected_case_type)),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_card(frame: &mut Frame, card: &SummaryCard, area: Rect) {
    let accent = case_color(card.case_type);
    let border = if card.active {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let delta_color = if card.is_red { accent } else { Color::Green };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(
            format!(" {} ", card.title),
            Style::default().fg(Color::Gray),
        ));

    let text = vec![
        Line::from(Span::styled(
            card.delta.clone(),
            Style::default().fg(delta_color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{} Total", card.total),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_map<S: StatsSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let state = app.state();
    let block = map_block().title(Span::styled(
        format!(" {} ", state.selected_case_type),
        Style::default()
            .fg(case_color(state.selected_case_type))
            .add_modifier(Modifier::BOLD),
    ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut viewport = app.viewport.clone();
    viewport.resize(inner.width as usize * 2, inner.height as usize * 4);

    let mut canvas = BrailleCanvas::new(inner.width as usize, inner.height as usize);
    let label = app
        .map_renderer
        .render(&mut canvas, &viewport, &state.markers, &state.selected_region);

    let map_widget = MapWidget {
        canvas,
        marker_color: case_color(state.selected_case_type),
        label,
        popup: app.popup_marker().map(|m| m.popup.clone()),
    };
    frame.render_widget(map_widget, inner);
}

/// Braille map with the selected label and the inspection popup on top.
struct MapWidget {
    canvas: BrailleCanvas,
    marker_color: Color,
    label: Option<Label>,
    popup: Option<Popup>,
}

impl MapWidget {
    fn layer_style(&self, layer: Layer) -> Style {
        match layer {
            Layer::Land => Style::default().fg(Color::Cyan),
            Layer::Marker => Style::default().fg(self.marker_color),
            Layer::Highlight => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        }
    }

    fn render_popup(popup: &Popup, area: Rect, buf: &mut Buffer) {
        let width = popup
            .lines
            .iter()
            .map(|(ct, n)| ct.label().len() + n.len() + 2)
            .chain(std::iter::once(popup.title.chars().count()))
            .max()
            .unwrap_or(0) as u16
            + 4;
        let height = popup.lines.len() as u16 + 2;
        if width > area.width || height > area.height {
            return;
        }
        let rect = Rect::new(area.right() - width, area.y, width, height);

        let lines: Vec<Line> = popup
            .lines
            .iter()
            .map(|(ct, n)| {
                Line::from(vec![
                    Span::styled(format!("{}: ", ct.label()), Style::default().fg(Color::Gray)),
                    Span::styled(n.clone(), Style::default().fg(case_color(*ct))),
                ])
            })
            .collect();

        Clear.render(rect, buf);
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Gray))
                    .title(Span::styled(
                        format!(" {} ", popup.title),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
            )
            .render(rect, buf);
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            let y = area.y + row;
            let mut x = area.x;
            for (layer, text) in self.canvas.row_runs(row as usize) {
                for ch in text.chars() {
                    if x >= area.right() {
                        break;
                    }
                    // Empty braille cells keep the background untouched.
                    if let Some(layer) = layer {
                        buf[(x, y)].set_char(ch).set_style(self.layer_style(layer));
                    }
                    x += 1;
                }
            }
        }

        if let Some(label) = &self.label {
            if label.y < area.height && label.x < area.width {
                let max_len = (area.width - label.x) as usize;
                let style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
                for (i, ch) in label.text.chars().take(max_len.min(24)).enumerate() {
                    buf[(area.x + label.x + i as u16, area.y + label.y)]
                        .set_char(ch)
                        .set_style(style);
                }
            }
        }

        if let Some(popup) = &self.popup {
            Self::render_popup(popup, area, buf);
        }
    }
}

fn render_table<S: StatsSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let rows: Vec<Row> = table_rows(app.state())
        .into_iter()
        .map(|row| {
            let style = if row.selected {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(row.name),
                Cell::from(Line::from(row.cases).right_aligned()),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Min(12), Constraint::Length(13)])
        .header(
            Row::new(vec!["Country", "Cases"])
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Live Cases by Country "),
        )
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(app.table_cursor));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_chart<S: StatsSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let case_type = app.state().selected_case_type;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let Some(series) = chart_series(app.state()) else {
        frame.render_widget(
            Paragraph::new("No history yet")
                .style(Style::default().fg(Color::DarkGray))
                .block(block.title(" Worldwide history ")),
            area,
        );
        return;
    };

    let x_max = (series.points.len().saturating_sub(1)).max(1) as f64;
    let y_max = (series.max * 1.1).max(1.0);
    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(case_color(case_type)))
        .data(&series.points);

    let chart = Chart::new(vec![dataset])
        .block(block.title(format!(" {} ", series.title)))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels([
                    series.first_date.format("%b %d").to_string(),
                    series.last_date.format("%b %d").to_string(),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, y_max])
                .labels(["0".to_string(), format_magnitude(Some(y_max as u64))]),
        );
    frame.render_widget(chart, area);
}

fn render_status_bar<S: StatsSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let state = app.state();
    let message_style = if state.last_error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    let status = Line::from(vec![
        Span::styled(format!(" {} ", status_line(state)), message_style),
        Span::styled("| Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(app.lod_level(), Style::default().fg(Color::Magenta)),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | /:region w:world 1-3:type hjkl:pan +/-:zoom 0:reset b/m:layers q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn render_picker<S: StatsSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let Some(picker) = &app.picker else {
        return;
    };
    let entries = app.picker_entries();
    let rect = centered_rect(40, 20, area);

    let items: Vec<ListItem> = entries
        .iter()
        .map(|e| ListItem::new(e.label.clone()))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" Region: {}_ ", picker.filter))
                .title_bottom(" Enter:select Esc:close "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(picker.cursor));
    frame.render_widget(Clear, rect);
    frame.render_stateful_widget(list, rect, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_areas_fit_terminal() {
        let areas = Areas::compute(Rect::new(0, 0, 120, 40));
        assert_eq!(areas.header.height, 1);
        assert_eq!(areas.status.y, 39);
        assert_eq!(areas.table.width, SIDE_PANEL_WIDTH);
        assert_eq!(areas.map_inner.x, areas.map.x + 1);
        assert_eq!(areas.map_pixels(), (
            areas.map_inner.width as usize * 2,
            areas.map_inner.height as usize * 4,
        ));
        assert!(areas.cards.iter().all(|c| c.height == CARD_HEIGHT));
    }

    #[test]
    fn test_centered_rect_is_clamped() {
        let rect = centered_rect(40, 20, Rect::new(0, 0, 30, 10));
        assert_eq!(rect, Rect::new(0, 0, 30, 10));
    }
}
