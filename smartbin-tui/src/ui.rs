use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap,
        canvas::{Canvas, Context, Line as CanvasLine, Points},
    },
};
use smartbin_core::{
    map::{MIN_VIEW_SPAN, MapLayers, MarkerSize, Viewport},
    model::{AlertSeverity, Bin, ConnectionStatus, Coordinate, RiskLevel, WasteCategory},
    notify::Severity,
    registry::HIGH_PRIORITY_THRESHOLD,
};

use crate::app::{App, DetailView};

/// Segments per dashed direct line; odd ones are left blank.
const DASH_SEGMENTS: u32 = 24;

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: header, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(area);

    let [header_area, content_area, status_area] = layout_chunks.as_ref() else {
        return;
    };

    draw_header(frame, app, *header_area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(*content_area);
    let [list_area, right_area] = columns.as_ref() else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(*right_area);
    let [map_area, detail_area] = rows.as_ref() else {
        return;
    };

    draw_bin_list(frame, app, *list_area);
    draw_map(frame, app.dashboard.map(), *map_area);
    match app.detail {
        DetailView::Bin => draw_bin_detail(frame, app, *detail_area),
        DetailView::Route => draw_route(frame, app, *detail_area),
        DetailView::Prediction => draw_prediction(frame, app, *detail_area),
        DetailView::Navigation => draw_navigation(frame, app, *detail_area),
        DetailView::Alerts => draw_alerts(frame, app, *detail_area),
    }

    draw_status(frame, app, *status_area);
}

fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let (connection, connection_style) = match dashboard.connection() {
        ConnectionStatus::Connected => ("connected", Style::default().fg(Color::Green)),
        ConnectionStatus::Error => ("backend unreachable", Style::default().fg(Color::Red)),
        ConnectionStatus::Unknown => ("connecting…", Style::default().fg(Color::Yellow)),
    };
    let stats = dashboard.registry().stats();

    let mut spans = vec![Span::styled(connection, connection_style)];
    if let Some(database) = dashboard
        .health()
        .and_then(|health| health.database.as_deref())
    {
        spans.push(Span::raw(format!(" ({database})")));
    }
    spans.push(Span::raw(format!(
        " · {} bins · {} high priority · {} critical · avg fill {:.0}%",
        stats.total, stats.high_priority, stats.critical, stats.average_fill
    )));
    if let Some(savings) = dashboard
        .registry()
        .system_stats()
        .and_then(|system| system.fuel_savings_percent)
    {
        spans.push(Span::raw(format!(" · fuel savings {savings:.1}%")));
    }
    if let Some(session) = dashboard.navigation().session() {
        spans.push(Span::styled(
            format!(
                " · en route to {} ({} min)",
                session.destination.id,
                session.remaining_minutes()
            ),
            Style::default().fg(Color::Cyan),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("SmartBin – waste collection monitor"),
    );
    frame.render_widget(header, area);
}

fn draw_bin_list(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let registry = app.dashboard.registry();
    let selected = registry.selected_id();

    let items = if registry.bins().is_empty() {
        vec![ListItem::new("No bins yet. Press r to refresh.")]
    } else {
        registry
            .sorted_by_priority()
            .map(|bin| {
                let marker = if Some(&bin.id) == selected { "● " } else { "  " };
                let provisional = if registry.is_provisional(&bin.id) {
                    " *"
                } else {
                    ""
                };
                let mut style = Style::default().fg(category_color(bin.category));
                if bin.priority_score > HIGH_PRIORITY_THRESHOLD {
                    style = style.add_modifier(Modifier::BOLD);
                }
                ListItem::new(format!(
                    "{marker}{:<8} {:>3.0}%  {:.2}  {}{provisional}",
                    bin.id, bin.fill_level, bin.priority_score, bin.location
                ))
                .style(style)
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Bins by priority (↑/↓, Enter)"),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if !registry.bins().is_empty() {
        state.select(Some(app.bin_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_map(frame: &mut Frame<'_>, map: &MapLayers, area: Rect) {
    let view = map
        .viewport()
        .unwrap_or_else(|| around(map.current_location()));

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title("Map"))
        .marker(Marker::Braille)
        .x_bounds([view.west, view.east])
        .y_bounds([view.south, view.north])
        .paint(|ctx| paint_map(ctx, map));

    frame.render_widget(canvas, area);
}

fn paint_map(ctx: &mut Context<'_>, map: &MapLayers) {
    if let Some(route) = map.route() {
        for pair in route.polyline.windows(2) {
            if let [from, to] = pair {
                ctx.draw(&segment(*from, *to, Color::Blue));
            }
        }
    }
    if let Some(direct) = map.direct_route() {
        for index in (0..DASH_SEGMENTS).step_by(2) {
            let from = direct
                .from
                .lerp(direct.to, f64::from(index) / f64::from(DASH_SEGMENTS));
            let to = direct
                .from
                .lerp(direct.to, f64::from(index + 1) / f64::from(DASH_SEGMENTS));
            ctx.draw(&segment(from, to, Color::Red));
        }
    }
    ctx.layer();

    for marker in map.markers() {
        let color = category_color(marker.category);
        ctx.draw(&Points {
            coords: &[(marker.position.lng, marker.position.lat)],
            color,
        });
        if marker.size == MarkerSize::Large {
            let mut style = Style::default().fg(color).add_modifier(Modifier::BOLD);
            if marker.pulsing {
                style = style.add_modifier(Modifier::SLOW_BLINK);
            }
            ctx.print(
                marker.position.lng,
                marker.position.lat,
                Span::styled("◉", style),
            );
        }
    }

    if let Some(route) = map.route() {
        for stop in &route.stops {
            ctx.print(
                stop.position.lng,
                stop.position.lat,
                Span::styled(
                    stop.number.to_string(),
                    Style::default().fg(Color::White).bg(Color::Blue),
                ),
            );
        }
    }

    let vehicle = map.current_location();
    ctx.print(
        vehicle.lng,
        vehicle.lat,
        Span::styled("▲", Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD)),
    );

    if let Some(popup) = map.popup() {
        ctx.print(
            popup.position.lng,
            popup.position.lat,
            Span::styled(
                format!(" {}", popup.popup),
                Style::default().fg(Color::Black).bg(Color::Yellow),
            ),
        );
    }
}

fn segment(from: Coordinate, to: Coordinate, color: Color) -> CanvasLine {
    CanvasLine::new(from.lng, from.lat, to.lng, to.lat, color)
}

fn around(center: Coordinate) -> Viewport {
    let half = MIN_VIEW_SPAN * 5.0;
    Viewport {
        south: center.lat - half,
        west: center.lng - half,
        north: center.lat + half,
        east: center.lng + half,
    }
}

fn draw_bin_detail(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(bin) = app.dashboard.registry().selected() else {
        let paragraph = Paragraph::new("Select a bin with Enter to see its details.")
            .block(Block::default().borders(Borders::ALL).title("Bin"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let paragraph = Paragraph::new(bin_lines(bin))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Bin {} (n navigate · p predict)", bin.id)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn bin_lines(bin: &Bin) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} · {}", bin.location, bin.category.label()),
            Style::default()
                .fg(category_color(bin.category))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "Fill {:.0}% · priority {:.2} · status {}",
            bin.fill_level, bin.priority_score, bin.status
        )),
    ];
    if let Some(address) = &bin.address {
        lines.push(Line::from(address.clone()));
    }

    let sensors = &bin.sensors;
    let readings: Vec<String> = [
        sensors.weight_kg.map(|value| format!("{value:.1} kg")),
        sensors.temperature_c.map(|value| format!("{value:.1} °C")),
        sensors.battery_percent.map(|value| format!("battery {value:.0}%")),
        sensors.gas_ppm.map(|value| format!("gas {value:.0} ppm")),
        sensors.humidity_percent.map(|value| format!("humidity {value:.0}%")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !readings.is_empty() {
        lines.push(Line::from(readings.join(" · ")));
    }

    if let Some(hazard) = bin.hazard_score {
        lines.push(Line::from(format!("Hazard score {hazard:.1}")));
    }
    if let Some(full) = &bin.predicted_full {
        lines.push(Line::from(format!("Predicted full in {full}")));
    }
    if let Some(updated) = bin.last_update {
        lines.push(Line::from(format!(
            "Last update {}",
            updated.format("%d.%m.%Y %H:%M")
        )));
    }
    if bin.position().is_none() {
        lines.push(Line::from(Span::styled(
            "No coordinates: not shown on the map",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines
}

fn draw_route(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(route) = app.dashboard.route() else {
        let paragraph = Paragraph::new("Press o to compute an optimized collection route.")
            .block(Block::default().borders(Borders::ALL).title("Route"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let summary = &route.summary;
    let title = format!(
        "Route: {} stops · {:.1} km · {} min · fuel savings {:.1}% (c clear)",
        summary.total_stops,
        summary.total_distance_km,
        summary.estimated_time_minutes,
        summary.fuel_savings_percent
    );

    if route.stops.is_empty() {
        let paragraph = Paragraph::new("No bins need collection right now.")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = route.stops.iter().map(|stop| {
        Row::new(vec![
            Cell::from(stop.stop_number.to_string()),
            Cell::from(stop.bin_id.to_string()),
            Cell::from(stop.location.clone()),
            Cell::from(format!("{:.0}%", stop.fill_level)),
            Cell::from(format!("{:.1} km", stop.distance_from_previous_km)),
            Cell::from(stop.estimated_arrival.clone().unwrap_or_default()),
        ])
        .style(Style::default().fg(category_color(stop.category)))
    });

    let column_widths = [
        Constraint::Length(4),
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(9),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["#", "Bin", "Location", "Fill", "Leg", "ETA"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn draw_prediction(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let Some(prediction) = app.dashboard.prediction() else {
        let paragraph = Paragraph::new("Select a bin and press p for a fill prediction.")
            .block(Block::default().borders(Borders::ALL).title("Prediction"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    };

    let risk = &prediction.risk;
    let risk_color = match &risk.level {
        RiskLevel::High => Color::Red,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::Low => Color::Green,
        RiskLevel::Other(_) => Color::Gray,
    };
    let risk_label = match &risk.level {
        RiskLevel::High => "high",
        RiskLevel::Medium => "medium",
        RiskLevel::Low => "low",
        RiskLevel::Other(level) => level.as_str(),
    };

    let mut lines = vec![
        Line::from(format!(
            "80% in {:.1} h · 90% in {:.1} h · full in {:.1} h",
            prediction.hours_to_80_percent,
            prediction.hours_to_90_percent,
            prediction.hours_to_full
        )),
        Line::from(Span::styled(
            format!("Risk {risk_label} ({:.2})", risk.overall_score),
            Style::default().fg(risk_color).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(rate) = prediction.daily_fill_rate_percent {
        lines.push(Line::from(format!("Fills {rate:.1}% per day")));
    }
    if let Some(collection) = prediction.predicted_collection {
        lines.push(Line::from(format!(
            "Collect by {}",
            collection.format("%d.%m.%Y %H:%M")
        )));
    }
    lines.extend(
        risk.recommendations
            .iter()
            .map(|recommendation| Line::from(format!("• {recommendation}"))),
    );

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Prediction for {}", prediction.bin_id)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_navigation(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let dashboard = &app.dashboard;
    let mut lines = Vec::new();

    match dashboard.navigation().session() {
        Some(session) => {
            lines.push(Line::from(Span::styled(
                format!(
                    "En route to {} · {}",
                    session.destination.id, session.destination.location
                ),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(format!(
                "{:.0}% done · {} min remaining",
                (session.progress() * 100.0).min(100.0),
                session.remaining_minutes()
            )));
            lines.push(Line::from(format!(
                "Position {:.5}, {:.5}",
                session.position.lat, session.position.lng
            )));
        }
        None => lines.push(Line::from(
            "Idle. Select a bin and press n to simulate a trip.",
        )),
    }

    if let Some(plan) = dashboard.navigation_plan() {
        lines.push(Line::from(format!(
            "{:.2} km · {} min · {:.0}% on arrival",
            plan.distance_km, plan.estimated_travel_minutes, plan.predicted_fill_on_arrival
        )));
        if let Some(justification) = &plan.justification {
            lines.push(Line::from(justification.clone()));
        }
        if let Some(traffic) = &plan.traffic {
            lines.push(Line::from(format!(
                "Traffic {} · +{} min",
                traffic.route_status.replace('_', " "),
                traffic.estimated_delay_minutes
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Navigation (s stop)"),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_alerts(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let alerts = app.dashboard.alerts();
    let items = if alerts.is_empty() {
        vec![ListItem::new("No active alerts. Press a to reload.")]
    } else {
        alerts
            .iter()
            .map(|alert| {
                let severity_color = match alert.severity {
                    AlertSeverity::Critical => Color::Red,
                    AlertSeverity::High => Color::Yellow,
                    AlertSeverity::Info => Color::Gray,
                };
                let priority = alert
                    .priority_score
                    .map(|score| format!(" · P {score:.2}"))
                    .unwrap_or_default();
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} · {} ", alert.bin_id, alert.location),
                        Style::default().fg(category_color(alert.category)),
                    ),
                    Span::styled(
                        format!("· {}{priority}", alert.message),
                        Style::default().fg(severity_color),
                    ),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Alerts ({})", alerts.len())),
    );
    frame.render_widget(list, area);
}

fn draw_status(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let nav_hint = "↑/↓ move · Enter select · Tab view · r refresh · o route · c clear · n navigate · s stop · p predict · a alerts · x dismiss · q quit";

    let mut lines: Vec<Line<'_>> = app
        .dashboard
        .notifications()
        .items()
        .iter()
        .rev()
        .take(1)
        .map(|notification| {
            Line::from(Span::styled(
                notification.message.clone(),
                Style::default().fg(severity_color(notification.severity)),
            ))
        })
        .collect();
    if app.dashboard.pending_requests() > 0 {
        lines.insert(0, Line::from(Span::styled("Loading…", Style::default().fg(Color::Yellow))));
    }
    lines.push(Line::from(Span::styled(
        nav_hint,
        Style::default().fg(Color::DarkGray),
    )));

    let status = Paragraph::new(lines)
        .block(Block::default().borders(Borders::TOP).title("Status"))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, area);
}

fn category_color(category: WasteCategory) -> Color {
    match category {
        WasteCategory::General => Color::Gray,
        WasteCategory::Recyclable => Color::Blue,
        WasteCategory::Biodegradable => Color::Green,
        WasteCategory::Hazardous => Color::Red,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Success => Color::Green,
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Cyan,
    }
}
