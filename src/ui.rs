use chrono::{Datelike, NaiveDate};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap,
};
use std::collections::HashMap;

use crate::app::{App, Mode, SETTINGS_ITEMS, SettingsItem, TextForm, theme_name};
use crate::dates::{self, ScheduleView};
use crate::directory::initials;
use crate::grouping::{EmployeeHours, total_hours};
use crate::models::Shift;
use crate::session::Page;
use crate::storage::ThemePreference;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();
    let theme = theme_from(app.theme);
    draw_background(frame, size, &theme);

    match app.mode {
        Mode::Login => draw_login(frame, app, size, &theme),
        Mode::RequestAccount => draw_request_form(frame, app, size, &theme),
        _ => draw_shell(frame, app, size, &theme),
    }

    match app.mode {
        Mode::ShiftForm => {
            let title = if app.is_editing_shift() { "Edit Shift" } else { "Add Shift" };
            draw_form(frame, app, size, title, &theme);
        }
        Mode::ProfileEdit => draw_form(frame, app, size, "Edit Profile", &theme),
        Mode::ConfirmDelete => draw_confirm_delete(frame, app, size, &theme),
        Mode::Share => draw_share(frame, app, size, &theme),
        Mode::Login | Mode::RequestAccount | Mode::Browse | Mode::Search => {}
    }

    if !app.show_help {
        if let Some(toast) = app.active_toast() {
            draw_toast(frame, size, &toast.message, toast.is_error, &theme);
        }
    }

    if app.show_help {
        draw_help(frame, size, &theme);
    }
}

fn draw_shell(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let content = area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    });

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(2)])
        .split(content);

    let header = Paragraph::new(header_line(app, theme))
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(theme.border_style())
                .style(theme.panel_style()),
        );
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)])
        .split(chunks[1]);

    draw_nav(frame, app, body[0], theme);

    match app.page {
        Page::Dashboard => draw_dashboard(frame, app, body[1], theme),
        Page::Schedule | Page::ScheduleEdit => draw_schedule(frame, app, body[1], theme),
        Page::Employees => draw_employees(frame, app, body[1], theme),
        Page::Resources => draw_resources(frame, app, body[1], theme),
        Page::Profile => draw_profile(frame, app, body[1], theme),
        Page::Admin => draw_admin(frame, app, body[1], theme),
        Page::Settings => draw_settings(frame, app, body[1], theme),
        Page::AccountRequests => draw_requests(frame, app, body[1], theme),
    }

    let footer = Paragraph::new(footer_line(app, theme))
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(theme.border_style())
                .style(theme.panel_style()),
        );
    frame.render_widget(footer, chunks[2]);
}

fn header_line(app: &App, theme: &Theme) -> Line<'static> {
    let (name, role) = app
        .session
        .as_ref()
        .map(|session| (session.display_name().to_string(), session.role.label()))
        .unwrap_or_else(|| ("Guest".to_string(), "-"));
    Line::from(vec![
        Span::styled("Shiftboard", theme.title_style()),
        Span::raw("  "),
        Span::styled(app.page.title(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled("User", theme.muted_style()),
        Span::raw(": "),
        Span::raw(name),
        Span::raw(" "),
        Span::styled(format!("({role})"), theme.muted_style()),
        Span::raw("  "),
        Span::styled("Today", theme.muted_style()),
        Span::raw(": "),
        Span::raw(app.today.format("%a %b %-d, %Y").to_string()),
    ])
}

fn footer_line(app: &App, theme: &Theme) -> Line<'static> {
    if app.mode == Mode::Search {
        return Line::from(vec![
            Span::styled("Search: ", theme.title_style()),
            Span::raw(app.query.clone()),
            Span::styled("▏", Style::default().fg(theme.accent)),
            Span::raw("   "),
            Span::styled("Enter keep · Esc clear", theme.muted_style()),
        ]);
    }

    let can_manage = app
        .session
        .as_ref()
        .is_some_and(|session| session.role.can_manage_schedule());
    let mut hints: Vec<&str> = match app.page {
        Page::Schedule | Page::ScheduleEdit => {
            let mut hints = vec!["←/→ move", "v view", "t today"];
            if can_manage {
                hints.extend(["n new", "e edit", "x delete", "s share"]);
            }
            hints
        }
        Page::Employees => vec!["/ search"],
        Page::Resources => vec!["/ search", "f tab"],
        Page::AccountRequests => vec!["/ search", "a approve", "d reject", "r refresh"],
        Page::Admin => vec!["r refresh"],
        Page::Profile => vec!["e edit", "r refresh"],
        Page::Settings => vec!["Enter change"],
        Page::Dashboard => Vec::new(),
    };
    hints.extend(["Tab pages", "h help", "L logout", "q quit"]);

    let mut spans = Vec::new();
    for (index, hint) in hints.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw(" · "));
        }
        spans.push(Span::styled(hint.to_string(), theme.muted_style()));
    }
    if !app.query.is_empty() {
        spans.push(Span::raw(format!("   |   filter: {}", app.query)));
    }
    Line::from(spans)
}

fn draw_nav(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let items: Vec<ListItem> = app
        .nav
        .iter()
        .enumerate()
        .map(|(index, page)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", index + 1), theme.muted_style()),
                Span::raw(page.title()),
            ]))
            .style(theme.panel_style())
        })
        .collect();

    let list = List::new(items)
        .block(panel_block("Menu", theme))
        .highlight_style(theme.active_highlight())
        .highlight_symbol("▍ ");
    frame.render_stateful_widget(list, area, &mut app.nav_state);
}

fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let greeting = app
        .session
        .as_ref()
        .map(|session| format!("Welcome back, {}", session.display_name()))
        .unwrap_or_default();
    let mut lines = vec![
        Line::from(Span::styled(greeting, theme.title_style())),
        Line::from(Span::styled(
            dates::view_label(ScheduleView::Day, app.today),
            theme.muted_style(),
        )),
        Line::from(""),
    ];
    let todays = app.todays_shifts();
    if todays.is_empty() {
        lines.push(Line::from("No shifts scheduled today."));
    } else {
        for shift in todays {
            lines.push(shift_line(shift, false, theme));
        }
    }
    let today_panel = Paragraph::new(lines)
        .block(panel_block("Today", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(today_panel, columns[0]);

    let summary = app.week_summary();
    draw_hours_table(
        frame,
        &summary,
        &dates::view_label(ScheduleView::Week, app.today),
        columns[1],
        theme,
    );
}

fn draw_schedule(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let label = Line::from(vec![
        Span::styled(dates::view_label(app.view, app.cursor), theme.title_style()),
        Span::raw("  "),
        Span::styled(format!("[{}]", app.view.label()), theme.muted_style()),
    ]);
    frame.render_widget(Paragraph::new(label).style(theme.panel_style()), rows[0]);

    let list_area = if app.view == ScheduleView::Month {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(0)])
            .split(rows[1]);
        let calendar = Paragraph::new(build_calendar_lines(
            app.cursor,
            app.schedule.shifts(),
            app.today,
            theme,
        ))
        .block(panel_block("Calendar", theme));
        frame.render_widget(calendar, split[0]);
        split[1]
    } else {
        rows[1]
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(list_area);

    let show_date = app.view != ScheduleView::Day;
    let items: Vec<ListItem> = {
        let shifts = app.visible_shifts();
        if shifts.is_empty() {
            vec![ListItem::new(Line::from("No shifts in this period")).style(theme.panel_style())]
        } else {
            shifts
                .into_iter()
                .map(|shift| ListItem::new(shift_line(shift, show_date, theme)).style(theme.panel_style()))
                .collect()
        }
    };
    let list = List::new(items)
        .block(panel_block("Shifts", theme))
        .highlight_style(theme.active_highlight())
        .highlight_symbol("▍ ");
    frame.render_stateful_widget(list, columns[0], &mut app.list_state);

    let summary = app.visible_summary();
    draw_hours_table(frame, &summary, "Hours", columns[1], theme);
}

fn shift_line(shift: &Shift, show_date: bool, theme: &Theme) -> Line<'static> {
    let mut spans = Vec::new();
    if show_date {
        spans.push(Span::styled(
            shift.date.format("%a %m/%d  ").to_string(),
            theme.muted_style(),
        ));
    }
    spans.push(Span::raw(format!("{}-{}  ", shift.start_time, shift.end_time)));
    spans.push(Span::styled(
        shift.employee.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    if let Some(position) = &shift.position {
        spans.push(Span::styled(format!("  {position}"), theme.muted_style()));
    }
    spans.push(Span::styled(format!("  {:.2}h", shift.hours), theme.muted_style()));
    Line::from(spans)
}

fn draw_hours_table(
    frame: &mut Frame,
    summary: &[EmployeeHours],
    title: &str,
    area: Rect,
    theme: &Theme,
) {
    let header = Row::new(vec![
        Cell::from(Span::styled("Employee", theme.muted_style())),
        Cell::from(Span::styled("Shifts", theme.muted_style())),
        Cell::from(Span::styled("Hours", theme.muted_style())),
    ]);
    let mut rows: Vec<Row> = summary
        .iter()
        .map(|group| {
            Row::new(vec![
                Cell::from(group.name.clone()),
                Cell::from(group.shift_count.to_string()),
                Cell::from(format!("{:.2}", group.total_hours)),
            ])
        })
        .collect();
    let total: f64 = summary.iter().map(|group| group.total_hours).sum();
    rows.push(Row::new(vec![
        Cell::from(Span::styled("Total", theme.title_style())),
        Cell::from(""),
        Cell::from(Span::styled(format!("{total:.2}"), theme.title_style())),
    ]));

    let table = Table::new(
        rows,
        [Constraint::Min(12), Constraint::Length(7), Constraint::Length(8)],
    )
    .header(header)
    .block(panel_block(title, theme))
    .column_spacing(1);
    frame.render_widget(table, area);
}

fn build_calendar_lines(
    cursor: NaiveDate,
    shifts: &[Shift],
    today: NaiveDate,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut hours: HashMap<NaiveDate, Vec<&Shift>> = HashMap::new();
    for shift in shifts {
        hours.entry(shift.date).or_default().push(shift);
    }

    let cell_width = 7;
    let mut lines = Vec::new();
    let header_labels = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    let mut header_spans = Vec::new();
    for (index, label) in header_labels.iter().enumerate() {
        header_spans.push(Span::styled(
            format!("{:^width$}", label, width = cell_width),
            theme.muted_style(),
        ));
        if index < header_labels.len() - 1 {
            header_spans.push(Span::raw(" "));
        }
    }
    lines.push(Line::from(header_spans));

    for week in dates::month_grid(cursor).chunks(7) {
        let mut spans = Vec::new();
        for (index, cell) in week.iter().enumerate() {
            let span = match cell {
                Some(date) => {
                    let day_shifts = hours.get(date).map(Vec::as_slice).unwrap_or(&[]);
                    let day_hours = total_hours(day_shifts.iter().copied());
                    let label = if day_shifts.is_empty() {
                        format!("{:>2}     ", date.day())
                    } else {
                        format!("{:>2} {:>4.1}", date.day(), day_hours)
                    };
                    if *date == cursor {
                        Span::styled(label, theme.active_highlight())
                    } else if *date == today {
                        Span::styled(label, Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD))
                    } else if day_shifts.is_empty() {
                        Span::styled(label, theme.muted_style())
                    } else {
                        Span::styled(label, Style::default().fg(theme.success))
                    }
                }
                None => Span::raw(format!("{:width$}", "", width = cell_width)),
            };
            spans.push(span);
            if index < week.len() - 1 {
                spans.push(Span::raw(" "));
            }
        }
        lines.push(Line::from(spans));
    }

    lines
}

fn draw_employees(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let employees = app.visible_employees();
    let items: Vec<ListItem> = if employees.is_empty() {
        vec![ListItem::new(Line::from("No employees found")).style(theme.panel_style())]
    } else {
        employees
            .iter()
            .map(|employee| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<3}", initials(&employee.name)), theme.title_style()),
                    Span::styled(employee.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}", employee.department), theme.muted_style()),
                ]))
                .style(theme.panel_style())
            })
            .collect()
    };
    let list = List::new(items)
        .block(panel_block(&format!("Employees ({})", employees.len()), theme))
        .highlight_style(theme.active_highlight())
        .highlight_symbol("▍ ");
    frame.render_stateful_widget(list, columns[0], &mut app.list_state);

    let selected = app.list_state.selected().and_then(|index| employees.get(index));
    let lines = match selected {
        Some(employee) => {
            let mut lines = vec![
                Line::from(Span::styled(employee.name.clone(), theme.title_style())),
                Line::from(Span::styled(
                    format!(
                        "{}{}",
                        employee.role.label(),
                        employee
                            .position
                            .as_deref()
                            .map(|position| format!(" · {position}"))
                            .unwrap_or_default()
                    ),
                    theme.muted_style(),
                )),
                Line::from(""),
                detail_line("Department", &employee.department, theme),
                detail_line("Email", &employee.email, theme),
                detail_line("Phone", &employee.phone, theme),
                detail_line("Hired", &employee.hire_date.format("%B %-d, %Y").to_string(), theme),
            ];
            if let Some(address) = &employee.address {
                lines.push(detail_line("Address", address, theme));
            }
            if let Some(contact) = &employee.emergency_contact {
                lines.push(detail_line("Emergency", contact, theme));
            }
            if let Some(bio) = &employee.bio {
                lines.push(Line::from(""));
                lines.push(Line::from(bio.clone()));
            }
            lines
        }
        None => vec![Line::from("Select an employee")],
    };
    let details = Paragraph::new(lines)
        .block(panel_block("Details", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(details, columns[1]);
}

fn draw_resources(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let mut tab_spans = Vec::new();
    for tab in [
        crate::directory::ResourceTab::All,
        crate::directory::ResourceTab::Recent,
        crate::directory::ResourceTab::Favorites,
    ] {
        let style = if tab == app.resource_tab {
            theme.active_highlight()
        } else {
            theme.muted_style()
        };
        tab_spans.push(Span::styled(format!(" {} ", tab.label()), style));
        tab_spans.push(Span::raw(" "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(tab_spans)).style(theme.panel_style()),
        rows[0],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let resources = app.visible_resources();
    let items: Vec<ListItem> = if resources.is_empty() {
        vec![ListItem::new(Line::from("No resources found")).style(theme.panel_style())]
    } else {
        resources
            .iter()
            .map(|resource| {
                let star = if resource.is_favorite { "★ " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(star, Style::default().fg(theme.highlight)),
                    Span::styled(format!("{:<6}", resource.kind.label()), theme.muted_style()),
                    Span::raw(resource.title),
                ]))
                .style(theme.panel_style())
            })
            .collect()
    };
    let list = List::new(items)
        .block(panel_block("Resources", theme))
        .highlight_style(theme.active_highlight())
        .highlight_symbol("▍ ");
    frame.render_stateful_widget(list, columns[0], &mut app.list_state);

    let lines = match app.list_state.selected().and_then(|index| resources.get(index)) {
        Some(resource) => vec![
            Line::from(Span::styled(resource.title, theme.title_style())),
            Line::from(Span::styled(resource.category, theme.muted_style())),
            Line::from(""),
            Line::from(resource.description),
        ],
        None => vec![Line::from("Select a resource")],
    };
    let details = Paragraph::new(lines)
        .block(panel_block("Details", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(details, columns[1]);
}

fn draw_profile(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let lines = match &app.profile {
        Some(profile) => {
            let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| "—".to_string());
            vec![
                Line::from(Span::styled(profile.name.clone(), theme.title_style())),
                Line::from(Span::styled(profile.role.label(), theme.muted_style())),
                Line::from(""),
                detail_line("Email", &profile.email, theme),
                detail_line("Department", &profile.department, theme),
                detail_line("Phone", &optional(&profile.phone), theme),
                detail_line("Address", &optional(&profile.address), theme),
                detail_line("Emergency", &optional(&profile.emergency_contact), theme),
                detail_line(
                    "Hired",
                    &profile
                        .hire_date
                        .map(|date| date.format("%B %-d, %Y").to_string())
                        .unwrap_or_else(|| "—".to_string()),
                    theme,
                ),
                Line::from(""),
                Line::from(optional(&profile.bio)),
            ]
        }
        None => vec![Line::from("Profile unavailable. Press r to retry.")],
    };
    let paragraph = Paragraph::new(lines)
        .block(panel_block("My Profile", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_admin(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let stats = vec![
        Line::from(vec![
            Span::styled("Users: ", theme.muted_style()),
            Span::styled(app.users.len().to_string(), theme.title_style()),
            Span::raw("   "),
            Span::styled("Pending requests: ", theme.muted_style()),
            Span::styled(app.requests.len().to_string(), theme.title_style()),
            Span::raw("   "),
            Span::styled("Scheduled shifts: ", theme.muted_style()),
            Span::styled(app.schedule.shifts().len().to_string(), theme.title_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Review requests under Account Requests. Schedule defaults live in Settings.",
            theme.muted_style(),
        )),
    ];
    frame.render_widget(
        Paragraph::new(stats)
            .block(panel_block("Overview", theme))
            .wrap(Wrap { trim: true }),
        rows[0],
    );

    let items: Vec<ListItem> = if app.users.is_empty() {
        vec![ListItem::new(Line::from("No users")).style(theme.panel_style())]
    } else {
        app.users
            .iter()
            .map(|user| {
                ListItem::new(Line::from(vec![
                    Span::styled(user.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}", user.email), theme.muted_style()),
                    Span::raw(format!("  {} · {}", user.role.label(), user.department)),
                ]))
                .style(theme.panel_style())
            })
            .collect()
    };
    let list = List::new(items)
        .block(panel_block("Users", theme))
        .highlight_style(theme.active_highlight())
        .highlight_symbol("▍ ");
    frame.render_stateful_widget(list, rows[1], &mut app.list_state);
}

fn draw_settings(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let items: Vec<ListItem> = SETTINGS_ITEMS
        .iter()
        .map(|item| {
            let value = match item {
                SettingsItem::Theme => theme_name(app.theme).to_string(),
                SettingsItem::DefaultView => app.default_view.label().to_string(),
                SettingsItem::ResetSchedule => format!("{} shifts", app.schedule.shifts().len()),
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}: ", item.label()), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(value, theme.muted_style()),
            ]))
            .style(theme.panel_style())
        })
        .collect();

    let list = List::new(items)
        .block(panel_block("Settings", theme))
        .highlight_style(theme.active_highlight())
        .highlight_symbol("▍ ");
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn draw_requests(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let items: Vec<ListItem> = if app.requests.is_empty() {
        vec![ListItem::new(Line::from("No pending requests")).style(theme.panel_style())]
    } else {
        app.requests
            .iter()
            .map(|request| {
                ListItem::new(Line::from(vec![
                    Span::styled(request.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}", request.department), theme.muted_style()),
                    Span::styled(
                        format!("  {}", request.request_date.format("%b %-d")),
                        theme.muted_style(),
                    ),
                ]))
                .style(theme.panel_style())
            })
            .collect()
    };
    let list = List::new(items)
        .block(panel_block(&format!("Pending ({})", app.requests.len()), theme))
        .highlight_style(theme.active_highlight())
        .highlight_symbol("▍ ");
    frame.render_stateful_widget(list, columns[0], &mut app.list_state);

    let lines = match app.selected_request() {
        Some(request) => vec![
            Line::from(Span::styled(request.name.clone(), theme.title_style())),
            Line::from(""),
            detail_line("Email", &request.email, theme),
            detail_line("Department", &request.department, theme),
            detail_line("Phone", request.phone.as_deref().unwrap_or("—"), theme),
            detail_line(
                "Requested",
                &request.request_date.format("%B %-d, %Y").to_string(),
                theme,
            ),
            Line::from(""),
            Line::from(Span::styled("a approve · d reject", theme.muted_style())),
        ],
        None => vec![Line::from("Select a request")],
    };
    frame.render_widget(
        Paragraph::new(lines)
            .block(panel_block("Request", theme))
            .wrap(Wrap { trim: true }),
        columns[1],
    );
}

fn detail_line(label: &str, value: &str, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<11}"), theme.muted_style()),
        Span::raw(value.to_string()),
    ])
}

fn form_lines(form: &TextForm, theme: &Theme) -> Vec<Line<'static>> {
    form.labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let raw = form.value(index);
            let value = if label.contains("Password") {
                "•".repeat(raw.chars().count())
            } else {
                raw.to_string()
            };
            let focused = index == form.focus;
            let value_span = if focused {
                Span::styled(
                    format!("{value}▏"),
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(value)
            };
            Line::from(vec![
                Span::styled(
                    format!("{:<18}", format!("{label}:")),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                value_span,
            ])
        })
        .collect()
}

fn push_status(lines: &mut Vec<Line<'static>>, status: Option<&str>, theme: &Theme) {
    if let Some(status) = status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(theme.error),
        )));
    }
}

fn draw_login(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let block = centered_rect(60, 45, area);
    frame.render_widget(Clear, block);

    let mut lines = vec![
        Line::from(Span::styled("Shiftboard", theme.title_style())),
        Line::from(Span::styled(
            "Sign in to view schedules and the team directory",
            theme.muted_style(),
        )),
        Line::from(""),
    ];
    lines.extend(form_lines(&app.form, theme));
    let check = if app.remember { "[x]" } else { "[ ]" };
    lines.push(Line::from(format!("{check} Remember me")));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter sign in · Tab next field · Ctrl+R remember · Ctrl+N request account · Esc quit",
        theme.muted_style(),
    )));
    push_status(&mut lines, app.status.as_deref(), theme);

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(panel_block("Login", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, block);
}

fn draw_request_form(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let block = centered_rect(60, 50, area);
    frame.render_widget(Clear, block);

    let mut lines = vec![
        Line::from("An administrator reviews every request before the account is created."),
        Line::from(""),
    ];
    lines.extend(form_lines(&app.form, theme));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter submit · Tab next field · ←/→ department · Esc back",
        theme.muted_style(),
    )));
    push_status(&mut lines, app.status.as_deref(), theme);

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(panel_block("Request Account", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, block);
}

fn draw_form(frame: &mut Frame, app: &App, area: Rect, title: &str, theme: &Theme) {
    let block = centered_rect(60, 50, area);
    frame.render_widget(Clear, block);

    let mut lines = form_lines(&app.form, theme);
    lines.push(Line::from(""));
    if app.mode == Mode::ShiftForm {
        let hours = app
            .form_hours()
            .map(|hours| format!("{hours:.2}h"))
            .unwrap_or_else(|| "—".to_string());
        lines.push(Line::from(vec![
            Span::styled("Hours: ", theme.muted_style()),
            Span::styled(hours, theme.title_style()),
        ]));
        lines.push(Line::from(Span::styled(
            "←/→ pick employee, date, department or position",
            theme.muted_style(),
        )));
    }
    lines.push(Line::from(Span::styled(
        "Enter save · Tab next field · Esc cancel",
        theme.muted_style(),
    )));
    push_status(&mut lines, app.status.as_deref(), theme);

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(panel_block(title, theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, block);
}

fn draw_confirm_delete(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let block = centered_rect(50, 25, area);
    frame.render_widget(Clear, block);

    let mut lines = vec![Line::from("Delete this shift?"), Line::from("")];
    if let Some(shift) = app.pending_delete() {
        lines.push(shift_line(shift, true, theme));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("y delete · n cancel", theme.muted_style())));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(panel_block("Confirm", theme))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, block);
}

fn draw_share(frame: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let block = centered_rect(60, 70, area);
    frame.render_widget(Clear, block);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(4)])
        .split(block);

    let intro = vec![
        Line::from(Span::styled(
            dates::view_label(ScheduleView::Week, app.cursor),
            theme.title_style(),
        )),
        Line::from(vec![
            Span::styled("Send via: ", theme.muted_style()),
            Span::styled(app.share.method.label(), Style::default().add_modifier(Modifier::BOLD)),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(intro).block(panel_block("Send Schedule", theme)),
        sections[0],
    );

    let items: Vec<ListItem> = app
        .share
        .recipients
        .iter()
        .map(|(name, selected)| {
            let check = if *selected { "[x]" } else { "[ ]" };
            ListItem::new(Line::from(format!("{check} {name}"))).style(theme.panel_style())
        })
        .collect();
    let title = format!(
        "Recipients ({}/{})",
        app.share.selected_count(),
        app.share.recipients.len()
    );
    let list = List::new(items)
        .block(panel_block(&title, theme))
        .highlight_style(theme.active_highlight())
        .highlight_symbol("▍ ");
    frame.render_stateful_widget(list, sections[1], &mut app.share.list_state);

    let mut lines = vec![Line::from(Span::styled(
        "Space toggle · a all/none · m method · Enter send · Esc cancel",
        theme.muted_style(),
    ))];
    push_status(&mut lines, app.status.as_deref(), theme);
    frame.render_widget(
        Paragraph::new(lines)
            .block(panel_block("Hint", theme))
            .wrap(Wrap { trim: true }),
        sections[2],
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1]);
    vertical[1]
}

fn draw_toast(frame: &mut Frame, area: Rect, message: &str, is_error: bool, theme: &Theme) {
    let width = (message.chars().count() as u16 + 6).clamp(20, area.width.saturating_sub(2));
    let height = 3;
    let x = area.x + area.width.saturating_sub(width + 1);
    let y = area.y + area.height.saturating_sub(height + 4);
    let rect = Rect::new(x, y, width, height);

    frame.render_widget(Clear, rect);
    let (style, title) = if is_error {
        (Style::default().fg(theme.error).add_modifier(Modifier::BOLD), "Error")
    } else {
        (Style::default().fg(theme.success).add_modifier(Modifier::BOLD), "Done")
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(message.to_string(), style)))
        .alignment(Alignment::Center)
        .block(panel_block(title, theme));
    frame.render_widget(paragraph, rect);
}

fn draw_help(frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = centered_rect(70, 70, area);
    frame.render_widget(Clear, block);

    let header_style = Style::default().add_modifier(Modifier::BOLD).fg(theme.accent);
    let key_style = Style::default().fg(theme.highlight);

    let sections: [(&str, &[(&str, &str)]); 5] = [
        (
            "Navigation",
            &[
                ("Tab / Shift+Tab", "Next / previous page"),
                ("1-8", "Jump to menu item"),
                ("Up/Down", "Move selection"),
            ],
        ),
        (
            "Schedule",
            &[
                ("Left/Right", "Previous / next day, week or month"),
                ("v", "Cycle day, week and month views"),
                ("t", "Jump to today"),
                ("n / e / x", "New, edit or delete a shift (managers)"),
                ("s", "Send the week's schedule (managers)"),
            ],
        ),
        (
            "Directory",
            &[
                ("/", "Search employees, resources or requests"),
                ("f", "Cycle resource tabs"),
                ("a / d", "Approve or reject a request (admins)"),
            ],
        ),
        (
            "Profile",
            &[("e", "Edit your profile"), ("r", "Refresh")],
        ),
        (
            "General",
            &[
                ("m", "Toggle theme"),
                ("L", "Log out"),
                ("h / Esc", "Close help"),
                ("q", "Quit"),
            ],
        ),
    ];

    let mut rows = Vec::new();
    for (index, (title, keys)) in sections.iter().enumerate() {
        if index > 0 {
            rows.push(Row::new(vec![Cell::from(""), Cell::from("")]));
        }
        rows.push(Row::new(vec![
            Cell::from(Span::styled(*title, header_style)),
            Cell::from(""),
        ]));
        for (key, description) in keys.iter() {
            rows.push(Row::new(vec![
                Cell::from(Span::styled(*key, key_style)),
                Cell::from(*description),
            ]));
        }
    }

    let table = Table::new(rows, [Constraint::Length(20), Constraint::Min(10)])
        .block(panel_block("Help", theme))
        .column_spacing(2);

    frame.render_widget(table, block);
}

fn draw_background(frame: &mut Frame, area: Rect, theme: &Theme) {
    let block = Block::default().style(Style::default().bg(theme.bg).fg(theme.text));
    frame.render_widget(block, area);
}

fn panel_block(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style())
        .style(theme.panel_style())
        .title(Line::from(Span::styled(
            format!(" {} ", title),
            theme.title_style(),
        )))
}

#[derive(Clone, Copy)]
struct Theme {
    bg: Color,
    panel: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    highlight: Color,
    success: Color,
    error: Color,
    accent_dark: Color,
}

impl Theme {
    fn panel_style(&self) -> Style {
        Style::default().bg(self.panel).fg(self.text)
    }

    fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    fn title_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    fn active_highlight(&self) -> Style {
        Style::default()
            .bg(self.accent)
            .fg(self.accent_contrast())
            .add_modifier(Modifier::BOLD)
    }

    fn accent_contrast(&self) -> Color {
        if matches!(self.bg, Color::Rgb(246, 243, 238)) {
            self.accent_dark
        } else {
            Color::Black
        }
    }
}

fn theme_from(pref: ThemePreference) -> Theme {
    match pref {
        ThemePreference::Terminal => Theme {
            bg: Color::Reset,
            panel: Color::Reset,
            border: Color::DarkGray,
            text: Color::Reset,
            muted: Color::DarkGray,
            accent: Color::Red,
            highlight: Color::Yellow,
            success: Color::Green,
            error: Color::LightRed,
            accent_dark: Color::Black,
        },
        ThemePreference::Dark => Theme {
            bg: Color::Rgb(20, 16, 18),
            panel: Color::Rgb(32, 26, 28),
            border: Color::Rgb(86, 60, 64),
            text: Color::Rgb(240, 228, 226),
            muted: Color::Rgb(170, 150, 150),
            accent: Color::Rgb(230, 96, 90),
            highlight: Color::Rgb(255, 200, 110),
            success: Color::Rgb(130, 210, 140),
            error: Color::Rgb(255, 130, 120),
            accent_dark: Color::Rgb(90, 30, 28),
        },
        ThemePreference::Light => Theme {
            bg: Color::Rgb(246, 243, 238),
            panel: Color::Rgb(255, 255, 255),
            border: Color::Rgb(222, 210, 204),
            text: Color::Rgb(40, 30, 30),
            muted: Color::Rgb(120, 100, 100),
            accent: Color::Rgb(196, 52, 48),
            highlight: Color::Rgb(220, 140, 40),
            success: Color::Rgb(40, 140, 80),
            error: Color::Rgb(200, 40, 60),
            accent_dark: Color::Rgb(60, 16, 14),
        },
    }
}
