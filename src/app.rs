use arboard::Clipboard;
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::io;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::accounts::{self, AccountRequestForm};
use crate::backend::RowStore;
use crate::dates::{self, ScheduleView};
use crate::directory::{self, DEPARTMENTS, MEAT_MARKET_POSITIONS, ResourceTab};
use crate::grouping::{EmployeeHours, hours_by_employee};
use crate::models::{
    Employee, MEAT_MARKET, ProfileUpdate, RegistrationRequest, Resource, Shift, UserProfile,
    UserRecord,
};
use crate::schedule::{ScheduleCache, ShiftDraft};
use crate::session::{self, Access, Page, Session};
use crate::share::{self, ShareMethod};
use crate::shift_time::shift_hours;
use crate::storage::{self, Config, LocalStore, ThemePreference};

pub const LOGIN_FIELDS: &[&str] = &["Email", "Password"];
pub const REQUEST_FIELDS: &[&str] = &["Full name", "Email", "Password", "Department", "Phone"];
pub const SHIFT_FIELDS: &[&str] = &["Employee", "Date", "Start", "End", "Department", "Position"];
pub const PROFILE_FIELDS: &[&str] = &["Name", "Phone", "Address", "Emergency contact", "Bio"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Login,
    RequestAccount,
    Browse,
    Search,
    ShiftForm,
    ConfirmDelete,
    Share,
    ProfileEdit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsItem {
    Theme,
    DefaultView,
    ResetSchedule,
}

pub const SETTINGS_ITEMS: [SettingsItem; 3] = [
    SettingsItem::Theme,
    SettingsItem::DefaultView,
    SettingsItem::ResetSchedule,
];

impl SettingsItem {
    pub fn label(self) -> &'static str {
        match self {
            SettingsItem::Theme => "Theme",
            SettingsItem::DefaultView => "Default schedule view",
            SettingsItem::ResetSchedule => "Reset schedule to defaults",
        }
    }
}

/// Labelled text inputs with one focused field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextForm {
    pub labels: &'static [&'static str],
    pub values: Vec<String>,
    pub focus: usize,
}

impl TextForm {
    fn new(labels: &'static [&'static str]) -> Self {
        Self {
            labels,
            values: vec![String::new(); labels.len()],
            focus: 0,
        }
    }

    fn with_values(labels: &'static [&'static str], values: Vec<String>) -> Self {
        let mut form = Self::new(labels);
        for (slot, value) in form.values.iter_mut().zip(values) {
            *slot = value;
        }
        form
    }

    pub fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    fn set(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value.into();
        }
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.labels.len();
    }

    fn previous_field(&mut self) {
        self.focus = if self.focus == 0 {
            self.labels.len() - 1
        } else {
            self.focus - 1
        };
    }

    /// Applies typing and backspace to the focused field.
    fn edit(&mut self, key: KeyEvent) -> bool {
        let Some(value) = self.values.get_mut(self.focus) else {
            return false;
        };
        match key.code {
            KeyCode::Backspace => {
                value.pop();
                true
            }
            KeyCode::Char(ch)
                if !ch.is_control() && !key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                value.push(ch);
                true
            }
            _ => false,
        }
    }
}

pub struct ShareState {
    pub recipients: Vec<(String, bool)>,
    pub method: ShareMethod,
    pub list_state: ListState,
}

impl ShareState {
    fn new() -> Self {
        let recipients = directory::department_employees(MEAT_MARKET)
            .into_iter()
            .map(|employee| (employee.name, true))
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            recipients,
            method: ShareMethod::default(),
            list_state,
        }
    }

    pub fn selected_count(&self) -> usize {
        self.recipients.iter().filter(|(_, selected)| *selected).count()
    }
}

pub struct App {
    pub should_quit: bool,
    pub mode: Mode,
    pub show_help: bool,
    pub status: Option<String>,
    pub theme: ThemePreference,
    pub default_view: ScheduleView,
    pub session: Option<Session>,
    pub page: Page,
    pub nav: Vec<Page>,
    pub nav_state: ListState,
    pub today: NaiveDate,
    pub schedule: ScheduleCache,
    pub view: ScheduleView,
    pub cursor: NaiveDate,
    pub list_state: ListState,
    pub form: TextForm,
    pub remember: bool,
    pub share: ShareState,
    pub query: String,
    pub resource_tab: ResourceTab,
    pub requests: Vec<RegistrationRequest>,
    pub users: Vec<UserRecord>,
    pub profile: Option<UserProfile>,
    editing_shift: Option<String>,
    store: LocalStore,
    rows: Box<dyn RowStore>,
    toast: Option<Toast>,
}

impl App {
    pub fn new(store: LocalStore, rows: Box<dyn RowStore>, config: &Config, today: NaiveDate) -> Self {
        let schedule = ScheduleCache::load(&store, dates::week_start(today));
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        let mut app = App {
            should_quit: false,
            mode: Mode::Login,
            show_help: false,
            status: None,
            theme: config.theme,
            default_view: config.default_view,
            session: None,
            page: Page::Dashboard,
            nav: Vec::new(),
            nav_state: ListState::default(),
            today,
            schedule,
            view: config.default_view,
            cursor: today,
            list_state,
            form: TextForm::new(LOGIN_FIELDS),
            remember: false,
            share: ShareState::new(),
            query: String::new(),
            resource_tab: ResourceTab::All,
            requests: Vec::new(),
            users: Vec::new(),
            profile: None,
            editing_shift: None,
            store,
            rows,
            toast: None,
        };

        if Session::load(&app.store).is_some() {
            app.mode = Mode::Browse;
            app.navigate(Page::Dashboard);
        } else {
            app.show_login();
        }
        app
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if self.show_help {
            match key.code {
                KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::Esc => self.show_help = false,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match self.mode {
            Mode::Login => self.handle_login_input(key),
            Mode::RequestAccount => self.handle_request_input(key),
            Mode::Browse => self.handle_browse_input(key),
            Mode::Search => self.handle_search_input(key),
            Mode::ShiftForm => self.handle_shift_form_input(key),
            Mode::ConfirmDelete => self.handle_confirm_delete_input(key),
            Mode::Share => self.handle_share_input(key),
            Mode::ProfileEdit => self.handle_profile_input(key),
        }
    }

    /// Runs the role guard for `page` and switches to it, or to wherever the
    /// guard sends the user instead. Returns whether `page` itself was entered.
    fn navigate(&mut self, page: Page) -> bool {
        match session::guard(page, &self.store) {
            Access::Granted(session) => {
                if base_page(self.page) != base_page(page) {
                    self.query.clear();
                    self.list_state.select(Some(0));
                }
                self.nav = session::nav_items(session.role);
                self.session = Some(session);
                self.page = page;
                let index = self.nav.iter().position(|item| *item == base_page(page));
                self.nav_state.select(index);
                self.enter_page();
                true
            }
            Access::Redirect(fallback) => {
                info!(page = page.title(), "access denied, redirecting");
                self.set_toast(format!("{} is not available for your role", page.title()), true);
                self.navigate(fallback);
                false
            }
            Access::Login => {
                self.expire_session();
                false
            }
        }
    }

    fn enter_page(&mut self) {
        match self.page {
            Page::AccountRequests => self.load_requests(),
            Page::Admin => {
                self.load_users();
                self.load_requests();
            }
            Page::Profile => self.load_profile(),
            _ => {}
        }
    }

    fn cycle_page(&mut self, forward: bool) {
        if self.nav.is_empty() {
            return;
        }
        let len = self.nav.len();
        let current = self
            .nav
            .iter()
            .position(|item| *item == base_page(self.page))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        self.navigate(self.nav[next]);
    }

    fn show_login(&mut self) {
        let remembered = session::remembered_email(&self.store);
        let mut form = TextForm::new(LOGIN_FIELDS);
        if let Some(email) = &remembered {
            form.set(0, email.as_str());
            form.focus = 1;
        }
        self.remember = remembered.is_some();
        self.form = form;
        self.status = None;
        self.mode = Mode::Login;
    }

    fn expire_session(&mut self) {
        self.session = None;
        self.nav.clear();
        self.show_login();
        self.status = Some("Please log in to continue.".to_string());
    }

    fn handle_login_input(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('r') if ctrl => self.remember = !self.remember,
            KeyCode::Char('n') if ctrl => self.open_request_form(),
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.previous_field(),
            KeyCode::Enter => self.submit_login(),
            _ => {
                if self.form.edit(key) {
                    self.status = None;
                }
            }
        }
    }

    fn submit_login(&mut self) {
        let email = self.form.value(0).trim().to_string();
        let password = self.form.value(1).to_string();
        if email.is_empty() || password.is_empty() {
            self.status = Some("Enter your email and password.".to_string());
            return;
        }

        let user = match accounts::authenticate(self.rows.as_ref(), &email, &password) {
            Ok(user) => user,
            Err(err) => {
                self.status = Some(err.to_string());
                self.form.set(1, "");
                return;
            }
        };

        let session = Session {
            user_id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        };
        if let Err(err) = persist_login(&mut self.store, &session, self.remember) {
            self.status = Some(format!("Failed to save session: {err}"));
            return;
        }

        let greeting = format!("Welcome, {}", session.display_name());
        self.session = Some(session);
        self.form = TextForm::new(LOGIN_FIELDS);
        self.status = None;
        self.mode = Mode::Browse;
        if self.navigate(Page::Dashboard) {
            self.set_toast(greeting, false);
        }
    }

    fn logout(&mut self) {
        if let Err(err) = Session::clear(&mut self.store) {
            warn!("failed to clear session: {err}");
        }
        self.session = None;
        self.nav.clear();
        self.profile = None;
        self.show_login();
        self.set_toast("Logged out", false);
    }

    fn open_request_form(&mut self) {
        let mut form = TextForm::new(REQUEST_FIELDS);
        form.set(3, DEPARTMENTS[0]);
        self.form = form;
        self.status = None;
        self.mode = Mode::RequestAccount;
    }

    fn handle_request_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.show_login(),
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.previous_field(),
            KeyCode::Left | KeyCode::Right if self.form.focus == 3 => {
                if let Some(department) =
                    cycle_value(&DEPARTMENTS, self.form.value(3), key.code == KeyCode::Right)
                {
                    self.form.set(3, department);
                }
            }
            KeyCode::Enter => self.submit_request(),
            _ => {
                if self.form.edit(key) {
                    self.status = None;
                }
            }
        }
    }

    fn submit_request(&mut self) {
        let request = AccountRequestForm {
            name: self.form.value(0).to_string(),
            email: self.form.value(1).to_string(),
            password: self.form.value(2).to_string(),
            department: self.form.value(3).to_string(),
            phone: Some(self.form.value(4).to_string()),
        };
        match accounts::create_registration_request(self.rows.as_ref(), &request, self.today) {
            Ok(_) => {
                self.show_login();
                self.form.set(0, request.email.trim());
                self.form.focus = 1;
                self.set_toast("Request submitted. An admin will review it.", false);
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn handle_browse_input(&mut self, key: KeyEvent) {
        if self.handle_page_key(key) {
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('h') | KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('m') => self.toggle_theme(),
            KeyCode::Char('L') => self.logout(),
            KeyCode::Tab => self.cycle_page(true),
            KeyCode::BackTab => self.cycle_page(false),
            KeyCode::Char(ch @ '1'..='9') => {
                let index = ch as usize - '1' as usize;
                if let Some(page) = self.nav.get(index).copied() {
                    self.navigate(page);
                }
            }
            KeyCode::Up => {
                let len = self.page_len();
                select_previous(&mut self.list_state, len);
            }
            KeyCode::Down => {
                let len = self.page_len();
                select_next(&mut self.list_state, len);
            }
            _ => {}
        }
    }

    fn handle_page_key(&mut self, key: KeyEvent) -> bool {
        match (self.page, key.code) {
            (Page::Schedule, KeyCode::Left) => self.step_schedule(false),
            (Page::Schedule, KeyCode::Right) => self.step_schedule(true),
            (Page::Schedule, KeyCode::Char('t')) => {
                self.cursor = self.today;
                self.list_state.select(Some(0));
            }
            (Page::Schedule, KeyCode::Char('v')) => {
                self.view = self.view.next();
                self.list_state.select(Some(0));
            }
            (Page::Schedule, KeyCode::Char('n')) => self.open_shift_form(None),
            (Page::Schedule, KeyCode::Char('e')) => {
                match self.selected_shift().map(|shift| shift.id.clone()) {
                    Some(id) => self.open_shift_form(Some(id)),
                    None => self.set_toast("No shift selected", true),
                }
            }
            (Page::Schedule, KeyCode::Char('x')) => self.confirm_delete(),
            (Page::Schedule, KeyCode::Char('s')) => self.open_share(),
            (Page::Employees | Page::Resources | Page::AccountRequests, KeyCode::Char('/')) => {
                self.mode = Mode::Search;
            }
            (Page::Employees | Page::Resources | Page::AccountRequests, KeyCode::Esc)
                if !self.query.is_empty() =>
            {
                self.query.clear();
                self.on_query_changed();
            }
            (Page::Resources, KeyCode::Char('f')) => {
                self.resource_tab = self.resource_tab.next();
                self.list_state.select(Some(0));
            }
            (Page::AccountRequests, KeyCode::Char('a')) => self.review_selected_request(true),
            (Page::AccountRequests, KeyCode::Char('d')) => self.review_selected_request(false),
            (Page::AccountRequests | Page::Admin | Page::Profile, KeyCode::Char('r')) => {
                self.enter_page();
                self.set_toast("Refreshed", false);
            }
            (Page::Profile, KeyCode::Char('e')) => self.open_profile_form(),
            (Page::Settings, KeyCode::Enter | KeyCode::Char(' ')) => self.activate_setting(),
            _ => return false,
        }
        true
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.query.clear();
                self.mode = Mode::Browse;
                self.on_query_changed();
            }
            KeyCode::Enter => self.mode = Mode::Browse,
            KeyCode::Backspace => {
                self.query.pop();
                self.on_query_changed();
            }
            KeyCode::Up => {
                let len = self.page_len();
                select_previous(&mut self.list_state, len);
            }
            KeyCode::Down => {
                let len = self.page_len();
                select_next(&mut self.list_state, len);
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.query.push(ch);
                self.on_query_changed();
            }
            _ => {}
        }
    }

    fn on_query_changed(&mut self) {
        if self.page == Page::AccountRequests {
            self.load_requests();
        }
        self.list_state.select(Some(0));
    }

    fn page_len(&self) -> usize {
        match self.page {
            Page::Schedule | Page::ScheduleEdit => self.visible_shifts().len(),
            Page::Employees => self.visible_employees().len(),
            Page::Resources => self.visible_resources().len(),
            Page::AccountRequests => self.requests.len(),
            Page::Admin => self.users.len(),
            Page::Settings => SETTINGS_ITEMS.len(),
            Page::Dashboard | Page::Profile => 0,
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.page_len();
        match self.list_state.selected() {
            Some(index) if index >= len && len > 0 => self.list_state.select(Some(len - 1)),
            None if len > 0 => self.list_state.select(Some(0)),
            _ => {}
        }
    }

    fn step_schedule(&mut self, forward: bool) {
        self.cursor = dates::step(self.view, self.cursor, forward);
        self.list_state.select(Some(0));
    }

    /// Shifts inside the current view, ordered by day then start time.
    pub fn visible_shifts(&self) -> Vec<&Shift> {
        let (start, end) = dates::view_bounds(self.view, self.cursor);
        let mut shifts = self.schedule.between(start, end);
        shifts.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.start_time.cmp(&b.start_time))
        });
        shifts
    }

    pub fn selected_shift(&self) -> Option<&Shift> {
        let index = self.list_state.selected()?;
        self.visible_shifts().get(index).copied()
    }

    pub fn visible_summary(&self) -> Vec<EmployeeHours> {
        hours_by_employee(self.visible_shifts())
    }

    pub fn todays_shifts(&self) -> Vec<&Shift> {
        self.schedule.on_date(self.today)
    }

    pub fn week_summary(&self) -> Vec<EmployeeHours> {
        let (start, end) = dates::view_bounds(ScheduleView::Week, self.today);
        hours_by_employee(self.schedule.between(start, end))
    }

    pub fn visible_employees(&self) -> Vec<Employee> {
        directory::search_employees(&self.query)
    }

    pub fn visible_resources(&self) -> Vec<&'static Resource> {
        directory::search_resources(&self.query, self.resource_tab)
    }

    pub fn pending_delete(&self) -> Option<&Shift> {
        self.editing_shift
            .as_deref()
            .and_then(|id| self.schedule.get(id))
    }

    pub fn is_editing_shift(&self) -> bool {
        self.editing_shift.is_some()
    }

    /// Hours for the start and end currently typed into the shift form.
    pub fn form_hours(&self) -> Option<f64> {
        if self.mode != Mode::ShiftForm {
            return None;
        }
        shift_hours(self.form.value(2), self.form.value(3)).ok()
    }

    fn open_shift_form(&mut self, shift_id: Option<String>) {
        if !self.navigate(Page::ScheduleEdit) {
            return;
        }
        let mut draft = match shift_id.as_deref().and_then(|id| self.schedule.get(id)) {
            Some(shift) => ShiftDraft::from_shift(shift),
            None => ShiftDraft::new(self.cursor),
        };
        if draft.department.is_empty() {
            draft.department = MEAT_MARKET.to_string();
        }
        self.form = TextForm::with_values(
            SHIFT_FIELDS,
            vec![
                draft.employee,
                draft.date.format("%Y-%m-%d").to_string(),
                draft.start_time,
                draft.end_time,
                draft.department,
                draft.position.unwrap_or_default(),
            ],
        );
        self.editing_shift = shift_id;
        self.status = None;
        self.mode = Mode::ShiftForm;
    }

    fn close_editor(&mut self) {
        self.editing_shift = None;
        self.status = None;
        self.mode = Mode::Browse;
        self.navigate(Page::Schedule);
        self.clamp_selection();
    }

    fn handle_shift_form_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_editor(),
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.previous_field(),
            KeyCode::Left => self.cycle_shift_field(false),
            KeyCode::Right => self.cycle_shift_field(true),
            KeyCode::Enter => self.save_shift(),
            _ => {
                if self.form.edit(key) {
                    self.status = None;
                }
            }
        }
    }

    fn cycle_shift_field(&mut self, forward: bool) {
        let next = match self.form.focus {
            0 => {
                let roster: Vec<String> = directory::department_employees(self.form.value(4))
                    .into_iter()
                    .map(|employee| employee.name)
                    .collect();
                cycle_value(&roster, self.form.value(0), forward)
            }
            1 => dates::parse_date(self.form.value(1)).ok().map(|date| {
                let moved = if forward { date.succ_opt() } else { date.pred_opt() };
                moved.unwrap_or(date).format("%Y-%m-%d").to_string()
            }),
            4 => cycle_value(&DEPARTMENTS, self.form.value(4), forward),
            5 if self.form.value(4) == MEAT_MARKET => {
                cycle_value(&MEAT_MARKET_POSITIONS, self.form.value(5), forward)
            }
            _ => None,
        };
        if let Some(value) = next {
            let focus = self.form.focus;
            self.form.set(focus, value);
        }
    }

    fn save_shift(&mut self) {
        let date = match dates::parse_date(self.form.value(1)) {
            Ok(date) => date,
            Err(err) => {
                self.status = Some(err);
                return;
            }
        };
        let position = self.form.value(5).trim();
        let draft = ShiftDraft {
            employee: self.form.value(0).to_string(),
            date,
            start_time: self.form.value(2).to_string(),
            end_time: self.form.value(3).to_string(),
            department: self.form.value(4).to_string(),
            position: (!position.is_empty()).then(|| position.to_string()),
        };

        let editing = self.editing_shift.clone();
        let result = match &editing {
            Some(id) => self.schedule.update(&mut self.store, id, draft),
            None => self.schedule.create(&mut self.store, draft),
        };
        match result {
            Ok(shift) => {
                let verb = if editing.is_some() { "updated" } else { "added" };
                self.cursor = shift.date;
                self.close_editor();
                self.set_toast(format!("Shift {verb} for {}", shift.employee), false);
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn confirm_delete(&mut self) {
        let Some(id) = self.selected_shift().map(|shift| shift.id.clone()) else {
            self.set_toast("No shift selected", true);
            return;
        };
        if !self.navigate(Page::ScheduleEdit) {
            return;
        }
        self.editing_shift = Some(id);
        self.mode = Mode::ConfirmDelete;
    }

    fn handle_confirm_delete_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => self.delete_shift(),
            KeyCode::Char('n') | KeyCode::Esc => self.close_editor(),
            _ => {}
        }
    }

    fn delete_shift(&mut self) {
        let Some(id) = self.editing_shift.clone() else {
            self.close_editor();
            return;
        };
        let result = self.schedule.delete(&mut self.store, &id);
        self.close_editor();
        match result {
            Ok(shift) => self.set_toast(format!("Deleted {}'s shift", shift.employee), false),
            Err(err) => self.set_toast(err.to_string(), true),
        }
    }

    fn open_share(&mut self) {
        if !self.navigate(Page::ScheduleEdit) {
            return;
        }
        self.share = ShareState::new();
        self.status = None;
        self.mode = Mode::Share;
    }

    fn handle_share_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_editor(),
            KeyCode::Up => select_previous(&mut self.share.list_state, self.share.recipients.len()),
            KeyCode::Down => select_next(&mut self.share.list_state, self.share.recipients.len()),
            KeyCode::Char(' ') => {
                if let Some(index) = self.share.list_state.selected() {
                    if let Some((_, selected)) = self.share.recipients.get_mut(index) {
                        *selected = !*selected;
                    }
                }
            }
            KeyCode::Char('a') => {
                let all = self.share.recipients.iter().all(|(_, selected)| *selected);
                for (_, selected) in &mut self.share.recipients {
                    *selected = !all;
                }
            }
            KeyCode::Char('m') => self.share.method = self.share.method.next(),
            KeyCode::Enter => self.send_schedule(),
            _ => {}
        }
    }

    fn send_schedule(&mut self) {
        let count = self.share.selected_count();
        let message = match share::share_message(self.cursor, count, self.share.method) {
            Ok(message) => message,
            Err(err) => {
                self.status = Some(err.to_string());
                return;
            }
        };

        let text = share::schedule_text(self.cursor, self.schedule.shifts());
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(_) => {
                info!(recipients = count, method = self.share.method.label(), "schedule shared");
                self.close_editor();
                self.set_toast(message, false);
            }
            Err(err) => {
                warn!("clipboard unavailable: {err}");
                self.status = Some(format!("Clipboard error: {err}"));
            }
        }
    }

    fn load_requests(&mut self) {
        match accounts::pending_requests(self.rows.as_ref(), &self.query) {
            Ok(requests) => self.requests = requests,
            Err(err) => {
                warn!("failed to load registration requests: {err}");
                self.set_toast(err.to_string(), true);
            }
        }
        self.clamp_selection();
    }

    fn load_users(&mut self) {
        match self.rows.list_users() {
            Ok(users) => self.users = users,
            Err(err) => {
                warn!("failed to load users: {err}");
                self.set_toast(err.to_string(), true);
            }
        }
        self.clamp_selection();
    }

    pub fn selected_request(&self) -> Option<&RegistrationRequest> {
        self.list_state
            .selected()
            .and_then(|index| self.requests.get(index))
    }

    fn review_selected_request(&mut self, approve: bool) {
        let Some(request) = self.selected_request().cloned() else {
            self.set_toast("No request selected", true);
            return;
        };
        let result = if approve {
            accounts::approve_registration_request(self.rows.as_ref(), &request.id, self.today)
        } else {
            accounts::reject_registration_request(self.rows.as_ref(), &request.id)
        };
        match result {
            Ok(()) => {
                let verb = if approve { "Approved" } else { "Rejected" };
                self.set_toast(format!("{verb} {}", request.name), false);
            }
            Err(err) => self.set_toast(err.to_string(), true),
        }
        self.load_requests();
    }

    fn load_profile(&mut self) {
        let Some(user_id) = self.session.as_ref().map(|session| session.user_id.clone()) else {
            return;
        };
        match accounts::get_user_profile(self.rows.as_ref(), &user_id) {
            Ok(profile) => self.profile = Some(profile),
            Err(err) => {
                self.profile = None;
                self.set_toast(err.to_string(), true);
            }
        }
    }

    fn open_profile_form(&mut self) {
        let values = match &self.profile {
            Some(profile) => vec![
                profile.name.clone(),
                profile.phone.clone().unwrap_or_default(),
                profile.address.clone().unwrap_or_default(),
                profile.emergency_contact.clone().unwrap_or_default(),
                profile.bio.clone().unwrap_or_default(),
            ],
            None => {
                self.set_toast("Profile not loaded", true);
                return;
            }
        };
        self.form = TextForm::with_values(PROFILE_FIELDS, values);
        self.status = None;
        self.mode = Mode::ProfileEdit;
    }

    fn handle_profile_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.status = None;
                self.mode = Mode::Browse;
            }
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.previous_field(),
            KeyCode::Enter => self.save_profile(),
            _ => {
                if self.form.edit(key) {
                    self.status = None;
                }
            }
        }
    }

    fn save_profile(&mut self) {
        let Some(user_id) = self.session.as_ref().map(|session| session.user_id.clone()) else {
            self.expire_session();
            return;
        };
        let field = |index: usize| Some(self.form.value(index).trim().to_string());
        let update = ProfileUpdate {
            name: field(0),
            phone: field(1),
            address: field(2),
            emergency_contact: field(3),
            bio: field(4),
        };

        match accounts::update_user_profile(self.rows.as_ref(), &user_id, &update) {
            Ok(profile) => {
                if let Some(session) = self.session.as_mut() {
                    session.name = profile.name.clone();
                    if let Err(err) = session.save(&mut self.store) {
                        warn!("failed to refresh session name: {err}");
                    }
                }
                self.profile = Some(profile);
                self.status = None;
                self.mode = Mode::Browse;
                self.set_toast("Profile updated", false);
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn activate_setting(&mut self) {
        let Some(item) = self
            .list_state
            .selected()
            .and_then(|index| SETTINGS_ITEMS.get(index).copied())
        else {
            return;
        };
        match item {
            SettingsItem::Theme => self.toggle_theme(),
            SettingsItem::DefaultView => {
                self.default_view = self.default_view.next();
                match storage::write_default_view(self.default_view) {
                    Ok(()) => self.set_toast(
                        format!("Default view set to {}", self.default_view.label()),
                        false,
                    ),
                    Err(err) => self.set_toast(format!("Failed to save settings: {err}"), true),
                }
            }
            SettingsItem::ResetSchedule => self.reset_schedule(),
        }
    }

    fn reset_schedule(&mut self) {
        if !matches!(session::guard(Page::ScheduleEdit, &self.store), Access::Granted(_)) {
            self.set_toast("Only managers can reset the schedule", true);
            return;
        }
        match self.schedule.reset(&mut self.store) {
            Ok(()) => self.set_toast("Schedule reset to defaults", false),
            Err(err) => self.set_toast(err.to_string(), true),
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.next();
        match storage::write_theme(self.theme) {
            Ok(()) => self.set_toast(format!("Theme set to {}", theme_name(self.theme)), false),
            Err(err) => self.set_toast(format!("Failed to save theme: {err}"), true),
        }
    }

    pub fn active_toast(&mut self) -> Option<ToastView> {
        let toast = self.toast.as_ref()?;
        if toast.created_at.elapsed() > Duration::from_secs(2) {
            self.toast = None;
            return None;
        }
        Some(ToastView {
            message: toast.message.clone(),
            is_error: toast.is_error,
        })
    }

    fn set_toast(&mut self, message: impl Into<String>, is_error: bool) {
        self.toast = Some(Toast {
            message: message.into(),
            created_at: Instant::now(),
            is_error,
        });
    }
}

struct Toast {
    message: String,
    created_at: Instant,
    is_error: bool,
}

pub struct ToastView {
    pub message: String,
    pub is_error: bool,
}

pub fn theme_name(theme: ThemePreference) -> &'static str {
    match theme {
        ThemePreference::Terminal => "Terminal",
        ThemePreference::Dark => "Midnight",
        ThemePreference::Light => "Snow",
    }
}

fn base_page(page: Page) -> Page {
    match page {
        Page::ScheduleEdit => Page::Schedule,
        other => other,
    }
}

fn persist_login(store: &mut LocalStore, session: &Session, remember: bool) -> Result<(), io::Error> {
    session.save(store)?;
    let email = remember.then_some(session.email.as_str());
    session::remember(store, email)
}

fn cycle_value<S: AsRef<str>>(options: &[S], current: &str, forward: bool) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let len = options.len();
    let next = match options.iter().position(|option| option.as_ref() == current) {
        Some(index) if forward => (index + 1) % len,
        Some(index) => (index + len - 1) % len,
        None if forward => 0,
        None => len - 1,
    };
    Some(options[next].as_ref().to_string())
}

fn select_previous(state: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let selected = state.selected().unwrap_or(0);
    let new_index = if selected == 0 || selected >= len {
        len - 1
    } else {
        selected - 1
    };
    state.select(Some(new_index));
}

fn select_next(state: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let selected = state.selected().unwrap_or(0);
    let new_index = if selected + 1 >= len { 0 } else { selected + 1 };
    state.select(Some(new_index));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::models::Role;
    use crate::storage::keys;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 22).unwrap()
    }

    fn rows() -> MemoryStore {
        let rows = MemoryStore::new();
        accounts::seed_admin(&rows, Some("pw"), today()).unwrap();
        let form = AccountRequestForm {
            name: "Sam Carter".to_string(),
            email: "sam@example.com".to_string(),
            password: "hunter22".to_string(),
            department: "Deli".to_string(),
            phone: None,
        };
        let request = accounts::create_registration_request(&rows, &form, today()).unwrap();
        accounts::approve_registration_request(&rows, &request.id, today()).unwrap();
        rows
    }

    fn app_with(rows: MemoryStore) -> App {
        App::new(LocalStore::in_memory(), Box::new(rows), &Config::default(), today())
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App, ch: char) {
        app.handle_key_event(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL));
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn login(app: &mut App, email: &str, password: &str) {
        type_text(app, email);
        press(app, KeyCode::Tab);
        type_text(app, password);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn starts_at_login_without_session() {
        let app = app_with(rows());
        assert_eq!(app.mode, Mode::Login);
        assert!(app.session.is_none());
    }

    #[test]
    fn wrong_password_stays_on_login() {
        let mut app = app_with(rows());
        login(&mut app, "admin", "nope");
        assert_eq!(app.mode, Mode::Login);
        assert_eq!(app.status.as_deref(), Some("Invalid email or password"));
    }

    #[test]
    fn admin_login_sets_flags_and_full_nav() {
        let mut app = app_with(rows());
        login(&mut app, "admin", "pw");
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.page, Page::Dashboard);
        assert_eq!(app.nav.len(), 8);
        assert_eq!(app.store.get(keys::LOGGED_IN), Some("true"));
        assert_eq!(app.store.get(keys::USER_ROLE), Some("admin"));
    }

    #[test]
    fn associate_is_redirected_from_admin_pages() {
        let mut app = app_with(rows());
        login(&mut app, "sam@example.com", "hunter22");
        assert_eq!(app.session.as_ref().map(|s| s.role), Some(Role::Associate));
        assert_eq!(app.nav.len(), 5);

        assert!(!app.navigate(Page::Settings));
        assert_eq!(app.page, Page::Dashboard);
        assert!(app.active_toast().unwrap().is_error);

        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.page, Page::Schedule);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.page, Page::Schedule);
    }

    #[test]
    fn shift_form_creates_and_persists_a_shift() {
        let mut app = app_with(rows());
        login(&mut app, "admin", "pw");
        press(&mut app, KeyCode::Char('2'));
        let before = app.schedule.shifts().len();

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, Mode::ShiftForm);
        assert_eq!(app.page, Page::ScheduleEdit);
        type_text(&mut app, "Randy");
        assert_eq!(app.form_hours(), Some(8.0));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::ShiftForm);
        assert!(app.status.as_deref().unwrap().contains("Position"));

        for _ in 0..5 {
            press(&mut app, KeyCode::Tab);
        }
        press(&mut app, KeyCode::Right);
        assert_eq!(app.form.value(5), MEAT_MARKET_POSITIONS[0]);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.page, Page::Schedule);
        assert_eq!(app.schedule.shifts().len(), before + 1);
        let cached = app.store.get(keys::SHIFT_SCHEDULE).unwrap();
        assert!(cached.contains("\"employee\":\"Randy\""));
    }

    #[test]
    fn deleting_requires_confirmation() {
        let mut app = app_with(rows());
        login(&mut app, "admin", "pw");
        press(&mut app, KeyCode::Char('2'));
        app.cursor = dates::week_start(today()) + chrono::Duration::days(1);
        let before = app.schedule.shifts().len();
        let target = app.selected_shift().unwrap().id.clone();

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.mode, Mode::ConfirmDelete);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.schedule.shifts().len(), before);

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.schedule.shifts().len(), before - 1);
        assert!(app.schedule.get(&target).is_none());
    }

    #[test]
    fn approving_from_the_queue_creates_the_account() {
        let store = rows();
        let form = AccountRequestForm {
            name: "Kim Lee".to_string(),
            email: "kim@example.com".to_string(),
            password: "letmein1".to_string(),
            department: "Produce".to_string(),
            phone: None,
        };
        accounts::create_registration_request(&store, &form, today()).unwrap();

        let mut app = app_with(store);
        login(&mut app, "admin", "pw");
        assert!(app.navigate(Page::AccountRequests));
        assert_eq!(app.requests.len(), 1);

        press(&mut app, KeyCode::Char('a'));
        assert!(app.requests.is_empty());
        let user = app.rows.find_user_by_email("kim@example.com").unwrap().unwrap();
        assert_eq!(user.role, Role::Associate);
    }

    #[test]
    fn logout_keeps_remembered_email() {
        let mut app = app_with(rows());
        ctrl(&mut app, 'r');
        login(&mut app, "admin", "pw");
        press(&mut app, KeyCode::Char('L'));

        assert_eq!(app.mode, Mode::Login);
        assert!(Session::load(&app.store).is_none());
        assert_eq!(app.form.value(0), "admin");
        assert!(app.remember);
    }

    #[test]
    fn existing_session_resumes() {
        let mut store = LocalStore::in_memory();
        Session {
            user_id: "u1".to_string(),
            name: "Shane".to_string(),
            email: "shane@example.com".to_string(),
            role: Role::Manager,
        }
        .save(&mut store)
        .unwrap();
        let app = App::new(store, Box::new(rows()), &Config::default(), today());
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.page, Page::Dashboard);
        assert_eq!(app.nav.len(), 5);
    }

    #[test]
    fn sharing_with_nobody_is_rejected() {
        let mut app = app_with(rows());
        login(&mut app, "admin", "pw");
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.mode, Mode::Share);
        assert_eq!(app.share.selected_count(), 8);

        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Share);
        assert_eq!(app.status.as_deref(), Some("Select at least one employee"));
    }

    #[test]
    fn employee_search_filters_the_list() {
        let mut app = app_with(rows());
        login(&mut app, "admin", "pw");
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.page, Page::Employees);
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "deli");
        assert_eq!(app.visible_employees().len(), 2);
        press(&mut app, KeyCode::Esc);
        assert!(app.query.is_empty());
        assert_eq!(app.mode, Mode::Browse);
    }

    #[test]
    fn request_form_submits_pending_request() {
        let mut app = app_with(rows());
        ctrl(&mut app, 'n');
        assert_eq!(app.mode, Mode::RequestAccount);
        type_text(&mut app, "Pat Doe");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "pat@example.com");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "s3cret!");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Login);
        assert_eq!(app.form.value(0), "pat@example.com");
        let pending = accounts::pending_requests(app.rows.as_ref(), "pat").unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].department, MEAT_MARKET);
    }
}
