//! Session management screen: toolbar, sortable table, pager and the add/edit/delete dialogs.

use arboard::Clipboard;
use chrono::{NaiveDate, Utc};
use client_core::{
    form::{FormMode, SessionEdit},
    sessions_view::{SessionDialog, DEFAULT_INSTANCE_UNAVAILABLE},
    table::{expiry_date, SortDirection, PAGE_SIZE_OPTIONS},
};
use eframe::egui;
use shared::{
    domain::{InstanceType, SessionColumn},
    validation::{canonical_endpoint, Field, ValidationError},
};

use super::app::EventEngineApp;

enum TableAction {
    Toggle(String),
    SelectAll(bool),
    Sort(SessionColumn),
    CopyLink(String),
    OpenLink(String),
}

struct RowSnapshot {
    name: String,
    selected: bool,
    expired: bool,
    cells: Vec<String>,
}

/// Single-line input that reports the new text only when the user changed it.
fn text_row(ui: &mut egui::Ui, label: &str, value: &str, enabled: bool) -> Option<String> {
    let mut buf = value.to_string();
    let mut changed = None;
    ui.label(label);
    let response = ui.add_enabled(enabled, egui::TextEdit::singleline(&mut buf).desired_width(320.0));
    if response.changed() {
        changed = Some(buf);
    }
    ui.end_row();
    changed
}

fn issue_row(ui: &mut egui::Ui, issue: Option<ValidationError>) {
    if let Some(issue) = issue {
        ui.label("");
        ui.label(
            egui::RichText::new(issue.to_string())
                .small()
                .color(ui.visuals().error_fg_color),
        );
        ui.end_row();
    }
}

fn sort_marker(column: SessionColumn, active: SessionColumn, direction: SortDirection) -> &'static str {
    match (column == active, direction) {
        (false, _) => "",
        (true, SortDirection::Ascending) => " ^",
        (true, SortDirection::Descending) => " v",
    }
}

impl EventEngineApp {
    pub(super) fn show_sessions_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_sessions_toolbar(ui);
            ui.separator();
            egui::ScrollArea::both().show(ui, |ui| {
                self.show_sessions_table(ui);
            });
            ui.separator();
            self.show_pager(ui);
        });

        self.show_session_dialog(ctx);
        self.show_delete_dialog(ctx);
        self.show_error_modal(ctx);
    }

    fn show_sessions_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let selected = self.sessions.table().selection().len();
            if selected > 0 {
                ui.strong(format!("{selected} selected"));
            } else {
                ui.heading("Sessions");
            }
            if self.sessions.is_busy() {
                ui.spinner();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if self.sessions.can_delete() && ui.button("Delete").clicked() {
                    self.sessions.launch_delete();
                }
                if self.sessions.can_edit() && ui.button("Edit").clicked() && self.sessions.launch_edit() {
                    self.reset_dialog_inputs();
                }
                if ui.button("Add").clicked() {
                    self.sessions.launch_add(Utc::now());
                    self.reset_dialog_inputs();
                }
                if ui
                    .add_enabled(!self.sessions.is_busy(), egui::Button::new("Refresh"))
                    .clicked()
                {
                    let load = self.sessions.load();
                    self.dispatch(load);
                }
            });
        });
    }

    fn reset_dialog_inputs(&mut self) {
        self.expiry_input = expiry_date(self.sessions.form().fields().expires_at);
        self.field_error = None;
        if let Some(lookup) = self.sessions.default_instance_command() {
            self.dispatch(lookup);
        }
    }

    fn show_sessions_table(&mut self, ui: &mut egui::Ui) {
        let now = Utc::now();
        let table = self.sessions.table();
        let total = table.rows().len();
        let sort = table.sort();
        let mut all_checked = table.selection().is_all(total);
        let partial = table.selection().is_partial(total);
        let filler = table.filler_rows();
        let rows: Vec<RowSnapshot> = table
            .visible_rows()
            .into_iter()
            .map(|row| RowSnapshot {
                name: row.name.clone(),
                selected: table.selection().is_selected(&row.name),
                expired: row.is_expired(now),
                cells: SessionColumn::ALL
                    .iter()
                    .map(|column| self.sessions.cell(row, *column))
                    .collect(),
            })
            .collect();

        let mut actions = Vec::new();
        egui::Grid::new("sessions_table")
            .striped(true)
            .num_columns(SessionColumn::ALL.len() + 2)
            .show(ui, |ui| {
                if ui
                    .add(egui::Checkbox::new(&mut all_checked, "").indeterminate(partial))
                    .changed()
                {
                    actions.push(TableAction::SelectAll(all_checked));
                }
                for column in SessionColumn::ALL {
                    let label = format!(
                        "{}{}",
                        column.label(),
                        sort_marker(column, sort.column, sort.direction)
                    );
                    let header = ui.selectable_label(sort.column == column, egui::RichText::new(label).strong());
                    let header = if sort.column == column {
                        header.on_hover_text(sort.direction.label())
                    } else {
                        header
                    };
                    if header.clicked() {
                        actions.push(TableAction::Sort(column));
                    }
                }
                ui.strong("Session Link");
                ui.end_row();

                for row in rows {
                    let mut checked = row.selected;
                    if ui.checkbox(&mut checked, "").changed() {
                        actions.push(TableAction::Toggle(row.name.clone()));
                    }
                    for (i, cell) in row.cells.iter().enumerate() {
                        if row.expired && SessionColumn::ALL[i] == SessionColumn::ExpiresAt {
                            ui.colored_label(ui.visuals().warn_fg_color, cell)
                                .on_hover_text("Expired");
                        } else {
                            ui.label(cell);
                        }
                    }
                    ui.horizontal(|ui| {
                        if ui.small_button("Copy").clicked() {
                            actions.push(TableAction::CopyLink(row.name.clone()));
                        }
                        if ui.small_button("Open").clicked() {
                            actions.push(TableAction::OpenLink(row.name.clone()));
                        }
                    });
                    ui.end_row();
                }

                for _ in 0..filler {
                    ui.label(" ");
                    ui.end_row();
                }
            });

        for action in actions {
            match action {
                TableAction::Toggle(name) => self.sessions.toggle_row(&name),
                TableAction::SelectAll(checked) => self.sessions.set_all_selected(checked),
                TableAction::Sort(column) => self.sessions.request_sort(column),
                TableAction::CopyLink(name) => {
                    let link = self.settings.event_link(&name);
                    match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(link.clone())) {
                        Ok(()) => self.status = format!("Copied {link}"),
                        Err(err) => self.status = format!("Clipboard unavailable: {err}"),
                    }
                }
                TableAction::OpenLink(name) => {
                    ui.ctx()
                        .open_url(egui::OpenUrl::new_tab(self.settings.event_link(&name)));
                }
            }
        }
    }

    fn show_pager(&mut self, ui: &mut egui::Ui) {
        let pagination = self.sessions.table().pagination();
        let page_count = self.sessions.table().page_count().max(1);
        ui.horizontal(|ui| {
            ui.label("Rows per page");
            let mut page_size = pagination.page_size();
            egui::ComboBox::from_id_salt("sessions_page_size")
                .selected_text(page_size.to_string())
                .show_ui(ui, |ui| {
                    for option in PAGE_SIZE_OPTIONS {
                        ui.selectable_value(&mut page_size, option, option.to_string());
                    }
                });
            if page_size != pagination.page_size() {
                if let Err(err) = self.sessions.set_page_size(page_size) {
                    self.status = err.to_string();
                }
            }

            ui.separator();
            let page = pagination.page();
            if ui.add_enabled(page > 0, egui::Button::new("<")).clicked() {
                self.sessions.set_page(page - 1);
            }
            ui.label(format!("page {} of {page_count}", page + 1));
            if ui
                .add_enabled(page + 1 < page_count, egui::Button::new(">"))
                .clicked()
            {
                self.sessions.set_page(page + 1);
            }
            ui.weak(format!("{} sessions", self.sessions.table().rows().len()));
        });
    }

    fn edit_session_form(&mut self, edit: SessionEdit) {
        match self.sessions.edit_form(edit) {
            Ok(()) => self.field_error = None,
            Err(err) => self.field_error = Some(err.to_string()),
        }
    }

    fn show_session_dialog(&mut self, ctx: &egui::Context) {
        let title = match self.sessions.dialog() {
            Some(SessionDialog::Add) => "Add session",
            Some(SessionDialog::Edit) => "Edit session",
            _ => return,
        };
        let form = self.sessions.form().clone();
        let fields = form.fields();
        let is_edit = matches!(form.mode(), FormMode::Edit { .. });
        let custom = fields.instance_type == InstanceType::Custom;
        let default_label = format!(
            "DEFAULT {}",
            self.sessions
                .default_instance()
                .unwrap_or(DEFAULT_INSTANCE_UNAVAILABLE)
        );

        let mut edits = Vec::new();
        let mut submit = false;
        let mut cancel = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                let mut instance_type = fields.instance_type;
                ui.horizontal(|ui| {
                    ui.radio_value(&mut instance_type, InstanceType::Custom, "CUSTOM");
                    ui.radio_value(&mut instance_type, InstanceType::Default, default_label.as_str());
                });
                if instance_type != fields.instance_type {
                    edits.push(SessionEdit::InstanceType(instance_type));
                }

                egui::Grid::new("session_form").num_columns(2).show(ui, |ui| {
                    if let Some(v) = text_row(ui, "Name", &fields.name, !is_edit) {
                        edits.push(SessionEdit::Name(v));
                    }
                    issue_row(ui, form.issue_for(Field::SessionName));

                    if custom {
                        if let Some(v) = text_row(ui, "Lacework URL", &fields.url, true) {
                            edits.push(SessionEdit::Url(v));
                        }
                        issue_row(ui, form.issue_for(Field::Url));
                        if !fields.url.is_empty() {
                            ui.label("");
                            ui.weak(canonical_endpoint(&fields.url));
                            ui.end_row();
                        }
                        if let Some(v) = text_row(ui, "Sub-account", &fields.sub_account, true) {
                            edits.push(SessionEdit::SubAccount(v));
                        }
                        if let Some(v) = text_row(ui, "AccessKeyID", &fields.access_key_id, true) {
                            edits.push(SessionEdit::AccessKeyId(v));
                        }
                        issue_row(ui, form.issue_for(Field::AccessKeyId));
                        if let Some(v) = text_row(ui, "SecretKey", &fields.secret_key, true) {
                            edits.push(SessionEdit::SecretKey(v));
                        }
                        issue_row(ui, form.issue_for(Field::SecretKey));
                    }

                    if let Some(v) = text_row(ui, "User group", &fields.user_group, true) {
                        edits.push(SessionEdit::UserGroup(v));
                    }
                    issue_row(ui, form.issue_for(Field::UserGroup));

                    ui.label("Delete session on this date");
                    ui.add(egui::TextEdit::singleline(&mut self.expiry_input).hint_text("YYYY-MM-DD"));
                    ui.end_row();
                });

                if let Some(err) = &self.field_error {
                    ui.colored_label(ui.visuals().error_fg_color, err);
                }

                ui.horizontal(|ui| {
                    cancel = ui.button("Cancel").clicked();
                    let label = if is_edit { "Save" } else { "Add" };
                    submit = ui
                        .add_enabled(!self.sessions.is_busy(), egui::Button::new(label))
                        .clicked();
                });
            });

        for edit in edits {
            self.edit_session_form(edit);
        }
        if cancel {
            self.sessions.cancel_dialog();
            return;
        }
        if submit {
            match NaiveDate::parse_from_str(self.expiry_input.trim(), "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
            {
                Some(expires) => self.edit_session_form(SessionEdit::ExpiresAt(expires.and_utc())),
                None => {
                    self.field_error = Some("Expiry must be a YYYY-MM-DD date".to_string());
                    return;
                }
            }
            if let Some(cmd) = self.sessions.confirm(&self.auth) {
                self.dispatch(cmd);
            }
        }
    }

    fn show_delete_dialog(&mut self, ctx: &egui::Context) {
        if self.sessions.dialog() != Some(SessionDialog::ConfirmDelete) {
            return;
        }
        let names = self.sessions.table().selection().names().join(", ");
        let mut confirm = false;
        let mut cancel = false;
        egui::Window::new("Delete sessions")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("The following sessions will be deleted:");
                ui.strong(&names);
                ui.horizontal(|ui| {
                    cancel = ui.button("Cancel").clicked();
                    confirm = ui
                        .add_enabled(!self.sessions.is_busy(), egui::Button::new("Delete"))
                        .clicked();
                });
            });
        if cancel {
            self.sessions.cancel_dialog();
        } else if confirm {
            if let Some(cmd) = self.sessions.confirm(&self.auth) {
                self.dispatch(cmd);
            }
        }
    }

    fn show_error_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.sessions.error().map(|modal| modal.message.clone()) else {
            return;
        };
        let mut dismissed = false;
        egui::Modal::new(egui::Id::new("session_error_modal")).show(ctx, |ui| {
            ui.heading("Error");
            ui.label(&message);
            dismissed = ui.button("OK").clicked();
        });
        if dismissed {
            if let Some(cmd) = self.sessions.dismiss_error() {
                self.dispatch(cmd);
            }
        }
    }
}
