use client_core::{form::RegistrationEdit, registration_view::RegistrationEffect};
use eframe::egui;
use shared::validation::Field;

use super::app::EventEngineApp;

impl EventEngineApp {
    pub(super) fn show_event_screen(&mut self, ctx: &egui::Context) {
        let Some(view) = self.registration.as_ref() else {
            return;
        };
        let session_name = view.session_name().to_string();
        let fields = view.form().fields().clone();
        let issues = view.issues();
        let busy = view.is_busy();
        let message = view.message().map(|m| m.text().to_string());

        let mut edits = Vec::new();
        let mut submit = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(480.0);
                ui.heading(format!("Register for {session_name}"));
                ui.weak("We'll email you the credentials for your lab environment.");
                ui.add_space(12.0);

                egui::Grid::new("registration_form").num_columns(2).show(ui, |ui| {
                    let rows = [
                        (Field::Email, fields.email.as_str()),
                        (Field::FirstName, fields.first_name.as_str()),
                        (Field::LastName, fields.last_name.as_str()),
                        (Field::Company, fields.company.as_str()),
                    ];
                    for (field, value) in rows {
                        let mut buf = value.to_string();
                        ui.label(field.label());
                        if ui.text_edit_singleline(&mut buf).changed() {
                            edits.push(match field {
                                Field::Email => RegistrationEdit::Email(buf),
                                Field::FirstName => RegistrationEdit::FirstName(buf),
                                Field::LastName => RegistrationEdit::LastName(buf),
                                _ => RegistrationEdit::Company(buf),
                            });
                        }
                        ui.end_row();
                        if let Some(issue) = issues.iter().find(|i| i.field() == field) {
                            ui.label("");
                            ui.label(
                                egui::RichText::new(issue.to_string())
                                    .small()
                                    .color(ui.visuals().error_fg_color),
                            );
                            ui.end_row();
                        }
                    }
                });

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    submit = ui.add_enabled(!busy, egui::Button::new("Register")).clicked();
                    if busy {
                        ui.spinner();
                    }
                });
            });
        });

        let mut dismissed = false;
        if let Some(text) = &message {
            egui::Modal::new(egui::Id::new("registration_message")).show(ctx, |ui| {
                ui.label(text);
                dismissed = ui.button("OK").clicked();
            });
        }

        let Some(view) = self.registration.as_mut() else {
            return;
        };
        for edit in edits {
            view.edit(edit);
        }
        if dismissed {
            if let Some(RegistrationEffect::RedirectTo(url)) = view.dismiss(&self.settings.docs_url) {
                ctx.open_url(egui::OpenUrl::same_tab(url));
            }
        }
        if submit {
            if let Some(cmd) = view.submit() {
                self.dispatch(cmd);
            }
        }
    }
}
