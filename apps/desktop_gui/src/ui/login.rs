use eframe::egui;

use super::app::EventEngineApp;

impl EventEngineApp {
    pub(super) fn show_login_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            let card_width = avail.x.clamp(360.0, 480.0);
            ui.add_space((avail.y * 0.2).clamp(18.0, 160.0));

            ui.vertical_centered(|ui| {
                ui.set_width(card_width);
                egui::Frame::NONE
                    .fill(ui.visuals().faint_bg_color)
                    .corner_radius(14.0)
                    .stroke(egui::Stroke::new(
                        1.0,
                        ui.visuals().widgets.noninteractive.bg_stroke.color,
                    ))
                    .inner_margin(egui::Margin::symmetric(20, 18))
                    .show(ui, |ui| {
                        ui.style_mut().spacing.item_spacing = egui::vec2(10.0, 10.0);
                        ui.heading("Sign in");
                        ui.weak("Administrators sign in through the organisation's Google account.");

                        if ui.button("Login with Google").clicked() {
                            ui.ctx()
                                .open_url(egui::OpenUrl::new_tab(self.settings.sessions_page()));
                            self.status =
                                "Finish signing in in your browser, then press Check again".to_string();
                        }

                        let checking = !self.auth.is_initialized();
                        if ui
                            .add_enabled(!checking, egui::Button::new("Check again"))
                            .clicked()
                        {
                            let refresh = self.auth.refresh_command();
                            self.dispatch(refresh);
                        }
                        if checking {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.weak("Checking sign-in state...");
                            });
                        }
                    });
            });
        });
    }
}
