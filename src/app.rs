use eframe::egui;

use crate::state::{AppState, View};
use crate::ui::{panels, plot, tables};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct HaloViewerApp {
    pub state: AppState,
}

impl HaloViewerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for HaloViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + view tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: schema + filters ----
        egui::SidePanel::left("control_panel")
            .default_width(280.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: selected view ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.view {
            View::Scatter => plot::scatter_plot(ui, &mut self.state),
            View::MassFunction => plot::mass_function_plots(ui, &self.state),
            View::Radius => plot::radius_plot(ui, &self.state),
            View::Hierarchy => tables::hierarchy_browser(ui, &mut self.state),
            View::Datasets => tables::dataset_table(ui, &self.state),
        });
    }
}
