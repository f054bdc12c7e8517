use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};

use halo_viewer::data::{BoundKey, Field, Role};

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Left side panel – schema editor, filters, summary
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let Some(cat) = &state.catalog else {
        ui.heading("Halo Viewer");
        ui.separator();
        ui.label("No catalog loaded.");
        return;
    };
    let file_name = cat
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ui.heading(file_name);
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            summary_section(ui, state);
            if state
                .catalog
                .as_ref()
                .is_some_and(|c| c.file.is_hierarchical())
            {
                schema_section(ui, state);
            }
            filter_section(ui, state);
        });
}

fn summary_section(ui: &mut Ui, state: &AppState) {
    let Some(cat) = &state.catalog else {
        return;
    };
    egui::CollapsingHeader::new(RichText::new("Summary").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.label(format!(
                "{} of {} halos visible",
                cat.visible.len(),
                cat.records.len()
            ));
            let Some(s) = &cat.stats.summary else {
                ui.label("Nothing to summarise.");
                return;
            };
            egui::Grid::new("summary_grid")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Total mass");
                    ui.label(format!("{:.4e}", s.total_mass));
                    ui.end_row();
                    ui.label("Mass range");
                    ui.label(format!("{:.3e} – {:.3e}", s.min_mass, s.max_mass));
                    ui.end_row();
                    ui.label("Mean mass");
                    ui.label(format!("{:.4e}", s.avg_mass));
                    ui.end_row();
                    for (axis, lo, hi) in [
                        ("x", s.bbox.x_min, s.bbox.x_max),
                        ("y", s.bbox.y_min, s.bbox.y_max),
                        ("z", s.bbox.z_min, s.bbox.z_max),
                    ] {
                        ui.label(format!("{axis} extent"));
                        ui.label(format!("{lo:.3} – {hi:.3}"));
                        ui.end_row();
                    }
                });
        });
}

fn schema_section(ui: &mut Ui, state: &mut AppState) {
    let Some(cat) = &state.catalog else {
        return;
    };
    let active = match &cat.schema {
        Some(_) => "detected / edited schema",
        None => "default layout",
    };
    // Clone what we need so we can mutate state inside the closures.
    let all_paths: Vec<String> = cat.descriptors.iter().map(|d| d.path.clone()).collect();
    let candidates = cat.candidates.clone();

    let mut apply = None;
    egui::CollapsingHeader::new(RichText::new("Schema").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.label(format!("Reading with {active}"));
            for role in Role::ALL {
                let suggested = candidates.paths(role);
                let current = state.schema_draft.get(role).map(str::to_string);
                let mut selected = current.clone();
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(format!("{:>9}", role.as_str()));
                    egui::ComboBox::from_id_salt(("schema_role", role.as_str()))
                        .width(180.0)
                        .selected_text(current.as_deref().unwrap_or("(none)"))
                        .show_ui(ui, |ui: &mut Ui| {
                            ui.selectable_value(&mut selected, None, "(none)");
                            // Detector candidates first, best first.
                            for path in &suggested {
                                ui.selectable_value(
                                    &mut selected,
                                    Some(path.to_string()),
                                    RichText::new(*path).strong(),
                                );
                            }
                            for path in all_paths.iter().filter(|p| !suggested.contains(&p.as_str())) {
                                ui.selectable_value(&mut selected, Some(path.clone()), path);
                            }
                        });
                });
                if selected != current {
                    state.schema_draft.set(role, selected);
                }
            }
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Apply schema").clicked() {
                    apply = Some(Some(state.schema_draft.clone()));
                }
                if ui.button("Default layout").clicked() {
                    apply = Some(None);
                }
            });
        });

    if let Some(schema) = apply {
        if let Err(e) = state.reload_with(schema) {
            log::error!("Failed to apply schema: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn filter_section(ui: &mut Ui, state: &mut AppState) {
    let has_radius = state
        .catalog
        .as_ref()
        .is_some_and(|c| c.records.radius().is_some());

    egui::CollapsingHeader::new(RichText::new("Filters").strong())
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            for key in BoundKey::ALL {
                let enabled_field = key.field() != Field::Radius || has_radius;
                ui.add_enabled_ui(enabled_field, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        let mut on = state.draft_bounds.get(key).is_some();
                        if ui.checkbox(&mut on, key.as_str()).changed() {
                            let seed = if on {
                                Some(state.seed_bound(key).unwrap_or(0.0))
                            } else {
                                None
                            };
                            state.draft_bounds.set(key, seed);
                        }
                        if let Some(mut value) = state.draft_bounds.get(key) {
                            let speed = (value.abs() * 0.01).max(1e-3);
                            if ui.add(DragValue::new(&mut value).speed(speed)).changed() {
                                state.draft_bounds.set(key, Some(value));
                            }
                        }
                    });
                });
            }
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Apply").clicked() {
                    state.apply_filters();
                }
                if ui.button("Reset").clicked() {
                    state.reset_filters();
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let has_catalog = state.catalog.is_some();
            if ui
                .add_enabled(has_catalog, egui::Button::new("Export visible…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for (view, label) in [
            (View::Scatter, "Scatter"),
            (View::MassFunction, "Mass function"),
            (View::Radius, "Radius"),
            (View::Hierarchy, "Hierarchy"),
            (View::Datasets, "Datasets"),
        ] {
            ui.selectable_value(&mut state.view, view, label);
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open halo catalog")
        .add_filter("Supported files", &["h5", "hdf5", "json", "csv", "parquet", "pq"])
        .add_filter("HDF5", &["h5", "hdf5"])
        .add_filter("JSON container", &["json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open(path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export visible halos")
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .set_file_name("halos.csv")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_visible(&path) {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
