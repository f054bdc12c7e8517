use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use halo_viewer::data::Role;

use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Hierarchy browser
// ---------------------------------------------------------------------------

/// One level of the halo tree with breadcrumbs back to the top.
pub fn hierarchy_browser(ui: &mut Ui, state: &mut AppState) {
    let Some(cat) = &state.catalog else {
        ui.label("Open a catalog to browse its halo tree.");
        return;
    };
    if cat.records.parent_id().is_none() {
        ui.label("This catalog has no parent ids; there is no hierarchy to browse.");
        return;
    }

    // Navigation is applied after drawing, once the borrows end.
    let mut back_to = None;
    let mut enter = None;

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Top level").clicked() {
            back_to = Some(0);
        }
        for (depth, id) in state.hierarchy_path.iter().enumerate() {
            ui.label("›");
            if ui.button(format!("halo {id}")).clicked() {
                back_to = Some(depth + 1);
            }
        }
    });
    ui.separator();

    let level = &state.hierarchy_level;
    if level.is_empty() {
        ui.label(RichText::new("No halos at this level.").weak());
    } else {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(120.0))
            .column(Column::remainder())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                header.col(|ui| {
                    ui.strong("id");
                });
                header.col(|ui| {
                    ui.strong("mass");
                });
                header.col(|ui| {
                    ui.strong("children");
                });
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, level.len(), |mut row| {
                    let node = &level[row.index()];
                    row.col(|ui| {
                        ui.label(node.id.to_string());
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.4e}", node.mass));
                    });
                    row.col(|ui| {
                        if node.has_children {
                            if ui.small_button("open ›").clicked() {
                                enter = Some(node.id);
                            }
                        } else {
                            ui.label(RichText::new("none").weak());
                        }
                    });
                });
            });
    }

    if let Some(depth) = back_to {
        state.hierarchy_back_to(depth);
    } else if let Some(id) = enter {
        state.enter_halo(id);
    }
}

// ---------------------------------------------------------------------------
// Dataset listing
// ---------------------------------------------------------------------------

/// Every leaf array of the container and the role it is read as.
pub fn dataset_table(ui: &mut Ui, state: &AppState) {
    let Some(cat) = &state.catalog else {
        ui.label("Open a catalog to list its datasets.");
        return;
    };
    if cat.descriptors.is_empty() {
        ui.label("Flat tables have no datasets; columns are read by name.");
        return;
    }

    let role_of = |path: &str| -> String {
        let Some(schema) = &cat.schema else {
            return String::new();
        };
        Role::ALL
            .into_iter()
            .filter(|&r| schema.get(r) == Some(path))
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(220.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(70.0))
        .column(Column::auto().at_least(40.0))
        .column(Column::remainder())
        .header(ROW_HEIGHT + 2.0, |mut header| {
            for title in ["path", "shape", "dtype", "rank", "role"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, cat.descriptors.len(), |mut row| {
                let d = &cat.descriptors[row.index()];
                row.col(|ui| {
                    ui.label(&d.path);
                });
                row.col(|ui| {
                    ui.label(format!("{:?}", d.shape));
                });
                row.col(|ui| {
                    ui.label(d.element_kind.to_string());
                });
                row.col(|ui| {
                    ui.label(d.rank.to_string());
                });
                row.col(|ui| {
                    ui.label(role_of(&d.path));
                });
            });
        });
}
