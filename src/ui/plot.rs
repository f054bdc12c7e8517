use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::state::{AppState, Projection};

fn no_catalog(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading("Open a catalog to explore halos  (File → Open…)");
    });
}

// ---------------------------------------------------------------------------
// Scatter projection (central panel)
// ---------------------------------------------------------------------------

/// Halo positions projected onto two axes, coloured by mass.
pub fn scatter_plot(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Projection:");
        for p in [Projection::Xy, Projection::Xz, Projection::Yz] {
            ui.selectable_value(&mut state.projection, p, p.label());
        }
    });

    let Some(cat) = &state.catalog else {
        no_catalog(ui);
        return;
    };
    let records = &cat.visible;
    if records.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No halos pass the current filters.");
        });
        return;
    }

    let (a, b, a_label, b_label) = match state.projection {
        Projection::Xy => (records.x(), records.y(), "x", "y"),
        Projection::Xz => (records.x(), records.z(), "x", "z"),
        Projection::Yz => (records.y(), records.z(), "y", "z"),
    };
    let mass = records.mass();

    // Heaviest halos first so the cap drops the small ones.
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&i, &j| mass[j].total_cmp(&mass[i]));
    let cap = state.config.max_scatter_points;
    if order.len() > cap {
        ui.label(
            RichText::new(format!(
                "Showing the {cap} heaviest of {} halos",
                order.len()
            ))
            .weak(),
        );
        order.truncate(cap);
    }

    let steps = cat.color_map.as_ref().map_or(1, |cm| cm.steps());
    let mut groups: Vec<Vec<[f64; 2]>> = vec![Vec::new(); steps];
    for &i in &order {
        let step = cat.color_map.as_ref().map_or(0, |cm| cm.step_for(mass[i]));
        groups[step].push([a[i], b[i]]);
    }

    let radius = state.config.point_radius;
    Plot::new("scatter_plot")
        .legend(Legend::default())
        .data_aspect(1.0)
        .x_axis_label(a_label)
        .y_axis_label(b_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (step, pts) in groups.into_iter().enumerate() {
                if pts.is_empty() {
                    continue;
                }
                let (color, name) = match &cat.color_map {
                    Some(cm) => (cm.color(step), cm.label(step)),
                    None => (Color32::LIGHT_BLUE, "halos".to_string()),
                };
                plot_ui.points(
                    Points::new(PlotPoints::from(pts))
                        .name(name)
                        .color(color)
                        .radius(radius),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Mass function
// ---------------------------------------------------------------------------

/// Differential and cumulative mass functions side by side.
pub fn mass_function_plots(ui: &mut Ui, state: &AppState) {
    let Some(cat) = &state.catalog else {
        no_catalog(ui);
        return;
    };
    let Some(summary) = &cat.stats.summary else {
        ui.label("No halos pass the current filters.");
        return;
    };

    // The cumulative function only exists on the logarithmic binning.
    let log_bins = summary.cumulative_mass_function.is_some();
    let mf = &summary.mass_function;
    let x_of = |c: f64| if log_bins { c.log10() } else { c };

    ui.columns(2, |cols| {
        let differential: PlotPoints = mf
            .bin_centers
            .iter()
            .zip(&mf.counts)
            .map(|(&c, &n)| [x_of(c), (n as f64 + 1.0).log10()])
            .collect();
        cols[0].label(RichText::new("Mass function").strong());
        Plot::new("mass_function")
            .x_axis_label(if log_bins { "log10 M" } else { "M" })
            .y_axis_label("log10 (N + 1)")
            .show(&mut cols[0], |plot_ui| {
                plot_ui.line(
                    Line::new(differential)
                        .name("dN")
                        .color(Color32::LIGHT_BLUE)
                        .width(1.5),
                );
            });

        cols[1].label(RichText::new("Cumulative mass function").strong());
        match &summary.cumulative_mass_function {
            Some(cum) => {
                let cumulative: PlotPoints = cum
                    .bin_centers
                    .iter()
                    .zip(&cum.counts)
                    .map(|(&c, &n)| [c.log10(), (n as f64 + 1.0).log10()])
                    .collect();
                Plot::new("cumulative_mass_function")
                    .x_axis_label("log10 M")
                    .y_axis_label("log10 (N(≥M) + 1)")
                    .show(&mut cols[1], |plot_ui| {
                        plot_ui.line(
                            Line::new(cumulative)
                                .name("N(≥M)")
                                .color(Color32::LIGHT_RED)
                                .width(1.5),
                        );
                    });
            }
            None => {
                cols[1].centered_and_justified(|ui: &mut Ui| {
                    ui.label("No data");
                });
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Radius histogram
// ---------------------------------------------------------------------------

pub fn radius_plot(ui: &mut Ui, state: &AppState) {
    let Some(cat) = &state.catalog else {
        no_catalog(ui);
        return;
    };
    let Some(hist) = cat
        .stats
        .summary
        .as_ref()
        .and_then(|s| s.radius_histogram.as_ref())
    else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("No radius distribution for this selection.");
        });
        return;
    };

    let bars: Vec<Bar> = hist
        .bin_edges
        .windows(2)
        .zip(&hist.counts)
        .map(|(edge, &n)| Bar::new((edge[0] + edge[1]) / 2.0, n as f64).width(edge[1] - edge[0]))
        .collect();

    Plot::new("radius_histogram")
        .legend(Legend::default())
        .x_axis_label("radius")
        .y_axis_label("halos")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name("radius")
                    .color(Color32::from_rgb(120, 170, 230)),
            );
        });
}
