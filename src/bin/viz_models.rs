//! Visualization: Model Scatter
//!
//! Interactive scatter of topic-model runs: pie glyphs encode the
//! hyperparameter levels, grouping collapses runs into parameter-fixed
//! aggregates, and a rectangular brush multi-selects. The side panel plots
//! the brushed models' rank metrics via the brush notification, the same
//! way a host application would consume it.
//!
//! Run: cargo run --release --bin viz_models [-- --data path.json]

use eframe::egui;
use egui_plot::{Legend, Plot, PlotPoints, Points};
use std::cell::RefCell;
use std::rc::Rc;
use topic_model_explorer::view::TopicModelView;
use topic_model_explorer::{viz_common, ModelSet};

#[derive(Default)]
struct LinkState {
    brushed: Option<Vec<String>>,
    hovered: Option<String>,
    last_clicked: Option<String>,
}

struct ModelsApp {
    data: ModelSet,
    view: TopicModelView,
    link: Rc<RefCell<LinkState>>,
}

impl ModelsApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let data = viz_common::load_data();
        let link = Rc::new(RefCell::new(LinkState::default()));

        let mut view = TopicModelView::new().with_title("Scatter Metrics");
        {
            let l = Rc::clone(&link);
            view.on_brush(move |ids| l.borrow_mut().brushed = ids.map(|s| s.to_vec()));
        }
        {
            let l = Rc::clone(&link);
            view.on_hover(move |id| l.borrow_mut().hovered = id.map(str::to_owned));
        }
        {
            let l = Rc::clone(&link);
            view.on_click(move |id| l.borrow_mut().last_clicked = Some(id.to_owned()));
        }

        Self { data, view, link }
    }
}

impl eframe::App for ModelsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::right("selection")
            .min_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Selection");
                let link = self.link.borrow();
                match &link.brushed {
                    Some(ids) if !ids.is_empty() => {
                        ui.label(format!("{} models brushed", ids.len()));

                        let pts: PlotPoints = self
                            .data
                            .models
                            .iter()
                            .filter(|m| ids.contains(&m.id))
                            .map(|m| [m.mean_rank, m.best_rank])
                            .collect();
                        Plot::new("selection_plot")
                            .legend(Legend::default())
                            .show(ui, |plot_ui| {
                                plot_ui.points(
                                    Points::new(pts)
                                        .radius(3.0)
                                        .color(egui::Color32::GOLD)
                                        .name("mean vs best rank"),
                                );
                            });
                    }
                    Some(_) => {
                        ui.label("Empty brush selection.");
                    }
                    None => {
                        ui.label("Drag on the plot to brush models.");
                        ui.label("Click an axis label to cycle its metric.");
                    }
                }
                ui.separator();
                if let Some(id) = &link.hovered {
                    ui.label(format!("Hovering: {id}"));
                }
                if let Some(id) = &link.last_clicked {
                    ui.label(format!("Last clicked: {id}"));
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            self.view.set_width(avail.x.max(400.0));
            self.view.set_height((avail.y - 30.0).max(300.0));
            self.view.show(ui, &mut self.data);
        });
    }
}

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Model Scatter",
        options,
        Box::new(|cc| Ok(Box::new(ModelsApp::new(cc)))),
    )
}
