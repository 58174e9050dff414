//! Visualization: Linked Scatter Views
//!
//! Two independent views over the same dataset, cross-wired the way a host
//! application links visualizations: brushing or hovering in one is pushed
//! into the other via handle_brush/handle_hover. The left view shows the
//! rank metrics with glyphs and grouping; the right shows the ungrouped 2D
//! projection as plain dots.
//!
//! Run: cargo run --release --bin viz_linked [-- --data path.json]

use eframe::egui;
use std::cell::RefCell;
use std::rc::Rc;
use topic_model_explorer::view::{Grouping, TopicModelView};
use topic_model_explorer::{viz_common, ModelSet};

/// Notifications captured from one view during a frame, drained into the
/// other view afterwards. The outer Option marks "something fired"; the
/// inner payload may itself be a cleared state.
#[derive(Default)]
struct Pending {
    brush: Option<Option<Vec<String>>>,
    hover: Option<Option<String>>,
}

struct LinkedApp {
    data: ModelSet,
    left: TopicModelView,
    right: TopicModelView,
    left_out: Rc<RefCell<Pending>>,
    right_out: Rc<RefCell<Pending>>,
}

fn wire(view: &mut TopicModelView, out: &Rc<RefCell<Pending>>) {
    {
        let o = Rc::clone(out);
        view.on_brush(move |ids| o.borrow_mut().brush = Some(ids.map(|s| s.to_vec())));
    }
    {
        let o = Rc::clone(out);
        view.on_hover(move |id| o.borrow_mut().hover = Some(id.map(str::to_owned)));
    }
}

impl LinkedApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let data = viz_common::load_data();

        let mut left = TopicModelView::new().with_title("Rank Metrics");
        let mut right = TopicModelView::new()
            .with_title("Projection")
            .with_mappings(0, 1)
            .with_grouping(Grouping::None)
            .with_glyphs(false);

        let left_out = Rc::new(RefCell::new(Pending::default()));
        let right_out = Rc::new(RefCell::new(Pending::default()));
        wire(&mut left, &left_out);
        wire(&mut right, &right_out);

        Self {
            data,
            left,
            right,
            left_out,
            right_out,
        }
    }
}

impl eframe::App for LinkedApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let half = (ui.available_width() / 2.0 - 12.0).max(320.0);
            let height = (ui.available_height() - 30.0).max(300.0);
            self.left.set_width(half).set_height(height);
            self.right.set_width(half).set_height(height);

            ui.columns(2, |cols| {
                self.left.show(&mut cols[0], &mut self.data);
                self.right.show(&mut cols[1], &mut self.data);
            });
        });

        // Mirror each view's notifications into the other.
        if let Some(ids) = self.left_out.borrow_mut().brush.take() {
            self.right.handle_brush(ids.as_deref());
        }
        if let Some(id) = self.left_out.borrow_mut().hover.take() {
            self.right.handle_hover(id.as_deref());
        }
        if let Some(ids) = self.right_out.borrow_mut().brush.take() {
            self.left.handle_brush(ids.as_deref());
        }
        if let Some(id) = self.right_out.borrow_mut().hover.take() {
            self.left.handle_hover(id.as_deref());
        }
    }
}

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1600.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Linked Scatter Views",
        options,
        Box::new(|cc| Ok(Box::new(LinkedApp::new(cc)))),
    )
}
