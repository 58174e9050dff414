//! The interactive scatter view of topic-model runs.
//!
//! Models (or parameter-fixed groups of models) are plotted by two
//! selectable metrics, drawn as dots or as pie glyphs encoding each
//! hyperparameter's level. Axis labels cycle their mapped metric on click,
//! a rectangular brush multi-selects models, and hover/click/brush
//! notifications let a host application link several views together.
//! Rendering uses egui::Painter with manual hit-testing; the view is
//! immediate-mode, so every pass fully recomputes layout from the current
//! scales and data.

use eframe::egui::{
    self, epaint::TextShape, pos2, vec2, Align2, Color32, CursorIcon, FontId, Margin, Painter,
    Pos2, Rect, Sense, Shape, Stroke, Ui,
};
use std::collections::HashSet;

use crate::events::Listeners;
use crate::glyph;
use crate::scale::{extent, LinearScale};
use crate::{default_params, format_level, AxisMapping, Group, Model, ModelSet, ParamSpec};

const TICK_COUNT: usize = 10;

const MARK_FILL: Color32 = Color32::from_rgb(70, 130, 180);
const MARK_OUTLINE: Color32 = Color32::WHITE;
const HOVER_FILL: Color32 = Color32::from_rgb(255, 100, 50);
const BRUSHED_FILL: Color32 = Color32::from_rgb(255, 200, 50);
const EXT_BRUSHED_FILL: Color32 = Color32::from_rgb(80, 200, 120);
const MUTED_FILL: Color32 = Color32::from_rgba_premultiplied(120, 120, 120, 100);
const AXIS_COLOR: Color32 = Color32::from_rgb(160, 160, 160);
const TICK_TEXT: Color32 = Color32::from_rgb(140, 140, 140);
const LABEL_COLOR: Color32 = Color32::from_rgb(210, 210, 210);
const LABEL_HOVER: Color32 = Color32::from_rgb(255, 200, 50);
const BRUSH_AREA: Color32 = Color32::from_rgba_premultiplied(120, 120, 120, 40);
const BRUSH_BORDER: Color32 = Color32::from_rgb(160, 160, 160);
const TOOLTIP_BG: Color32 = Color32::from_rgba_premultiplied(30, 30, 30, 220);

/// How many hyperparameters are held fixed when aggregating models into
/// groups; `None` shows the raw, ungrouped models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    None,
    FixOne,
    FixTwo,
}

impl Grouping {
    pub fn label(&self) -> &'static str {
        match self {
            Grouping::None => "None",
            Grouping::FixOne => "Fix 1 param",
            Grouping::FixTwo => "Fix 2 params",
        }
    }

    pub fn all() -> [Grouping; 3] {
        [Grouping::None, Grouping::FixOne, Grouping::FixTwo]
    }

    /// Condition length of the groups this mode displays; None for raw
    /// models.
    pub fn fixed_params(&self) -> Option<usize> {
        match self {
            Grouping::None => None,
            Grouping::FixOne => Some(1),
            Grouping::FixTwo => Some(2),
        }
    }
}

enum MarkHit {
    Model(String),
    Group(String),
}

impl MarkHit {
    fn id(&self) -> &str {
        match self {
            MarkHit::Model(id) | MarkHit::Group(id) => id,
        }
    }
}

pub struct TopicModelView {
    // Configuration.
    title: String,
    vis_width: f32,
    vis_height: f32,
    margin: Margin,
    glyph_radius: f32,
    dot_radius: f32,
    axis_offset_x: f32,
    axis_offset_y: f32,
    params: Vec<ParamSpec>,
    x_mapping_idx: usize,
    y_mapping_idx: usize,
    show_glyphs: bool,
    grouping: Grouping,
    tooltip_fn: Box<dyn Fn(&Model) -> String>,

    // Scales; domains recomputed when `data_changed` is set.
    x_scale: LinearScale,
    y_scale: LinearScale,
    data_changed: bool,

    // Interaction state.
    brushing: bool,
    brush_anchor: Option<Pos2>,
    brush_rect: Option<Rect>,
    brushed: Option<HashSet<String>>,
    hovered: Option<String>,
    ext_brushed: Option<HashSet<String>>,
    ext_hovered: Option<String>,
    warned: HashSet<String>,

    listeners: Listeners,
}

impl Default for TopicModelView {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicModelView {
    pub fn new() -> Self {
        TopicModelView {
            title: "Scatter Metrics".to_owned(),
            vis_width: 960.0,
            vis_height: 600.0,
            margin: Margin {
                left: 5.0,
                right: 5.0,
                top: 25.0,
                bottom: 5.0,
            },
            glyph_radius: 16.0,
            dot_radius: 4.0,
            axis_offset_x: 25.0,
            axis_offset_y: 15.0,
            params: default_params(),
            x_mapping_idx: 2,
            y_mapping_idx: 3,
            show_glyphs: true,
            grouping: Grouping::FixTwo,
            tooltip_fn: Box::new(|m| m.tooltip.clone()),
            x_scale: LinearScale::new(),
            y_scale: LinearScale::new(),
            data_changed: true,
            brushing: false,
            brush_anchor: None,
            brush_rect: None,
            brushed: None,
            hovered: None,
            ext_brushed: None,
            ext_hovered: None,
            warned: HashSet::new(),
            listeners: Listeners::default(),
        }
    }

    // ─── Configuration ──────────────────────────────────────────────────────

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.vis_width = width;
        self.vis_height = height;
        self
    }

    pub fn with_params(mut self, params: Vec<ParamSpec>) -> Self {
        self.params = params;
        self.data_changed = true;
        self
    }

    pub fn with_mappings(mut self, x: usize, y: usize) -> Self {
        let n = AxisMapping::all().len();
        self.x_mapping_idx = x % n;
        self.y_mapping_idx = y % n;
        self
    }

    pub fn with_glyphs(mut self, on: bool) -> Self {
        self.show_glyphs = on;
        self
    }

    /// Replace the model tooltip accessor (defaults to the model's own
    /// `tooltip` string).
    pub fn with_tooltip(mut self, f: impl Fn(&Model) -> String + 'static) -> Self {
        self.tooltip_fn = Box::new(f);
        self
    }

    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self.data_changed = true;
        self
    }

    pub fn width(&self) -> f32 {
        self.vis_width
    }

    pub fn set_width(&mut self, width: f32) -> &mut Self {
        self.vis_width = width;
        self
    }

    pub fn height(&self) -> f32 {
        self.vis_height
    }

    pub fn set_height(&mut self, height: f32) -> &mut Self {
        self.vis_height = height;
        self
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    pub fn set_grouping(&mut self, grouping: Grouping) -> &mut Self {
        if self.grouping != grouping {
            self.grouping = grouping;
            self.data_changed = true;
        }
        self
    }

    pub fn glyphs(&self) -> bool {
        self.show_glyphs
    }

    pub fn set_glyphs(&mut self, on: bool) -> &mut Self {
        if self.show_glyphs != on {
            self.show_glyphs = on;
            self.data_changed = true;
        }
        self
    }

    pub fn x_mapping(&self) -> AxisMapping {
        AxisMapping::all()[self.x_mapping_idx]
    }

    pub fn y_mapping(&self) -> AxisMapping {
        AxisMapping::all()[self.y_mapping_idx]
    }

    /// Advance the x axis to the next metric, wrapping after the last.
    pub fn cycle_x_mapping(&mut self) {
        self.x_mapping_idx = (self.x_mapping_idx + 1) % AxisMapping::all().len();
        self.data_changed = true;
    }

    /// Advance the y axis to the next metric, wrapping after the last.
    pub fn cycle_y_mapping(&mut self) {
        self.y_mapping_idx = (self.y_mapping_idx + 1) % AxisMapping::all().len();
        self.data_changed = true;
    }

    // ─── Notifications ──────────────────────────────────────────────────────

    pub fn on_hover(&mut self, f: impl FnMut(Option<&str>) + 'static) -> &mut Self {
        self.listeners.on_hover(f);
        self
    }

    pub fn on_click(&mut self, f: impl FnMut(&str) + 'static) -> &mut Self {
        self.listeners.on_click(f);
        self
    }

    pub fn on_brush(&mut self, f: impl FnMut(Option<&[String]>) + 'static) -> &mut Self {
        self.listeners.on_brush(f);
        self
    }

    // ─── External control ───────────────────────────────────────────────────

    /// Signal that the underlying data changed; domains are recomputed on
    /// the next render pass.
    pub fn invalidate(&mut self) {
        self.data_changed = true;
        self.warned.clear();
    }

    /// Reflect a selection made in a linked view: matching model marks are
    /// styled as externally brushed, all others as externally non-brushed.
    /// None or an empty list clears both.
    pub fn handle_brush(&mut self, ids: Option<&[String]>) {
        self.ext_brushed = match ids {
            Some(ids) if !ids.is_empty() => Some(ids.iter().cloned().collect()),
            _ => None,
        };
    }

    /// Reflect a hover from a linked view: the matching mark is highlighted
    /// and raised. None clears it.
    pub fn handle_hover(&mut self, id: Option<&str>) {
        self.ext_hovered = id.map(str::to_owned);
    }

    // ─── Layout ─────────────────────────────────────────────────────────────

    /// Plot content size: configured dimensions minus margins.
    fn plot_size(&self) -> (f32, f32) {
        (
            self.vis_width - self.margin.left - self.margin.right,
            self.vis_height - self.margin.top - self.margin.bottom,
        )
    }

    fn configure_ranges(&mut self) {
        let (w, h) = self.plot_size();
        self.x_scale
            .set_range([self.axis_offset_x, w - self.axis_offset_x]);
        self.y_scale.set_range([h - self.axis_offset_y, 5.0]);
    }

    /// Reversed, niced extents of the active dataset under the current axis
    /// accessors. Rank metrics are "lower is better", so domains run
    /// max-to-min and worse values sit at the plot origin. An empty dataset
    /// leaves the domains untouched.
    fn recompute_domains(&mut self, data: &ModelSet) {
        let (xm, ym) = (self.x_mapping(), self.y_mapping());
        let (x_extent, y_extent) = match self.grouping.fixed_params() {
            None => (
                extent(data.models.iter().map(|m| xm.value(m))),
                extent(data.models.iter().map(|m| ym.value(m))),
            ),
            Some(n) => {
                let active = || data.groups.iter().filter(move |g| g.condition.len() == n);
                (
                    extent(active().map(|g| xm.value(g))),
                    extent(active().map(|g| ym.value(g))),
                )
            }
        };

        if let Some([min, max]) = x_extent {
            self.x_scale.set_domain([max, min]);
            self.x_scale.nice(TICK_COUNT);
        }
        if let Some([min, max]) = y_extent {
            self.y_scale.set_domain([max, min]);
            self.y_scale.nice(TICK_COUNT);
        }
    }

    /// Write pixel positions onto every record from the current scales.
    fn layout(&self, data: &mut ModelSet) {
        let (xm, ym) = (self.x_mapping(), self.y_mapping());
        for m in &mut data.models {
            m.x = self.x_scale.scale(xm.value(m));
            m.y = self.y_scale.scale(ym.value(m));
        }
        for g in &mut data.groups {
            g.x = self.x_scale.scale(xm.value(g));
            g.y = self.y_scale.scale(ym.value(g));
        }
    }

    fn update_layout(&mut self, data: &mut ModelSet) {
        self.configure_ranges();
        if self.data_changed {
            self.recompute_domains(data);
            self.warn_param_violations(data);
            self.data_changed = false;
        }
        self.layout(data);
    }

    /// A model carrying a parameter value outside the allowed levels breaks
    /// the data contract. Warn once per (model, parameter); the glyph
    /// renderer degrades to the unfilled max-radius sector.
    fn warn_param_violations(&mut self, data: &ModelSet) {
        for m in &data.models {
            for spec in &self.params {
                let value = m.param(spec.kind);
                if glyph::level_index(&spec.levels, value).is_none()
                    && self.warned.insert(format!("{}:{}", m.id, spec.kind.name()))
                {
                    eprintln!(
                        "model {}: {} value {} is not an allowed level",
                        m.id,
                        spec.kind.name(),
                        value
                    );
                }
            }
        }
    }

    /// Ids of models whose current pixel position lies inside the rectangle
    /// (inclusive on both axes), in data order.
    fn brushed_ids(&self, data: &ModelSet, rect: Rect) -> Vec<String> {
        data.models
            .iter()
            .filter(|m| {
                rect.min.x <= m.x && m.x <= rect.max.x && rect.min.y <= m.y && m.y <= rect.max.y
            })
            .map(|m| m.id.clone())
            .collect()
    }

    fn apply_brush(&mut self, data: &ModelSet, rect: Rect) {
        let ids = self.brushed_ids(data, rect);
        self.brushed = Some(ids.iter().cloned().collect());
        self.listeners.fire_brush(Some(&ids));
    }

    fn clear_brush(&mut self) {
        self.brush_rect = None;
        self.brushed = None;
        self.listeners.fire_brush(None);
    }

    /// Generated tooltip for a group mark: constituent model count, the
    /// fixed parameter/value pairs, and the averaged rank metrics.
    fn group_tooltip(&self, g: &Group) -> String {
        let count = crate::analysis::condition_model_count(&self.params, &g.condition);
        let cond = g
            .condition
            .iter()
            .map(|(k, v)| format!("{}={}", k.name(), format_level(*v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} models with {}\n  Average mean rank: {:.1}\n  Average best rank: {:.1}",
            count, cond, g.mean_rank, g.best_rank
        )
    }

    fn hit_test(&self, data: &ModelSet, p: Pos2) -> Option<MarkHit> {
        let hit_r = if self.show_glyphs {
            self.glyph_radius
        } else {
            self.dot_radius + 2.0
        };

        let mut best: Option<(f32, MarkHit)> = None;
        let mut consider = |x: f32, y: f32, hit: MarkHit| {
            let d = ((p.x - x).powi(2) + (p.y - y).powi(2)).sqrt();
            if d <= hit_r && best.as_ref().map_or(true, |(bd, _)| d < *bd) {
                best = Some((d, hit));
            }
        };

        match self.grouping.fixed_params() {
            None => {
                for m in &data.models {
                    consider(m.x, m.y, MarkHit::Model(m.id.clone()));
                }
            }
            Some(n) => {
                for g in data.groups.iter().filter(|g| g.condition.len() == n) {
                    consider(g.x, g.y, MarkHit::Group(g.id()));
                }
            }
        }
        best.map(|(_, h)| h)
    }

    fn model_fill(&self, id: &str) -> Color32 {
        if self.hovered.as_deref() == Some(id) || self.ext_hovered.as_deref() == Some(id) {
            return HOVER_FILL;
        }
        if let Some(brushed) = &self.brushed {
            return if brushed.contains(id) {
                BRUSHED_FILL
            } else {
                MUTED_FILL
            };
        }
        if let Some(ext) = &self.ext_brushed {
            return if ext.contains(id) {
                EXT_BRUSHED_FILL
            } else {
                MUTED_FILL
            };
        }
        MARK_FILL
    }

    fn group_fill(&self, id: &str) -> Color32 {
        if self.hovered.as_deref() == Some(id) || self.ext_hovered.as_deref() == Some(id) {
            HOVER_FILL
        } else {
            MARK_FILL
        }
    }

    // ─── Rendering ──────────────────────────────────────────────────────────

    /// Draw the view into the Ui and process its interactions. The caller
    /// passes the data each frame and may mutate it between frames (call
    /// [`invalidate`](Self::invalidate) after doing so).
    pub fn show(&mut self, ui: &mut Ui, data: &mut ModelSet) {
        self.settings_bar(ui);

        let (outer, response) =
            ui.allocate_exact_size(vec2(self.vis_width, self.vis_height), Sense::click_and_drag());
        if !ui.is_rect_visible(outer) {
            return;
        }

        self.update_layout(data);

        let origin = pos2(outer.min.x + self.margin.left, outer.min.y + self.margin.top);
        let (w, h) = self.plot_size();
        let plot_bounds = Rect::from_min_max(Pos2::ZERO, pos2(w, h));
        let local = |p: Pos2| pos2(p.x - origin.x, p.y - origin.y);
        let clamp = |p: Pos2| pos2(p.x.clamp(0.0, w), p.y.clamp(0.0, h));

        // The brush extent is the full plot rectangle; re-clamp the stored
        // region every pass so resizing keeps it in sync.
        if !self.brushing {
            if let Some(r) = self.brush_rect {
                let clamped = r.intersect(plot_bounds);
                if clamped != r {
                    self.brush_rect = clamped.is_positive().then_some(clamped);
                }
            }
        }

        // Brush gesture.
        if response.drag_started() {
            if let Some(p) = response.interact_pointer_pos().map(local) {
                if plot_bounds.contains(p) {
                    self.brushing = true;
                    self.brush_anchor = Some(p);
                    self.brush_rect = Some(Rect::from_min_max(p, p));
                }
            }
        }
        if self.brushing && response.dragged() {
            if let (Some(a), Some(p)) = (self.brush_anchor, response.interact_pointer_pos()) {
                let r = Rect::from_two_pos(a, clamp(local(p)));
                if Some(r) != self.brush_rect {
                    self.brush_rect = Some(r);
                    self.apply_brush(data, r);
                }
            }
        }
        if self.brushing && response.drag_stopped() {
            match self.brush_rect {
                Some(r) if r.width() > 0.0 && r.height() > 0.0 => self.apply_brush(data, r),
                _ => self.clear_brush(),
            }
            self.brushing = false;
            self.brush_anchor = None;
        }

        // Hover. Entering a mark is ignored mid-brush, but leaving the
        // hovered mark still clears and notifies.
        let hover_local = response.hover_pos().map(local);
        if self.brushing {
            if let Some(current) = self.hovered.clone() {
                let still_on = hover_local
                    .and_then(|p| self.hit_test(data, p))
                    .is_some_and(|hit| hit.id() == current);
                if !still_on {
                    self.hovered = None;
                    self.listeners.fire_hover(None);
                }
            }
        } else {
            let hit = hover_local.and_then(|p| self.hit_test(data, p));
            let new_id = hit.map(|h| h.id().to_owned());
            if new_id != self.hovered {
                self.hovered = new_id;
                let id = self.hovered.clone();
                self.listeners.fire_hover(id.as_deref());
            }
        }

        // Clicks: models notify, groups are inert, empty space clears the
        // brush selection.
        if response.clicked() {
            if let Some(p) = response.interact_pointer_pos().map(local) {
                match self.hit_test(data, p) {
                    Some(MarkHit::Model(id)) => self.listeners.fire_click(&id),
                    Some(MarkHit::Group(_)) => {}
                    None => {
                        if plot_bounds.contains(p)
                            && (self.brush_rect.is_some() || self.brushed.is_some())
                        {
                            self.clear_brush();
                        }
                    }
                }
            }
        }

        let painter = ui.painter_at(outer);
        self.draw_brush(&painter, origin);
        self.draw_marks(&painter, origin, data);
        self.draw_axes(ui, &painter, origin);
        self.draw_tooltip(&painter, origin, data);
    }

    fn settings_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.strong(self.title.clone());
            ui.separator();
            ui.label("Group");
            let before = self.grouping;
            egui::ComboBox::from_id_source(ui.id().with("grouping"))
                .selected_text(self.grouping.label())
                .show_ui(ui, |ui| {
                    for g in Grouping::all() {
                        ui.selectable_value(&mut self.grouping, g, g.label());
                    }
                });
            if self.grouping != before {
                self.data_changed = true;
            }
            if ui.checkbox(&mut self.show_glyphs, "Glyphs").changed() {
                self.data_changed = true;
            }
        });
    }

    fn draw_brush(&self, painter: &Painter, origin: Pos2) {
        if let Some(r) = self.brush_rect {
            let screen = Rect::from_min_max(
                pos2(origin.x + r.min.x, origin.y + r.min.y),
                pos2(origin.x + r.max.x, origin.y + r.max.y),
            );
            painter.rect_filled(screen, 0.0, BRUSH_AREA);
            painter.rect_stroke(screen, 0.0, Stroke::new(1.0, BRUSH_BORDER));
        }
    }

    fn draw_marks(&self, painter: &Painter, origin: Pos2, data: &ModelSet) {
        let at = |x: f32, y: f32| pos2(origin.x + x, origin.y + y);
        let raised = |id: &str| {
            self.hovered.as_deref() == Some(id) || self.ext_hovered.as_deref() == Some(id)
        };

        match self.grouping.fixed_params() {
            None => {
                // Hovered marks draw last so they sit on top.
                for m in data.models.iter().filter(|m| !raised(&m.id)) {
                    self.draw_model_mark(painter, at(m.x, m.y), m);
                }
                for m in data.models.iter().filter(|m| raised(&m.id)) {
                    self.draw_model_mark(painter, at(m.x, m.y), m);
                }
            }
            Some(n) => {
                let active: Vec<&Group> = data
                    .groups
                    .iter()
                    .filter(|g| g.condition.len() == n)
                    .collect();
                for g in active.iter().filter(|g| !raised(&g.id())) {
                    self.draw_group_mark(painter, at(g.x, g.y), g);
                }
                for g in active.iter().filter(|g| raised(&g.id())) {
                    self.draw_group_mark(painter, at(g.x, g.y), g);
                }
            }
        }
    }

    fn draw_model_mark(&self, painter: &Painter, center: Pos2, m: &Model) {
        let fill = self.model_fill(&m.id);
        if !self.show_glyphs {
            painter.circle(center, self.dot_radius, fill, Stroke::new(1.0, MARK_OUTLINE));
            return;
        }
        let n = self.params.len();
        for (i, spec) in self.params.iter().enumerate() {
            let idx = glyph::level_index(&spec.levels, m.param(spec.kind));
            self.draw_sector(painter, center, i, n, spec, idx, fill);
        }
    }

    fn draw_group_mark(&self, painter: &Painter, center: Pos2, g: &Group) {
        let fill = self.group_fill(&g.id());
        if !self.show_glyphs {
            painter.circle(center, self.dot_radius, fill, Stroke::new(1.0, MARK_OUTLINE));
            return;
        }
        let n = self.params.len();
        for (i, spec) in self.params.iter().enumerate() {
            let idx = g
                .condition
                .iter()
                .find(|(k, _)| *k == spec.kind)
                .and_then(|(_, v)| glyph::level_index(&spec.levels, *v));
            self.draw_sector(painter, center, i, n, spec, idx, fill);
        }
    }

    /// One glyph sector. A missing level index means the parameter is not
    /// fixed for this record: the sector draws at maximum radius, unfilled,
    /// to distinguish "spans all levels" from "fixed at the top level".
    fn draw_sector(
        &self,
        painter: &Painter,
        center: Pos2,
        i: usize,
        n: usize,
        spec: &ParamSpec,
        idx: Option<usize>,
        fill: Color32,
    ) {
        let empty = idx.is_none();
        let idx = idx.unwrap_or(spec.levels.len().saturating_sub(1));
        let radius = glyph::sector_radius(self.glyph_radius, spec.levels.len(), idx);
        let (a0, a1) = glyph::sector_angles(i, n);
        let path = glyph::sector_path(center, radius, a0, a1);
        if empty {
            painter.add(Shape::convex_polygon(
                path,
                Color32::TRANSPARENT,
                Stroke::new(1.0, fill),
            ));
        } else {
            painter.add(Shape::convex_polygon(path, fill, Stroke::new(1.0, MARK_OUTLINE)));
        }
    }

    fn draw_axes(&mut self, ui: &Ui, painter: &Painter, origin: Pos2) {
        let at = |x: f32, y: f32| pos2(origin.x + x, origin.y + y);
        let axis_stroke = Stroke::new(1.0, AXIS_COLOR);
        let tick_font = FontId::proportional(10.0);
        let label_font = FontId::proportional(12.0);
        let (_, h) = self.plot_size();
        let baseline = h - self.axis_offset_y;

        let [xr0, xr1] = self.x_scale.range();
        painter.line_segment([at(xr0, baseline), at(xr1, baseline)], axis_stroke);
        for t in self.x_scale.ticks(TICK_COUNT) {
            let x = self.x_scale.scale(t);
            painter.line_segment([at(x, baseline), at(x, baseline + 4.0)], axis_stroke);
            painter.text(
                at(x, baseline + 5.0),
                Align2::CENTER_TOP,
                tick_label(t),
                tick_font.clone(),
                TICK_TEXT,
            );
        }

        let [yr0, yr1] = self.y_scale.range();
        painter.line_segment(
            [at(self.axis_offset_x, yr1), at(self.axis_offset_x, yr0)],
            axis_stroke,
        );
        for t in self.y_scale.ticks(TICK_COUNT) {
            let y = self.y_scale.scale(t);
            painter.line_segment(
                [at(self.axis_offset_x - 4.0, y), at(self.axis_offset_x, y)],
                axis_stroke,
            );
            painter.text(
                at(self.axis_offset_x - 6.0, y),
                Align2::RIGHT_CENTER,
                tick_label(t),
                tick_font.clone(),
                TICK_TEXT,
            );
        }

        // Axis labels double as buttons cycling the mapped metric.
        let x_galley = painter.layout_no_wrap(
            self.x_mapping().label().to_owned(),
            label_font.clone(),
            Color32::PLACEHOLDER,
        );
        let x_pos = at(xr1 - x_galley.size().x, baseline - 5.0 - x_galley.size().y);
        let x_rect = Rect::from_min_size(x_pos, x_galley.size());
        let x_resp = ui
            .interact(x_rect.expand(2.0), ui.id().with("x-axis-label"), Sense::click())
            .on_hover_cursor(CursorIcon::PointingHand);
        let x_color = if x_resp.hovered() { LABEL_HOVER } else { LABEL_COLOR };
        painter.galley(x_pos, x_galley, x_color);
        if x_resp.clicked() {
            self.cycle_x_mapping();
        }

        let y_galley = painter.layout_no_wrap(
            self.y_mapping().label().to_owned(),
            label_font,
            Color32::PLACEHOLDER,
        );
        let y_size = y_galley.size();
        // Rotated a quarter turn counter-clockwise: text runs upward from
        // its anchor, alongside the top of the y axis.
        let y_pos = at(self.axis_offset_x + 5.0, yr1 + y_size.x);
        let y_rect = Rect::from_min_max(
            pos2(y_pos.x, y_pos.y - y_size.x),
            pos2(y_pos.x + y_size.y, y_pos.y),
        );
        let y_resp = ui
            .interact(y_rect.expand(2.0), ui.id().with("y-axis-label"), Sense::click())
            .on_hover_cursor(CursorIcon::PointingHand);
        let y_color = if y_resp.hovered() { LABEL_HOVER } else { LABEL_COLOR };
        let mut text_shape = TextShape::new(y_pos, y_galley, y_color);
        text_shape.angle = -std::f32::consts::FRAC_PI_2;
        painter.add(text_shape);
        if y_resp.clicked() {
            self.cycle_y_mapping();
        }
    }

    fn draw_tooltip(&self, painter: &Painter, origin: Pos2, data: &ModelSet) {
        if self.brushing {
            return;
        }
        let Some(id) = self.hovered.as_deref() else {
            return;
        };

        let (pos, text) = match self.grouping.fixed_params() {
            None => match data.models.iter().find(|m| m.id == id) {
                Some(m) => (pos2(origin.x + m.x, origin.y + m.y), (self.tooltip_fn)(m)),
                None => return,
            },
            Some(n) => {
                match data
                    .groups
                    .iter()
                    .filter(|g| g.condition.len() == n)
                    .find(|g| g.id() == id)
                {
                    Some(g) => (pos2(origin.x + g.x, origin.y + g.y), self.group_tooltip(g)),
                    None => return,
                }
            }
        };

        let anchor = pos + vec2(self.glyph_radius + 8.0, -10.0);
        let galley = painter.layout_no_wrap(text, FontId::proportional(13.0), Color32::WHITE);
        let rect = Rect::from_min_size(anchor, galley.size() + vec2(8.0, 4.0));
        painter.rect_filled(rect.expand(4.0), 4.0, TOOLTIP_BG);
        painter.galley(anchor + vec2(4.0, 2.0), galley, Color32::WHITE);
    }
}

fn tick_label(v: f64) -> String {
    let mut s = format!("{:.6}", v);
    while s.contains('.') && (s.ends_with('0') || s.ends_with('.')) {
        s.pop();
    }
    if s == "-0" {
        s = "0".to_owned();
    }
    s
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Model, ModelSet, ParamKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_model(id: &str, mean_rank: f64, best_rank: f64) -> Model {
        Model {
            id: id.to_owned(),
            tooltip: format!("{id} tooltip"),
            coords: [mean_rank / 2.0, best_rank / 2.0],
            mean_rank,
            best_rank,
            alpha: 0.1,
            beta: 0.01,
            num_topics: 10.0,
            x: 0.0,
            y: 0.0,
        }
    }

    fn make_test_data() -> ModelSet {
        ModelSet {
            models: vec![
                test_model("m1", 1.0, 1.0),
                test_model("m2", 5.0, 3.0),
                test_model("m3", 10.0, 6.0),
            ],
            groups: vec![],
        }
    }

    #[test]
    fn test_layout_matches_scales() {
        let mut data = ModelSet::sample();
        let mut view = TopicModelView::new().with_grouping(Grouping::None);
        view.update_layout(&mut data);

        let (xm, ym) = (view.x_mapping(), view.y_mapping());
        for m in &data.models {
            assert_eq!(m.x, view.x_scale.scale(xm.value(m)));
            assert_eq!(m.y, view.y_scale.scale(ym.value(m)));
        }
        for g in &data.groups {
            assert_eq!(g.x, view.x_scale.scale(xm.value(g)));
            assert_eq!(g.y, view.y_scale.scale(ym.value(g)));
        }
    }

    #[test]
    fn test_domain_is_reversed_extent() {
        let mut data = make_test_data();
        let mut view = TopicModelView::new().with_grouping(Grouping::None);
        // x is mean rank by default; values [1, 5, 10] reverse to [10, 1],
        // already nice.
        view.update_layout(&mut data);
        assert_eq!(view.x_scale.domain(), [10.0, 1.0]);
    }

    #[test]
    fn test_lower_rank_plots_away_from_origin() {
        let mut data = ModelSet {
            models: vec![test_model("good", 2.0, 5.0), test_model("bad", 8.0, 5.0)],
            groups: vec![],
        };
        let mut view = TopicModelView::new().with_grouping(Grouping::None);
        view.update_layout(&mut data);

        // Reversed domains put worse ranks at the plot origin, so the
        // better (lower) mean rank lands at greater x.
        assert!(data.models[0].x > data.models[1].x);
    }

    #[test]
    fn test_grouping_filter_drives_domains() {
        let mut data = ModelSet::sample();
        let mut view = TopicModelView::new().with_grouping(Grouping::FixOne);
        view.update_layout(&mut data);

        let singles: Vec<&crate::Group> = data
            .groups
            .iter()
            .filter(|g| g.condition.len() == 1)
            .collect();
        assert_eq!(singles.len(), 12);

        let xm = view.x_mapping();
        let e = crate::scale::extent(singles.iter().map(|g| xm.value(*g))).unwrap();
        let mut expected = LinearScale::new();
        expected.set_domain([e[1], e[0]]);
        expected.nice(TICK_COUNT);
        assert_eq!(view.x_scale.domain(), expected.domain());
    }

    #[test]
    fn test_brush_containment_inclusive() {
        let mut data = make_test_data();
        let mut view = TopicModelView::new().with_grouping(Grouping::None);
        view.update_layout(&mut data);

        let (m1, m2) = (&data.models[0], &data.models[1]);
        let rect = Rect::from_min_max(
            pos2(m1.x.min(m2.x), m1.y.min(m2.y)),
            pos2(m1.x.max(m2.x), m1.y.max(m2.y)),
        );

        // Both corner models sit exactly on the bounds and are included.
        let ids = view.brushed_ids(&data, rect);
        assert!(ids.contains(&"m1".to_owned()));
        assert!(ids.contains(&"m2".to_owned()));
        assert!(!ids.contains(&"m3".to_owned()));
    }

    #[test]
    fn test_brush_broadcast_and_clear() {
        let mut data = make_test_data();
        let mut view = TopicModelView::new().with_grouping(Grouping::None);

        let events: Rc<RefCell<Vec<Option<usize>>>> = Rc::new(RefCell::new(vec![]));
        let e = Rc::clone(&events);
        view.on_brush(move |ids| e.borrow_mut().push(ids.map(|s| s.len())));

        view.update_layout(&mut data);
        let all = Rect::from_min_max(pos2(-1e6, -1e6), pos2(1e6, 1e6));
        view.apply_brush(&data, all);
        assert_eq!(view.brushed.as_ref().map(|s| s.len()), Some(3));

        view.clear_brush();
        assert!(view.brushed.is_none());
        assert!(view.brush_rect.is_none());
        assert_eq!(*events.borrow(), vec![Some(3), None]);
    }

    #[test]
    fn test_axis_cycling_wraps() {
        let mut view = TopicModelView::new();
        assert_eq!(view.x_mapping(), AxisMapping::MeanRank);

        view.data_changed = false;
        view.cycle_x_mapping();
        assert_eq!(view.x_mapping(), AxisMapping::BestRank);
        assert!(view.data_changed);

        view.cycle_x_mapping();
        assert_eq!(view.x_mapping(), AxisMapping::Dim1);

        let start = view.y_mapping();
        for _ in 0..AxisMapping::all().len() {
            view.cycle_y_mapping();
        }
        assert_eq!(view.y_mapping(), start);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let mut data = ModelSet::sample();
        let mut view = TopicModelView::new();
        view.update_layout(&mut data);
        let first: Vec<(f32, f32)> = data.models.iter().map(|m| (m.x, m.y)).collect();

        view.update_layout(&mut data);
        let second: Vec<(f32, f32)> = data.models.iter().map(|m| (m.x, m.y)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_group_tooltip_counts() {
        let view = TopicModelView::new();
        let single = crate::Group {
            condition: vec![(ParamKind::Alpha, 1.0)],
            coords: [0.0, 0.0],
            mean_rank: 3.46,
            best_rank: 1.24,
            x: 0.0,
            y: 0.0,
        };
        assert_eq!(
            view.group_tooltip(&single),
            "16 models with alpha=1\n  Average mean rank: 3.5\n  Average best rank: 1.2"
        );

        let double = crate::Group {
            condition: vec![(ParamKind::Alpha, 1.0), (ParamKind::Beta, 0.1)],
            coords: [0.0, 0.0],
            mean_rank: 7.0,
            best_rank: 2.0,
            x: 0.0,
            y: 0.0,
        };
        assert_eq!(
            view.group_tooltip(&double),
            "4 models with alpha=1, beta=0.1\n  Average mean rank: 7.0\n  Average best rank: 2.0"
        );
    }

    #[test]
    fn test_fill_precedence() {
        let mut view = TopicModelView::new();
        assert_eq!(view.model_fill("m1"), MARK_FILL);

        view.handle_brush(Some(&["m1".to_owned()]));
        assert_eq!(view.model_fill("m1"), EXT_BRUSHED_FILL);
        assert_eq!(view.model_fill("m2"), MUTED_FILL);

        view.brushed = Some(["m2".to_owned()].into_iter().collect());
        assert_eq!(view.model_fill("m2"), BRUSHED_FILL);
        assert_eq!(view.model_fill("m1"), MUTED_FILL);

        view.hovered = Some("m1".to_owned());
        assert_eq!(view.model_fill("m1"), HOVER_FILL);

        view.handle_brush(None);
        view.brushed = None;
        view.hovered = None;
        view.handle_hover(Some("m3"));
        assert_eq!(view.model_fill("m3"), HOVER_FILL);

        // An empty external selection clears, like None.
        view.handle_hover(None);
        let empty: Vec<String> = Vec::new();
        view.handle_brush(Some(&empty));
        assert_eq!(view.model_fill("m1"), MARK_FILL);
    }

    #[test]
    fn test_hit_test_radius() {
        let mut data = make_test_data();
        let mut view = TopicModelView::new().with_grouping(Grouping::None);
        view.update_layout(&mut data);

        let m = &data.models[1];
        let on = view.hit_test(&data, pos2(m.x + 2.0, m.y - 2.0));
        assert_eq!(on.map(|h| h.id().to_owned()), Some("m2".to_owned()));

        let off = view.hit_test(&data, pos2(m.x + 500.0, m.y));
        assert!(off.is_none());
    }

    #[test]
    fn test_hit_test_groups_by_derived_id() {
        let mut data = ModelSet::sample();
        let mut view = TopicModelView::new().with_grouping(Grouping::FixOne);
        view.update_layout(&mut data);

        let g = data
            .groups
            .iter()
            .find(|g| g.condition.len() == 1)
            .unwrap();
        let hit = view.hit_test(&data, pos2(g.x, g.y)).unwrap();
        match hit {
            MarkHit::Group(id) => assert!(id.contains('-')),
            MarkHit::Model(_) => panic!("expected a group hit"),
        }
    }

    #[test]
    fn test_empty_dataset_keeps_domains() {
        let mut data = ModelSet::default();
        let mut view = TopicModelView::new().with_grouping(Grouping::None);
        view.update_layout(&mut data);
        assert_eq!(view.x_scale.domain(), [0.0, 1.0]);
        assert!(view.brushed_ids(&data, Rect::EVERYTHING).is_empty());
    }

    #[test]
    fn test_invalidate_sets_dirty() {
        let mut data = make_test_data();
        let mut view = TopicModelView::new().with_grouping(Grouping::None);
        view.update_layout(&mut data);
        assert!(!view.data_changed);

        data.models.push(test_model("m4", 20.0, 12.0));
        view.invalidate();
        assert!(view.data_changed);
        view.update_layout(&mut data);
        assert_eq!(view.x_scale.domain(), [20.0, 0.0]);
    }

    #[test]
    fn test_tick_label_trims() {
        assert_eq!(tick_label(2.0), "2");
        assert_eq!(tick_label(0.3), "0.3");
        assert_eq!(tick_label(-4.0), "-4");
        assert_eq!(tick_label(0.25), "0.25");
        assert_eq!(tick_label(0.0), "0");
    }
}
