//! Listener registries for the view's notification channels.
//!
//! Each view instance owns one registry with three named channels (hover,
//! click, brush) and any number of listeners per channel. Hover and brush
//! carry None when the state clears (mouse leaves a mark, brush selection
//! emptied).

pub type HoverListener = Box<dyn FnMut(Option<&str>)>;
pub type ClickListener = Box<dyn FnMut(&str)>;
pub type BrushListener = Box<dyn FnMut(Option<&[String]>)>;

#[derive(Default)]
pub struct Listeners {
    hover: Vec<HoverListener>,
    click: Vec<ClickListener>,
    brush: Vec<BrushListener>,
}

impl Listeners {
    pub fn on_hover(&mut self, f: impl FnMut(Option<&str>) + 'static) {
        self.hover.push(Box::new(f));
    }

    pub fn on_click(&mut self, f: impl FnMut(&str) + 'static) {
        self.click.push(Box::new(f));
    }

    pub fn on_brush(&mut self, f: impl FnMut(Option<&[String]>) + 'static) {
        self.brush.push(Box::new(f));
    }

    pub fn fire_hover(&mut self, id: Option<&str>) {
        for f in &mut self.hover {
            f(id);
        }
    }

    pub fn fire_click(&mut self, id: &str) {
        for f in &mut self.click {
            f(id);
        }
    }

    pub fn fire_brush(&mut self, ids: Option<&[String]>) {
        for f in &mut self.brush {
            f(ids);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
