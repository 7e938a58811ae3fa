//! Network diagram: cosmetic layer plan, synthetic activity, SVG rendering.

pub mod activity;
pub mod diagram;
pub mod topology;

pub use activity::{idle, synthesize, LayerActivity};
pub use diagram::{render_svg, Canvas};
pub use topology::{plan_layers, LayerSpec};
