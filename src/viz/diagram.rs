use std::fmt::Write;

use crate::viz::activity::LayerActivity;
use crate::viz::topology::LayerSpec;

/// Drawing area of the diagram in SVG user units.
#[derive(Debug, Clone, Copy)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas { width: 640.0, height: 360.0, margin: 28.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub x: f32,
    pub y: f32,
    pub activity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: (usize, usize),
    pub to: (usize, usize),
    pub opacity: f32,
}

/// Edges leaving each node towards a layer of `next` nodes.
pub fn fan_out(next: usize) -> usize {
    (next / 4).max(2)
}

/// Targets of node `from` in a layer of `next` nodes: `(from*3 + k*2) mod next`,
/// duplicates dropped.
pub fn edge_targets(from: usize, next: usize) -> Vec<usize> {
    if next == 0 {
        return Vec::new();
    }
    let mut out: Vec<usize> = Vec::with_capacity(fan_out(next));
    for k in 0..fan_out(next) {
        let t = (from * 3 + k * 2) % next;
        if !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

/// Node positions: columns evenly spaced across the width, nodes evenly
/// spaced down each column.
pub fn layout(layers: &[LayerSpec], activity: &LayerActivity, canvas: Canvas) -> Vec<Vec<Node>> {
    let inner_w = canvas.width - 2.0 * canvas.margin;
    let inner_h = canvas.height - 2.0 * canvas.margin;
    let col_step = if layers.len() > 1 { inner_w / (layers.len() - 1) as f32 } else { 0.0 };
    layers
        .iter()
        .enumerate()
        .map(|(li, spec)| {
            let x = canvas.margin + col_step * li as f32;
            let row_step = inner_h / spec.nodes.max(1) as f32;
            (0..spec.nodes)
                .map(|ni| Node {
                    x,
                    y: canvas.margin + row_step * (ni as f32 + 0.5),
                    activity: activity.layers.get(li).and_then(|a| a.get(ni)).cloned().unwrap_or(0.0),
                })
                .collect()
        })
        .collect()
}

/// Bounded fan-out edges between consecutive columns, opacity from the mean
/// endpoint activity.
pub fn edges(nodes: &[Vec<Node>]) -> Vec<Edge> {
    let mut out = Vec::new();
    for (li, pair) in nodes.windows(2).enumerate() {
        let (from_col, to_col) = (&pair[0], &pair[1]);
        for (fi, from) in from_col.iter().enumerate() {
            for ti in edge_targets(fi, to_col.len()) {
                let mean = (from.activity + to_col[ti].activity) / 2.0;
                out.push(Edge {
                    from: (li, fi),
                    to: (li + 1, ti),
                    opacity: (0.06 + 0.8 * mean).clamp(0.0, 1.0),
                });
            }
        }
    }
    out
}

/// Renders the whole diagram as a standalone SVG element.
pub fn render_svg(layers: &[LayerSpec], activity: &LayerActivity, canvas: Canvas) -> String {
    let nodes = layout(layers, activity, canvas);
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" class="net-diagram">"#,
        w = canvas.width,
        h = canvas.height
    );

    svg.push_str(r##"<g class="edges" stroke="#4a6cf7" stroke-width="1">"##);
    for e in edges(&nodes) {
        let (a, b) = (nodes[e.from.0][e.from.1], nodes[e.to.0][e.to.1]);
        let _ = write!(
            svg,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke-opacity="{:.3}"/>"#,
            a.x, a.y, b.x, b.y, e.opacity
        );
    }
    svg.push_str("</g>");

    for (li, col) in nodes.iter().enumerate() {
        let r = node_radius(col.len(), canvas);
        let _ = write!(svg, r#"<g class="layer" data-layer="{}">"#, li);
        for n in col {
            let _ = write!(
                svg,
                r##"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="#4a6cf7" fill-opacity="{:.3}" stroke="#2b3a67" stroke-width="0.8"/>"##,
                n.x, n.y, r, 0.12 + 0.88 * n.activity.clamp(0.0, 1.0)
            );
        }
        if let (Some(spec), Some(first)) = (layers.get(li), col.first()) {
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11">{} ({})</text>"#,
                first.x,
                canvas.height - 6.0,
                spec.name,
                spec.nodes
            );
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

fn node_radius(count: usize, canvas: Canvas) -> f32 {
    let spacing = (canvas.height - 2.0 * canvas.margin) / count.max(1) as f32;
    (spacing * 0.38).clamp(2.0, 9.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::activity::idle;
    use crate::viz::topology::plan_layers;

    #[test]
    fn targets_follow_the_stride_pattern() {
        // next = 16 → fan-out 4: (5*3 + 0, 2, 4, 6) mod 16
        assert_eq!(edge_targets(5, 16), vec![15, 1, 3, 5]);
        // small layers still get two edges
        assert_eq!(fan_out(3), 2);
        assert_eq!(edge_targets(1, 3), vec![0, 2]);
        // collisions collapse
        assert_eq!(edge_targets(0, 2), vec![0]);
        assert!(edge_targets(0, 0).is_empty());
    }

    #[test]
    fn layout_spreads_columns_and_rows() {
        let layers = vec![LayerSpec::new("Input", 4), LayerSpec::new("Output", 2)];
        let act = idle(&layers);
        let canvas = Canvas { width: 200.0, height: 100.0, margin: 10.0 };
        let nodes = layout(&layers, &act, canvas);
        assert_eq!(nodes[0][0].x, 10.0);
        assert_eq!(nodes[1][0].x, 190.0);
        assert_eq!(nodes[0][0].y, 10.0 + 10.0);
        assert_eq!(nodes[1][1].y, 10.0 + 60.0);
    }

    #[test]
    fn edge_opacity_tracks_endpoint_activity() {
        let layers = vec![LayerSpec::new("a", 2), LayerSpec::new("b", 2)];
        let quiet = LayerActivity { layers: vec![vec![0.0; 2], vec![0.0; 2]] };
        let busy = LayerActivity { layers: vec![vec![1.0; 2], vec![1.0; 2]] };
        let c = Canvas::default();
        let q = edges(&layout(&layers, &quiet, c));
        let b = edges(&layout(&layers, &busy, c));
        assert_eq!(q.len(), b.len());
        assert!(q.iter().zip(&b).all(|(q, b)| q.opacity < b.opacity));
    }

    #[test]
    fn svg_contains_every_node() {
        let layers = plan_layers(None, None, 10);
        let svg = render_svg(&layers, &idle(&layers), Canvas::default());
        let total: usize = layers.iter().map(|l| l.nodes).sum();
        assert_eq!(svg.matches("<circle").count(), total);
        assert!(svg.starts_with("<svg") && svg.ends_with("</svg>"));
        assert!(svg.contains("Hidden (16)"));
    }
}
