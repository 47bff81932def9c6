use scorecard_core::series::ChartLayout;

const MARKER_RADIUS: f64 = 2.0;

/// Inline SVG for a mini line chart: rounded frame, a connecting line when
/// there are at least two points, and one marker per point.
pub fn render_mini_line_chart(layout: &ChartLayout) -> String {
    let mut svg = format!(
        r##"<svg class="mini-chart" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img">"##,
        w = layout.width,
        h = layout.height,
    );
    svg.push_str(&format!(
        r##"<rect x="0" y="0" width="{}" height="{}" rx="8" fill="#ffffff" stroke="#d1d5db"/>"##,
        layout.width, layout.height
    ));

    if let Some(d) = layout.path() {
        svg.push_str(&format!(
            r##"<path d="{}" fill="none" stroke="#1f2937" stroke-width="2"/>"##,
            d
        ));
    }

    for p in &layout.points {
        svg.push_str(&format!(
            r##"<circle cx="{}" cy="{}" r="{}" fill="#1f2937"/>"##,
            p.x, p.y, MARKER_RADIUS
        ));
    }

    svg.push_str("</svg>");
    svg
}
