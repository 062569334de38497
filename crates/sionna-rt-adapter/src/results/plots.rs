//! Plotly-style plot descriptions
//!
//! Every builder returns a JSON document with `id`, `title`, `data` and
//! `layout` that the host hands to its plot widget unchanged.

use std::path::Path;

use serde_json::{json, Value};

pub const HISTOGRAM_EDGES: usize = 20;

fn legend() -> Value {
    json!({
        "x": 0.98,
        "xanchor": "right",
        "y": 0.98,
        "yanchor": "top",
        "borderwidth": 1,
        "bgcolor": "rgba(180,180,180,0.2)"
    })
}

fn axes_layout(title: &str, x_title: &str, y_title: &str) -> Value {
    json!({
        "title": {"text": title},
        "xaxis": {"title": x_title},
        "yaxis": {"title": y_title},
        "annotations": [],
        "margin": {}
    })
}

fn index_labels(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{:.1}", i as f64)).collect()
}

/// Rendered scene, referenced by path
pub fn image(path: &Path, title: &str) -> Value {
    json!({
        "id": "1",
        "title": title,
        "data": [{
            "name": title,
            "type": "image",
            "source": path.to_string_lossy(),
            "showlegend": false,
            "visible": true
        }],
        "layout": {
            "title": {"text": title},
            "xaxis": {"visible": false},
            "yaxis": {"visible": false},
            "annotations": [],
            "margin": {},
            "legend": legend()
        }
    })
}

/// One radio-map metric over the cell grid; `rows` is indexed `[y][x]`
pub fn heatmap(rows: &[&[f64]], title: &str, name: &str) -> Value {
    let columns = rows.first().map_or(0, |row| row.len());
    json!({
        "id": "5",
        "title": title,
        "data": [{
            "type": "heatmap",
            "z": rows,
            "x": index_labels(columns),
            "y": index_labels(rows.len()),
            "colorscale": "Viridis",
            "showscale": true,
            "name": name
        }],
        "layout": axes_layout(title, "Cell index (X Axis)", "Cell index (Y Axis)")
    })
}

pub fn line(y: &[f64], x_title: &str, y_title: &str, title: &str) -> Value {
    let mut layout = axes_layout(title, x_title, y_title);
    layout["legend"] = legend();
    json!({
        "id": "1",
        "title": title,
        "data": [{
            "name": "Line Trace",
            "type": "scattergl",
            "showlegend": true,
            "visible": true,
            "text": "",
            "textposition": "",
            "x": index_labels(y.len()),
            "y": y,
            "line": {"color": "rgb(57,231,95)", "dash": "0"},
            "mode": "lines"
        }],
        "layout": layout
    })
}

/// Axis titles and trace name of a marker plot
#[derive(Debug, Clone, Copy)]
pub struct ScatterLabels<'a> {
    pub title: &'a str,
    pub name: &'a str,
    pub x_title: &'a str,
    pub y_title: &'a str,
}

impl Default for ScatterLabels<'_> {
    fn default() -> Self {
        Self {
            title: "Discrete Channel Taps",
            name: "Tap Amplitude",
            x_title: "Tap index",
            y_title: "Tap amplitude",
        }
    }
}

/// Markers at `x` (or at the element index) with magnitudes `y`
pub fn scatter(y: &[f64], x: Option<&[f64]>, labels: ScatterLabels<'_>) -> Value {
    let x: Vec<f64> = match x {
        Some(x) => x.to_vec(),
        None => (0..y.len()).map(|i| i as f64).collect(),
    };
    let y: Vec<f64> = y.iter().map(|v| v.abs()).collect();
    json!({
        "id": "7",
        "title": labels.title,
        "data": [{
            "type": "scatter",
            "mode": "markers",
            "x": x,
            "y": y,
            "name": labels.name
        }],
        "layout": axes_layout(labels.title, labels.x_title, labels.y_title)
    })
}

/// Weighted histogram over `HISTOGRAM_EDGES` evenly spaced edges spanning
/// the data; the last bin is closed
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<f64>,
}

impl Histogram {
    pub fn weighted(values: &[f64], weights: &[f64]) -> Self {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (mut low, mut high) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if low > high {
            (low, high) = (0.0, 1.0);
        } else if low == high {
            (low, high) = (low - 0.5, high + 0.5);
        }

        let bins = HISTOGRAM_EDGES - 1;
        let step = (high - low) / bins as f64;
        let edges: Vec<f64> = (0..HISTOGRAM_EDGES)
            .map(|i| if i == bins { high } else { low + step * i as f64 })
            .collect();

        let mut counts = vec![0.0; bins];
        for (&value, &weight) in values.iter().zip(weights) {
            if !value.is_finite() {
                continue;
            }
            let bin = (((value - low) / step) as usize).min(bins - 1);
            counts[bin] += weight;
        }
        Self { edges, counts }
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    pub fn widths(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

pub fn cir_histogram(histogram: &Histogram) -> Value {
    let title = "Binned Channel Impulse Response";
    let labels: Vec<String> = histogram.centers().iter().map(|c| format!("{:.2e}", c)).collect();
    json!({
        "id": "6",
        "title": title,
        "data": [{
            "type": "bar",
            "x": labels,
            "y": histogram.counts,
            "width": histogram.widths(),
            "name": "Sum of |a|"
        }],
        "layout": axes_layout(title, "Delay [ns]", "Sum of |a| in bin")
    })
}
