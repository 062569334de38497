//! The solver's `summary.json`

use std::path::PathBuf;

use serde::Deserialize;

use super::tensor::{Complex, NdArray};

#[derive(Debug, Clone, Deserialize)]
pub struct RadioMapSummary {
    /// `[num_tx, cells_y, cells_x]`
    pub path_gain: NdArray<f64>,
    pub rss: NdArray<f64>,
    pub sinr: NdArray<f64>,
    /// Sampled receiver positions, `[num_tx, num_positions, 3]`
    #[serde(default)]
    pub positions: Option<NdArray<f64>>,
    #[serde(default)]
    pub cell_ids: Option<NdArray<i64>>,
    pub image: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathSummary {
    /// `[num_rx, num_rx_ant, num_tx, num_tx_ant, num_paths, num_time_steps]`
    pub a: NdArray<Complex>,
    /// Delays in ns, `[num_rx, num_rx_ant, num_tx, num_tx_ant, num_paths]`
    /// or `[num_rx, num_tx, num_paths]` for synthetic arrays
    pub tau: NdArray<f64>,
    /// `[num_rx, num_rx_ant, num_tx, num_tx_ant, num_time_steps, num_subcarriers]`
    pub h_freq: NdArray<Complex>,
    /// `[num_rx, num_rx_ant, num_tx, num_tx_ant, num_time_steps, num_taps]`
    pub taps: NdArray<Complex>,
    pub image: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Summary {
    RadioMap(RadioMapSummary),
    Path(PathSummary),
}

impl Summary {
    pub fn kind(&self) -> &'static str {
        match self {
            Summary::RadioMap(_) => "RadioMap",
            Summary::Path(_) => "Path",
        }
    }

    pub fn image(&self) -> &PathBuf {
        match self {
            Summary::RadioMap(summary) => &summary.image,
            Summary::Path(summary) => &summary.image,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Summary::RadioMap(_) => "RadioMap solver results",
            Summary::Path(_) => "Paths solver results",
        }
    }

    pub fn plot_kinds(&self) -> &'static [PlotKind] {
        match self {
            Summary::RadioMap(_) => {
                &[PlotKind::Sinr, PlotKind::PathGain, PlotKind::Rss, PlotKind::Image]
            }
            Summary::Path(_) => &[
                PlotKind::FrequencyResponse,
                PlotKind::CirHistogram,
                PlotKind::Cir,
                PlotKind::Taps,
                PlotKind::Image,
            ],
        }
    }

    /// Index selectors, sized from the result arrays
    pub fn selectors(&self) -> Vec<Selector> {
        match self {
            Summary::RadioMap(summary) => {
                vec![Selector::new("ind", "Select transmitter", "Transmitter", summary.sinr.dim(0))]
            }
            Summary::Path(summary) => {
                let h = &summary.h_freq;
                vec![
                    Selector::new("ind", "Select receiver", "Receiver", h.dim(0)),
                    Selector::new("ind2", "Select rx_ant", "RX_ant", h.dim(1)),
                    Selector::new("ind3", "Select transmitter", "Transmitter", h.dim(2)),
                    Selector::new("ind4", "Select tx_ant", "TX_ant", h.dim(3)),
                    Selector::new("ind5", "Select time step", "Timestep", h.dim(4)),
                ]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Sinr,
    PathGain,
    Rss,
    Image,
    FrequencyResponse,
    CirHistogram,
    Cir,
    Taps,
}

impl PlotKind {
    pub fn label(self) -> &'static str {
        match self {
            PlotKind::Sinr => "SINR",
            PlotKind::PathGain => "Path gain",
            PlotKind::Rss => "RSS",
            PlotKind::Image => "Image",
            PlotKind::FrequencyResponse => "Channel frequency response",
            PlotKind::CirHistogram => "Channel Impulse response (histogram)",
            PlotKind::Cir => "Channel Impulse response",
            PlotKind::Taps => "Discrete channel taps",
        }
    }
}

/// An index control offered to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub name: &'static str,
    pub description: &'static str,
    pub options: Vec<String>,
}

impl Selector {
    fn new(name: &'static str, description: &'static str, label: &str, count: usize) -> Self {
        Self {
            name,
            description,
            options: (0..count).map(|i| format!("{} {}", label, i)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_radio_map_selectors() {
        let summary: Summary = serde_json::from_value(json!({
            "type": "RadioMap",
            "path_gain": [[[0.1, 0.2]], [[0.3, 0.4]]],
            "rss": [[[1, 2]], [[3, 4]]],
            "sinr": [[[5, null]], [[7, 8]]],
            "image": "/out/render_file.png"
        }))
        .unwrap();
        assert_eq!(summary.kind(), "RadioMap");
        let selectors = summary.selectors();
        assert_eq!(selectors.len(), 1);
        assert_eq!(selectors[0].options, vec!["Transmitter 0", "Transmitter 1"]);
        assert_eq!(summary.plot_kinds().len(), 4);
    }

    #[test]
    fn test_path_selectors_follow_array_layout() {
        let c = json!({"real": 1.0, "imag": 0.0});
        // [rx=2, rx_ant=1, tx=3, tx_ant=1, time=1, subcarriers=2]
        let h_freq = json!([[[[[[c, c]]], [[[c, c]]], [[[c, c]]]]], [[[[[c, c]]], [[[c, c]]], [[[c, c]]]]]]);
        let summary: Summary = serde_json::from_value(json!({
            "type": "Path",
            "a": [[[[[[c]]]]]],
            "tau": [[[[[0.5]]]]],
            "h_freq": h_freq,
            "taps": [[[[[[c]]]]]],
            "image": "render_file.png"
        }))
        .unwrap();

        let counts: Vec<(&str, usize)> = summary
            .selectors()
            .iter()
            .map(|s| (s.description, s.options.len()))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("Select receiver", 2),
                ("Select rx_ant", 1),
                ("Select transmitter", 3),
                ("Select tx_ant", 1),
                ("Select time step", 1),
            ]
        );
        assert_eq!(summary.plot_kinds()[1].label(), "Channel Impulse response (histogram)");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<Summary, _> = serde_json::from_value(json!({"type": "Mesh"}));
        assert!(result.is_err());
    }
}
