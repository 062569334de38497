//! Read a finished run and build plot descriptions from it

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use super::plots::{self, Histogram, ScatterLabels};
use super::summary::{PathSummary, PlotKind, RadioMapSummary, Selector, Summary};
use super::tensor::{Complex, NdArray};
use crate::api::SimulationInput;
use crate::driver::SUMMARY_FILE;
use crate::error::{Error, Result};
use crate::{INPUT_FILE_NAME, INPUT_FILES_DIR, OUTPUT_FILES_DIR};

#[derive(Debug)]
pub struct ResultExtractor {
    results_dir: PathBuf,
    summary: Summary,
}

impl ResultExtractor {
    /// Load `output_files/summary.json` below `results_dir`
    pub fn open(results_dir: &Path) -> Result<Self> {
        if !results_dir.is_dir() {
            return Err(Error::MissingResource {
                what: "results directory",
                path: results_dir.to_path_buf(),
            });
        }
        let summary_path = results_dir.join(OUTPUT_FILES_DIR).join(SUMMARY_FILE);
        if !summary_path.is_file() {
            return Err(Error::MissingResource {
                what: "summary file",
                path: summary_path,
            });
        }

        let json = fs::read_to_string(&summary_path)?;
        let summary: Summary = serde_json::from_str(&json)
            .map_err(|err| Error::InvalidSummary(format!("{:?}: {}", summary_path, err)))?;
        info!("Loaded {} results from {:?}", summary.kind(), summary_path);

        Ok(Self {
            results_dir: results_dir.to_path_buf(),
            summary,
        })
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// The simulation input the results were computed from
    pub fn input_simulation(&self) -> Result<SimulationInput> {
        let path = self.results_dir.join(INPUT_FILES_DIR).join(INPUT_FILE_NAME);
        if !path.is_file() {
            return Err(Error::MissingResource {
                what: "input file",
                path,
            });
        }
        SimulationInput::load(&path)
    }

    pub fn selectors(&self) -> Vec<Selector> {
        self.summary.selectors()
    }

    pub fn plot_kinds(&self) -> &'static [PlotKind] {
        self.summary.plot_kinds()
    }

    /// Build the plot `kind` for the selector values in `selection`, one
    /// index per selector
    pub fn plot(&self, kind: PlotKind, selection: &[usize]) -> Result<Value> {
        if !self.plot_kinds().contains(&kind) {
            return Err(Error::InvalidSummary(format!(
                "{} plots are not available for {} results",
                kind.label(),
                self.summary.kind()
            )));
        }
        debug!("Building {} plot for {:?}", kind.label(), selection);

        if kind == PlotKind::Image {
            return Ok(plots::image(self.summary.image(), "Rendered scene"));
        }
        match &self.summary {
            Summary::RadioMap(summary) => radio_map_plot(summary, kind, selection),
            Summary::Path(summary) => path_plot(summary, kind, selection),
        }
    }
}

fn out_of_range(selection: &[usize]) -> Error {
    Error::InvalidSummary(format!("selection {:?} is out of range", selection))
}

fn radio_map_plot(summary: &RadioMapSummary, kind: PlotKind, selection: &[usize]) -> Result<Value> {
    let (metric, title, name) = match kind {
        PlotKind::Sinr => (
            &summary.sinr,
            "SINR",
            "Signal-to-interference-plus-noise ratio [dB]",
        ),
        PlotKind::PathGain => (&summary.path_gain, "Path gain", "Path_gain [dB]"),
        _ => (&summary.rss, "RSS", "Received signal strength(RSS) [dBm]"),
    };
    let transmitter = selection.first().copied().unwrap_or(0);
    let grid = metric
        .block(&[transmitter])
        .ok_or_else(|| out_of_range(selection))?;
    let columns = metric.dim(2).max(1);
    let rows: Vec<&[f64]> = grid.chunks(columns).collect();
    Ok(plots::heatmap(&rows, title, name))
}

/// `[rx, rx_ant, tx, tx_ant, time]`, missing trailing indices default to 0
fn path_selection(selection: &[usize]) -> [usize; 5] {
    let mut indices = [0; 5];
    for (slot, &index) in indices.iter_mut().zip(selection) {
        *slot = index;
    }
    indices
}

/// Path amplitudes of one link at one time step
fn amplitudes(a: &NdArray<Complex>, link: [usize; 5]) -> Option<Vec<f64>> {
    let [rx, rx_ant, tx, tx_ant, time] = link;
    (0..a.dim(4))
        .map(|path| a.get(&[rx, rx_ant, tx, tx_ant, path, time]).map(Complex::norm))
        .collect()
}

/// Path delays of one link; synthetic arrays drop the antenna axes
fn delays(tau: &NdArray<f64>, link: [usize; 5]) -> Option<&[f64]> {
    let [rx, rx_ant, tx, tx_ant, _] = link;
    if tau.ndim() == 3 {
        tau.block(&[rx, tx])
    } else {
        tau.block(&[rx, rx_ant, tx, tx_ant])
    }
}

fn path_plot(summary: &PathSummary, kind: PlotKind, selection: &[usize]) -> Result<Value> {
    let link = path_selection(selection);
    let missing = || out_of_range(selection);

    match kind {
        PlotKind::FrequencyResponse => {
            let response: Vec<f64> = summary
                .h_freq
                .block(&link)
                .ok_or_else(missing)?
                .iter()
                .map(Complex::norm)
                .collect();
            Ok(plots::line(
                &response,
                "Subcarrier index",
                "|h_freq|",
                "Channel frequency response",
            ))
        }
        PlotKind::Taps => {
            let taps: Vec<f64> = summary
                .taps
                .block(&link)
                .ok_or_else(missing)?
                .iter()
                .map(Complex::norm)
                .collect();
            Ok(plots::scatter(&taps, None, ScatterLabels::default()))
        }
        PlotKind::CirHistogram => {
            let weights = amplitudes(&summary.a, link).ok_or_else(missing)?;
            let tau = delays(&summary.tau, link).ok_or_else(missing)?;
            Ok(plots::cir_histogram(&Histogram::weighted(tau, &weights)))
        }
        _ => {
            let magnitudes = amplitudes(&summary.a, link).ok_or_else(missing)?;
            let tau = delays(&summary.tau, link).ok_or_else(missing)?;
            let labels = ScatterLabels {
                title: "Channel Impulse response",
                name: "tau vs a",
                x_title: "Tau [ns]",
                y_title: "|a|",
            };
            Ok(plots::scatter(&magnitudes, Some(tau), labels))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn write_summary(results: &Path, summary: Value) {
        let dir = results.join(OUTPUT_FILES_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SUMMARY_FILE), summary.to_string()).unwrap();
    }

    fn c(real: f64, imag: f64) -> Value {
        json!({"real": real, "imag": imag})
    }

    /// One receiver, one transmitter, single antennas, two paths and two
    /// time steps
    fn path_summary() -> Value {
        json!({
            "type": "Path",
            "a": [[[[[[c(3.0, 4.0), c(1.0, 0.0)], [c(0.0, 2.0), c(0.0, 0.0)]]]]]],
            "tau": [[[[[10.0, 30.0]]]]],
            "h_freq": [[[[[[c(1.0, 0.0), c(0.0, -2.0), c(0.0, 1.0)]]]]]],
            "taps": [[[[[[c(0.0, 1.0), c(-3.0, 0.0)]]]]]],
            "image": "/results/output_files/render_file.png"
        })
    }

    #[test]
    fn test_missing_results() {
        let results = tempfile::tempdir().unwrap();
        assert!(matches!(
            ResultExtractor::open(&results.path().join("nope")),
            Err(Error::MissingResource { what: "results directory", .. })
        ));
        assert!(matches!(
            ResultExtractor::open(results.path()),
            Err(Error::MissingResource { what: "summary file", .. })
        ));
    }

    #[test]
    fn test_radio_map_heatmap() {
        let results = tempfile::tempdir().unwrap();
        write_summary(
            results.path(),
            json!({
                "type": "RadioMap",
                "path_gain": [[[1, 2, 3], [4, 5, 6]], [[7, 8, 9], [10, 11, 12]]],
                "rss": [[[0, 0, 0], [0, 0, 0]], [[0, 0, 0], [0, 0, 0]]],
                "sinr": [[[0, 0, 0], [0, 0, 0]], [[0, 0, 0], [0, 0, 0]]],
                "image": "render_file.png"
            }),
        );

        let extractor = ResultExtractor::open(results.path()).unwrap();
        let plot = extractor.plot(PlotKind::PathGain, &[1]).unwrap();
        assert_eq!(plot["title"], "Path gain");
        assert_eq!(plot["data"][0]["z"], json!([[7.0, 8.0, 9.0], [10.0, 11.0, 12.0]]));

        assert!(extractor.plot(PlotKind::Sinr, &[2]).is_err());
        assert!(extractor.plot(PlotKind::Taps, &[0]).is_err());
    }

    #[test]
    fn test_path_plots() {
        let results = tempfile::tempdir().unwrap();
        write_summary(results.path(), path_summary());
        let extractor = ResultExtractor::open(results.path()).unwrap();
        assert_eq!(extractor.selectors().len(), 5);

        let response = extractor.plot(PlotKind::FrequencyResponse, &[0, 0, 0, 0, 0]).unwrap();
        assert_eq!(response["data"][0]["y"], json!([1.0, 2.0, 1.0]));

        // second time step: |a| = [1, 0]
        let cir = extractor.plot(PlotKind::Cir, &[0, 0, 0, 0, 1]).unwrap();
        assert_eq!(cir["data"][0]["x"], json!([10.0, 30.0]));
        assert_eq!(cir["data"][0]["y"], json!([1.0, 0.0]));

        let histogram = extractor.plot(PlotKind::CirHistogram, &[0, 0, 0, 0, 0]).unwrap();
        let counts = histogram["data"][0]["y"].as_array().unwrap();
        assert_eq!(counts.first(), Some(&json!(5.0)));
        assert_eq!(counts.last(), Some(&json!(2.0)));

        let taps = extractor.plot(PlotKind::Taps, &[0, 0, 0, 0, 0]).unwrap();
        assert_eq!(taps["data"][0]["y"], json!([1.0, 3.0]));

        let image = extractor.plot(PlotKind::Image, &[]).unwrap();
        assert_eq!(image["data"][0]["source"], "/results/output_files/render_file.png");

        assert!(extractor.plot(PlotKind::Cir, &[0, 0, 1, 0, 0]).is_err());
    }

    #[test]
    fn test_synthetic_array_delays() {
        let tau = NdArray::from_json(&json!([[[1.0, 2.0]], [[3.0, 4.0]]])).unwrap();
        assert_eq!(delays(&tau, [1, 5, 0, 5, 0]), Some(&[3.0, 4.0][..]));
    }

    #[test]
    fn test_input_simulation() {
        let results = tempfile::tempdir().unwrap();
        write_summary(results.path(), path_summary());
        let extractor = ResultExtractor::open(results.path()).unwrap();
        assert!(matches!(
            extractor.input_simulation(),
            Err(Error::MissingResource { what: "input file", .. })
        ));

        let mut simulation = crate::model::Simulation::default();
        simulation.antennas.transmitters.add();
        crate::export_simulation(&mut simulation, results.path(), &crate::model::MemoryModel::new())
            .unwrap();
        let input = extractor.input_simulation().unwrap();
        assert_eq!(input.antennas.transmitters.len(), 1);
    }
}
