use crate::api::{HistorySeries, Prediction};
use std::{cell::Cell, fmt, rc::Rc};

pub const PRICE_LABEL: &str = "Price";
pub const HISTORICAL_LABEL: &str = "Historical";
pub const PREDICTION_LABEL: &str = "Prediction";

/// Number of dashes drawn between two adjacent prediction points.
const DASHES_PER_STEP: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartDataset {
    pub label: &'static str,
    /// One entry per label; `None` leaves a gap.
    pub values: Vec<Option<f64>>,
    pub dashed: bool,
}

impl ChartDataset {
    /// `(index, value)` pairs for the entries that hold a value.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect()
    }
}

/// Datasets for one chart. Without a split the series is a single "Price"
/// line; with one, history and prediction become two datasets sharing the
/// label axis, the prediction repeating the last historical value at
/// `split - 1` so the segments join.
pub fn build_datasets(prices: &[f64], split_index: Option<usize>) -> Vec<ChartDataset> {
    let Some(split) = split_index else {
        return vec![ChartDataset {
            label: PRICE_LABEL,
            values: prices.iter().copied().map(Some).collect(),
            dashed: false,
        }];
    };
    let split = split.min(prices.len());

    let historical = ChartDataset {
        label: HISTORICAL_LABEL,
        values: prices[..split].iter().copied().map(Some).collect(),
        dashed: false,
    };

    let mut predicted: Vec<Option<f64>> = vec![None; split];
    if let Some(last) = split.checked_sub(1) {
        predicted[last] = Some(prices[last]);
    }
    predicted.extend(prices[split..].iter().copied().map(Some));

    vec![
        historical,
        ChartDataset {
            label: PREDICTION_LABEL,
            values: predicted,
            dashed: true,
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSummary {
    pub symbol: String,
    pub current_price: f64,
    pub final_price: Option<f64>,
    pub final_date: Option<String>,
    pub change: f64,
    pub change_percent: f64,
}

impl fmt::Display for PredictionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} 7-day prediction", self.symbol)?;
        writeln!(f, "Current price: ${:.2}", self.current_price)?;
        match (&self.final_date, self.final_price) {
            (Some(date), Some(price)) => writeln!(f, "Predicted ({date}): ${price:.2}")?,
            _ => writeln!(f, "Predicted: n/a")?,
        }
        write!(f, "Expected change: {:+.2} ({:+.2}%)", self.change, self.change_percent)
    }
}

/// History and prediction spliced into one chart-ready series.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrediction {
    pub labels: Vec<String>,
    pub prices: Vec<f64>,
    pub split_index: usize,
    pub summary: PredictionSummary,
}

pub fn compose_prediction(symbol: &str, history: HistorySeries, prediction: &Prediction) -> ComposedPrediction {
    let split_index = history.dates.len();

    let mut labels = history.dates;
    labels.extend(prediction.predictions.dates.iter().cloned());
    let mut prices = history.prices;
    prices.extend(prediction.predictions.prices.iter().copied());

    let summary = PredictionSummary {
        symbol: symbol.to_string(),
        current_price: prediction.current_price,
        final_price: prediction.predictions.prices.last().copied(),
        final_date: prediction.predictions.dates.last().cloned(),
        change: prediction.predicted_change,
        change_percent: prediction.predicted_change_percent,
    };

    ComposedPrediction { labels, prices, split_index, summary }
}

/// A drawable polyline: a named dataset, or one unnamed dash of a dashed one.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub label: Option<&'static str>,
    pub points: Vec<(f64, f64)>,
    pub dashed: bool,
}

/// Break a polyline into short alternating on/off pieces.
pub fn dash_segments(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let pieces = DASHES_PER_STEP * 2;
    let mut dashes = Vec::new();
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let at = |t: f64| (x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
        for i in (0..pieces).step_by(2) {
            let start = i as f64 / pieces as f64;
            let end = (i + 1) as f64 / pieces as f64;
            dashes.push(vec![at(start), at(end)]);
        }
    }
    dashes
}

/// The live drawing surface. Dropping it releases the surface.
#[derive(Debug)]
pub struct ChartHandle {
    id: u64,
    title: String,
    labels: Vec<String>,
    datasets: Vec<ChartDataset>,
    strokes: Vec<Stroke>,
    y_bounds: [f64; 2],
    live: Rc<Cell<usize>>,
}

impl ChartHandle {
    fn new(id: u64, title: String, labels: Vec<String>, datasets: Vec<ChartDataset>, live: Rc<Cell<usize>>) -> Self {
        let mut strokes = Vec::new();
        for dataset in &datasets {
            let points = dataset.points();
            if dataset.dashed {
                // Named single-point stroke keeps the legend entry.
                strokes.push(Stroke {
                    label: Some(dataset.label),
                    points: points.first().copied().into_iter().collect(),
                    dashed: true,
                });
                strokes.extend(dash_segments(&points).into_iter().map(|points| Stroke {
                    label: None,
                    points,
                    dashed: true,
                }));
            } else {
                strokes.push(Stroke { label: Some(dataset.label), points, dashed: false });
            }
        }

        let y_bounds = y_bounds(&datasets);
        live.set(live.get() + 1);
        log::debug!("chart {id} created: {title}");
        ChartHandle { id, title, labels, datasets, strokes, y_bounds, live }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn datasets(&self) -> &[ChartDataset] {
        &self.datasets
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        [0.0, self.labels.len().saturating_sub(1).max(1) as f64]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        self.y_bounds
    }
}

impl Drop for ChartHandle {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
        log::debug!("chart {} disposed", self.id);
    }
}

fn y_bounds(datasets: &[ChartDataset]) -> [f64; 2] {
    let values = datasets.iter().flat_map(|d| d.values.iter().flatten().copied());
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if min == max {
        return [min - 1.0, max + 1.0];
    }
    let pad = (max - min) * 0.05;
    [min - pad, max + pad]
}

/// Owns the single chart handle.
#[derive(Debug, Default)]
pub struct ChartRenderer {
    handle: Option<ChartHandle>,
    next_id: u64,
    live: Rc<Cell<usize>>,
}

impl ChartRenderer {
    pub fn draw(
        &mut self,
        labels: Vec<String>,
        prices: &[f64],
        title: impl Into<String>,
        split_index: Option<usize>,
    ) -> &ChartHandle {
        // The previous surface is released before the next exists.
        drop(self.handle.take());
        debug_assert_eq!(self.live.get(), 0);

        self.next_id += 1;
        let datasets = build_datasets(prices, split_index);
        let handle = ChartHandle::new(self.next_id, title.into(), labels, datasets, Rc::clone(&self.live));
        self.handle.insert(handle)
    }

    pub fn clear(&mut self) {
        self.handle = None;
    }

    pub fn handle(&self) -> Option<&ChartHandle> {
        self.handle.as_ref()
    }

    pub fn live_handles(&self) -> usize {
        self.live.get()
    }
}
