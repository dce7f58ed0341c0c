/// Period tokens offered in the chart panel, in display order. The backend
/// interprets them; the client only passes them along.
pub const PERIODS: [(&str, &str); 6] = [
    ("1mo", "1M"),
    ("3mo", "3M"),
    ("6mo", "6M"),
    ("1y", "1Y"),
    ("2y", "2Y"),
    ("5y", "5Y"),
];

pub const DEFAULT_PERIOD: &str = "1mo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodControl {
    pub token: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// The row of period controls. Exactly one is active at a time.
#[derive(Debug, Clone)]
pub struct PeriodSelector {
    controls: Vec<PeriodControl>,
}

impl Default for PeriodSelector {
    fn default() -> Self {
        let mut selector = PeriodSelector {
            controls: PERIODS
                .iter()
                .map(|&(token, label)| PeriodControl { token, label, active: false })
                .collect(),
        };
        selector.reset();
        selector
    }
}

impl PeriodSelector {
    /// Activate the control for `token`. Unknown tokens leave the selection as is.
    pub fn select(&mut self, token: &str) -> bool {
        if !self.controls.iter().any(|c| c.token == token) {
            return false;
        }
        for control in &mut self.controls {
            control.active = false;
        }
        for control in &mut self.controls {
            if control.token == token {
                control.active = true;
            }
        }
        true
    }

    /// Token of the control at `index`, in display order.
    pub fn token_at(&self, index: usize) -> Option<&'static str> {
        self.controls.get(index).map(|c| c.token)
    }

    pub fn reset(&mut self) {
        self.select(DEFAULT_PERIOD);
    }

    pub fn current(&self) -> &'static str {
        self.controls
            .iter()
            .find(|c| c.active)
            .map(|c| c.token)
            .unwrap_or(DEFAULT_PERIOD)
    }

    pub fn active_index(&self) -> usize {
        self.controls.iter().position(|c| c.active).unwrap_or(0)
    }

    pub fn controls(&self) -> &[PeriodControl] {
        &self.controls
    }
}
