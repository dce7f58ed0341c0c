use crate::{
    api::{ApiError, HistorySeries, MarketApi, Quote, SearchResult, PREDICTION_DAYS},
    chart::{compose_prediction, ChartRenderer, ComposedPrediction},
    period::PeriodSelector,
    store::WatchlistStore,
    ui::ClickableRegions,
    watchlist::Watchlist,
};
use chrono::{DateTime, Local};
use ratatui::widgets::TableState;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// How long a card whose quote failed stays visible before the symbol is dropped.
pub const FAILED_QUOTE_TTL: Duration = Duration::from_secs(3);

/// Result delivered from a background fetch task to the UI loop
#[derive(Debug)]
pub enum FetchMessage {
    Quote {
        symbol: String,
        result: Result<Quote, ApiError>,
    },
    History {
        symbol: String,
        period: String,
        result: Result<HistorySeries, ApiError>,
    },
    Prediction {
        symbol: String,
        result: Result<ComposedPrediction, String>,
    },
    Search {
        query: String,
        result: Result<Vec<SearchResult>, ApiError>,
    },
}

#[derive(Debug, Clone)]
pub enum CardState {
    Loading,
    Ready(Quote),
    Failed { message: String, remove_at: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// A modal message; it swallows the next key press.
#[derive(Debug, Clone)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub selected: usize,
    /// Query the current `results` belong to.
    pub searched: Option<String>,
    pub pending: bool,
}

#[derive(Debug)]
pub enum InputMode {
    Normal,
    AddSymbol(String),
    Search(SearchState),
}

pub struct App {
    api: Arc<dyn MarketApi>,
    store: WatchlistStore,
    pub watchlist: Watchlist,
    pub cards: HashMap<String, CardState>,
    pub table_state: TableState,
    pub input_mode: InputMode,
    pub notification: Option<Notification>,
    /// Symbol whose chart panel is open.
    pub chart_symbol: Option<String>,
    pub periods: PeriodSelector,
    pub renderer: ChartRenderer,
    pub predicting: bool,
    pub last_update: Option<DateTime<Local>>,
    pub clickable_regions: ClickableRegions,
    fetch_sender: UnboundedSender<FetchMessage>,
    fetch_receiver: UnboundedReceiver<FetchMessage>,
}

impl App {
    pub fn new(api: Arc<dyn MarketApi>, store: WatchlistStore) -> Self {
        let (fetch_sender, fetch_receiver) = mpsc::unbounded_channel();
        let watchlist = Watchlist::from_symbols(store.load());
        log::info!("loaded {} symbols from {}", watchlist.len(), store.path().display());

        let mut table_state = TableState::default();
        if !watchlist.is_empty() {
            table_state.select(Some(0));
        }

        App {
            api,
            store,
            watchlist,
            cards: HashMap::new(),
            table_state,
            input_mode: InputMode::Normal,
            notification: None,
            chart_symbol: None,
            periods: PeriodSelector::default(),
            renderer: ChartRenderer::default(),
            predicting: false,
            last_update: None,
            clickable_regions: ClickableRegions::default(),
            fetch_sender,
            fetch_receiver,
        }
    }

    fn notify(&mut self, level: Level, title: impl Into<String>, body: impl Into<String>) {
        self.notification = Some(Notification {
            level,
            title: title.into(),
            body: body.into(),
        });
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(self.watchlist.symbols()) {
            log::error!("saving watchlist: {err:#}");
            self.notify(Level::Error, "Save failed", format!("{err:#}"));
        }
    }

    pub fn selected_symbol(&self) -> Option<&String> {
        self.table_state
            .selected()
            .and_then(|i| self.watchlist.symbols().get(i))
    }

    pub fn next_row(&mut self) {
        let len = self.watchlist.len();
        if len == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => (i + 1).min(len - 1),
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn prev_row(&mut self) {
        let i = match self.table_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    fn clamp_selection(&mut self) {
        let len = self.watchlist.len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    /// Validate, store and start fetching a new symbol.
    pub fn add_symbol(&mut self, input: &str) -> bool {
        match self.watchlist.add(input) {
            Ok(symbol) => {
                log::info!("added {symbol}");
                self.persist();
                self.fetch_quote(symbol);
                self.table_state.select(Some(self.watchlist.len() - 1));
                true
            }
            Err(err) => {
                self.notify(Level::Warning, "Cannot add symbol", err.to_string());
                false
            }
        }
    }

    pub fn remove_symbol(&mut self, symbol: &str) {
        if !self.watchlist.remove(symbol) {
            return;
        }
        log::info!("removed {symbol}");
        self.persist();
        self.cards.remove(symbol);
        if self.chart_symbol.as_deref() == Some(symbol) {
            self.hide_chart();
        }
        self.clamp_selection();
    }

    pub fn hide_chart(&mut self) {
        self.chart_symbol = None;
        self.renderer.clear();
    }

    pub fn fetch_quote(&mut self, symbol: String) {
        self.cards.insert(symbol.clone(), CardState::Loading);
        let api = Arc::clone(&self.api);
        let sender = self.fetch_sender.clone();
        tokio::spawn(async move {
            let result = api.fetch_quote(&symbol).await;
            let _ = sender.send(FetchMessage::Quote { symbol, result });
        });
    }

    pub fn refresh_all(&mut self) {
        let symbols = self.watchlist.symbols().to_vec();
        for symbol in symbols {
            self.fetch_quote(symbol);
        }
    }

    /// Whether the card for `symbol` holds a fetched quote.
    pub fn is_ready(&self, symbol: &str) -> bool {
        matches!(self.cards.get(symbol), Some(CardState::Ready(_)))
    }

    /// Open the chart panel for `symbol` on the default period. Only cards
    /// showing a quote can be charted.
    pub fn show_chart(&mut self, symbol: &str) {
        if !self.watchlist.contains(symbol) || !self.is_ready(symbol) {
            log::debug!("not charting {symbol}: no quote on its card");
            return;
        }
        self.chart_symbol = Some(symbol.to_string());
        self.periods.reset();
        self.load_history(symbol.to_string(), self.periods.current().to_string());
    }

    pub fn select_period(&mut self, token: &str) {
        if !self.periods.select(token) {
            return;
        }
        if let Some(symbol) = self.chart_symbol.clone() {
            self.load_history(symbol, token.to_string());
        }
    }

    fn load_history(&self, symbol: String, period: String) {
        let api = Arc::clone(&self.api);
        let sender = self.fetch_sender.clone();
        tokio::spawn(async move {
            let result = api.fetch_history(&symbol, &period).await;
            let _ = sender.send(FetchMessage::History { symbol, period, result });
        });
    }

    /// Fetch a prediction for the charted symbol, then the history for the
    /// current period, and splice them. No-op while one is in flight.
    pub fn request_prediction(&mut self) {
        if self.predicting {
            return;
        }
        let Some(symbol) = self.chart_symbol.clone() else {
            return;
        };
        self.predicting = true;

        let api = Arc::clone(&self.api);
        let sender = self.fetch_sender.clone();
        let period = self.periods.current().to_string();
        let task_symbol = symbol.clone();

        tokio::spawn(async move {
            let work = tokio::spawn(async move {
                let prediction = api.fetch_prediction(&task_symbol, PREDICTION_DAYS).await?;
                let history = api.fetch_history(&task_symbol, &period).await?;
                Ok::<_, ApiError>(compose_prediction(&task_symbol, history, &prediction))
            });
            let result = match work.await {
                Ok(composed) => composed.map_err(|e| e.to_string()),
                Err(join) => Err(format!("prediction task failed: {join}")),
            };
            let _ = sender.send(FetchMessage::Prediction { symbol, result });
        });
    }

    pub fn search(&mut self, query: String) {
        let query = query.trim().to_string();
        if query.is_empty() {
            return;
        }
        if let InputMode::Search(state) = &mut self.input_mode {
            state.pending = true;
        }
        let api = Arc::clone(&self.api);
        let sender = self.fetch_sender.clone();
        tokio::spawn(async move {
            let result = api.search(&query).await;
            let _ = sender.send(FetchMessage::Search { query, result });
        });
    }

    pub fn apply(&mut self, msg: FetchMessage) {
        match msg {
            FetchMessage::Quote { symbol, result } => {
                if !self.watchlist.contains(&symbol) {
                    log::debug!("dropping quote for removed symbol {symbol}");
                    return;
                }
                let state = match result {
                    Ok(quote) => {
                        self.last_update = Some(Local::now());
                        CardState::Ready(quote)
                    }
                    Err(err) => {
                        log::warn!("quote for {symbol} failed: {err}");
                        CardState::Failed {
                            message: err.to_string(),
                            remove_at: Instant::now() + FAILED_QUOTE_TTL,
                        }
                    }
                };
                self.cards.insert(symbol, state);
            }
            FetchMessage::History { symbol, period, result } => match result {
                Ok(series) => {
                    if self.chart_symbol.is_none() {
                        return;
                    }
                    let HistorySeries { dates, prices, .. } = series;
                    self.renderer.draw(dates, &prices, format!("{symbol} ({period})"), None);
                }
                Err(err) => log::warn!("history for {symbol} ({period}) failed: {err}"),
            },
            FetchMessage::Prediction { symbol, result } => {
                self.predicting = false;
                match result {
                    Ok(composed) => {
                        if self.chart_symbol.is_none() {
                            return;
                        }
                        let ComposedPrediction { labels, prices, split_index, summary } = composed;
                        self.renderer.draw(
                            labels,
                            &prices,
                            format!("{symbol} with 7-day prediction"),
                            Some(split_index),
                        );
                        self.notify(Level::Info, "Prediction", summary.to_string());
                    }
                    Err(err) => {
                        log::warn!("prediction for {symbol} failed: {err}");
                        self.notify(Level::Error, "Prediction failed", err);
                    }
                }
            }
            FetchMessage::Search { query, result } => {
                let InputMode::Search(state) = &mut self.input_mode else {
                    return;
                };
                state.pending = false;
                state.selected = 0;
                state.results = result.unwrap_or_else(|err| {
                    log::warn!("search for {query} failed: {err}");
                    Vec::new()
                });
                state.searched = Some(query);
            }
        }
    }

    /// Drain everything the background tasks have delivered.
    pub fn process_fetch_results(&mut self) -> bool {
        let mut updated = false;
        while let Ok(msg) = self.fetch_receiver.try_recv() {
            self.apply(msg);
            updated = true;
        }
        updated
    }

    /// Drop symbols whose failed card has been shown long enough.
    pub fn expire_failed_cards(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .cards
            .iter()
            .filter_map(|(symbol, state)| match state {
                CardState::Failed { remove_at, .. } if *remove_at <= now => Some(symbol.clone()),
                _ => None,
            })
            .collect();
        for symbol in expired {
            log::info!("auto-removing {symbol} after failed quote");
            self.remove_symbol(&symbol);
        }
    }

    pub fn tick(&mut self) {
        self.process_fetch_results();
        self.expire_failed_cards(Instant::now());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// In-memory backend. Symbols without a canned quote answer 404.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub quotes: HashMap<String, Quote>,
        pub history: HashMap<(String, String), HistorySeries>,
        pub predictions: HashMap<String, crate::api::Prediction>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            status: StatusCode::NOT_FOUND,
            message: format!("{what} not found"),
        }
    }

    #[async_trait]
    impl MarketApi for FakeApi {
        async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ApiError> {
            self.record(format!("quote {symbol}"));
            self.quotes.get(symbol).cloned().ok_or_else(|| not_found("Stock"))
        }

        async fn fetch_history(&self, symbol: &str, period: &str) -> Result<HistorySeries, ApiError> {
            self.record(format!("history {symbol} {period}"));
            self.history
                .get(&(symbol.to_string(), period.to_string()))
                .cloned()
                .ok_or_else(|| not_found("History"))
        }

        async fn fetch_prediction(&self, symbol: &str, days: u32) -> Result<crate::api::Prediction, ApiError> {
            self.record(format!("predict {symbol} {days}"));
            if symbol == "PANIC" {
                panic!("model exploded");
            }
            self.predictions.get(symbol).cloned().ok_or(ApiError::RateLimited)
        }

        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
            self.record(format!("search {query}"));
            Ok(vec![SearchResult {
                symbol: query.to_uppercase(),
                name: format!("{query} Corp"),
                exchange: Some("NMS".into()),
            }])
        }
    }

    pub(crate) fn quote(symbol: &str, price: f64, change: f64) -> Quote {
        Quote {
            symbol: symbol.into(),
            name: format!("{symbol} Inc."),
            price,
            change,
            change_percent: change / price * 100.0,
            currency: Some("USD".into()),
        }
    }

    fn series(dates: &[&str], prices: &[f64]) -> HistorySeries {
        HistorySeries::new(dates.iter().map(|d| d.to_string()).collect(), prices.to_vec())
    }

    fn fake() -> FakeApi {
        let mut api = FakeApi::default();
        api.quotes.insert("AAPL".into(), quote("AAPL", 190.0, 1.5));
        api.quotes.insert("MSFT".into(), quote("MSFT", 410.0, 0.0));
        api.history.insert(("AAPL".into(), "1mo".into()), series(&["d1", "d2"], &[10.0, 12.0]));
        api.history.insert(("AAPL".into(), "1y".into()), series(&["y1", "y2", "y3"], &[8.0, 9.0, 12.0]));
        api.predictions.insert(
            "AAPL".into(),
            crate::api::Prediction {
                symbol: Some("AAPL".into()),
                current_price: 12.0,
                predicted_change: 1.0,
                predicted_change_percent: 8.33,
                predictions: series(&["e1", "e2"], &[12.5, 13.0]),
            },
        );
        api
    }

    fn app_with(api: Arc<FakeApi>, dir: &tempfile::TempDir) -> App {
        App::new(api, WatchlistStore::new(dir.path().join("stocks.json")))
    }

    async fn settle(app: &mut App, n: usize) {
        for _ in 0..n {
            let msg = app.fetch_receiver.recv().await.unwrap();
            app.apply(msg);
        }
    }

    #[tokio::test]
    async fn added_symbol_is_normalized_persisted_and_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(fake());
        let mut app = app_with(api.clone(), &dir);

        assert!(app.add_symbol("aapl  "));
        assert!(matches!(app.cards.get("AAPL"), Some(CardState::Loading)));
        assert_eq!(WatchlistStore::new(dir.path().join("stocks.json")).load(), ["AAPL"]);

        settle(&mut app, 1).await;
        match app.cards.get("AAPL") {
            Some(CardState::Ready(q)) => assert_eq!(q.price, 190.0),
            other => panic!("unexpected card state {other:?}"),
        }
        assert_eq!(app.selected_symbol().map(String::as_str), Some("AAPL"));
    }

    #[tokio::test]
    async fn duplicate_add_warns_and_keeps_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(fake()), &dir);
        app.add_symbol("AAPL");
        settle(&mut app, 1).await;

        assert!(!app.add_symbol(" aapl"));
        assert_eq!(app.watchlist.symbols(), ["AAPL"]);
        let note = app.notification.as_ref().unwrap();
        assert_eq!(note.level, Level::Warning);
        assert!(note.body.contains("already"));
    }

    #[tokio::test]
    async fn empty_add_warns() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(fake()), &dir);
        assert!(!app.add_symbol("   "));
        assert!(app.watchlist.is_empty());
        assert_eq!(app.notification.as_ref().unwrap().level, Level::Warning);
    }

    #[tokio::test]
    async fn failed_quote_removes_symbol_after_grace_period() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(fake());
        let mut app = app_with(api.clone(), &dir);
        app.add_symbol("AAPL");
        app.add_symbol("zzzz");
        settle(&mut app, 2).await;

        assert!(matches!(app.cards.get("ZZZZ"), Some(CardState::Failed { .. })));

        app.expire_failed_cards(Instant::now());
        assert!(app.watchlist.contains("ZZZZ"));

        let calls_before = api.calls().len();
        app.expire_failed_cards(Instant::now() + FAILED_QUOTE_TTL + Duration::from_millis(50));
        assert_eq!(app.watchlist.symbols(), ["AAPL"]);
        assert!(!app.cards.contains_key("ZZZZ"));
        assert_eq!(WatchlistStore::new(dir.path().join("stocks.json")).load(), ["AAPL"]);
        assert_eq!(api.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn failed_or_loading_card_cannot_be_charted() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(fake());
        let mut app = app_with(api.clone(), &dir);
        app.add_symbol("ZZZZ");
        app.show_chart("ZZZZ");
        settle(&mut app, 1).await;
        assert!(matches!(app.cards.get("ZZZZ"), Some(CardState::Failed { .. })));

        app.show_chart("ZZZZ");
        assert!(app.chart_symbol.is_none());
        assert_eq!(api.calls(), ["quote ZZZZ"]);

        app.expire_failed_cards(Instant::now() + FAILED_QUOTE_TTL);
        assert!(app.watchlist.is_empty());
        assert_eq!(api.calls(), ["quote ZZZZ"]);
    }

    #[tokio::test]
    async fn removing_charted_symbol_hides_chart() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(fake()), &dir);
        app.add_symbol("AAPL");
        app.add_symbol("MSFT");
        settle(&mut app, 2).await;

        app.show_chart("AAPL");
        settle(&mut app, 1).await;
        assert!(app.renderer.handle().is_some());

        app.remove_symbol("MSFT");
        assert_eq!(app.cards.len(), 1);
        assert_eq!(app.chart_symbol.as_deref(), Some("AAPL"));

        app.remove_symbol("AAPL");
        assert!(app.cards.is_empty());
        assert!(app.chart_symbol.is_none());
        assert_eq!(app.renderer.live_handles(), 0);
        assert_eq!(app.table_state.selected(), None);
    }

    #[tokio::test]
    async fn quote_for_removed_symbol_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(fake()), &dir);
        app.add_symbol("AAPL");
        app.remove_symbol("AAPL");
        settle(&mut app, 1).await;
        assert!(app.cards.is_empty());
    }

    #[tokio::test]
    async fn history_draws_single_price_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(fake());
        let mut app = app_with(api.clone(), &dir);
        app.add_symbol("AAPL");
        settle(&mut app, 1).await;

        app.periods.select("1y");
        app.show_chart("AAPL");
        assert_eq!(app.periods.current(), "1mo");
        settle(&mut app, 1).await;

        let handle = app.renderer.handle().unwrap();
        assert_eq!(handle.datasets().len(), 1);
        assert_eq!(handle.datasets()[0].label, "Price");
        assert_eq!(handle.datasets()[0].values, vec![Some(10.0), Some(12.0)]);
        assert!(api.calls().contains(&"history AAPL 1mo".to_string()));
    }

    #[tokio::test]
    async fn period_change_refetches_and_failures_keep_chart() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(fake()), &dir);
        app.add_symbol("AAPL");
        settle(&mut app, 1).await;
        app.show_chart("AAPL");
        settle(&mut app, 1).await;

        app.select_period("1y");
        settle(&mut app, 1).await;
        assert_eq!(app.renderer.handle().unwrap().labels(), ["y1", "y2", "y3"]);

        app.select_period("5y");
        settle(&mut app, 1).await;
        assert_eq!(app.periods.current(), "5y");
        assert_eq!(app.renderer.handle().unwrap().title(), "AAPL (1y)");
        assert!(app.notification.is_none());
    }

    #[tokio::test]
    async fn prediction_splices_history_and_reports_summary() {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(fake());
        let mut app = app_with(api.clone(), &dir);
        app.add_symbol("AAPL");
        settle(&mut app, 1).await;
        app.show_chart("AAPL");
        settle(&mut app, 1).await;

        app.request_prediction();
        assert!(app.predicting);
        app.request_prediction();
        settle(&mut app, 1).await;
        assert!(!app.predicting);

        let handle = app.renderer.handle().unwrap();
        assert_eq!(handle.labels(), ["d1", "d2", "e1", "e2"]);
        let prediction = &handle.datasets()[1];
        assert_eq!(prediction.values, vec![None, Some(12.0), Some(12.5), Some(13.0)]);
        assert_eq!(app.renderer.live_handles(), 1);

        let note = app.notification.as_ref().unwrap();
        assert_eq!(note.level, Level::Info);
        assert!(note.body.contains("$13.00"));

        let calls = api.calls();
        let predict_at = calls.iter().position(|c| c == "predict AAPL 7").unwrap();
        let history_at = calls.iter().rposition(|c| c == "history AAPL 1mo").unwrap();
        assert!(predict_at < history_at);
        assert_eq!(calls.iter().filter(|c| c.starts_with("predict")).count(), 1);
    }

    #[tokio::test]
    async fn failed_prediction_reenables_control_and_keeps_chart() {
        let dir = tempfile::tempdir().unwrap();
        let mut api = fake();
        api.quotes.insert("NVDA".into(), quote("NVDA", 100.0, -2.0));
        api.history.insert(("NVDA".into(), "1mo".into()), series(&["d1"], &[100.0]));
        let mut app = app_with(Arc::new(api), &dir);
        app.add_symbol("NVDA");
        settle(&mut app, 1).await;
        app.show_chart("NVDA");
        settle(&mut app, 1).await;

        app.request_prediction();
        settle(&mut app, 1).await;

        assert!(!app.predicting);
        assert_eq!(app.renderer.handle().unwrap().title(), "NVDA (1mo)");
        let note = app.notification.as_ref().unwrap();
        assert_eq!(note.level, Level::Error);
        assert!(note.body.contains("Rate limit"));
    }

    #[tokio::test]
    async fn panicking_prediction_still_reenables_control() {
        let dir = tempfile::tempdir().unwrap();
        let mut api = fake();
        api.quotes.insert("PANIC".into(), quote("PANIC", 1.0, 0.0));
        let mut app = app_with(Arc::new(api), &dir);
        app.add_symbol("PANIC");
        settle(&mut app, 1).await;
        app.chart_symbol = Some("PANIC".into());

        app.request_prediction();
        settle(&mut app, 1).await;
        assert!(!app.predicting);
        assert_eq!(app.notification.as_ref().unwrap().level, Level::Error);
    }

    #[tokio::test]
    async fn search_results_land_in_search_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with(Arc::new(fake()), &dir);
        app.input_mode = InputMode::Search(SearchState {
            query: "tsla".into(),
            ..Default::default()
        });
        app.search("tsla".into());
        settle(&mut app, 1).await;

        let InputMode::Search(state) = &app.input_mode else {
            panic!("left search mode");
        };
        assert!(!state.pending);
        assert_eq!(state.searched.as_deref(), Some("tsla"));
        assert_eq!(state.results[0].symbol, "TSLA");
    }

    #[tokio::test]
    async fn startup_rehydrates_from_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stocks.json"), r#"["MSFT","AAPL"]"#).unwrap();
        let mut app = app_with(Arc::new(fake()), &dir);
        assert_eq!(app.watchlist.symbols(), ["MSFT", "AAPL"]);

        app.refresh_all();
        settle(&mut app, 2).await;
        assert!(app.cards.values().all(|c| matches!(c, CardState::Ready(_))));
    }
}
