//! Application state management for the aidwatch dashboard
//!
//! This module contains the main application state, handling keyboard input,
//! data loading, and state transitions between the dashboard views.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};

use crate::cache::ResponseCache;
use crate::cli::{StartupConfig, View};
use crate::data::{
    DangerLevel, DetectionRecord, DetectionsClient, DeviceClient, DeviceStatus,
    PredictionSummary, PredictionsClient, SystemHealth,
};
use crate::refresh::RefreshMessage;

/// How long a fetched payload is served without hitting the backend again
const FRESHNESS_WINDOW: std::time::Duration = std::time::Duration::from_secs(30);

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while fetching data
    Loading,
    /// Recent detection log
    DetectionLog,
    /// Detail view for a single detection, by backend id
    DetectionDetail(i64),
    /// ML-prediction analytics
    Analytics,
    /// Device status and system health
    Health,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Index of currently selected row in the (filtered) detection log
    pub selected_index: usize,
    /// Most recent detection log, newest first
    pub detections: Vec<DetectionRecord>,
    /// Latest device status, if any fetch has succeeded
    pub device_status: Option<DeviceStatus>,
    /// Latest system health, if any fetch has succeeded
    pub health: Option<SystemHealth>,
    /// Latest prediction summaries
    pub predictions: Vec<PredictionSummary>,
    /// Minimum danger level shown in the log; `None` shows everything
    pub danger_filter: Option<DangerLevel>,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Scroll offset for detection detail view
    pub detail_scroll_offset: u16,
    /// Timestamp of last data refresh
    pub last_refresh: Option<DateTime<Local>>,
    /// Last refresh error, shown in the status line
    pub last_error: Option<String>,
    /// Flag indicating a manual refresh has been requested
    pub refresh_requested: bool,
    /// Flag indicating a cache clear + reload has been requested
    pub clear_requested: bool,
    /// Whether a background refresh cycle is currently running
    pub refreshing: bool,
    /// Detection log page size
    detection_limit: usize,
    /// View to switch to after the initial load (from --view)
    pending_view: Option<View>,
    /// Detections API client
    detections_client: DetectionsClient,
    /// Device status/health API client
    device_client: DeviceClient,
    /// Predictions API client
    predictions_client: PredictionsClient,
}

impl App {
    /// Creates a new App instance from the startup configuration
    ///
    /// Builds one response cache per payload type and hands it to the matching
    /// client; every consumer of a resource shares the same cache instance.
    pub fn new(config: StartupConfig) -> Self {
        let detections_client = DetectionsClient::new(
            config.server_url.clone(),
            ResponseCache::new(FRESHNESS_WINDOW),
        );
        let device_client = DeviceClient::new(
            config.server_url.clone(),
            ResponseCache::new(FRESHNESS_WINDOW),
            ResponseCache::new(FRESHNESS_WINDOW),
        );
        let predictions_client =
            PredictionsClient::new(config.server_url.clone(), ResponseCache::new(FRESHNESS_WINDOW));

        Self::with_clients(
            detections_client,
            device_client,
            predictions_client,
            config.detection_limit,
            config.initial_view,
        )
    }

    /// Creates a new App instance with the given clients
    ///
    /// Used by `new` and directly by tests that need custom clients.
    pub fn with_clients(
        detections_client: DetectionsClient,
        device_client: DeviceClient,
        predictions_client: PredictionsClient,
        detection_limit: usize,
        pending_view: Option<View>,
    ) -> Self {
        Self {
            state: AppState::Loading,
            selected_index: 0,
            detections: Vec::new(),
            device_status: None,
            health: None,
            predictions: Vec::new(),
            danger_filter: None,
            should_quit: false,
            show_help: false,
            detail_scroll_offset: 0,
            last_refresh: None,
            last_error: None,
            refresh_requested: false,
            clear_requested: false,
            refreshing: false,
            detection_limit,
            pending_view,
            detections_client,
            device_client,
            predictions_client,
        }
    }

    /// Returns the detection log filtered by the current danger threshold
    pub fn filtered_detections(&self) -> Vec<&DetectionRecord> {
        match self.danger_filter {
            Some(threshold) => self
                .detections
                .iter()
                .filter(|d| d.at_least(threshold))
                .collect(),
            None => self.detections.iter().collect(),
        }
    }

    /// Returns the number of rows in the filtered log
    pub fn detection_count(&self) -> usize {
        self.filtered_detections().len()
    }

    /// Returns the currently selected detection, if any
    pub fn selected_detection(&self) -> Option<&DetectionRecord> {
        self.filtered_detections().get(self.selected_index).copied()
    }

    /// Looks up a detection by backend id
    pub fn get_detection(&self, id: i64) -> Option<&DetectionRecord> {
        self.detections.iter().find(|d| d.id == id)
    }

    /// Loads all dashboard data concurrently
    ///
    /// Fetches the detection log, device status, system health, and prediction
    /// summaries in one round. On partial failure the previously loaded data
    /// is kept and the error is surfaced in the status line; if the log has
    /// never loaded, the last cached (possibly stale) log is shown instead.
    /// Transitions out of `Loading` when complete.
    pub async fn load_all_data(&mut self, force_refresh: bool) {
        let (detections, status, health, predictions) = futures::join!(
            self.detections_client
                .fetch_recent(self.detection_limit, force_refresh),
            self.device_client.fetch_status(force_refresh),
            self.device_client.fetch_health(force_refresh),
            self.predictions_client.fetch_summary(force_refresh),
        );

        let mut errors: Vec<String> = Vec::new();

        match detections {
            Ok(records) => self.set_detections(records),
            Err(e) => {
                errors.push(e.to_string());
                if self.detections.is_empty() {
                    if let Some(cached) =
                        self.detections_client.cached_recent(self.detection_limit)
                    {
                        self.set_detections(cached.payload);
                    }
                }
            }
        }
        match status {
            Ok(s) => self.device_status = Some(s),
            Err(e) => errors.push(e.to_string()),
        }
        match health {
            Ok(h) => self.health = Some(h),
            Err(e) => errors.push(e.to_string()),
        }
        match predictions {
            Ok(p) => self.predictions = p,
            Err(e) => errors.push(e.to_string()),
        }

        self.last_error = if errors.is_empty() {
            None
        } else {
            Some(errors.join("; "))
        };
        self.last_refresh = Some(Local::now());

        // Leave Loading for the configured (or default) view
        if self.state == AppState::Loading {
            self.state = match self.pending_view.take() {
                Some(View::Analytics) => AppState::Analytics,
                Some(View::Health) => AppState::Health,
                _ => AppState::DetectionLog,
            };
        }
    }

    /// Applies an update pushed by the background refresh system
    pub fn apply_refresh_message(&mut self, message: RefreshMessage) {
        match message {
            RefreshMessage::DetectionsUpdated(records) => {
                self.set_detections(records);
                self.last_refresh = Some(Local::now());
                self.last_error = None;
            }
            RefreshMessage::StatusUpdated(status) => {
                self.device_status = Some(status);
                self.last_refresh = Some(Local::now());
            }
            RefreshMessage::HealthUpdated(health) => {
                self.health = Some(health);
                self.last_refresh = Some(Local::now());
            }
            RefreshMessage::PredictionsUpdated(summaries) => {
                self.predictions = summaries;
                self.last_refresh = Some(Local::now());
            }
            RefreshMessage::RefreshError(error) => {
                self.last_error = Some(error);
            }
            RefreshMessage::RefreshStarted => {
                self.refreshing = true;
            }
            RefreshMessage::RefreshCompleted => {
                self.refreshing = false;
            }
        }
    }

    /// Records a detection observed locally before the backend reflects it
    ///
    /// The record lands at the top of both the in-memory log and the shared
    /// cache, so every view shows it immediately; the next forced refresh
    /// reconciles with the server.
    pub fn record_live_detection(&mut self, record: DetectionRecord) {
        self.detections_client
            .record_detection(self.detection_limit, record.clone());
        self.detections.insert(0, record);
    }

    /// Drops every cached payload; the next load hits the backend
    pub fn clear_caches(&self) {
        self.detections_client.clear_cache();
        self.device_client.clear_cache();
        self.predictions_client.clear_cache();
    }

    /// Returns a handle to the detections client sharing this app's cache
    pub fn detections_client(&self) -> DetectionsClient {
        self.detections_client.clone()
    }

    /// Returns a handle to the device client sharing this app's caches
    pub fn device_client(&self) -> DeviceClient {
        self.device_client.clone()
    }

    /// Returns a handle to the predictions client sharing this app's cache
    pub fn predictions_client(&self) -> PredictionsClient {
        self.predictions_client.clone()
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q`: Quit (any view); `Esc` also quits from the detection log
    /// - `Up`/`k`, `Down`/`j`: Move selection / scroll
    /// - `Enter`: Open detection detail
    /// - `Esc`: Go back / close
    /// - `1`/`2`/`3`: Jump to Log / Analytics / Health
    /// - `Tab`: Cycle through views
    /// - `f`: Cycle the minimum-danger filter
    /// - `r`: Request a forced refresh
    /// - `c`: Clear cached data and reload
    /// - `g`/`G`: Scroll to top/bottom in detail view
    /// - `?`: Toggle help overlay
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match self.state {
            AppState::Loading => {
                // Only quit is allowed during loading
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::DetectionLog => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down();
                }
                KeyCode::Enter => {
                    if let Some(id) = self.selected_detection().map(|d| d.id) {
                        self.state = AppState::DetectionDetail(id);
                    }
                }
                KeyCode::Tab => {
                    self.state = AppState::Analytics;
                }
                KeyCode::Char('1') => {
                    self.state = AppState::DetectionLog;
                }
                KeyCode::Char('2') => {
                    self.state = AppState::Analytics;
                }
                KeyCode::Char('3') => {
                    self.state = AppState::Health;
                }
                KeyCode::Char('f') => {
                    self.cycle_danger_filter();
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                KeyCode::Char('c') => {
                    self.clear_requested = true;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::DetectionDetail(_) => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc => {
                    self.reset_detail_view_state();
                    self.state = AppState::DetectionLog;
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    self.scroll_down();
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.scroll_up();
                }
                KeyCode::Char('g') => {
                    self.scroll_to_top();
                }
                KeyCode::Char('G') => {
                    self.scroll_to_bottom();
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::Analytics => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc | KeyCode::Char('1') => {
                    self.state = AppState::DetectionLog;
                }
                KeyCode::Tab | KeyCode::Char('3') => {
                    self.state = AppState::Health;
                }
                KeyCode::Char('2') => {
                    self.state = AppState::Analytics;
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                KeyCode::Char('c') => {
                    self.clear_requested = true;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::Health => match key_event.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Esc | KeyCode::Char('1') | KeyCode::Tab => {
                    self.state = AppState::DetectionLog;
                }
                KeyCode::Char('2') => {
                    self.state = AppState::Analytics;
                }
                KeyCode::Char('3') => {
                    self.state = AppState::Health;
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                KeyCode::Char('c') => {
                    self.clear_requested = true;
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
        }
    }

    /// Replaces the detection log, keeping the selection in bounds
    fn set_detections(&mut self, records: Vec<DetectionRecord>) {
        self.detections = records;
        let count = self.detection_count();
        if count == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= count {
            self.selected_index = count - 1;
        }
    }

    /// Moves the selection up in the log, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.detection_count();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the log, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.detection_count();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    /// Cycles the minimum-danger filter: off -> Low -> Medium -> High ->
    /// Critical -> off
    pub fn cycle_danger_filter(&mut self) {
        self.danger_filter = match self.danger_filter {
            None => Some(DangerLevel::Low),
            Some(DangerLevel::Low) => Some(DangerLevel::Medium),
            Some(DangerLevel::Medium) => Some(DangerLevel::High),
            Some(DangerLevel::High) => Some(DangerLevel::Critical),
            Some(DangerLevel::Critical) | Some(DangerLevel::Unknown) => None,
        };
        let count = self.detection_count();
        if count == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= count {
            self.selected_index = count - 1;
        }
    }

    /// Scrolls up in the detail view with bounds checking
    pub fn scroll_up(&mut self) {
        self.detail_scroll_offset = self.detail_scroll_offset.saturating_sub(1);
    }

    /// Scrolls down in the detail view with bounds checking
    pub fn scroll_down(&mut self) {
        const MAX_SCROLL: u16 = 100;
        if self.detail_scroll_offset < MAX_SCROLL {
            self.detail_scroll_offset += 1;
        }
    }

    /// Scrolls to the top of the detail view
    pub fn scroll_to_top(&mut self) {
        self.detail_scroll_offset = 0;
    }

    /// Scrolls to the bottom of the detail view
    ///
    /// Sets a large offset; the renderer clamps to the actual max.
    pub fn scroll_to_bottom(&mut self) {
        self.detail_scroll_offset = 100;
    }

    /// Resets detail view state when navigating away
    pub fn reset_detail_view_state(&mut self) {
        self.detail_scroll_offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    /// Helper to create a KeyEvent for testing
    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> App {
        App::new(StartupConfig {
            server_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        })
    }

    fn sample_detection(id: i64, danger_level: DangerLevel) -> DetectionRecord {
        DetectionRecord {
            id,
            object_detected: "person".to_string(),
            danger_level,
            distance_cm: Some(200.0),
            detection_confidence: Some(0.9),
            detection_source: Some("camera".to_string()),
            detected_at: None,
            image_url: None,
        }
    }

    fn app_with_detections() -> App {
        let mut app = test_app();
        app.state = AppState::DetectionLog;
        app.detections = vec![
            sample_detection(1, DangerLevel::Critical),
            sample_detection(2, DangerLevel::Medium),
            sample_detection(3, DangerLevel::Low),
        ];
        app
    }

    // ========================================================================
    // Initial State and Transitions
    // ========================================================================

    #[test]
    fn test_initial_state_is_loading() {
        let app = test_app();
        assert_eq!(app.state, AppState::Loading);
        assert_eq!(app.selected_index, 0);
        assert!(!app.should_quit);
        assert!(app.detections.is_empty());
        assert!(app.device_status.is_none());
        assert!(app.predictions.is_empty());
    }

    #[test]
    fn test_keys_ignored_during_loading() {
        let mut app = test_app();
        assert_eq!(app.state, AppState::Loading);

        app.handle_key(key_event(KeyCode::Down));
        assert_eq!(app.selected_index, 0);

        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.state, AppState::Loading);

        // But q should still work
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_load_against_unreachable_backend_surfaces_error() {
        let mut app = test_app();

        app.load_all_data(false).await;

        assert_eq!(
            app.state,
            AppState::DetectionLog,
            "Loading should end even when every fetch fails"
        );
        assert!(app.last_error.is_some());
        assert!(app.last_refresh.is_some());
        assert!(app.detections.is_empty());
    }

    #[tokio::test]
    async fn test_pending_view_applied_after_load() {
        let mut app = App::new(StartupConfig {
            server_url: "http://127.0.0.1:9".to_string(),
            initial_view: Some(View::Health),
            ..Default::default()
        });

        app.load_all_data(false).await;

        assert_eq!(app.state, AppState::Health);
    }

    #[test]
    fn test_enter_opens_detail_for_selected_detection() {
        let mut app = app_with_detections();
        app.selected_index = 1;

        app.handle_key(key_event(KeyCode::Enter));

        assert_eq!(app.state, AppState::DetectionDetail(2));
    }

    #[test]
    fn test_esc_returns_from_detail_and_resets_scroll() {
        let mut app = app_with_detections();
        app.state = AppState::DetectionDetail(1);
        app.detail_scroll_offset = 7;

        app.handle_key(key_event(KeyCode::Esc));

        assert_eq!(app.state, AppState::DetectionLog);
        assert_eq!(app.detail_scroll_offset, 0);
    }

    #[test]
    fn test_tab_cycles_through_views() {
        let mut app = app_with_detections();

        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.state, AppState::Analytics);

        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.state, AppState::Health);

        app.handle_key(key_event(KeyCode::Tab));
        assert_eq!(app.state, AppState::DetectionLog);
    }

    #[test]
    fn test_number_keys_jump_to_views() {
        let mut app = app_with_detections();

        app.handle_key(key_event(KeyCode::Char('2')));
        assert_eq!(app.state, AppState::Analytics);

        app.handle_key(key_event(KeyCode::Char('3')));
        assert_eq!(app.state, AppState::Health);

        app.handle_key(key_event(KeyCode::Char('1')));
        assert_eq!(app.state, AppState::DetectionLog);
    }

    #[test]
    fn test_q_quits_from_every_view() {
        for state in [
            AppState::DetectionLog,
            AppState::DetectionDetail(1),
            AppState::Analytics,
            AppState::Health,
        ] {
            let mut app = app_with_detections();
            app.state = state;
            app.handle_key(key_event(KeyCode::Char('q')));
            assert!(app.should_quit);
        }
    }

    #[test]
    fn test_esc_quits_from_detection_log() {
        let mut app = app_with_detections();
        assert!(!app.should_quit);

        app.handle_key(key_event(KeyCode::Esc));
        assert!(app.should_quit);
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    #[test]
    fn test_navigation_down_increases_index() {
        let mut app = app_with_detections();
        assert_eq!(app.selected_index, 0);

        app.handle_key(key_event(KeyCode::Down));
        assert_eq!(app.selected_index, 1);

        app.handle_key(key_event(KeyCode::Char('j')));
        assert_eq!(app.selected_index, 2);
    }

    #[test]
    fn test_navigation_up_decreases_index() {
        let mut app = app_with_detections();
        app.selected_index = 2;

        app.handle_key(key_event(KeyCode::Up));
        assert_eq!(app.selected_index, 1);

        app.handle_key(key_event(KeyCode::Char('k')));
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_navigation_wraps_at_both_ends() {
        let mut app = app_with_detections();
        app.selected_index = 2;

        app.handle_key(key_event(KeyCode::Down));
        assert_eq!(app.selected_index, 0, "Should wrap to top");

        app.handle_key(key_event(KeyCode::Up));
        assert_eq!(app.selected_index, 2, "Should wrap to bottom");
    }

    #[test]
    fn test_navigation_noop_with_empty_log() {
        let mut app = test_app();
        app.state = AppState::DetectionLog;

        app.handle_key(key_event(KeyCode::Down));
        assert_eq!(app.selected_index, 0);

        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.state, AppState::DetectionLog, "No detail for empty log");
    }

    // ========================================================================
    // Danger Filter
    // ========================================================================

    #[test]
    fn test_danger_filter_cycles_through_levels() {
        let mut app = app_with_detections();
        assert!(app.danger_filter.is_none());

        app.handle_key(key_event(KeyCode::Char('f')));
        assert_eq!(app.danger_filter, Some(DangerLevel::Low));

        app.handle_key(key_event(KeyCode::Char('f')));
        assert_eq!(app.danger_filter, Some(DangerLevel::Medium));

        app.handle_key(key_event(KeyCode::Char('f')));
        assert_eq!(app.danger_filter, Some(DangerLevel::High));

        app.handle_key(key_event(KeyCode::Char('f')));
        assert_eq!(app.danger_filter, Some(DangerLevel::Critical));

        app.handle_key(key_event(KeyCode::Char('f')));
        assert!(app.danger_filter.is_none());
    }

    #[test]
    fn test_danger_filter_restricts_log() {
        let mut app = app_with_detections();
        assert_eq!(app.detection_count(), 3);

        app.danger_filter = Some(DangerLevel::Medium);
        assert_eq!(app.detection_count(), 2);

        app.danger_filter = Some(DangerLevel::Critical);
        let filtered = app.filtered_detections();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }

    #[test]
    fn test_filter_clamps_selection() {
        let mut app = app_with_detections();
        app.selected_index = 2;

        app.danger_filter = Some(DangerLevel::High);
        app.cycle_danger_filter(); // -> Critical, one row
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_selected_detection_respects_filter() {
        let mut app = app_with_detections();
        app.danger_filter = Some(DangerLevel::Medium);
        app.selected_index = 1;

        let selected = app.selected_detection().expect("Should have a selection");
        assert_eq!(selected.id, 2);
    }

    // ========================================================================
    // Refresh Messages
    // ========================================================================

    #[test]
    fn test_apply_detections_update_replaces_log() {
        let mut app = app_with_detections();

        app.apply_refresh_message(RefreshMessage::DetectionsUpdated(vec![sample_detection(
            9,
            DangerLevel::High,
        )]));

        assert_eq!(app.detections.len(), 1);
        assert_eq!(app.detections[0].id, 9);
        assert!(app.last_refresh.is_some());
    }

    #[test]
    fn test_apply_detections_update_clamps_selection() {
        let mut app = app_with_detections();
        app.selected_index = 2;

        app.apply_refresh_message(RefreshMessage::DetectionsUpdated(vec![sample_detection(
            9,
            DangerLevel::High,
        )]));

        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_apply_refresh_error_sets_status_line() {
        let mut app = app_with_detections();

        app.apply_refresh_message(RefreshMessage::RefreshError(
            "HTTP request failed".to_string(),
        ));

        assert_eq!(app.last_error.as_deref(), Some("HTTP request failed"));
        assert_eq!(app.detections.len(), 3, "Errors must not drop loaded data");
    }

    #[test]
    fn test_refresh_started_and_completed_toggle_flag() {
        let mut app = app_with_detections();

        app.apply_refresh_message(RefreshMessage::RefreshStarted);
        assert!(app.refreshing);

        app.apply_refresh_message(RefreshMessage::RefreshCompleted);
        assert!(!app.refreshing);
    }

    #[test]
    fn test_record_live_detection_lands_on_top() {
        let mut app = app_with_detections();

        app.record_live_detection(sample_detection(42, DangerLevel::Critical));

        assert_eq!(app.detections[0].id, 42);
        assert_eq!(app.detections.len(), 4);
    }

    // ========================================================================
    // Help Overlay
    // ========================================================================

    #[test]
    fn test_help_overlay_intercepts_keys() {
        let mut app = app_with_detections();
        app.show_help = true;

        app.handle_key(key_event(KeyCode::Down));
        assert_eq!(app.selected_index, 0, "Navigation ignored while help shown");
        assert!(app.show_help);

        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(!app.show_help, "q closes help instead of quitting");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_question_mark_toggles_help() {
        let mut app = app_with_detections();

        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(app.show_help);

        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(!app.show_help);
    }

    // ========================================================================
    // Scrolling
    // ========================================================================

    #[test]
    fn test_detail_scroll_bounds() {
        let mut app = app_with_detections();
        app.state = AppState::DetectionDetail(1);

        app.handle_key(key_event(KeyCode::Char('k')));
        assert_eq!(app.detail_scroll_offset, 0, "Should not underflow");

        app.handle_key(key_event(KeyCode::Char('j')));
        assert_eq!(app.detail_scroll_offset, 1);

        app.handle_key(key_event(KeyCode::Char('G')));
        assert_eq!(app.detail_scroll_offset, 100);

        app.handle_key(key_event(KeyCode::Char('j')));
        assert_eq!(app.detail_scroll_offset, 100, "Should respect maximum");

        app.handle_key(key_event(KeyCode::Char('g')));
        assert_eq!(app.detail_scroll_offset, 0);
    }

    // ========================================================================
    // Refresh / Clear Requests
    // ========================================================================

    #[test]
    fn test_r_requests_refresh() {
        let mut app = app_with_detections();
        assert!(!app.refresh_requested);

        app.handle_key(key_event(KeyCode::Char('r')));
        assert!(app.refresh_requested);
    }

    #[test]
    fn test_c_requests_cache_clear() {
        let mut app = app_with_detections();
        assert!(!app.clear_requested);

        app.handle_key(key_event(KeyCode::Char('c')));
        assert!(app.clear_requested);
    }

    #[test]
    fn test_get_detection_by_id() {
        let app = app_with_detections();
        assert_eq!(app.get_detection(2).map(|d| d.id), Some(2));
        assert!(app.get_detection(99).is_none());
    }
}
