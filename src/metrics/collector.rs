//! Metrics collection using Prometheus
//!
//! Ledger metrics are grouped by concern and registered on one registry,
//! which the HTTP layer exposes in the text exposition format.

use crate::rating::RatingChange;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the ledger service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Game submission metrics
    game_metrics: GameMetrics,

    /// Player and season metrics
    roster_metrics: RosterMetrics,

    /// Service-level metrics
    service_metrics: ServiceMetrics,
}

/// Game submission metrics
#[derive(Clone)]
pub struct GameMetrics {
    /// Total games recorded
    pub games_recorded_total: IntCounter,

    /// Failed submissions by error kind
    pub submission_failures_total: IntCounterVec,

    /// End-to-end submission time
    pub submission_duration_seconds: Histogram,

    /// Rating change per participant
    pub rating_delta: Histogram,

    /// Participants per recorded game
    pub participants_per_game: Histogram,
}

/// Player and season metrics
#[derive(Clone)]
pub struct RosterMetrics {
    /// Players created, implicitly or by registration
    pub players_created_total: IntCounter,

    /// Seasons created
    pub seasons_created_total: IntCounter,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Health status (0=unhealthy, 1=healthy)
    pub health_status: IntGauge,

    /// Requests handled, by route and status class
    pub requests_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let game_metrics = GameMetrics::new(&registry)?;
        let roster_metrics = RosterMetrics::new(&registry)?;
        let service_metrics = ServiceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            game_metrics,
            roster_metrics,
            service_metrics,
        })
    }

    pub fn games(&self) -> &GameMetrics {
        &self.game_metrics
    }

    pub fn roster(&self) -> &RosterMetrics {
        &self.roster_metrics
    }

    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Record a committed game
    pub fn record_game(
        &self,
        changes: &[RatingChange],
        new_players: usize,
        duration: Duration,
    ) {
        self.game_metrics.games_recorded_total.inc();
        self.game_metrics
            .participants_per_game
            .observe(changes.len() as f64);
        self.game_metrics
            .submission_duration_seconds
            .observe(duration.as_secs_f64());

        for change in changes {
            self.game_metrics.rating_delta.observe(change.delta() as f64);
        }

        self.roster_metrics
            .players_created_total
            .inc_by(new_players as u64);
    }

    /// Record a rejected or failed submission
    pub fn record_submission_failure(&self, kind: &str, duration: Duration) {
        self.game_metrics
            .submission_failures_total
            .with_label_values(&[kind])
            .inc();
        self.game_metrics
            .submission_duration_seconds
            .observe(duration.as_secs_f64());
    }

    pub fn record_player_registered(&self) {
        self.roster_metrics.players_created_total.inc();
    }

    pub fn record_season_created(&self) {
        self.roster_metrics.seasons_created_total.inc();
    }

    /// Record a handled HTTP request
    pub fn record_request(&self, route: &str, status: u16) {
        let class = match status {
            200..=299 => "2xx",
            400..=499 => "4xx",
            _ => "5xx",
        };

        self.service_metrics
            .requests_total
            .with_label_values(&[route, class])
            .inc();
    }

    /// Update health status
    pub fn update_health_status(&self, healthy: bool) {
        self.service_metrics
            .health_status
            .set(if healthy { 1 } else { 0 });
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;

        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl GameMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let games_recorded_total =
            IntCounter::new("podium_games_recorded_total", "Total games recorded")?;
        registry.register(Box::new(games_recorded_total.clone()))?;

        let submission_failures_total = IntCounterVec::new(
            Opts::new(
                "podium_submission_failures_total",
                "Failed game submissions",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(submission_failures_total.clone()))?;

        let submission_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "podium_submission_duration_seconds",
                "Game submission processing time",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(submission_duration_seconds.clone()))?;

        let rating_delta = Histogram::with_opts(
            HistogramOpts::new("podium_rating_delta", "Rating change per participant")
                .buckets(vec![-32.0, -16.0, -8.0, -4.0, 0.0, 4.0, 8.0, 16.0, 32.0]),
        )?;
        registry.register(Box::new(rating_delta.clone()))?;

        let participants_per_game = Histogram::with_opts(
            HistogramOpts::new("podium_participants_per_game", "Participants per game")
                .buckets(vec![2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 12.0]),
        )?;
        registry.register(Box::new(participants_per_game.clone()))?;

        Ok(Self {
            games_recorded_total,
            submission_failures_total,
            submission_duration_seconds,
            rating_delta,
            participants_per_game,
        })
    }
}

impl RosterMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let players_created_total =
            IntCounter::new("podium_players_created_total", "Total players created")?;
        registry.register(Box::new(players_created_total.clone()))?;

        let seasons_created_total =
            IntCounter::new("podium_seasons_created_total", "Total seasons created")?;
        registry.register(Box::new(seasons_created_total.clone()))?;

        Ok(Self {
            players_created_total,
            seasons_created_total,
        })
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let health_status =
            IntGauge::new("podium_health_status", "Health status (0=unhealthy, 1=healthy)")?;
        registry.register(Box::new(health_status.clone()))?;

        let requests_total = IntCounterVec::new(
            Opts::new("podium_http_requests_total", "HTTP requests handled"),
            &["route", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        Ok(Self {
            health_status,
            requests_total,
        })
    }
}
