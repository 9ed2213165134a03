use crate::config::CollectorConfig;
use crate::domain::model::{DataKind, RoundSummary};
use crate::domain::ports::{DepartureSource, Storage, WeatherSource};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

struct WeatherTarget<W> {
    source: W,
    path: PathBuf,
}

/// Fetches departures for every stop, then weather, once per interval.
///
/// Everything inside a round runs sequentially. Failures for a single stop or for weather
/// are logged and skipped; they never end the loop.
pub struct Collector<D, W, S> {
    departures: D,
    weather: Option<WeatherTarget<W>>,
    storage: S,
    stop_ids: Vec<String>,
    output_path: PathBuf,
    interval: Duration,
}

impl<D, W, S> Collector<D, W, S>
where
    D: DepartureSource,
    W: WeatherSource,
    S: Storage,
{
    /// Weather is collected only when both a source and an output path are present.
    pub fn new(config: &CollectorConfig, departures: D, weather: Option<W>, storage: S) -> Self {
        let weather = match (weather, &config.weather_output_path) {
            (Some(source), Some(path)) => Some(WeatherTarget {
                source,
                path: path.clone(),
            }),
            _ => None,
        };

        Self {
            departures,
            weather,
            storage,
            stop_ids: config.stop_ids.clone(),
            output_path: config.output_path.clone(),
            interval: config.update_interval,
        }
    }

    pub fn weather_enabled(&self) -> bool {
        self.weather.is_some()
    }

    /// Runs rounds on a fixed schedule until `cancel` fires, returning how many completed.
    ///
    /// The first round starts one full interval after the call. A round that overruns the
    /// interval is followed by one immediate round, after which the schedule realigns.
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        let Some(first_tick) = Instant::now().checked_add(self.interval) else {
            tracing::error!(
                "❌ Update interval {:?} is out of range; not starting",
                self.interval
            );
            return 0;
        };
        let mut ticker = tokio::time::interval_at(first_tick, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!("🚀 Starting; data will not be fetched until first update interval");

        let mut rounds = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let summary = self.run_round(&cancel).await;
            if summary.cancelled {
                break;
            }
            rounds += 1;
        }

        tracing::info!("🛑 Collector stopped after {} rounds", rounds);
        rounds
    }

    /// One tick: every stop in order, then weather.
    pub async fn run_round(&self, cancel: &CancellationToken) -> RoundSummary {
        let mut summary = RoundSummary::default();

        for stop_id in &self.stop_ids {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            // 只在抓取時響應取消；寫檔一旦開始就寫完整行
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                fetched = self.departures.fetch_departures(stop_id) => fetched,
            };
            summary.stops_processed += 1;

            let saved = match fetched {
                Ok(data) => self.storage.append_line(&self.output_path, &data).await,
                Err(e) => {
                    tracing::warn!("⚠️ Failed to fetch departures for stop {}: {}", stop_id, e);
                    summary.departures_failed += 1;
                    continue;
                }
            };

            match saved {
                Ok(()) => summary.departures_saved += 1,
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Failed to save departures data for stop {}: {}",
                        stop_id,
                        e
                    );
                    summary.departures_failed += 1;
                }
            }
        }

        if let Some(weather) = &self.weather {
            if !summary.cancelled {
                let saved = self.collect_weather(weather, cancel, &mut summary).await;
                summary.weather_saved = saved;
            }
        }

        if summary.cancelled {
            tracing::info!(
                "Round interrupted by shutdown after {} stops",
                summary.stops_processed
            );
        } else {
            self.log_summary(&summary);
        }

        summary
    }

    async fn collect_weather(
        &self,
        weather: &WeatherTarget<W>,
        cancel: &CancellationToken,
        summary: &mut RoundSummary,
    ) -> Option<bool> {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                summary.cancelled = true;
                return None;
            }
            fetched = weather.source.fetch_current() => fetched,
        };

        let data = match fetched {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("⚠️ Failed to fetch {}: {}", DataKind::Weather, e);
                return Some(false);
            }
        };

        match self.storage.append_line(&weather.path, &data).await {
            Ok(()) => Some(true),
            Err(e) => {
                tracing::warn!("⚠️ Failed to save {} data: {}", DataKind::Weather, e);
                Some(false)
            }
        }
    }

    fn log_summary(&self, summary: &RoundSummary) {
        tracing::info!(
            "📊 Fetched and saved departures data for {} stops ({} saved, {} failed)",
            summary.stops_processed,
            summary.departures_saved,
            summary.departures_failed
        );

        if let Ok(json) = serde_json::to_string(summary) {
            tracing::debug!("Round summary: {}", json);
        }
    }
}
