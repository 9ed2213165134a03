use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Raw departure predictions for one stop.
#[async_trait]
pub trait DepartureSource: Send + Sync {
    async fn fetch_departures(&self, stop_id: &str) -> Result<Vec<u8>>;
}

/// Raw current conditions for the fixed collection site.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_current(&self) -> Result<Vec<u8>>;
}

pub trait Storage: Send + Sync {
    /// Appends `data` plus a trailing newline to `path`, creating the file if needed.
    fn append_line(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
