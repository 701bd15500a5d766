use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use utoipa::ToSchema;

pub type SharedMetrics = Arc<Metrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(Metrics::default())
}

/// Contatori di processo per le risposte generate dal contesto di richiesta
#[derive(Debug, Default)]
pub struct Metrics {
    page_status_200: AtomicU64,
    page_status_404: AtomicU64,
    page_status_500: AtomicU64,
    api_status_200: AtomicU64,
    api_status_404: AtomicU64,
    api_status_500: AtomicU64,
    api_key_rejections: AtomicU64,
}

/// Fotografia dei contatori
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MetricsSnapshot {
    pub page_status_200: u64,
    pub page_status_404: u64,
    pub page_status_500: u64,
    pub api_status_200: u64,
    pub api_status_404: u64,
    pub api_status_500: u64,
    pub api_key_rejections: u64,
}

impl Metrics {
    /// Conta una pagina HTML (solo 200, 404 e 500)
    pub fn record_page_status(&self, status: u16) {
        let counter = match status {
            200 => &self.page_status_200,
            404 => &self.page_status_404,
            500 => &self.page_status_500,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Conta una risposta API (solo 200, 404 e 500)
    pub fn record_api_status(&self, status: u16) {
        let counter = match status {
            200 => &self.api_status_200,
            404 => &self.api_status_404,
            500 => &self.api_status_500,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_key_rejection(&self) {
        self.api_key_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            page_status_200: self.page_status_200.load(Ordering::Relaxed),
            page_status_404: self.page_status_404.load(Ordering::Relaxed),
            page_status_500: self.page_status_500.load(Ordering::Relaxed),
            api_status_200: self.api_status_200.load(Ordering::Relaxed),
            api_status_404: self.api_status_404.load(Ordering::Relaxed),
            api_status_500: self.api_status_500.load(Ordering::Relaxed),
            api_key_rejections: self.api_key_rejections.load(Ordering::Relaxed),
        }
    }
}
