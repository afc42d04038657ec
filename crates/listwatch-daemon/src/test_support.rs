//! Scripted fakes for orchestrator and service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use listwatch_core::{Record, Target};
use listwatch_notify::{Alert, Notifier, NotifyError};
use listwatch_scraper::{
    ConsistencyConfig, DelayRange, Extractor, RenderSession, Renderer, ScraperError,
    StabilityConfig,
};

pub(crate) enum Load {
    Page(String),
    Denied,
}

pub(crate) fn page(content: &str) -> Load {
    Load::Page(content.to_owned())
}

pub(crate) fn target(display_name: &str, category: &str) -> Target {
    Target {
        url: format!("https://example.com/{display_name}/{category}"),
        display_name: display_name.to_owned(),
        category: category.to_owned(),
        channel_id: format!("chan-{display_name}"),
    }
}

pub(crate) fn fast_consistency() -> ConsistencyConfig {
    ConsistencyConfig {
        retries: 3,
        failed_attempt_backoff: DelayRange::ZERO,
        stability: StabilityConfig {
            max_attempts: 3,
            settle_timeout: Duration::from_millis(50),
            pre_capture_delay: DelayRange::ZERO,
            post_round_delay: DelayRange::ZERO,
        },
    }
}

/// Parses `name:price;name:price` pages.
pub(crate) struct PipeExtractor;

impl Extractor for PipeExtractor {
    fn parse(&self, content: &str) -> Vec<Record> {
        content
            .split(';')
            .filter_map(|item| {
                let (name, price) = item.split_once(':')?;
                Record::from_raw(name, price)
            })
            .collect()
    }
}

#[derive(Default)]
struct RendererState {
    scripts: HashMap<String, VecDeque<Load>>,
    navigations: Vec<String>,
    opened: usize,
    closed: usize,
    unavailable: bool,
}

/// Renderer whose sessions replay per-URL scripts. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct FakeRenderer {
    state: Arc<Mutex<RendererState>>,
}

impl FakeRenderer {
    pub(crate) fn unavailable() -> Self {
        let renderer = Self::default();
        renderer.state.lock().unwrap().unavailable = true;
        renderer
    }

    /// Replaces the loads served for `url`, one per navigation.
    pub(crate) fn script(&self, url: &str, loads: Vec<Load>) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(url.to_owned(), loads.into());
    }

    pub(crate) fn navigations(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .navigations
            .iter()
            .filter(|u| *u == url)
            .count()
    }

    pub(crate) fn first_visits(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut seen = Vec::new();
        for url in &state.navigations {
            if !seen.contains(url) {
                seen.push(url.clone());
            }
        }
        seen
    }

    pub(crate) fn sessions_opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    pub(crate) fn sessions_closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ScraperError> {
        let mut state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(ScraperError::NoPage);
        }
        state.opened += 1;
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
            page: None,
        }))
    }
}

struct FakeSession {
    state: Arc<Mutex<RendererState>>,
    page: Option<String>,
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn warm_up(&mut self, _target_url: &str) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<u16, ScraperError> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_owned());
        let load = state.scripts.get_mut(url).and_then(VecDeque::pop_front);
        match load {
            Some(Load::Page(content)) => {
                self.page = Some(content);
                Ok(200)
            }
            Some(Load::Denied) => Err(ScraperError::AccessDenied {
                url: url.to_owned(),
                status: 403,
            }),
            None => Err(ScraperError::UnexpectedStatus {
                status: 503,
                url: url.to_owned(),
            }),
        }
    }

    async fn wait_until_settled(&mut self, _timeout: Duration) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn capture(&mut self) -> Result<String, ScraperError> {
        self.page.clone().ok_or(ScraperError::NoPage)
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.state.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// Records every alert it is asked to deliver.
#[derive(Clone, Default)]
pub(crate) struct FakeNotifier {
    alerts: Arc<Mutex<Vec<Alert>>>,
    fail: bool,
}

impl FakeNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        self.alerts.lock().unwrap().push(alert.clone());
        if self.fail {
            return Err(NotifyError::UnexpectedStatus {
                status: 500,
                body: "chat unavailable".to_owned(),
            });
        }
        Ok(())
    }
}
