use std::path::PathBuf;
use std::sync::Arc;

use mirror_core::{decide, sanitize_title, Decision, Ledger, PageId, SkipReason};
use mirror_logging::{mirror_debug, mirror_error, mirror_info, mirror_warn, set_poll_cycle};

use crate::config::SyncSettings;
use crate::download::{DownloadError, ReqwestImageDownloader};
use crate::{Connector, NotionConnector, RenderInvoker, StoreError, TokenError, TokenResolver};

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("failed to resolve token: {0}")]
    Token(#[from] TokenError),
    #[error("failed to query database: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Rendered { path: PathBuf },
    RenderFailed { path: PathBuf, error: String },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub page_id: PageId,
    pub outcome: PageOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub pages: Vec<PageReport>,
}

impl CycleReport {
    /// Pages for which a render was attempted, successful or not.
    pub fn attempted(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| !matches!(p.outcome, PageOutcome::Skipped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p.outcome, PageOutcome::RenderFailed { .. }))
            .count()
    }
}

/// Drives the mirror: one cycle every `poll_interval`, pages strictly in
/// order, forever.
pub struct Poller {
    settings: SyncSettings,
    tokens: TokenResolver,
    connector: Arc<dyn Connector>,
    invoker: RenderInvoker,
}

impl Poller {
    pub fn new(
        settings: SyncSettings,
        tokens: TokenResolver,
        connector: Arc<dyn Connector>,
        invoker: RenderInvoker,
    ) -> Self {
        Self {
            settings,
            tokens,
            connector,
            invoker,
        }
    }

    /// Poller over the Notion API with the publishing hooks installed.
    pub fn notion(settings: SyncSettings, tokens: TokenResolver) -> Result<Self, DownloadError> {
        let connector: Arc<dyn Connector> = Arc::new(NotionConnector::new(settings.client.clone()));
        let downloader = Arc::new(ReqwestImageDownloader::new(&settings.client)?);
        let invoker = RenderInvoker::publishing(connector.clone(), &settings, downloader);
        Ok(Self::new(settings, tokens, connector, invoker))
    }

    /// Never returns. The ledger lives here and is lost with the process.
    pub async fn run_forever(&self) {
        let mut ledger = Ledger::new();
        let mut cycle: u64 = 0;
        mirror_info!(
            "Mirroring database {} into {} every {:?}",
            self.settings.database_id,
            self.settings.output_dir.display(),
            self.settings.poll_interval
        );
        loop {
            tokio::time::sleep(self.settings.poll_interval).await;
            cycle += 1;
            set_poll_cycle(cycle);
            match self.run_cycle(&mut ledger).await {
                Ok(report) => mirror_debug!(
                    "Cycle done: {} pages seen, {} rendered, {} failed",
                    report.pages.len(),
                    report.attempted() - report.failed(),
                    report.failed()
                ),
                Err(err) => mirror_error!("{}", err),
            }
        }
    }

    /// One poll: resolve the token, query the database, and render every
    /// publishable page whose `last_edited_time` differs from the ledger.
    ///
    /// The ledger is updated after every render attempt, including failed
    /// ones, so a failing page is retried only once it is edited again.
    pub async fn run_cycle(&self, ledger: &mut Ledger) -> Result<CycleReport, CycleError> {
        let token = self.tokens.resolve()?;
        let store = self.connector.store(&token)?;
        let pages = store.query_database(&self.settings.database_id).await?;

        let mut report = CycleReport::default();
        for page in &pages {
            let outcome = match decide(&self.settings.gate, ledger, page) {
                Decision::Skip(reason) => {
                    log_skip(&page.id, &reason);
                    PageOutcome::Skipped(reason)
                }
                Decision::Render { title } => {
                    mirror_info!("Page qualified to render. ID: {} Title: {}", page.id, title);
                    let path = self.settings.output_path(&sanitize_title(&title));
                    let result = self.invoker.render_page(&token, &page.id, &path).await;
                    ledger.record(page.id.clone(), page.last_edited_time);
                    match result {
                        Ok(path) => PageOutcome::Rendered { path },
                        Err(err) => PageOutcome::RenderFailed {
                            path,
                            error: err.to_string(),
                        },
                    }
                }
            };
            report.pages.push(PageReport {
                page_id: page.id.clone(),
                outcome,
            });
        }
        Ok(report)
    }
}

fn log_skip(page_id: &str, reason: &SkipReason) {
    match reason {
        SkipReason::Unchanged { .. } => mirror_debug!("Skipping page {}: {}", page_id, reason),
        SkipReason::NotPublishable { .. } => {
            mirror_info!("Skipping page {}: {}", page_id, reason)
        }
        SkipReason::MissingStatus
        | SkipReason::StatusTypeMismatch { .. }
        | SkipReason::MalformedTitle(_) => {
            mirror_warn!("Skipping page {}: {}", page_id, reason)
        }
    }
}
