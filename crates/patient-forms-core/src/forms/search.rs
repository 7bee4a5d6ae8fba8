use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;

use super::{FormStatus, failure_message};
use crate::bundle::{Bundle, PageLinks};
use crate::client::{FhirClient, ensure_ok, read_json};
use crate::error::Result;
use crate::mapper;
use crate::patient::{PATIENT, PatientForm};
use crate::search::{SearchQuery, SearchTarget};

/// Filter inputs of the list view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub given: String,
    pub family: String,
    pub telecom: String,
}

impl SearchFilters {
    /// `Patient?given=..&family=..&telecom=..`, leaving out blank filters
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery::new(PATIENT)
            .param("given", self.given.trim())
            .param("family", self.family.trim())
            .param("telecom", self.telecom.trim())
    }
}

/// Snapshot of the list view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub filters: SearchFilters,
    pub status: FormStatus,
    pub rows: Vec<PatientForm>,
    pub links: PageLinks,
    pub total: Option<u64>,
    /// Target of the page currently displayed
    pub current: Option<SearchTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    SetFilters(SearchFilters),
    Started,
    Loaded {
        target: SearchTarget,
        rows: Vec<PatientForm>,
        links: PageLinks,
        total: Option<u64>,
    },
    Failed(String),
}

impl SearchState {
    pub fn reduce(&self, action: SearchAction) -> Self {
        match action {
            SearchAction::SetFilters(filters) => Self {
                filters,
                ..self.clone()
            },
            SearchAction::Started => Self {
                status: FormStatus::Loading,
                ..self.clone()
            },
            SearchAction::Loaded {
                target,
                rows,
                links,
                total,
            } => Self {
                status: FormStatus::Success,
                rows,
                links,
                total,
                current: Some(target),
                ..self.clone()
            },
            SearchAction::Failed(msg) => Self {
                status: FormStatus::Error(msg),
                ..self.clone()
            },
        }
    }
}

/// Result of one search invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response was applied to the form
    Applied(Arc<SearchState>),
    /// A later search was issued before this one completed; its response
    /// was dropped
    Superseded,
    /// No page exists in the requested direction
    AtBoundary,
}

/// Controller behind the paginated list view.
///
/// Searches may overlap. Each one takes a ticket from a monotonically
/// increasing sequence and only the latest ticket may touch the state.
pub struct SearchForm {
    client: FhirClient,
    state: ArcSwap<SearchState>,
    sequence: AtomicU64,
}

impl SearchForm {
    pub fn new(client: FhirClient) -> Self {
        Self {
            client,
            state: ArcSwap::from_pointee(SearchState::default()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> Arc<SearchState> {
        self.state.load_full()
    }

    pub fn dispatch(&self, action: SearchAction) -> Arc<SearchState> {
        self.state.rcu(|s| s.reduce(action.clone()));
        self.state()
    }

    pub fn set_filters(&self, filters: SearchFilters) -> Arc<SearchState> {
        self.dispatch(SearchAction::SetFilters(filters))
    }

    /// First page shown when the view opens
    pub async fn load_initial(&self) -> SearchOutcome {
        self.run(SearchQuery::initial_patients().into()).await
    }

    /// Search with the current filters
    pub async fn submit(&self) -> SearchOutcome {
        let query = self.state().filters.to_query();
        self.run(query.into()).await
    }

    pub async fn next(&self) -> SearchOutcome {
        match self.state().links.next.clone() {
            Some(link) => self.run(link.into()).await,
            None => SearchOutcome::AtBoundary,
        }
    }

    pub async fn previous(&self) -> SearchOutcome {
        match self.state().links.previous.clone() {
            Some(link) => self.run(link.into()).await,
            None => SearchOutcome::AtBoundary,
        }
    }

    /// Run a search against any target, applying it only if no later search
    /// was issued meanwhile.
    pub async fn run(&self, target: SearchTarget) -> SearchOutcome {
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.apply_if_latest(ticket, SearchAction::Started);

        let result = self.fetch(&target).await;

        let action = match result {
            Ok(bundle) => {
                let rows: Vec<PatientForm> =
                    bundle.patients().iter().map(mapper::from_wire).collect();
                tracing::debug!(%target, rows = rows.len(), "search page loaded");
                SearchAction::Loaded {
                    target: target.clone(),
                    rows,
                    links: PageLinks::from_bundle(&bundle),
                    total: bundle.total,
                }
            }
            Err(e) => SearchAction::Failed(failure_message("search", &e)),
        };

        match self.apply_if_latest(ticket, action) {
            Some(state) => SearchOutcome::Applied(state),
            None => {
                tracing::debug!(ticket, %target, "discarding superseded search response");
                SearchOutcome::Superseded
            }
        }
    }

    /// Reduce `action` into the state only while `ticket` is the latest one
    /// issued. The ticket check runs inside the swap, so a search issued
    /// concurrently either lands first (and this one is dropped) or
    /// overwrites this one afterwards.
    fn apply_if_latest(&self, ticket: u64, action: SearchAction) -> Option<Arc<SearchState>> {
        let mut applied = None;
        self.state.rcu(|current| {
            if self.sequence.load(Ordering::SeqCst) == ticket {
                let next = Arc::new(current.reduce(action.clone()));
                applied = Some(Arc::clone(&next));
                next
            } else {
                applied = None;
                Arc::clone(current)
            }
        });
        applied
    }

    async fn fetch(&self, target: &SearchTarget) -> Result<Bundle> {
        let resp = ensure_ok(self.client.search(target).await?)?;
        Ok(Bundle::from_json_lenient(read_json(resp).await?))
    }
}
