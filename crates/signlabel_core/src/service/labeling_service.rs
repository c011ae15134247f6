//! Labeling use-case service.
//!
//! # Responsibility
//! - Draw the next image for a session from the eligible set.
//! - Validate and enqueue label submissions.
//! - Report progress and per-volunteer statistics.
//!
//! # Invariants
//! - Every submission this service makes invalidates its coverage cache, so
//!   the next draw reflects it. Writes from other processes show up only
//!   once the cache TTL has elapsed.
//! - A rejected submission appends nothing and leaves the session unchanged.
//! - Once a submission is queued, `submit` returns `Ok`. A failed redraw is
//!   carried in the outcome and the session falls back to `HasUser`, so the
//!   labeled image is never left presented.

use crate::catalog::Catalog;
use crate::config::LabelerConfig;
use crate::coverage::cache::{CoverageCache, DEFAULT_COVERAGE_TTL};
use crate::coverage::index::CoverageIndex;
use crate::db::open_db;
use crate::model::category::{CategoryRegistry, SelectionError, SelectionMode};
use crate::model::label::{ImageId, LabelEvent, LabelValidationError};
use crate::repo::label_repo::{RepoError, RepoResult, SqliteLabelStore};
use crate::repo::worker::{PendingWrite, StoreWorker};
use crate::selector::{eligible, pick_random};
use crate::session::{LabelSession, SessionError};
use crate::stats::{Progress, UserStats};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

pub type LabelingResult<T> = Result<T, LabelingError>;

/// Service error for labeling use-cases.
#[derive(Debug)]
pub enum LabelingError {
    Session(SessionError),
    Label(LabelValidationError),
    Selection(SelectionError),
    /// Submitted image is not part of the catalog.
    UnknownImage(ImageId),
    Repo(RepoError),
}

impl Display for LabelingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(err) => write!(f, "{err}"),
            Self::Label(err) => write!(f, "{err}"),
            Self::Selection(err) => write!(f, "{err}"),
            Self::UnknownImage(image) => write!(f, "image is not in the catalog: {image}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LabelingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Label(err) => Some(err),
            Self::Selection(err) => Some(err),
            Self::UnknownImage(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<SessionError> for LabelingError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<LabelValidationError> for LabelingError {
    fn from(value: LabelValidationError) -> Self {
        Self::Label(value)
    }
}

impl From<SelectionError> for LabelingError {
    fn from(value: SelectionError) -> Self {
        Self::Selection(value)
    }
}

impl From<RepoError> for LabelingError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Tunables for one service instance.
#[derive(Debug, Clone)]
pub struct LabelingOptions {
    pub mode: SelectionMode,
    pub coverage_ttl: Duration,
    pub categories: CategoryRegistry,
    /// Fixed seed for reproducible draws; entropy-seeded when `None`.
    pub rng_seed: Option<u64>,
}

impl Default for LabelingOptions {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            coverage_ttl: DEFAULT_COVERAGE_TTL,
            categories: CategoryRegistry::default(),
            rng_seed: None,
        }
    }
}

/// One accepted submission.
///
/// `pending` can be awaited for the store acknowledgement or dropped.
#[derive(Debug)]
pub struct Submission {
    pub event: LabelEvent,
    pub pending: PendingWrite,
}

/// Result of submitting for the image a session is presenting.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub submission: Submission,
    /// Image now presented, or `None` when the session reached `Done` or
    /// the redraw failed.
    pub next_image: Option<ImageId>,
    /// Error from drawing the next image after the write was queued.
    pub redraw_error: Option<LabelingError>,
}

/// Labeling facade over the store worker, catalog and coverage cache.
pub struct LabelingService {
    worker: StoreWorker,
    catalog: Catalog,
    categories: CategoryRegistry,
    mode: SelectionMode,
    coverage: CoverageCache,
    rng: StdRng,
}

impl LabelingService {
    pub fn new(worker: StoreWorker, catalog: Catalog, options: LabelingOptions) -> Self {
        let rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            worker,
            catalog,
            categories: options.categories,
            mode: options.mode,
            coverage: CoverageCache::new(options.coverage_ttl),
            rng,
        }
    }

    /// Builds a service from a config: SQLite store at `db_path`, catalog
    /// from the configured source (empty when it cannot be loaded).
    pub fn open(config: &LabelerConfig) -> LabelingResult<Self> {
        let db_path = config.db_path.clone();
        let worker = StoreWorker::spawn(move || -> RepoResult<SqliteLabelStore> {
            SqliteLabelStore::try_new(open_db(&db_path)?)
        })?;
        let catalog = Catalog::load_or_empty(&config.catalog);
        let options = LabelingOptions {
            mode: config.selection_mode,
            coverage_ttl: config.coverage_ttl(),
            ..LabelingOptions::default()
        };
        Ok(Self::new(worker, catalog, options))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Drops the memoized coverage so the next read hits the store.
    pub fn refresh(&mut self) {
        self.coverage.invalidate();
    }

    /// Coverage index, served from cache while it is fresh.
    pub fn coverage(&mut self) -> LabelingResult<&CoverageIndex> {
        self.coverage_at(Instant::now())
    }

    /// Same as `coverage`, with an explicit clock reading.
    pub fn coverage_at(&mut self, now: Instant) -> LabelingResult<&CoverageIndex> {
        Ok(refreshed_index(&mut self.coverage, &self.worker, now)?)
    }

    /// Catalog images still below the completion threshold.
    pub fn eligible_images(&mut self) -> LabelingResult<Vec<ImageId>> {
        let index = refreshed_index(&mut self.coverage, &self.worker, Instant::now())?;
        Ok(eligible(self.catalog.images(), index))
    }

    /// Draws one eligible image, or `None` when all are complete.
    pub fn next_image(&mut self) -> LabelingResult<Option<ImageId>> {
        let candidates = self.eligible_images()?;
        Ok(pick_random(&candidates, &mut self.rng))
    }

    /// Logs a volunteer in; a blank name leaves the session in `NoUser`.
    pub fn login(&self, session: &mut LabelSession, name: &str) -> LabelingResult<()> {
        let session_id = session.id();
        match session.login(name) {
            Ok(user) => {
                info!("event=session_login module=service status=ok session={session_id} user={user}");
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=session_login module=service status=rejected session={session_id} error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Returns the image the session should show, drawing one if needed.
    ///
    /// Keeps an already presented image; otherwise moves the session to
    /// `Presenting` or `Done`.
    pub fn present(&mut self, session: &mut LabelSession) -> LabelingResult<Option<ImageId>> {
        if session.user().is_none() {
            return Err(SessionError::NotLoggedIn.into());
        }
        if let Some(image) = session.current_image() {
            return Ok(Some(image.to_string()));
        }
        self.advance(session)
    }

    /// Replaces the presented image with a fresh draw.
    ///
    /// The redraw may return the same image.
    pub fn skip(&mut self, session: &mut LabelSession) -> LabelingResult<Option<ImageId>> {
        let (_, skipped) = session.presented()?;
        info!(
            "event=image_skip module=service status=ok session={} image={skipped}",
            session.id()
        );
        self.advance(session)
    }

    /// Validates and enqueues one label event.
    ///
    /// # Errors
    /// - `Label(EmptyUser)` for a blank name.
    /// - `UnknownImage` when `image` is not in the catalog.
    /// - `Selection` for unknown categories or a cardinality mismatch.
    pub fn submit_label<I, S>(
        &mut self,
        user: &str,
        image: &str,
        categories: I,
    ) -> LabelingResult<Submission>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let user = user.trim();
        if user.is_empty() {
            return Err(LabelValidationError::EmptyUser.into());
        }
        if !self.catalog.contains(image) {
            return Err(LabelingError::UnknownImage(image.to_string()));
        }
        let keys = self.categories.validate_selection(self.mode, categories)?;

        let event = LabelEvent::new(user, image, keys);
        let pending = self.worker.submit(event.clone());
        self.coverage.invalidate();
        info!(
            "event=label_submit module=service status=queued user={} image={} categories={}",
            event.user,
            event.image,
            event.categories.len()
        );
        Ok(Submission { event, pending })
    }

    /// Submits for the presented image and advances the session.
    pub fn submit(
        &mut self,
        session: &mut LabelSession,
        categories: &[String],
    ) -> LabelingResult<SubmitOutcome> {
        let (user, image) = session.presented()?;
        let (user, image) = (user.to_string(), image.to_string());

        let submission = self.submit_label(&user, &image, categories)?;
        let (next_image, redraw_error) = match self.advance(session) {
            Ok(next) => (next, None),
            Err(err) => {
                session.release_image();
                warn!(
                    "event=image_present module=service status=error session={} error={err}",
                    session.id()
                );
                (None, Some(err))
            }
        };
        Ok(SubmitOutcome {
            submission,
            next_image,
            redraw_error,
        })
    }

    /// Progress over the catalog from the (possibly cached) coverage.
    pub fn progress(&mut self) -> LabelingResult<Progress> {
        let index = refreshed_index(&mut self.coverage, &self.worker, Instant::now())?;
        Ok(Progress::compute(self.catalog.images(), index))
    }

    /// Event count and rank for `user`, read from a fresh snapshot.
    pub fn user_stats(&self, user: &str) -> LabelingResult<UserStats> {
        let rows = self.worker.snapshot()?;
        Ok(UserStats::compute(rows.iter().map(|row| &row.event), user.trim()))
    }

    fn advance(&mut self, session: &mut LabelSession) -> LabelingResult<Option<ImageId>> {
        let next = self.next_image()?;
        session.present(next.clone())?;
        match &next {
            Some(image) => info!(
                "event=image_present module=service status=ok session={} image={image}",
                session.id()
            ),
            None => info!(
                "event=session_done module=service status=ok session={}",
                session.id()
            ),
        }
        Ok(next)
    }
}

fn refreshed_index<'a>(
    coverage: &'a mut CoverageCache,
    worker: &StoreWorker,
    now: Instant,
) -> RepoResult<&'a CoverageIndex> {
    coverage.get_or_refresh(now, || {
        let rows = worker.snapshot()?;
        Ok(CoverageIndex::compute(rows.iter().map(|row| &row.event)))
    })
}
