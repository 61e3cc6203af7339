//! The engine/session object.
//!
//! `ReviewEngine` owns the in-memory thesis and review collections and the
//! applied-patch-id set, and drives every mutation through the lifecycle
//! rules. It is constructed explicitly from a [`ReviewStore`]; there are
//! no ambient singletons.
//!
//! Single-writer semantics: mutating operations on the same thesis must be
//! serialized by the caller. Reads may run concurrently with each other.
//! Storage is called synchronously and treated as fallible; when a storage
//! write fails, the in-memory state is left unmodified.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use tr_common::{Error, KpiId, PatchId, Result, ReviewId, ThesisId, Week};

use crate::lifecycle::{normalize, recompute, seed_draft};
use crate::model::review::WeeklyReview;
use crate::model::thesis::{KpiDefinition, Thesis};
use crate::patch::apply::{build_review, PatchOutcome};
use crate::patch::validate::{validate, PatchValidation};
use crate::patch::PatchResolver;
use crate::store::ReviewStore;

/// In-memory aggregate state of one engine session.
#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) theses: BTreeMap<ThesisId, Thesis>,
    pub(crate) reviews: BTreeMap<ReviewId, WeeklyReview>,
    /// Patch id → review it reconciled into. Rebuilt from persisted
    /// reviews on load, appended to on every successful apply.
    pub(crate) applied_patches: BTreeMap<PatchId, ReviewId>,
}

impl EngineState {
    fn review_id_for(&self, thesis_id: &ThesisId, week: Week) -> Option<ReviewId> {
        self.reviews
            .values()
            .find(|r| &r.thesis_id == thesis_id && r.week == week)
            .map(|r| r.id.clone())
    }
}

impl PatchResolver for EngineState {
    fn thesis(&self, id: &ThesisId) -> Option<&Thesis> {
        self.theses.get(id)
    }

    fn review_for(&self, thesis_id: &ThesisId, week: Week) -> Option<&WeeklyReview> {
        self.reviews
            .values()
            .find(|r| &r.thesis_id == thesis_id && r.week == week)
    }
}

/// Thesis registry, review lifecycle, and patch reconciliation engine.
pub struct ReviewEngine<S: ReviewStore> {
    store: S,
    state: EngineState,
}

impl<S: ReviewStore> ReviewEngine<S> {
    /// Build a session from storage. Reviews are normalized against their
    /// thesis's current definitions (dangling KPI readings are dropped)
    /// and every derived field is recomputed rather than trusted verbatim.
    /// Reviews whose thesis no longer exists are skipped.
    pub fn load(store: S) -> Result<Self> {
        let mut state = EngineState::default();

        for thesis in store.load_theses()? {
            thesis.validate_kpi_lists()?;
            state.theses.insert(thesis.id.clone(), thesis);
        }

        for mut review in store.load_reviews()? {
            let Some(thesis) = state.theses.get(&review.thesis_id) else {
                warn!(review_id = %review.id, thesis_id = %review.thesis_id,
                      "skipping review for unknown thesis");
                continue;
            };
            normalize(&mut review, thesis);
            recompute(&mut review, thesis);
            if let Some(patch_id) = &review.patch_id {
                state
                    .applied_patches
                    .insert(patch_id.clone(), review.id.clone());
            }
            state.reviews.insert(review.id.clone(), review);
        }

        info!(
            theses = state.theses.len(),
            reviews = state.reviews.len(),
            applied_patches = state.applied_patches.len(),
            "engine session loaded"
        );
        Ok(ReviewEngine { store, state })
    }

    pub(crate) fn state(&self) -> &EngineState {
        &self.state
    }

    /// Consume the engine and hand back its store.
    pub fn into_store(self) -> S {
        self.store
    }

    // ── Thesis / KPI registry ───────────────────────────────────────────

    /// Create a thesis or replace its full field set. Existing reviews of
    /// the thesis are reconciled against the replacement definitions, so a
    /// changed range set or primary flag is reflected in their derived
    /// statuses immediately, not at the next load.
    pub fn upsert_thesis(&mut self, thesis: Thesis) -> Result<()> {
        thesis.validate_kpi_lists()?;
        self.store.upsert_thesis(&thesis)?;
        info!(thesis_id = %thesis.id, "thesis upserted");
        let thesis_id = thesis.id.clone();
        self.state.theses.insert(thesis_id.clone(), thesis);
        self.renormalize_thesis_reviews(&thesis_id);
        Ok(())
    }

    /// Delete a thesis, cascading to its reviews and their patch ids.
    pub fn delete_thesis(&mut self, thesis_id: &ThesisId) -> Result<()> {
        if !self.state.theses.contains_key(thesis_id) {
            return Err(Error::ThesisNotFound {
                thesis_id: thesis_id.to_string(),
            });
        }
        self.store.delete_thesis(thesis_id)?;
        self.state.theses.remove(thesis_id);
        let removed: Vec<ReviewId> = self
            .state
            .reviews
            .values()
            .filter(|r| &r.thesis_id == thesis_id)
            .map(|r| r.id.clone())
            .collect();
        for id in &removed {
            self.state.reviews.remove(id);
        }
        self.state
            .applied_patches
            .retain(|_, rid| !removed.contains(rid));
        info!(thesis_id = %thesis_id, reviews = removed.len(), "thesis deleted");
        Ok(())
    }

    /// Add a KPI to a thesis, subject to the cardinality caps.
    pub fn add_kpi(&mut self, thesis_id: &ThesisId, kpi: KpiDefinition) -> Result<()> {
        let thesis = self.thesis_or_err(thesis_id)?;
        if thesis.kpi(&kpi.id).is_some() {
            return Err(Error::DuplicateKpiId {
                kpi_id: kpi.id.to_string(),
            });
        }
        thesis.check_kpi_capacity(kpi.is_primary, None)?;
        self.store.upsert_kpi(thesis_id, &kpi)?;
        self.state
            .theses
            .get_mut(thesis_id)
            .expect("checked above")
            .kpis
            .push(kpi);
        Ok(())
    }

    /// Edit a KPI in place. Moving it between the primary and secondary
    /// lists re-checks the destination cap.
    pub fn update_kpi(&mut self, thesis_id: &ThesisId, kpi: KpiDefinition) -> Result<()> {
        let thesis = self.thesis_or_err(thesis_id)?;
        if thesis.kpi(&kpi.id).is_none() {
            return Err(Error::KpiNotFound {
                thesis_id: thesis_id.to_string(),
                kpi_id: kpi.id.to_string(),
            });
        }
        thesis.check_kpi_capacity(kpi.is_primary, Some(&kpi.id))?;
        self.store.upsert_kpi(thesis_id, &kpi)?;
        let thesis = self.state.theses.get_mut(thesis_id).expect("checked above");
        if let Some(slot) = thesis.kpis.iter_mut().find(|k| k.id == kpi.id) {
            *slot = kpi;
        }
        // Ranges may have changed; re-derive statuses of this thesis's
        // reviews so nothing is classified against stale bands.
        self.renormalize_thesis_reviews(thesis_id);
        Ok(())
    }

    /// Remove a KPI from its thesis and strip any reading referencing it
    /// from every review of that thesis.
    pub fn delete_kpi(&mut self, thesis_id: &ThesisId, kpi_id: &KpiId) -> Result<()> {
        let thesis = self.thesis_or_err(thesis_id)?;
        if thesis.kpi(kpi_id).is_none() {
            return Err(Error::KpiNotFound {
                thesis_id: thesis_id.to_string(),
                kpi_id: kpi_id.to_string(),
            });
        }
        self.store.delete_kpi(thesis_id, kpi_id)?;
        let thesis = self.state.theses.get_mut(thesis_id).expect("checked above");
        thesis.kpis.retain(|k| &k.id != kpi_id);

        let thesis = self.state.theses.get(thesis_id).expect("checked above").clone();
        let affected: Vec<ReviewId> = self
            .state
            .reviews
            .values()
            .filter(|r| r.thesis_id == thesis.id && r.reading(kpi_id).is_some())
            .map(|r| r.id.clone())
            .collect();
        for id in affected {
            let mut review = self.state.reviews.get(&id).expect("indexed above").clone();
            normalize(&mut review, &thesis);
            recompute(&mut review, &thesis);
            self.store.upsert_review(&review)?;
            self.state.reviews.insert(id, review);
        }
        debug!(thesis_id = %thesis_id, kpi_id = %kpi_id, "KPI deleted and readings stripped");
        Ok(())
    }

    // ── Review lifecycle ────────────────────────────────────────────────

    /// Start (or resume) the draft review for `(thesis_id, week)`.
    ///
    /// If a review already exists for the key it is returned re-normalized
    /// against the thesis's current definitions; otherwise a fresh draft
    /// is seeded from those definitions and persisted.
    pub fn start_draft(&mut self, thesis_id: &ThesisId, week: Week) -> Result<WeeklyReview> {
        let thesis = self.thesis_or_err(thesis_id)?.clone();

        if let Some(id) = self.state.review_id_for(thesis_id, week) {
            let mut review = self.state.reviews.get(&id).expect("indexed above").clone();
            normalize(&mut review, &thesis);
            recompute(&mut review, &thesis);
            self.state.reviews.insert(id, review.clone());
            return Ok(review);
        }

        let draft = seed_draft(&thesis, week, Utc::now());
        self.store.upsert_review(&draft)?;
        self.state.reviews.insert(draft.id.clone(), draft.clone());
        debug!(thesis_id = %thesis_id, week = %week, review_id = %draft.id, "draft started");
        Ok(draft)
    }

    /// Save a review, optionally finalizing it.
    ///
    /// Fails with `ReviewAlreadyFinalized` when the stored review for the
    /// same `(thesis_id, week)` is finalized, and with
    /// `PrimaryKpiIncomplete` when `finalize` is requested while primary
    /// KPIs lack values; neither failure mutates any state. Every KPI
    /// status, the status lists, and all derived fields are recomputed
    /// before the review is committed.
    pub fn save_review(&mut self, review: WeeklyReview, finalize: bool) -> Result<WeeklyReview> {
        let thesis = self.thesis_or_err(&review.thesis_id)?.clone();

        let mut candidate = review;
        if let Some(existing) = self.state.review_for(&candidate.thesis_id, candidate.week) {
            if existing.is_finalized() {
                return Err(Error::ReviewAlreadyFinalized {
                    review_id: existing.id.to_string(),
                    week: existing.week.to_string(),
                });
            }
            // One review per natural key: an incoming save for the same
            // week updates the stored review whatever id it carries.
            candidate.id = existing.id.clone();
            candidate.created_at = existing.created_at;
        }

        normalize(&mut candidate, &thesis);
        recompute(&mut candidate, &thesis);

        if finalize && !candidate.missing_primary_kpis.is_empty() {
            return Err(Error::PrimaryKpiIncomplete {
                missing: candidate
                    .missing_primary_kpis
                    .iter()
                    .map(|k| k.to_string())
                    .collect(),
            });
        }
        candidate.finalized_at = finalize.then(Utc::now);

        self.store.upsert_review(&candidate)?;
        self.state
            .reviews
            .insert(candidate.id.clone(), candidate.clone());
        if let Some(patch_id) = &candidate.patch_id {
            self.state
                .applied_patches
                .insert(patch_id.clone(), candidate.id.clone());
        }
        debug!(review_id = %candidate.id, finalize, "review saved");
        Ok(candidate)
    }

    /// Unlock a finalized review back to draft. Returns `false` when the
    /// review does not exist; no other field changes.
    pub fn unlock(&mut self, review_id: &ReviewId) -> Result<bool> {
        let Some(review) = self.state.reviews.get(review_id) else {
            return Ok(false);
        };
        let mut review = review.clone();
        review.finalized_at = None;
        self.store.upsert_review(&review)?;
        info!(review_id = %review_id, "review unlocked");
        self.state.reviews.insert(review_id.clone(), review);
        Ok(true)
    }

    // ── Patch ingestion ─────────────────────────────────────────────────

    /// Validate a raw patch document without mutating anything.
    pub fn validate_patch(&self, raw: &str) -> PatchValidation {
        validate(raw, &self.state)
    }

    /// Validate and reconcile a raw patch document into the review
    /// history, exactly once per patch id.
    ///
    /// Domain failures are reported inside the returned outcome; `Err` is
    /// reserved for storage failures.
    pub fn apply_patch(&mut self, raw: &str, finalize: bool) -> Result<PatchOutcome> {
        let mut validation = self.validate_patch(raw);
        if !validation.is_valid() {
            return Ok(PatchOutcome::rejected(validation));
        }
        let patch = validation.patch.clone().expect("valid implies parsed");

        if let Some(review_id) = self.state.applied_patches.get(&patch.patch_id) {
            info!(patch_id = %patch.patch_id, "duplicate patch delivery ignored");
            let review = self.state.reviews.get(review_id).cloned();
            return Ok(PatchOutcome::duplicate(validation, review));
        }

        let thesis_id = ThesisId::from(patch.thesis_id.as_str());
        let thesis = self
            .state
            .theses
            .get(&thesis_id)
            .expect("valid implies known thesis")
            .clone();
        let week: Week = patch.week.parse().expect("valid implies parseable week");
        let existing = self.state.review_for(&thesis_id, week).cloned();

        let mut candidate = build_review(&patch, &thesis, week, existing.as_ref(), Utc::now());

        if finalize && !candidate.missing_primary_kpis.is_empty() {
            let err = Error::PrimaryKpiIncomplete {
                missing: candidate
                    .missing_primary_kpis
                    .iter()
                    .map(|k| k.to_string())
                    .collect(),
            };
            validation.errors.push(err.to_string());
            return Ok(PatchOutcome::rejected(validation));
        }

        if let Some(existing) = &existing {
            if existing.is_finalized() {
                validation.errors.push(format!(
                    "review {} for week {} is already finalized; unlock it before re-applying",
                    existing.id, existing.week
                ));
                return Ok(PatchOutcome::rejected(validation));
            }
        }

        if finalize {
            candidate.finalized_at = Some(Utc::now());
        }

        self.store.upsert_review(&candidate)?;
        self.state
            .reviews
            .insert(candidate.id.clone(), candidate.clone());
        self.state
            .applied_patches
            .insert(patch.patch_id.clone(), candidate.id.clone());
        info!(
            patch_id = %patch.patch_id,
            review_id = %candidate.id,
            week = %candidate.week,
            overall = %candidate.overall_status,
            "patch applied"
        );
        Ok(PatchOutcome::applied(validation, candidate))
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn thesis_or_err(&self, thesis_id: &ThesisId) -> Result<&Thesis> {
        self.state
            .theses
            .get(thesis_id)
            .ok_or_else(|| Error::ThesisNotFound {
                thesis_id: thesis_id.to_string(),
            })
    }

    fn renormalize_thesis_reviews(&mut self, thesis_id: &ThesisId) {
        let Some(thesis) = self.state.theses.get(thesis_id).cloned() else {
            return;
        };
        for review in self
            .state
            .reviews
            .values_mut()
            .filter(|r| &r.thesis_id == thesis_id)
        {
            normalize(review, &thesis);
            recompute(review, &thesis);
        }
    }
}
