use carecheck::collaborators::{
    CentroidModel, LabelPredictor, ModelLoadError, OfflineGenerator, OllamaGenerator,
    ResponseGenerator,
};
use carecheck::config::{PredictorConfig, ResponderConfig};
use carecheck::screening::{
    RepositoryError, RunId, SessionRecord, SessionStore, SliderAssessment, SliderInventory,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) slider: SliderAssessment,
}

/// Process-local run storage. Records leave only through `remove` or, once
/// `capacity` runs are held, by evicting the least recently touched run on
/// insert. A reset keeps its record since the client carries on with it.
#[derive(Clone)]
pub(crate) struct InMemorySessionStore {
    inner: Arc<Mutex<StoreInner>>,
    capacity: usize,
}

pub(crate) const DEFAULT_STORE_CAPACITY: usize = 10_000;

#[derive(Default)]
struct StoreInner {
    records: HashMap<RunId, (u64, SessionRecord)>,
    clock: u64,
}

impl StoreInner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .records
            .iter()
            .min_by_key(|(_, (touched, _))| *touched)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            debug!(run_id = %id, "evicting least recently used run");
            self.records.remove(&id);
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_STORE_CAPACITY)
    }
}

impl InMemorySessionStore {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner::default())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store mutex poisoned".to_string()))
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.records.contains_key(&record.run_id) {
            return Err(RepositoryError::Conflict);
        }
        if guard.records.len() >= self.capacity {
            guard.evict_oldest();
        }
        let touched = guard.tick();
        guard
            .records
            .insert(record.run_id.clone(), (touched, record.clone()));
        Ok(record)
    }

    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.records.contains_key(&record.run_id) {
            let touched = guard.tick();
            guard
                .records
                .insert(record.run_id.clone(), (touched, record));
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &RunId) -> Result<Option<SessionRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.records.get(id).map(|(_, record)| record.clone()))
    }

    fn remove(&self, id: &RunId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        guard
            .records
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// Pick the response generator for this process. A generator that cannot be
/// built degrades to the offline one, whose failures the responder masks.
pub(crate) fn build_generator(config: &ResponderConfig) -> Arc<dyn ResponseGenerator> {
    if !config.enabled {
        info!("response generation disabled; replies use the fallback line");
        return Arc::new(OfflineGenerator);
    }

    match OllamaGenerator::new(config) {
        Ok(generator) => {
            info!(endpoint = %config.endpoint, model = %config.model, "response generator configured");
            Arc::new(generator)
        }
        Err(error) => {
            warn!(%error, "response generator unavailable; replies use the fallback line");
            Arc::new(OfflineGenerator)
        }
    }
}

/// Load both slider predictors once, falling back to the baseline centroids
/// when no model file is configured.
pub(crate) fn load_slider_assessment(
    config: &PredictorConfig,
) -> Result<SliderAssessment, ModelLoadError> {
    let stress = load_predictor(
        "stress",
        config.stress_model.as_deref(),
        CentroidModel::baseline_stress,
    )?;
    let depression = load_predictor(
        "depression",
        config.depression_model.as_deref(),
        CentroidModel::baseline_depression,
    )?;
    Ok(SliderAssessment::new(stress, depression))
}

fn load_predictor(
    name: &str,
    path: Option<&Path>,
    baseline: fn() -> CentroidModel,
) -> Result<Arc<dyn LabelPredictor>, ModelLoadError> {
    let (model, source) = match path {
        Some(path) => (
            CentroidModel::from_path(name, path)?,
            path.display().to_string(),
        ),
        None => (baseline(), "baseline".to_string()),
    };
    info!(
        model = model.name(),
        %source,
        labels = model.labels().count(),
        "label predictor loaded"
    );
    Ok(Arc::new(model))
}

pub(crate) fn parse_inventory(raw: &str) -> Result<SliderInventory, String> {
    raw.parse()
}
