use dealbot::leads::{
    Buyer, BuyerRepository, Lead, LeadEvent, LeadId, LeadRepository, RepositoryError,
};
use dealbot::sources::ProviderPayload;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct LeadStore {
    leads: HashMap<LeadId, Lead>,
    payloads: HashMap<LeadId, Vec<ProviderPayload>>,
    events: Vec<LeadEvent>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLeadRepository {
    store: Arc<Mutex<LeadStore>>,
}

impl LeadRepository for InMemoryLeadRepository {
    fn insert(&self, lead: Lead) -> Result<Lead, RepositoryError> {
        let mut guard = lock(&self.store)?;
        if guard.leads.contains_key(&lead.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    fn fetch(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        Ok(lock(&self.store)?.leads.get(&id).cloned())
    }

    fn update(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.store)?;
        let slot = guard.leads.get_mut(&lead.id).ok_or(RepositoryError::NotFound)?;
        *slot = lead;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Lead>, RepositoryError> {
        let guard = lock(&self.store)?;
        let mut leads: Vec<Lead> = guard.leads.values().cloned().collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(leads)
    }

    fn delete(&self, id: LeadId) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.store)?;
        if guard.leads.remove(&id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        guard.payloads.remove(&id);
        for event in guard.events.iter_mut().filter(|event| event.lead_id == Some(id)) {
            event.lead_id = None;
        }
        Ok(())
    }

    fn latest_by_phone(&self, phone: &str) -> Result<Option<Lead>, RepositoryError> {
        Ok(self.list()?.into_iter().find(|lead| lead.phone == phone))
    }

    fn store_payload(&self, lead: LeadId, payload: ProviderPayload) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.store)?;
        if !guard.leads.contains_key(&lead) {
            return Err(RepositoryError::NotFound);
        }
        guard.payloads.entry(lead).or_default().push(payload);
        Ok(())
    }

    fn payloads(&self, lead: LeadId) -> Result<Vec<ProviderPayload>, RepositoryError> {
        Ok(lock(&self.store)?
            .payloads
            .get(&lead)
            .cloned()
            .unwrap_or_default())
    }

    fn append_event(&self, event: LeadEvent) -> Result<(), RepositoryError> {
        lock(&self.store)?.events.push(event);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBuyerRepository {
    buyers: Arc<Mutex<Vec<Buyer>>>,
}

impl BuyerRepository for InMemoryBuyerRepository {
    fn insert(&self, buyer: Buyer) -> Result<Buyer, RepositoryError> {
        let mut guard = lock(&self.buyers)?;
        if guard.iter().any(|existing| existing.id == buyer.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(buyer.clone());
        Ok(buyer)
    }

    fn fetch(&self, id: u64) -> Result<Option<Buyer>, RepositoryError> {
        Ok(lock(&self.buyers)?
            .iter()
            .find(|buyer| buyer.id == id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Buyer>, RepositoryError> {
        let mut buyers = lock(&self.buyers)?.clone();
        buyers.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(buyers)
    }

    fn delete(&self, id: u64) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.buyers)?;
        let index = guard
            .iter()
            .position(|buyer| buyer.id == id)
            .ok_or(RepositoryError::NotFound)?;
        guard.remove(index);
        Ok(())
    }
}
