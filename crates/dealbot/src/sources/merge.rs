use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use super::domain::{PayloadKind, Provider, ProviderPayload, SnapshotField};
use super::mapping::{field_table, lookup_path, select_record};
use super::normalizer::normalize;

/// Precedence rules for combining provider payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Providers consulted in order; providers not listed are ignored.
    pub provider_priority: Vec<Provider>,
    /// Lower rank wins within a provider. Unlisted subtypes rank last.
    pub subtype_rank: HashMap<PayloadKind, u8>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            provider_priority: vec![Provider::Melissa, Provider::Zillow],
            subtype_rank: HashMap::from([
                (PayloadKind::LookupDeeds, 0),
                (PayloadKind::LookupProperty, 1),
                (PayloadKind::PropertyDetails, 0),
                (PayloadKind::MarketData, 1),
            ]),
        }
    }
}

impl MergeConfig {
    pub fn with_priority(mut self, provider_priority: Vec<Provider>) -> Self {
        self.provider_priority = provider_priority;
        self
    }

    fn provider_position(&self, provider: Provider) -> Option<usize> {
        self.provider_priority
            .iter()
            .position(|candidate| *candidate == provider)
    }

    fn rank(&self, kind: PayloadKind) -> u8 {
        self.subtype_rank.get(&kind).copied().unwrap_or(u8::MAX)
    }
}

/// Projects stored provider payloads into a single normalized snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotMerger {
    config: MergeConfig,
}

impl SnapshotMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn merge(&self, payloads: &[ProviderPayload]) -> Snapshot {
        let mut snapshot = Snapshot::default();

        for payload in self.ordered_candidates(payloads) {
            let Some(record) = select_record(payload.subtype, &payload.body) else {
                debug!(
                    provider = payload.source.key(),
                    subtype = payload.subtype.key(),
                    "payload has no usable record"
                );
                continue;
            };

            for (path, field) in field_table(payload.subtype) {
                if snapshot.entries.contains_key(field) {
                    continue;
                }
                let Some(value) = lookup_path(record, path).and_then(|raw| normalize(field.kind(), raw))
                else {
                    continue;
                };
                snapshot.entries.insert(
                    *field,
                    SnapshotEntry {
                        value,
                        provider: payload.source,
                        subtype: payload.subtype,
                        captured_at: payload.captured_at,
                    },
                );
            }
        }

        debug!(
            payloads = payloads.len(),
            fields = snapshot.entries.len(),
            "merged provider snapshot"
        );
        snapshot
    }

    /// Latest payload per (provider, subtype), in precedence order.
    fn ordered_candidates<'a>(&self, payloads: &'a [ProviderPayload]) -> Vec<&'a ProviderPayload> {
        let mut latest: HashMap<(Provider, PayloadKind), &ProviderPayload> = HashMap::new();

        for payload in payloads {
            if payload.subtype.provider() != payload.source {
                warn!(
                    provider = payload.source.key(),
                    subtype = payload.subtype.key(),
                    "skipping payload with foreign subtype"
                );
                continue;
            }
            if self.config.provider_position(payload.source).is_none() {
                continue;
            }

            latest
                .entry((payload.source, payload.subtype))
                .and_modify(|current| {
                    if payload.captured_at > current.captured_at {
                        *current = payload;
                    }
                })
                .or_insert(payload);
        }

        let mut candidates: Vec<_> = latest.into_values().collect();
        candidates.sort_by_key(|payload| {
            (
                self.config.provider_position(payload.source),
                self.config.rank(payload.subtype),
                Reverse(payload.captured_at),
                payload.subtype.key(),
            )
        });
        candidates
    }
}

/// Chosen value for one field, with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub value: Value,
    pub provider: Provider,
    pub subtype: PayloadKind,
    pub captured_at: DateTime<Utc>,
}

/// Merged read-time view of a property. Serializes every known field, absent ones as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: BTreeMap<SnapshotField, SnapshotEntry>,
}

impl Snapshot {
    pub fn get(&self, field: SnapshotField) -> Option<&SnapshotEntry> {
        self.entries.get(&field)
    }

    pub fn value(&self, field: SnapshotField) -> Option<&Value> {
        self.get(field).map(|entry| &entry.value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn view(&self) -> SnapshotView {
        let values = SnapshotField::ordered()
            .into_iter()
            .map(|field| {
                let value = self.value(field).cloned().unwrap_or(Value::Null);
                (field.key(), value)
            })
            .collect();

        let provenance = self
            .entries
            .iter()
            .map(|(field, entry)| {
                (
                    field.key(),
                    Provenance {
                        provider: entry.provider,
                        subtype: entry.subtype,
                        captured_at: entry.captured_at,
                    },
                )
            })
            .collect();

        SnapshotView { values, provenance }
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotView {
    pub values: BTreeMap<&'static str, Value>,
    pub provenance: BTreeMap<&'static str, Provenance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub provider: Provider,
    pub subtype: PayloadKind,
    pub captured_at: DateTime<Utc>,
}
