// ── Derived-field engine ──
//
// Rules declare the fields they read and the fields they write. When a
// watched field changes, the rule is scheduled after its own debounce
// (trailing edge: a new qualifying change restarts only that rule's
// timer). Outputs are merged into the form by direct assignment and fed
// back as changes, so rules may chain.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::values::{FieldValue, FormValues};
use crate::error::CoreError;
use crate::sync::lock;

/// Upper bound on synchronous rule chains triggered by one change.
const MAX_CHAIN_DEPTH: usize = 16;

/// Per-field presentation flags produced by rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    pub hidden: bool,
    pub read_only: bool,
    pub required: bool,
}

/// What a rule's `compute` sees.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// Form values at the time the rule fires.
    pub current: &'a FormValues,
    /// Form values when this rule last fired; `None` on its first run.
    pub previous: Option<&'a FormValues>,
}

impl RuleInput<'_> {
    /// Whether `field` differs from what the rule saw last time. Always
    /// `true` on the first run.
    pub fn changed(&self, field: &str) -> bool {
        self.previous
            .is_none_or(|prev| prev.get(field) != self.current.get(field))
    }
}

/// Output of one rule evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derivation {
    pub values: Vec<(String, FieldValue)>,
    pub flags: Vec<(String, FieldFlags)>,
}

impl Derivation {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.values.push((field.into(), value));
        self
    }

    pub fn flag(mut self, field: impl Into<String>, flags: FieldFlags) -> Self {
        self.flags.push((field.into(), flags));
        self
    }
}

type Compute = Arc<dyn Fn(&RuleInput<'_>) -> Derivation + Send + Sync>;

/// A declarative derivation rule.
#[derive(Clone)]
pub struct DerivationRule {
    name: String,
    depends_on: BTreeSet<String>,
    writes: BTreeSet<String>,
    debounce: Duration,
    compute: Compute,
}

impl DerivationRule {
    /// A rule with no dependencies, no outputs and no debounce.
    ///
    /// `compute` must not fail; numeric parse problems degrade to 0.
    pub fn new(
        name: impl Into<String>,
        compute: impl Fn(&RuleInput<'_>) -> Derivation + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            depends_on: BTreeSet::new(),
            writes: BTreeSet::new(),
            debounce: Duration::ZERO,
            compute: Arc::new(compute),
        }
    }

    pub fn depends_on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn writes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.writes.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn watches_any(&self, changed: &BTreeSet<String>) -> bool {
        !self.depends_on.is_disjoint(changed)
    }
}

impl fmt::Debug for DerivationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivationRule")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("writes", &self.writes)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

/// Values plus rule-produced flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub values: FormValues,
    pub flags: BTreeMap<String, FieldFlags>,
}

impl FormState {
    pub fn flags(&self, field: &str) -> FieldFlags {
        self.flags.get(field).copied().unwrap_or_default()
    }

    /// Required, visible fields without a value.
    pub fn required_missing(&self) -> Vec<String> {
        self.flags
            .iter()
            .filter(|(_, flags)| flags.required && !flags.hidden)
            .filter(|(field, _)| self.values.get(field).is_none_or(FieldValue::is_empty))
            .map(|(field, _)| field.clone())
            .collect()
    }
}

struct Timer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct EngineInner {
    rules: Mutex<Vec<DerivationRule>>,
    state: watch::Sender<FormState>,
    timers: Mutex<HashMap<usize, Timer>>,
    /// What each rule saw when it last fired.
    last_seen: Mutex<HashMap<usize, FormValues>>,
    timer_generation: Mutex<u64>,
}

/// Keeps dependent form fields consistent. One instance per mounted form.
#[derive(Clone)]
pub struct DerivedFieldEngine {
    inner: Arc<EngineInner>,
}

impl Default for DerivedFieldEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DerivedFieldEngine {
    pub fn new() -> Self {
        let (state, _) = watch::channel(FormState::default());
        Self {
            inner: Arc::new(EngineInner {
                rules: Mutex::new(Vec::new()),
                state,
                timers: Mutex::new(HashMap::new()),
                last_seen: Mutex::new(HashMap::new()),
                timer_generation: Mutex::new(0),
            }),
        }
    }

    /// Register a rule.
    ///
    /// Rejects a rule that writes a field it depends on, or a field
    /// another registered rule already writes.
    pub fn register_rule(&self, rule: DerivationRule) -> Result<(), CoreError> {
        if let Some(field) = rule.writes.intersection(&rule.depends_on).next() {
            return Err(CoreError::InvalidRule {
                rule: rule.name.clone(),
                reason: format!("writes '{field}', which it depends on"),
            });
        }
        let mut rules = lock(&self.inner.rules);
        for other in rules.iter() {
            if let Some(field) = rule.writes.intersection(&other.writes).next() {
                return Err(CoreError::InvalidRule {
                    rule: rule.name.clone(),
                    reason: format!("'{field}' is already written by '{}'", other.name),
                });
            }
        }
        debug!(rule = %rule.name, "registered derivation rule");
        rules.push(rule);
        Ok(())
    }

    // ── State access ─────────────────────────────────────────────────

    pub fn state(&self) -> FormState {
        self.inner.state.borrow().clone()
    }

    pub fn values(&self) -> FormValues {
        self.inner.state.borrow().values.clone()
    }

    pub fn flags(&self, field: &str) -> FieldFlags {
        self.inner.state.borrow().flags(field)
    }

    pub fn required_missing(&self) -> Vec<String> {
        self.inner.state.borrow().required_missing()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.inner.state.subscribe()
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Replace the form values without firing any rule (form mount,
    /// switching rows). Pending timers are dropped.
    pub fn load(&self, values: FormValues) {
        self.inner.abort_timers();
        lock(&self.inner.last_seen).clear();
        self.inner.state.send_modify(|s| {
            s.values = values;
            s.flags.clear();
        });
    }

    /// Run every rule once, immediately, against the current values.
    pub fn prime(&self) {
        let count = lock(&self.inner.rules).len();
        for index in 0..count {
            self.inner.run_rule(index, 0);
        }
    }

    /// The form reported `changed` fields; `all_values` is its full state.
    pub fn on_fields_changed<I, S>(&self, changed: I, all_values: FormValues)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let changed: BTreeSet<String> = changed.into_iter().map(Into::into).collect();
        self.inner.state.send_modify(|s| s.values = all_values);
        EngineInner::dispatch(&self.inner, &changed, 0);
    }

    /// Convenience for a single edited field.
    pub fn set_field(&self, field: &str, value: FieldValue) {
        let mut values = self.values();
        values.set(field, value);
        self.on_fields_changed([field], values);
    }

    /// Abort every pending timer. Rules no longer fire afterwards until new
    /// changes arrive.
    pub fn unmount(&self) {
        self.inner.abort_timers();
    }
}

impl EngineInner {
    fn dispatch(this: &Arc<Self>, changed: &BTreeSet<String>, depth: usize) {
        if changed.is_empty() {
            return;
        }
        if depth >= MAX_CHAIN_DEPTH {
            warn!(?changed, "derivation chain too deep, stopping");
            return;
        }
        let due: Vec<(usize, Duration)> = lock(&this.rules)
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.watches_any(changed))
            .map(|(index, rule)| (index, rule.debounce))
            .collect();

        for (index, debounce) in due {
            if debounce.is_zero() {
                this.run_rule(index, depth);
            } else {
                Self::schedule(this, index, debounce);
            }
        }
    }

    /// (Re)start a rule's trailing-edge timer. Without a runtime the rule
    /// runs immediately.
    fn schedule(this: &Arc<Self>, index: usize, debounce: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            this.run_rule(index, 0);
            return;
        };
        let generation = {
            let mut counter = lock(&this.timer_generation);
            *counter += 1;
            *counter
        };
        let weak: Weak<Self> = Arc::downgrade(this);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            let Some(inner) = weak.upgrade() else { return };
            let current = {
                let mut timers = lock(&inner.timers);
                let current = timers.get(&index).is_some_and(|t| t.generation == generation);
                if current {
                    timers.remove(&index);
                }
                current
            };
            if current {
                inner.run_rule(index, 0);
            }
        });

        let previous = lock(&this.timers).insert(index, Timer { generation, handle });
        if let Some(previous) = previous {
            previous.handle.abort();
        }
    }

    fn run_rule(self: &Arc<Self>, index: usize, depth: usize) {
        let Some(rule) = lock(&self.rules).get(index).cloned() else {
            return;
        };

        let current = self.state.borrow().values.clone();
        let previous = lock(&self.last_seen).insert(index, current.clone());
        let derivation = (rule.compute)(&RuleInput {
            current: &current,
            previous: previous.as_ref(),
        });

        let mut written = BTreeSet::new();
        self.state.send_if_modified(|s| {
            let mut modified = false;
            for (field, value) in derivation.values {
                if !rule.writes.contains(&field) {
                    warn!(rule = %rule.name, field = %field, "rule wrote an undeclared field, ignored");
                    continue;
                }
                if s.values.get(&field) != Some(&value) {
                    s.values.set(field.clone(), value);
                    written.insert(field);
                    modified = true;
                }
            }
            for (field, flags) in derivation.flags {
                if s.flags.get(&field) != Some(&flags) {
                    s.flags.insert(field, flags);
                    modified = true;
                }
            }
            modified
        });

        if !written.is_empty() {
            debug!(rule = %rule.name, ?written, "derived fields updated");
            Self::dispatch(self, &written, depth + 1);
        }
    }

    fn abort_timers(&self) {
        for (_, timer) in lock(&self.timers).drain() {
            timer.handle.abort();
        }
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        self.abort_timers();
    }
}
