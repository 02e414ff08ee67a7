// ── Form state and derived fields ──

mod engine;
pub mod rules;
mod values;

pub use engine::{
    Derivation, DerivationRule, DerivedFieldEngine, FieldFlags, FormState, RuleInput,
};
pub use values::{FieldValue, FormValues, Numeric};
