// ── Resource families ──
//
// A resource family is the set of cached list queries for one record
// type. `Ledger` names the families the back office exposes; custom
// families can still be built from a raw path.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The record types a mill keeps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Ledger {
    // ── Purchases ────────────────────────────────────────────────────
    PaddyPurchases,
    RicePurchases,
    FrkPurchases,
    GunnyPurchases,

    // ── Sales ────────────────────────────────────────────────────────
    PaddySales,
    RiceSales,
    BranSales,

    // ── Stock movement ───────────────────────────────────────────────
    PaddyInward,
    RiceInward,
    RiceOutward,
    GunnyOutward,

    // ── Registries ───────────────────────────────────────────────────
    Parties,
    Brokers,
    Committee,
    Transporters,

    // ── Milling ──────────────────────────────────────────────────────
    Milling,
}

impl Ledger {
    /// Human label for headings and notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::PaddyPurchases => "Paddy purchase",
            Self::RicePurchases => "Rice purchase",
            Self::FrkPurchases => "FRK purchase",
            Self::GunnyPurchases => "Gunny purchase",
            Self::PaddySales => "Paddy sale",
            Self::RiceSales => "Rice sale",
            Self::BranSales => "Bran sale",
            Self::PaddyInward => "Paddy inward",
            Self::RiceInward => "Rice inward",
            Self::RiceOutward => "Rice outward",
            Self::GunnyOutward => "Gunny outward",
            Self::Parties => "Party",
            Self::Brokers => "Broker",
            Self::Committee => "Committee member",
            Self::Transporters => "Transporter",
            Self::Milling => "Milling entry",
        }
    }

    /// Columns worth showing in a compact table, after the id.
    pub fn summary_fields(self) -> &'static [&'static str] {
        match self {
            Self::PaddyPurchases | Self::RicePurchases | Self::FrkPurchases | Self::GunnyPurchases => {
                &["date", "partyName", "brokerName", "quantity", "rate", "amount"]
            }
            Self::PaddySales | Self::RiceSales | Self::BranSales => {
                &["date", "partyName", "quantity", "rate", "amount"]
            }
            Self::PaddyInward | Self::RiceInward | Self::RiceOutward | Self::GunnyOutward => {
                &["date", "partyName", "truckNumber", "bags", "quantity"]
            }
            Self::Parties | Self::Transporters => &["name", "phone", "gstin", "address"],
            Self::Brokers => &["name", "phone", "commissionRate"],
            Self::Committee => &["name", "village", "phone"],
            Self::Milling => &["date", "paddyQuantity", "riceOutput", "branOutput", "yield"],
        }
    }
}

/// A resource family: the URL segment(s) under `/mills/{mill_id}/` plus a
/// label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    path: String,
    label: String,
}

impl Resource {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            path: path.into().trim_matches('/').to_owned(),
            label: label.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl From<Ledger> for Resource {
    fn from(ledger: Ledger) -> Self {
        let path: &'static str = ledger.into();
        Self::new(path, ledger.label())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
