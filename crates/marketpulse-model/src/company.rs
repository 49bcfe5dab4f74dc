// SPDX-License-Identifier: Apache-2.0

use crate::columns::{
    COL_CURRENT_PRICE, COL_DATE, COL_INDUSTRY, COL_MARKET_CAP, COL_SECTOR, COL_SHORT_NAME,
    COL_SYMBOL, COL_WEIGHT,
};
use crate::layout::INDEX_VALUE_ALIAS;
use crate::table::Record;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub symbol: String,
    pub short_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub weight: Option<f64>,
}

impl Company {
    /// Typed view of a company listing row; `None` without a text Symbol.
    #[must_use]
    pub fn from_record(record: &Record<'_>) -> Option<Self> {
        let text = |name: &str| record.get(name).and_then(|c| c.as_str()).map(str::to_string);
        let number = |name: &str| record.get(name).and_then(|c| c.as_f64());
        Some(Self {
            symbol: text(COL_SYMBOL)?,
            short_name: text(COL_SHORT_NAME),
            sector: text(COL_SECTOR),
            industry: text(COL_INDUSTRY),
            current_price: number(COL_CURRENT_PRICE),
            market_cap: number(COL_MARKET_CAP),
            weight: number(COL_WEIGHT),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHistoryPoint {
    pub date: String,
    pub value: Option<f64>,
}

impl IndexHistoryPoint {
    #[must_use]
    pub fn from_record(record: &Record<'_>) -> Option<Self> {
        Some(Self {
            date: record.get(COL_DATE)?.as_str()?.to_string(),
            value: record.get(INDEX_VALUE_ALIAS).and_then(|c| c.as_f64()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorStats {
    pub sector: String,
    pub n_companies: u64,
    pub avg_marketcap: Option<f64>,
    pub total_weight: f64,
}

/// Symbols are stored verbatim and matched uppercase.
#[must_use]
pub fn normalize_symbol(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

#[derive(Default)]
struct SectorAccumulator<'a> {
    symbols: BTreeSet<&'a str>,
    market_cap_sum: f64,
    market_cap_n: u64,
    weight_sum: f64,
}

/// Groups companies by sector. Rows without a sector belong to no group;
/// missing market caps and weights are skipped rather than counted as zero.
/// Output is ordered by sector name.
#[must_use]
pub fn compute_sector_stats(companies: &[Company]) -> Vec<SectorStats> {
    let mut groups: BTreeMap<&str, SectorAccumulator<'_>> = BTreeMap::new();
    for c in companies {
        let Some(sector) = c.sector.as_deref() else {
            continue;
        };
        let acc = groups.entry(sector).or_default();
        acc.symbols.insert(c.symbol.as_str());
        if let Some(cap) = c.market_cap {
            acc.market_cap_sum += cap;
            acc.market_cap_n += 1;
        }
        if let Some(w) = c.weight {
            acc.weight_sum += w;
        }
    }
    groups
        .into_iter()
        .map(|(sector, acc)| SectorStats {
            sector: sector.to_string(),
            n_companies: acc.symbols.len() as u64,
            avg_marketcap: (acc.market_cap_n > 0)
                .then(|| acc.market_cap_sum / acc.market_cap_n as f64),
            total_weight: acc.weight_sum,
        })
        .collect()
}
