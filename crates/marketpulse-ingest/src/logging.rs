// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStage {
    Prepare,
    Decode,
    Persist,
    Finalize,
}

impl LoadStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Decode => "decode",
            Self::Persist => "persist",
            Self::Finalize => "finalize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadEvent {
    pub stage: LoadStage,
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

/// Ordered record of a load run; every event is mirrored to `tracing`.
#[derive(Debug, Default, Clone)]
pub struct LoadLog {
    events: Vec<LoadEvent>,
}

impl LoadLog {
    pub fn emit(&mut self, stage: LoadStage, name: impl Into<String>, fields: BTreeMap<String, String>) {
        let name = name.into();
        tracing::info!(stage = stage.as_str(), event = %name, fields = ?fields, "load event");
        self.events.push(LoadEvent {
            stage,
            name,
            fields,
        });
    }

    #[must_use]
    pub fn into_events(self) -> Vec<LoadEvent> {
        self.events
    }
}

pub(crate) fn fields<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
