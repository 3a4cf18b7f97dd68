use serde::{Deserialize, Serialize};

use crate::detect::ActivityType;
use crate::{Priority, Severity};

/// A known dangerous (object, activity) pair and the verdict it forces.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CriticalCombination {
    pub object: String,
    pub activity: ActivityType,
    pub severity: Severity,
    pub priority: Priority,
}

const BUILTIN_COMBINATIONS: &[(&str, ActivityType, Severity, Priority)] = &[
    (
        "person",
        ActivityType::WeaponDetection,
        Severity::Critical,
        Priority::High,
    ),
    ("person", ActivityType::Fighting, Severity::High, Priority::High),
    (
        "knife",
        ActivityType::SuspiciousActivity,
        Severity::Critical,
        Priority::High,
    ),
    ("person", ActivityType::Intrusion, Severity::High, Priority::High),
    (
        "car",
        ActivityType::SuspiciousActivity,
        Severity::Medium,
        Priority::Medium,
    ),
    ("person", ActivityType::Theft, Severity::High, Priority::High),
];

/// Ordered lookup table of critical combinations.
///
/// Object labels are tested in the order the spatial detector first observed
/// them; the first label with a table entry for the current activity wins.
#[derive(Clone, Debug, PartialEq)]
pub struct CriticalResolver {
    table: Vec<CriticalCombination>,
}

impl CriticalResolver {
    pub fn builtin() -> Self {
        Self::with_extra(&[])
    }

    /// Built-in table followed by `extra` entries.
    pub fn with_extra(extra: &[CriticalCombination]) -> Self {
        let mut table: Vec<CriticalCombination> = BUILTIN_COMBINATIONS
            .iter()
            .map(|(object, activity, severity, priority)| CriticalCombination {
                object: object.to_string(),
                activity: *activity,
                severity: *severity,
                priority: *priority,
            })
            .collect();
        table.extend(extra.iter().cloned());
        Self { table }
    }

    pub fn entries(&self) -> &[CriticalCombination] {
        &self.table
    }

    pub fn resolve(
        &self,
        object_types: &[String],
        activity: ActivityType,
    ) -> Option<&CriticalCombination> {
        object_types.iter().find_map(|object| {
            self.table
                .iter()
                .find(|combo| combo.object == *object && combo.activity == activity)
        })
    }
}

impl Default for CriticalResolver {
    fn default() -> Self {
        Self::builtin()
    }
}
