use crate::config::FusionConfig;
use crate::detect::ActivityType;

pub const NORMAL: &str = "normal";

/// Resolve one canonical anomaly label, first match wins.
pub fn resolve_type(
    cfg: &FusionConfig,
    object_types: &[String],
    activity: ActivityType,
    has_anomaly: bool,
) -> String {
    if !has_anomaly {
        return NORMAL.to_string();
    }

    let has_weapon = object_types.iter().any(|object| cfg.is_weapon(object));
    let has_person = object_types.iter().any(|object| *object == cfg.person_label);

    let label = match activity {
        _ if activity == ActivityType::WeaponDetection || has_weapon => "weapon_detected",
        ActivityType::Fighting => "violent_behavior",
        ActivityType::Theft => "theft_detected",
        ActivityType::Intrusion => "unauthorized_access",
        ActivityType::SuspiciousActivity if has_person => "suspicious_person_behavior",
        ActivityType::Running => "rapid_movement",
        ActivityType::Loitering => "loitering_detected",
        _ => {
            return match object_types.first() {
                Some(object) => format!("suspicious_object_{object}"),
                None => activity.as_str().to_string(),
            };
        }
    };
    label.to_string()
}
