//! Appliance event-type lookup table.
//!
//! The analytics appliance tags every alarm with a numeric `type` code. Codes
//! `0..=30` map to a fixed category; anything else is unknown and only logged.

/// Event category reported by the appliance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Code 0.
    Loitering,
    /// Code 1.
    PathPass,
    /// Code 2.
    DirectionalMove,
    /// Code 3.
    Enter,
    /// Code 4.
    Exit,
    /// Code 5.
    Stop,
    /// Code 6.
    Abandoned,
    /// Code 7.
    LineCross,
    /// Code 8.
    Smoke,
    /// Code 9.
    Flame,
    /// Code 10.
    FallDown,
    /// Code 11.
    Crowd,
    /// Code 12.
    Violence,
    /// Code 13.
    MultiLineCross,
    /// Code 14.
    VehicleAccident,
    /// Code 15.
    VehicleStop,
    /// Code 16.
    TrafficJam,
    /// Code 17.
    ColorChange,
    /// Code 18.
    VehicleParking,
    /// Code 19.
    Removed,
    /// Code 20.
    DangerWaterLevel,
    /// Code 21.
    AreaColor,
    /// Code 22.
    Stay,
    /// Code 23.
    StayOverCount,
    /// Code 24.
    StayOverTime,
    /// Code 25.
    StayAlone,
    /// Code 26.
    NoHelmet,
    /// Code 27.
    LeftAlone,
    /// Code 28.
    Approach,
    /// Code 29.
    Separated,
    /// Code 30.
    ActionRecognition,
}

/// `(category, english label, appliance label)` indexed by code.
const TABLE: [(EventCategory, &str, &str); 31] = [
    (EventCategory::Loitering, "loitering", "배회"),
    (EventCategory::PathPass, "path pass", "경로 통과"),
    (EventCategory::DirectionalMove, "directional move", "방향성 이동"),
    (EventCategory::Enter, "enter", "진입"),
    (EventCategory::Exit, "exit", "진출"),
    (EventCategory::Stop, "stop", "멈춤"),
    (EventCategory::Abandoned, "abandoned", "버려짐"),
    (EventCategory::LineCross, "line cross", "경계선 통과"),
    (EventCategory::Smoke, "smoke", "연기"),
    (EventCategory::Flame, "flame", "불꽃"),
    (EventCategory::FallDown, "fall down", "쓰러짐"),
    (EventCategory::Crowd, "crowd", "군집"),
    (EventCategory::Violence, "violence", "폭력"),
    (EventCategory::MultiLineCross, "multi line cross", "멀티 경계선 통과"),
    (EventCategory::VehicleAccident, "vehicle accident", "차량 사고"),
    (EventCategory::VehicleStop, "vehicle stop", "차량 멈춤"),
    (EventCategory::TrafficJam, "traffic jam", "교통 정체"),
    (EventCategory::ColorChange, "color change", "색상 변화"),
    (EventCategory::VehicleParking, "vehicle parking", "차량 주차"),
    (EventCategory::Removed, "removed", "제거됨"),
    (EventCategory::DangerWaterLevel, "danger water level", "위험수위"),
    (EventCategory::AreaColor, "area color", "영역색상"),
    (EventCategory::Stay, "stay", "체류"),
    (EventCategory::StayOverCount, "stay over count", "체류-초과인원"),
    (EventCategory::StayOverTime, "stay over time", "체류-시간초과"),
    (EventCategory::StayAlone, "stay alone", "체류-단독인원체류"),
    (EventCategory::NoHelmet, "no helmet", "안전모 미착용"),
    (EventCategory::LeftAlone, "left alone", "홀로 남겨짐"),
    (EventCategory::Approach, "approach", "접근"),
    (EventCategory::Separated, "separated", "따로 떨어짐"),
    (EventCategory::ActionRecognition, "action recognition", "행동인식"),
];

impl EventCategory {
    /// Look up a category by appliance code.
    pub fn from_code(code: i64) -> Option<Self> {
        let idx = usize::try_from(code).ok()?;
        TABLE.get(idx).map(|(cat, _, _)| *cat)
    }

    /// Appliance code for this category.
    #[allow(clippy::cast_possible_wrap)]
    pub fn code(self) -> i64 {
        // Table order matches declaration order.
        self as i64
    }

    /// English label.
    pub fn label(self) -> &'static str {
        TABLE[self as usize].1
    }

    /// Label as shown by the appliance UI.
    pub fn appliance_label(self) -> &'static str {
        TABLE[self as usize].2
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_codes() {
        for (idx, (cat, _, _)) in TABLE.iter().enumerate() {
            assert_eq!(cat.code(), idx as i64, "{cat:?} out of order");
        }
    }

    #[test]
    fn every_known_code_has_nonempty_stable_labels() {
        for code in 0..=30 {
            let cat = EventCategory::from_code(code).unwrap();
            assert!(!cat.label().is_empty());
            assert!(!cat.appliance_label().is_empty());
            assert_eq!(EventCategory::from_code(code).unwrap().label(), cat.label());
        }
    }

    #[test]
    fn unknown_codes_yield_none() {
        assert_eq!(EventCategory::from_code(31), None);
        assert_eq!(EventCategory::from_code(-1), None);
        assert_eq!(EventCategory::from_code(i64::MAX), None);
    }

    #[test]
    fn specific_lookups() {
        assert_eq!(EventCategory::from_code(0), Some(EventCategory::Loitering));
        assert_eq!(EventCategory::from_code(9), Some(EventCategory::Flame));
        assert_eq!(EventCategory::from_code(30).unwrap().label(), "action recognition");
        assert_eq!(EventCategory::Smoke.appliance_label(), "연기");
    }

    #[test]
    fn labels_are_distinct() {
        let mut labels: Vec<&str> = TABLE.iter().map(|(_, en, _)| *en).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 31);
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(EventCategory::NoHelmet.to_string(), "no helmet");
    }
}
