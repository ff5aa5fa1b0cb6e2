// zcl-campaign/src/selection.rs
// ============================================================================
// Module: Mission Selection
// Description: Resolves `missionSource.selection` plus the
//              `(missionOffset, totalMissions)` window (§4.J step 2).
// Purpose: Produce the exact, ordered set of missions a campaign run will
//          attempt, independent of the Suite Runner's own per-attempt
//          single-mission slicing.
// Dependencies: zcl-core
// ============================================================================

//! ## Overview
//! Selection filters the suite's declared mission order down to the
//! `selection` predicate (whole suite, explicit indexes, or tag match), then
//! slices that filtered sequence with the offset/window — `missionOffset`
//! and `totalMissions` apply to the *selected* subset, not
//! [`zcl_core::model::Suite::window`], which only ever slices the
//! unfiltered suite.

// ============================================================================
// SECTION: Imports
// ============================================================================

use zcl_core::model::Mission;
use zcl_core::model::MissionSelection;
use zcl_core::model::MissionSourceConfig;
use zcl_core::model::Suite;

use crate::error::CampaignError;

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Resolves the ordered window of missions a run will attempt.
///
/// # Errors
///
/// Returns [`CampaignError::Usage`] if the selection-then-window result is
/// empty.
pub fn select<'suite>(
    suite: &'suite Suite,
    source: &MissionSourceConfig,
) -> Result<Vec<&'suite Mission>, CampaignError> {
    let filtered = filter(suite, &source.selection);

    let offset = usize::try_from(source.mission_offset).unwrap_or(usize::MAX);
    let total = source.total_missions.map_or(usize::MAX, |total| usize::try_from(total).unwrap_or(usize::MAX));
    let window: Vec<&Mission> = filtered.into_iter().skip(offset).take(total).collect();

    if window.is_empty() {
        return Err(CampaignError::Usage(format!(
            "mission selection produced an empty window (offset={offset}, total_missions={:?})",
            source.total_missions
        )));
    }
    Ok(window)
}

/// Filters `suite.missions` down to those matching `selection`, preserving
/// the suite's declared order.
fn filter<'suite>(suite: &'suite Suite, selection: &MissionSelection) -> Vec<&'suite Mission> {
    match selection {
        MissionSelection::Whole => suite.missions.iter().collect(),
        MissionSelection::Indexes(indexes) => suite
            .missions
            .iter()
            .filter(|mission| indexes.contains(&mission.mission_index.0))
            .collect(),
        MissionSelection::Tags(tags) => suite
            .missions
            .iter()
            .filter(|mission| mission.tags.iter().any(|tag| tags.contains(tag)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions")]

    use zcl_core::ids::MissionId;
    use zcl_core::ids::MissionIndex;
    use zcl_core::ids::SuiteId;
    use zcl_core::model::Mission;
    use zcl_core::model::MissionSelection;
    use zcl_core::model::MissionSourceConfig;
    use zcl_core::model::Suite;
    use zcl_core::model::SuiteDefaults;
    use zcl_core::model::TimeoutStart;

    use super::select;

    fn mission(index: u32, tags: Vec<&str>) -> Mission {
        Mission {
            mission_id: MissionId::new(format!("m{index}")).expect("valid id"),
            mission_index: MissionIndex(index),
            prompt: "do the thing".to_string(),
            tags: tags.into_iter().map(ToString::to_string).collect(),
            expects: None,
        }
    }

    fn suite(missions: Vec<Mission>) -> Suite {
        Suite {
            suite_id: SuiteId::new("suite-a").expect("valid id"),
            defaults: SuiteDefaults {
                mode: "default".to_string(),
                timeout_ms: 1000,
                timeout_start: TimeoutStart::AttemptStart,
                feedback_policy: "strict".to_string(),
                blind: false,
                blind_terms: Vec::new(),
            },
            missions,
        }
    }

    fn source(selection: MissionSelection, offset: u32, total: Option<u32>) -> MissionSourceConfig {
        MissionSourceConfig {
            suite_path: "suite.toml".into(),
            selection,
            mission_offset: offset,
            total_missions: total,
        }
    }

    #[test]
    fn whole_selection_with_no_window_returns_every_mission() {
        let suite = suite(vec![mission(0, vec![]), mission(1, vec![])]);
        let selected = select(&suite, &source(MissionSelection::Whole, 0, None)).expect("non-empty");
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn tag_selection_filters_before_windowing() {
        let suite = suite(vec![mission(0, vec!["smoke"]), mission(1, vec!["slow"]), mission(2, vec!["smoke"])]);
        let selected =
            select(&suite, &source(MissionSelection::Tags(vec!["smoke".to_string()]), 0, None)).expect("non-empty");
        assert_eq!(selected.iter().map(|mission| mission.mission_index.0).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn offset_and_total_apply_to_the_filtered_subset() {
        let suite = suite(vec![mission(0, vec!["a"]), mission(1, vec!["a"]), mission(2, vec!["a"]), mission(3, vec!["a"])]);
        let selected =
            select(&suite, &source(MissionSelection::Tags(vec!["a".to_string()]), 1, Some(2))).expect("non-empty");
        assert_eq!(selected.iter().map(|mission| mission.mission_index.0).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn an_empty_window_is_a_usage_error() {
        let suite = suite(vec![mission(0, vec!["a"])]);
        let err = select(&suite, &source(MissionSelection::Tags(vec!["nope".to_string()]), 0, None))
            .expect_err("empty window");
        assert!(matches!(err, super::CampaignError::Usage(_)));
    }
}
