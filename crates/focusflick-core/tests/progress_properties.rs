//! Property tests for session crediting, pause/resume and leveling.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use focusflick_core::progress::{self, award_xp, xp_needed};
use focusflick_core::{FocusController, TimerEngine, UserProfile};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn at(secs: u64) -> NaiveDateTime {
    t0() + Duration::seconds(secs as i64)
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn completed_focus_credits_duration(minutes in 1_u32..240) {
        let mut user = UserProfile::new(t0());
        let mut focus = FocusController::new(minutes, None).unwrap();
        focus.start(at(0)).unwrap();
        let d = u64::from(minutes) * 60;
        focus.tick(&mut user, at(d));
        prop_assert_eq!(user.sessions, 1);
        prop_assert_eq!(user.total_seconds, d);
        prop_assert_eq!(user.xp + (u64::from(user.level) - 1) * 1000, d / 60 * 10);
    }

    #[test]
    fn early_stop_under_a_minute_changes_nothing(elapsed in 0_u64..60) {
        let mut user = UserProfile::new(t0());
        let before = user.clone();
        let mut focus = FocusController::new(25, None).unwrap();
        focus.start(at(0)).unwrap();
        focus.stop(&mut user, at(elapsed)).unwrap();
        prop_assert_eq!(user.total_seconds, before.total_seconds);
        prop_assert_eq!(user.sessions, before.sessions);
        prop_assert_eq!(user.xp, before.xp);
    }

    #[test]
    fn pause_resume_preserves_elapsed(run in 0_u64..5000, paused_for in 0_u64..100_000) {
        let mut engine = TimerEngine::open_ended();
        engine.start(at(0)).unwrap();
        engine.pause(at(run)).unwrap();
        let before = engine.elapsed_secs(at(run));
        engine.resume(at(run + paused_for)).unwrap();
        prop_assert_eq!(engine.elapsed_secs(at(run + paused_for)), before);
    }

    #[test]
    fn double_threshold_award_levels_twice(extra in 0_u64..999) {
        let mut user = UserProfile::new(t0());
        // Level 1 needs 1000, level 2 needs 2000.
        let levels = award_xp(&mut user, 3000 + extra);
        prop_assert_eq!(levels, vec![2, 3]);
        prop_assert!(user.xp < xp_needed(user.level));
        prop_assert_eq!(user.xp, extra);
    }

    #[test]
    fn xp_is_whole_minutes(secs in 0_u64..1_000_000) {
        prop_assert_eq!(progress::xp_for_seconds(secs) % 10, 0);
        prop_assert!(progress::xp_for_seconds(secs) <= secs / 6);
    }
}
