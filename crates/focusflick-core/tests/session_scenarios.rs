//! End-to-end scenarios through the application facade.
//!
//! Each test drives `App` with a manual clock, then checks what ended up in
//! storage.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use focusflick_core::habit;
use focusflick_core::{
    App, Clock, Document, Event, JsonFileStore, ManualClock, MemoryStore, Phase, RecordingNotifier,
    Storage, TaskDraft, UserProfile,
};

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn fresh() -> (App<MemoryStore, ManualClock, RecordingNotifier>, MemoryStore, ManualClock) {
    let store = MemoryStore::new();
    let clock = ManualClock::new(t0());
    let app = App::open(store.clone(), clock.clone(), RecordingNotifier::new());
    (app, store, clock)
}

#[test]
fn twenty_five_minute_focus_on_fresh_document() {
    let (mut app, store, clock) = fresh();
    app.start_focus(Some(25), None, None).unwrap();
    for _ in 0..1500 {
        clock.advance_secs(1);
        app.tick().unwrap();
    }
    let doc = store.try_load(clock.now()).unwrap();
    assert_eq!(doc.user.sessions, 1);
    assert_eq!(doc.user.total_seconds, 1500);
    assert_eq!(doc.user.xp, 250);
    assert_eq!(doc.user.streak, 1);
}

#[test]
fn stopwatch_laps_and_credit() {
    let (mut app, store, clock) = fresh();
    app.start_stopwatch(None).unwrap();
    clock.advance_secs(30);
    app.lap().unwrap();
    clock.advance_secs(40);
    app.lap().unwrap();

    let laps = app.snapshot().laps;
    let elapsed: Vec<_> = laps.iter().map(|l| l.elapsed_secs).collect();
    let deltas: Vec<_> = laps.iter().map(|l| l.delta_secs).collect();
    assert_eq!(elapsed, [30, 70]);
    assert_eq!(deltas, [30, 40]);

    app.stop().unwrap();
    let doc = store.try_load(t0()).unwrap();
    assert_eq!(doc.user.total_seconds, 70);
    assert_eq!(doc.user.sessions, 1);
}

#[test]
fn pomodoro_cycle_sequence_with_defaults() {
    let (mut app, _, clock) = fresh();
    app.start_pomodoro(None).unwrap();

    let mut breaks = Vec::new();
    for _ in 0..4 {
        clock.advance_secs(25 * 60);
        let events = app.tick().unwrap();
        let to = events.iter().find_map(|e| match e {
            Event::PhaseChanged { to, .. } => Some(*to),
            _ => None,
        });
        breaks.push(to);
        let remaining = app.snapshot().remaining_secs.unwrap();
        clock.advance_secs(remaining as i64);
        app.tick().unwrap();
    }
    assert_eq!(
        breaks,
        [
            Some(Phase::ShortBreak),
            Some(Phase::ShortBreak),
            Some(Phase::ShortBreak),
            Some(Phase::LongBreak)
        ]
    );
    assert_eq!(app.document().user.sessions, 4);
    assert_eq!(app.document().user.total_seconds, 4 * 1500);
}

#[test]
fn streak_follows_calendar_days() {
    let (mut app, _, clock) = fresh();
    let credit_day = |app: &mut App<_, _, _>| {
        app.start_focus(Some(1), None, None).unwrap();
        clock.advance_secs(60);
        app.tick().unwrap();
    };

    credit_day(&mut app);
    assert_eq!(app.document().user.streak, 1);
    // Same day again: unchanged.
    credit_day(&mut app);
    assert_eq!(app.document().user.streak, 1);

    clock.advance(Duration::days(1));
    credit_day(&mut app);
    assert_eq!(app.document().user.streak, 2);

    clock.advance(Duration::days(3));
    credit_day(&mut app);
    assert_eq!(app.document().user.streak, 1);
}

#[test]
fn habit_streaks() {
    let today = t0().date();
    let mut user = UserProfile::new(t0());
    let id = habit::add(&mut user.habits, "Read", None, t0()).unwrap().id;
    for n in 0..3 {
        habit::set_completed(&mut user, &id, today - Duration::days(n), true).unwrap();
    }
    assert_eq!(user.habits[0].streak(today), 3);

    let mut user = UserProfile::new(t0());
    let id = habit::add(&mut user.habits, "Read", None, t0()).unwrap().id;
    habit::set_completed(&mut user, &id, today, true).unwrap();
    habit::set_completed(&mut user, &id, today - Duration::days(3), true).unwrap();
    assert_eq!(user.habits[0].streak(today), 1);
}

#[test]
fn focus_note_lands_on_task() {
    let (mut app, store, clock) = fresh();
    let task = app.add_task(&TaskDraft::named("Chemistry")).unwrap();
    app.start_focus(Some(10), Some(task.id.clone()), None).unwrap();
    app.set_session_note(Some("balanced equations".into())).unwrap();
    clock.advance_secs(600);
    app.tick().unwrap();

    let doc = store.try_load(t0()).unwrap();
    assert_eq!(doc.user.tasks[0].notes.len(), 1);
    assert_eq!(doc.user.tasks[0].notes[0].content, "balanced equations");
}

#[test]
fn save_load_save_is_stable_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("focusflick_data.json"));
    let clock = ManualClock::new(t0());
    let mut app = App::open(store.clone(), clock.clone(), RecordingNotifier::new());
    app.add_task(&TaskDraft {
        due_date: Some("06/01/2024".into()),
        description: Some("chapters 1-3".into()),
        ..TaskDraft::named("Revise")
    })
    .unwrap();
    let h = app.add_habit("Meditate", None).unwrap();
    app.set_habit_completed_today(&h.id, true).unwrap();
    app.start_focus(Some(2), None, None).unwrap();
    clock.advance_secs(120);
    app.tick().unwrap();

    let first = std::fs::read_to_string(store.path()).unwrap();
    let reloaded: Document = store.try_load(t0()).unwrap();
    store.save(&reloaded).unwrap();
    let second = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("focusflick_data.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = JsonFileStore::new(&path);
    let app = App::open(store, ManualClock::new(t0()), RecordingNotifier::new());
    assert_eq!(app.document(), &Document::new(t0()));
}
