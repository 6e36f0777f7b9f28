//! Controller integration tests
//!
//! Drive a spawned controller through fake engines on a paused clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use link_voice::{MemoryPreferenceStore, Preferences, RecognitionErrorKind};

mod common;
use common::Harness;

const PERMISSION_DENIED: &str = "Microphone access denied. Please enable microphone permissions.";
const BLIND_MODE_ON: &str = "Blind accessibility mode activated. Global voice commands are now enabled throughout the application. Say \"help\" to hear available commands.";

#[tokio::test(start_paused = true)]
async fn test_enable_starts_one_continuous_session() {
    let h = Harness::spawn();
    assert!(h.voice.capabilities().full_support);

    h.listen().await;

    let status = h.voice.status();
    assert!(status.is_global_voice_enabled);
    assert!(status.is_listening);
    assert!(!status.is_on_break);
    assert!(!status.is_blind_mode);
    assert_eq!(h.recognizer.starts(), 1);

    let settings = h.recognizer.last_settings().unwrap();
    assert!(settings.continuous);
    assert!(!settings.interim_results);
    assert_eq!(settings.language, "en-US");
    assert_eq!(settings.max_alternatives, 1);
}

#[tokio::test(start_paused = true)]
async fn test_double_enable_never_runs_two_sessions() {
    let h = Harness::spawn();

    h.voice.toggle_global_voice(true).unwrap();
    h.voice.toggle_global_voice(true).unwrap();
    h.settle().await;

    assert_eq!(h.recognizer.starts(), 1);
    assert_eq!(h.recognizer.overlapping_starts(), 0);

    // through break and resume as well
    h.advance(21_501).await;
    h.voice.toggle_global_voice(true).unwrap();
    h.settle().await;

    assert_eq!(h.recognizer.starts(), 2);
    assert_eq!(h.recognizer.overlapping_starts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_disable_clears_flags_in_one_turn() {
    let h = Harness::spawn();
    h.listen().await;

    h.voice.toggle_global_voice(false).unwrap();
    h.settle().await;

    let status = h.voice.status();
    assert!(!status.is_listening);
    assert!(!status.is_on_break);
    assert!(!h.recognizer.is_active());
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("Global voice recognition disabled.")
    );

    // nothing restarts later
    h.advance(60_000).await;
    assert_eq!(h.recognizer.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disable_during_break_cancels_resume() {
    let h = Harness::spawn();
    h.listen().await;

    h.advance(20_001).await;
    assert!(h.voice.status().is_on_break);

    h.voice.toggle_global_voice(false).unwrap();
    h.settle().await;
    let status = h.voice.status();
    assert!(!status.is_listening);
    assert!(!status.is_on_break);

    h.advance(5_000).await;
    assert_eq!(h.recognizer.starts(), 1);
    assert!(!h.voice.status().is_listening);
}

#[tokio::test(start_paused = true)]
async fn test_break_and_resume_cycle() {
    let h = Harness::spawn();
    h.listen().await;

    h.advance(19_990).await;
    assert!(h.voice.status().is_listening);

    h.advance(11).await;
    let status = h.voice.status();
    assert!(!status.is_listening);
    assert!(status.is_on_break);
    assert!(!h.recognizer.is_active());
    assert_eq!(h.recognizer.stops(), 1);

    h.advance(1_500).await;
    let status = h.voice.status();
    assert!(status.is_listening);
    assert!(!status.is_on_break);
    assert_eq!(h.recognizer.starts(), 2);

    // and again on the next window
    h.advance(20_000).await;
    assert!(h.voice.status().is_on_break);
    assert_eq!(h.recognizer.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_confidence_gate() {
    let h = Harness::spawn();
    h.listen().await;
    let spoken = h.synthesizer.count();

    assert!(h.recognizer.say("go to chat", Some(0.39)));
    h.settle().await;

    let status = h.voice.status();
    assert_eq!(status.command_count, 0);
    assert_eq!(status.last_command, "");
    assert_eq!(h.synthesizer.count(), spoken);
    assert!(h.host.actions().is_empty());

    assert!(h.recognizer.say("scroll down", Some(0.41)));
    h.settle().await;

    let status = h.voice.status();
    assert_eq!(status.command_count, 1);
    assert_eq!(status.last_command, "scroll down");
    assert_eq!(h.host.actions(), ["scroll 300"]);
}

#[tokio::test(start_paused = true)]
async fn test_unreported_confidence_is_accepted() {
    let h = Harness::spawn();
    h.listen().await;

    assert!(h.recognizer.say("scroll up", None));
    h.settle().await;

    assert_eq!(h.voice.status().command_count, 1);
    assert_eq!(h.synthesizer.last().as_deref(), Some("Scrolled up"));
}

#[tokio::test(start_paused = true)]
async fn test_navigation_command() {
    let h = Harness::spawn();
    h.listen().await;

    h.say("go to chat").await;

    assert_eq!(h.host.actions(), ["navigate /chat"]);
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("Opening chat assistant")
    );
    let status = h.voice.status();
    assert_eq!(status.last_command, "go to chat");
    assert_eq!(status.command_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unrecognized_command() {
    let h = Harness::spawn();
    h.listen().await;

    h.say("gibberish xyz").await;

    let reply = h.synthesizer.last().unwrap();
    assert!(reply.contains("gibberish xyz"));
    assert!(reply.contains("help"));
    assert!(h.host.actions().is_empty());
    assert_eq!(h.voice.status().command_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_blind_mode_toggle() {
    let h = Harness::spawn();

    h.voice.toggle_blind_mode(true).unwrap();
    h.settle().await;

    let status = h.voice.status();
    assert!(status.is_blind_mode);
    assert!(status.is_global_voice_enabled);
    assert!(status.is_listening);
    assert_eq!(h.preferences.saved(), Some(Preferences::with_voice_mode(true)));
    assert_eq!(h.synthesizer.last().as_deref(), Some(BLIND_MODE_ON));

    h.advance(2_990).await;
    assert_eq!(h.synthesizer.last().as_deref(), Some(BLIND_MODE_ON));

    h.advance(11).await;
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("You are currently on the Home Page.")
    );

    h.voice.toggle_blind_mode(false).unwrap();
    h.settle().await;

    let status = h.voice.status();
    assert!(!status.is_blind_mode);
    assert!(!status.is_global_voice_enabled);
    assert!(!status.is_listening);
    assert_eq!(h.preferences.saved(), Some(Preferences::with_voice_mode(false)));
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("Blind accessibility mode deactivated. Global voice commands are now disabled.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_blind_mode_off_before_summary_skips_it() {
    let h = Harness::spawn();

    h.voice.toggle_blind_mode(true).unwrap();
    h.settle().await;
    h.voice.toggle_blind_mode(false).unwrap();
    h.settle().await;
    let spoken = h.synthesizer.count();

    h.advance(5_000).await;
    assert_eq!(h.synthesizer.count(), spoken);
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_disables_voice() {
    let h = Harness::spawn();
    h.listen().await;

    assert!(h.recognizer.error(RecognitionErrorKind::from_code("not-allowed")));
    h.settle().await;

    let status = h.voice.status();
    assert!(!status.is_global_voice_enabled);
    assert!(!status.is_listening);
    assert!(!status.is_on_break);
    assert!(!h.recognizer.is_active());
    assert_eq!(h.synthesizer.last().as_deref(), Some(PERMISSION_DENIED));

    h.advance(30_000).await;
    assert_eq!(h.recognizer.starts(), 1);

    // an explicit re-enable starts again
    h.listen().await;
    assert!(h.voice.status().is_listening);
    assert_eq!(h.recognizer.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_speech_restarts_quickly() {
    let h = Harness::spawn();
    h.listen().await;

    assert!(h.recognizer.error(RecognitionErrorKind::NoSpeech));
    h.settle().await;

    assert!(!h.voice.status().is_listening);
    assert!(!h.recognizer.is_active());

    h.advance(790).await;
    assert_eq!(h.recognizer.starts(), 1);

    h.advance(11).await;
    assert_eq!(h.recognizer.starts(), 2);
    assert!(h.voice.status().is_listening);
}

#[tokio::test(start_paused = true)]
async fn test_other_errors_restart_after_longer_delay() {
    let h = Harness::spawn();
    h.listen().await;

    assert!(h.recognizer.error(RecognitionErrorKind::Network));
    h.settle().await;

    h.advance(1_490).await;
    assert_eq!(h.recognizer.starts(), 1);

    h.advance(11).await;
    assert_eq!(h.recognizer.starts(), 2);
    assert!(h.voice.status().is_listening);
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_end_restarts() {
    let h = Harness::spawn();
    h.listen().await;

    assert!(h.recognizer.end());
    h.settle().await;
    assert!(!h.voice.status().is_listening);

    h.advance(1_990).await;
    assert_eq!(h.recognizer.starts(), 1);

    h.advance(11).await;
    assert_eq!(h.recognizer.starts(), 2);
    assert!(h.voice.status().is_listening);
    assert_eq!(h.recognizer.overlapping_starts(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_start_is_retried() {
    let h = Harness::spawn();
    h.recognizer.fail_starts(true);

    h.listen().await;
    assert!(!h.voice.status().is_listening);
    assert_eq!(h.recognizer.failed_starts(), 1);

    h.advance(2_001).await;
    assert_eq!(h.recognizer.failed_starts(), 2);

    h.recognizer.fail_starts(false);
    h.advance(2_001).await;
    assert!(h.voice.status().is_listening);
    assert_eq!(h.recognizer.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_events_from_old_sessions_are_ignored() {
    let h = Harness::spawn();
    h.listen().await;
    let old = h.recognizer.last_sink().unwrap();

    // break and resume gives a new session
    h.advance(21_501).await;
    assert_eq!(h.recognizer.starts(), 2);

    old.result("go to chat", Some(0.9));
    old.error(RecognitionErrorKind::from_code("not-allowed"));
    old.ended();
    h.settle().await;

    let status = h.voice.status();
    assert_eq!(status.command_count, 0);
    assert!(status.is_global_voice_enabled);
    assert!(status.is_listening);
    assert!(h.host.actions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_custom_commands_win_and_can_be_removed() {
    let h = Harness::spawn();
    h.listen().await;

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    h.voice
        .add_custom_command(
            "Next Card",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            "show the next card",
        )
        .unwrap();
    h.settle().await;

    h.say("next card").await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(h.synthesizer.last().as_deref(), Some("Command executed."));

    h.voice.remove_custom_command("NEXT CARD").unwrap();
    h.voice.remove_custom_command("next card").unwrap();
    h.settle().await;

    h.say("next card").await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(h.synthesizer.last().unwrap().starts_with("I didn't understand"));
}

#[tokio::test(start_paused = true)]
async fn test_add_remove_sequences_leave_nothing_behind() {
    let h = Harness::spawn();
    h.listen().await;

    let phrases = ["flip card", "next card", "start quiz", "next card", "answer a"];
    for (i, phrase) in phrases.iter().enumerate() {
        h.voice.add_custom_command(phrase, || {}, "test").unwrap();
        if i % 2 == 0 {
            h.voice.remove_custom_command(phrase).unwrap();
        }
    }
    for phrase in phrases {
        h.voice.remove_custom_command(phrase).unwrap();
    }
    h.settle().await;

    h.say("page commands").await;
    assert!(h.synthesizer.last().unwrap().contains("no page-specific commands"));

    for phrase in phrases {
        h.say(phrase).await;
        assert!(h.synthesizer.last().unwrap().starts_with("I didn't understand"));
    }
}

#[tokio::test(start_paused = true)]
async fn test_page_scope_removes_commands_on_drop() {
    let h = Harness::spawn();
    h.listen().await;

    let hits = Arc::new(AtomicUsize::new(0));
    let mut scope = h.voice.page_scope();
    let counter = Arc::clone(&hits);
    scope
        .add(
            "flip card",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            "reveal the sign",
        )
        .unwrap();
    scope.add("next card", || {}, "show the next card").unwrap();
    assert_eq!(scope.phrases(), ["flip card", "next card"]);
    h.settle().await;

    h.say("what can i do here").await;
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some(
            "Commands on the Home Page: \"flip card\" to reveal the sign, \
             \"next card\" to show the next card."
        )
    );

    h.say("flip card").await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    drop(scope);
    h.settle().await;

    h.say("flip card").await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    h.say("page commands").await;
    assert!(h.synthesizer.last().unwrap().contains("no page-specific commands"));
}

#[tokio::test(start_paused = true)]
async fn test_route_change_announcement_is_delayed_and_superseded() {
    let h = Harness::spawn();
    h.voice.toggle_blind_mode(true).unwrap();
    h.advance(3_001).await;
    let before = h.synthesizer.count();

    h.voice.route_changed("/deaf").unwrap();
    h.advance(200).await;
    h.voice.route_changed("/tools").unwrap();
    h.advance(490).await;
    assert_eq!(h.synthesizer.count(), before);

    h.advance(11).await;
    assert_eq!(
        h.synthesizer.spoken_since(before),
        ["Navigated to AI Tools. Say \"help\" or \"what can I do\" to hear available commands on this page."]
    );
}

#[tokio::test(start_paused = true)]
async fn test_route_change_is_quiet_without_blind_mode() {
    let h = Harness::spawn();
    h.listen().await;
    let before = h.synthesizer.count();

    h.voice.route_changed("/about").unwrap();
    h.advance(1_000).await;
    assert_eq!(h.synthesizer.count(), before);

    h.say("where am i").await;
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("You are currently on the About Page.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_navigation_in_blind_mode_announces_new_page() {
    let h = Harness::spawn();
    h.voice.toggle_blind_mode(true).unwrap();
    h.advance(3_001).await;

    h.say("deaf learning").await;
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("Going to deaf learning section")
    );

    h.advance(501).await;
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("Navigated to Deaf Learning Section. Say \"help\" or \"what can I do\" to hear available commands on this page.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_announce_page_change_requires_blind_mode() {
    let h = Harness::spawn();

    h.voice.announce_page_change("Settings").unwrap();
    h.settle().await;
    assert_eq!(h.synthesizer.count(), 0);

    h.voice.toggle_blind_mode(true).unwrap();
    h.voice.announce_page_change("Settings").unwrap();
    h.settle().await;
    assert!(h.synthesizer.last().unwrap().starts_with("Navigated to Settings."));
}

#[tokio::test(start_paused = true)]
async fn test_voice_builtins() {
    let h = Harness::spawn();
    h.voice.toggle_blind_mode(true).unwrap();
    h.settle().await;

    h.say("please turn off voice").await;
    let status = h.voice.status();
    assert!(!status.is_global_voice_enabled);
    assert!(status.is_blind_mode);
    assert!(!status.is_listening);
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("Global voice recognition disabled.")
    );

    h.voice.toggle_global_voice(true).unwrap();
    h.settle().await;
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("Global voice recognition enabled. I will listen continuously across all pages.")
    );

    h.say("exit blind mode").await;
    let status = h.voice.status();
    assert!(!status.is_blind_mode);
    assert!(!status.is_global_voice_enabled);
    assert!(!status.is_listening);
    assert_eq!(h.preferences.saved(), Some(Preferences::with_voice_mode(false)));
}

#[tokio::test(start_paused = true)]
async fn test_page_control_builtins() {
    let h = Harness::spawn();
    h.listen().await;

    for phrase in [
        "scroll down",
        "scroll up",
        "go to bottom",
        "scroll to top",
        "reload page",
        "go to tools",
        "go back",
        "go forward",
    ] {
        h.say(phrase).await;
    }

    assert_eq!(
        h.host.actions(),
        [
            "scroll 300",
            "scroll -300",
            "bottom",
            "top",
            "reload",
            "navigate /tools",
            "back",
            "forward",
        ]
    );
    assert_eq!(h.synthesizer.last().as_deref(), Some("Going forward"));
    assert_eq!(h.voice.status().command_count, 8);
}

#[tokio::test(start_paused = true)]
async fn test_information_builtins() {
    let h = Harness::spawn();
    h.listen().await;

    h.say("help").await;
    let help = h.synthesizer.last().unwrap();
    assert!(help.starts_with("Global voice commands available on Home Page."));

    h.say("repeat").await;
    assert_eq!(h.synthesizer.last().unwrap(), help);

    h.say("go to about").await;
    h.say("what page is this").await;
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("You are currently on the About Page.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_processing_tracks_current_announcement() {
    let h = Harness::spawn();
    h.listen().await;
    h.synthesizer.finish();
    h.settle().await;
    assert!(!h.voice.status().is_processing);

    h.say("scroll down").await;
    assert!(h.voice.status().is_processing);

    // interrupting cancels the first; its failure must not clear the flag
    h.voice.speak("Card 3 of 10", true).unwrap();
    h.settle().await;
    assert_eq!(h.synthesizer.cancels(), 1);
    assert!(h.voice.status().is_processing);

    h.synthesizer.finish();
    h.settle().await;
    assert!(!h.voice.status().is_processing);
}

#[tokio::test(start_paused = true)]
async fn test_failed_announcement_clears_processing() {
    let h = Harness::spawn();
    h.listen().await;
    h.synthesizer.finish();
    h.settle().await;

    h.say("scroll up").await;
    assert!(h.voice.status().is_processing);

    assert!(h.synthesizer.fail("audio device lost"));
    h.settle().await;

    let status = h.voice.status();
    assert!(!status.is_processing);
    assert!(status.is_listening);
    assert_eq!(h.synthesizer.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_page_command_keeps_listening() {
    let h = Harness::spawn();
    h.listen().await;
    h.voice
        .add_custom_command("boom", || panic!("page bug"), "break the page")
        .unwrap();

    h.say("boom").await;

    assert_eq!(h.synthesizer.last().as_deref(), Some("Sorry, that command failed."));
    let status = h.voice.status();
    assert!(status.is_listening);
    assert_eq!(status.command_count, 1);

    h.say("go to chat").await;
    assert_eq!(h.host.actions(), ["navigate /chat"]);
    assert_eq!(h.voice.status().command_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_speak_without_interrupt_keeps_current_speech() {
    let h = Harness::spawn();

    h.voice.speak("first", true).unwrap();
    h.voice.speak("second", false).unwrap();
    h.settle().await;

    assert_eq!(h.synthesizer.cancels(), 0);
    assert_eq!(h.synthesizer.spoken(), ["first", "second"]);

    let utterance = h.synthesizer.last_utterance().unwrap();
    assert!((utterance.rate - 0.9).abs() < f32::EPSILON);
    assert!((utterance.volume - 0.8).abs() < f32::EPSILON);
    assert_eq!(utterance.language, "en-US");
}

#[tokio::test(start_paused = true)]
async fn test_saved_blind_mode_is_restored() {
    let h = Harness::spawn_with(MemoryPreferenceStore::with(Preferences::with_voice_mode(
        true,
    )));
    h.settle().await;

    let status = h.voice.status();
    assert!(status.is_blind_mode);
    assert!(status.is_global_voice_enabled);
    assert!(status.is_listening);
    assert_eq!(h.recognizer.starts(), 1);

    h.advance(501).await;
    assert_eq!(
        h.synthesizer.last().as_deref(),
        Some("Navigated to Home Page. Say \"help\" or \"what can I do\" to hear available commands on this page.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_status_subscribers_see_changes() {
    let h = Harness::spawn();
    let mut rx = h.voice.subscribe();
    let _ = rx.borrow_and_update();

    h.voice.toggle_global_voice(true).unwrap();
    rx.changed().await.unwrap();
    h.settle().await;

    assert!(rx.borrow().is_listening);
    assert_eq!(rx.borrow().clone(), h.voice.status());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_everything() {
    let h = Harness::spawn();
    h.listen().await;

    h.voice.shutdown().await.unwrap();
    assert!(!h.recognizer.is_active());
    let status = h.voice.status();
    assert!(!status.is_listening);
    assert!(!status.is_on_break);

    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    assert_eq!(h.recognizer.starts(), 1);
    assert!(h.voice.toggle_global_voice(true).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_every_handle_releases_the_session() {
    let Harness {
        voice,
        recognizer,
        ..
    } = Harness::spawn();
    voice.toggle_global_voice(true).unwrap();
    voice.settle().await.unwrap();
    assert!(recognizer.is_active());

    let status = voice.subscribe();
    drop(voice);

    tokio::time::sleep(std::time::Duration::from_secs(120)).await;
    assert!(!recognizer.is_active());
    assert_eq!(recognizer.starts(), 1);
    assert!(!status.borrow().is_listening);
}
