//! Activation engine behaviour against a scripted window system.

mod util;

use util::*;
use window_tracker::{
    ActivationResult, ModifierKey, MouseButton, SearchScope, StrategyKind, TrackerConfig,
    TrackerError,
};

fn single_window() -> std::sync::Arc<FakeSystem> {
    FakeSystem::new(vec![FakeWindow::new(1, "Inbox - Mail", "mail.exe", 100)])
}

/// Interleaved activations would leave an attach without its detach.
fn assert_attachments_never_overlap(calls: &[Call]) {
    let mut open_attachment = None;
    for call in calls {
        if let Call::Attach { to, attach, .. } = call {
            if *attach {
                assert!(
                    open_attachment.is_none(),
                    "attached to {to} while {open_attachment:?} was open"
                );
                open_attachment = Some(*to);
            } else {
                assert_eq!(open_attachment.take(), Some(*to));
            }
        }
    }
    assert!(open_attachment.is_none());
}

#[test]
fn pid_without_windows_attempts_nothing() {
    let fake = single_window();
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker.activate_by_pid(9999).unwrap();

    assert_eq!(
        result,
        ActivationResult {
            success: false,
            strategy_used: StrategyKind::None,
            attempts_used: 0,
        }
    );
    assert!(fake.calls().is_empty());
}

#[test]
fn strategies_run_in_escalation_order() {
    let fake = single_window();
    let config = TrackerConfig {
        max_retries: 1,
        ..fast_config()
    };
    let tracker = tracker_with_config(&fake, vec![], config);

    let result = tracker.activate_by_pid(100).unwrap();

    assert!(!result.success);
    assert_eq!(result.attempts_used, 1);
    assert_eq!(
        fake.calls(),
        vec![
            Call::Attach {
                from: CALLER_THREAD,
                to: 1007,
                attach: true,
            },
            Call::KeyDown(ModifierKey::Alt),
            Call::RequestForeground(1),
            Call::KeyUp(ModifierKey::Alt),
            Call::SetForegroundRaw(1),
            Call::Restore(1),
            Call::SetCursor(1400, 400),
            Call::Click(MouseButton::Left),
            Call::SetCursor(5, 5),
        ]
    );
}

#[test]
fn attach_input_succeeds_first_and_detaches() {
    let fake = single_window();
    fake.set_outcomes(Outcomes {
        attach: true,
        request_foreground: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker.activate_by_pid(100).unwrap();

    assert_eq!(result, ActivationResult::succeeded(StrategyKind::AttachInput, 1));
    assert_eq!(fake.attached_pairs(), 0);
    assert_eq!(
        fake.calls().last(),
        Some(&Call::Attach {
            from: CALLER_THREAD,
            to: 1007,
            attach: false,
        })
    );
}

#[test]
fn key_simulation_takes_over_when_alt_is_required() {
    let fake = single_window();
    fake.set_outcomes(Outcomes {
        attach: true,
        request_foreground: true,
        request_foreground_needs_alt: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker.activate_by_pid(100).unwrap();

    // The Alt tap in the first strategy is released before its retry.
    assert_eq!(result.strategy_used, StrategyKind::KeySimulation);
    assert_eq!(result.attempts_used, 1);
    assert!(fake.held_keys().is_empty());
    assert_eq!(fake.attached_pairs(), 0);
}

#[test]
fn system_api_is_third() {
    let fake = single_window();
    fake.set_outcomes(Outcomes {
        set_foreground_raw: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker.activate_by_pid(100).unwrap();

    assert_eq!(result, ActivationResult::succeeded(StrategyKind::SystemApi, 1));
    assert!(!fake.calls().contains(&Call::Click(MouseButton::Left)));
}

#[test]
fn pointer_click_is_last_and_restores_pointer() {
    let fake = single_window();
    fake.set_outcomes(Outcomes {
        click_activates: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker.activate_by_pid(100).unwrap();

    assert_eq!(
        result,
        ActivationResult::succeeded(StrategyKind::PointerClick, 1)
    );
    assert_eq!(fake.cursor(), (5, 5));
    assert_eq!(tracker.foreground_window().unwrap().identity.process_id, 100);
}

#[test]
fn exhausted_activation_reports_every_pass_and_releases_state() {
    let fake = single_window();
    fake.set_outcomes(Outcomes {
        attach: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker.activate_by_pid(100).unwrap();

    assert_eq!(result, ActivationResult::failed(3));
    let raw_calls = fake
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::SetForegroundRaw(_)))
        .count();
    assert_eq!(raw_calls, 3);
    assert!(fake.held_keys().is_empty());
    assert_eq!(fake.attached_pairs(), 0);
    assert_eq!(fake.cursor(), (5, 5));

    assert!(matches!(
        result.into_result(100),
        Err(TrackerError::ActivationExhausted {
            pid: 100,
            attempts: 3
        })
    ));
}

#[test]
fn retry_override_bounds_passes() {
    let fake = single_window();
    let tracker = tracker_with(&fake, vec![]);

    let engine = tracker.engine();
    assert_eq!(
        engine.activate_by_process_id_with_retries(100, 2).unwrap(),
        ActivationResult::failed(2)
    );

    fake.set_outcomes(Outcomes {
        set_foreground_raw: true,
        ..Outcomes::default()
    });
    assert_eq!(
        engine.activate_by_process_id_with_retries(100, 2).unwrap(),
        ActivationResult::succeeded(StrategyKind::SystemApi, 1)
    );
}

#[test]
fn first_titled_window_of_process_is_targeted() {
    let fake = FakeSystem::new(vec![
        FakeWindow::new(1, "", "mail.exe", 100),
        FakeWindow::new(2, "Inbox - Mail", "mail.exe", 100),
        FakeWindow::new(3, "Compose", "mail.exe", 100),
    ]);
    fake.set_outcomes(Outcomes {
        set_foreground_raw: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    tracker.activate_by_pid(100).unwrap();

    assert!(fake.calls().contains(&Call::SetForegroundRaw(2)));
}

#[test]
fn enumeration_failure_is_an_error() {
    let fake = single_window();
    fake.fail_enumeration();
    let tracker = tracker_with(&fake, vec![]);

    assert!(matches!(
        tracker.activate_by_pid(100),
        Err(TrackerError::Platform { .. })
    ));
}

#[test]
fn search_by_process_ignores_matching_titles() {
    let fake = FakeSystem::new(vec![
        FakeWindow::new(1, "Notepad - readme.txt", "editor.exe", 200),
        FakeWindow::new(2, "Untitled", "notepad.exe", 300),
    ]);
    fake.set_outcomes(Outcomes {
        set_foreground_raw: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker
        .activate_by_search("notepad", SearchScope::Process)
        .unwrap();

    assert!(result.success);
    assert!(fake.calls().contains(&Call::SetForegroundRaw(2)));
    assert!(!fake.calls().contains(&Call::SetForegroundRaw(1)));
}

#[test]
fn search_by_title_is_case_insensitive() {
    let fake = FakeSystem::new(vec![
        FakeWindow::new(1, "Notepad - readme.txt", "editor.exe", 200),
        FakeWindow::new(2, "Untitled", "notepad.exe", 300),
    ]);
    fake.set_outcomes(Outcomes {
        set_foreground_raw: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    tracker
        .activate_by_search("README", SearchScope::Title)
        .unwrap();

    assert!(fake.calls().contains(&Call::SetForegroundRaw(1)));
}

#[test]
fn search_without_match_is_not_found() {
    let fake = single_window();
    let tracker = tracker_with(&fake, vec![]);

    let err = tracker
        .activate_by_search("spreadsheet", SearchScope::Title)
        .unwrap_err();

    assert!(matches!(err, TrackerError::NotFound { .. }));
    assert!(fake.calls().is_empty());
}

#[test]
fn concurrent_activations_are_serialized() {
    let fake = FakeSystem::new(vec![
        FakeWindow::new(1, "Inbox - Mail", "mail.exe", 100),
        FakeWindow::new(2, "Terminal", "terminal.exe", 200),
    ]);
    fake.set_outcomes(Outcomes {
        attach: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let handles: Vec<_> = [100u32, 200, 100, 200]
        .into_iter()
        .map(|pid| {
            let tracker = tracker.clone();
            std::thread::spawn(move || tracker.activate_by_pid(pid).unwrap())
        })
        .collect();

    for handle in handles {
        assert!(!handle.join().unwrap().success);
    }

    assert_attachments_never_overlap(&fake.calls());
    assert!(fake.held_keys().is_empty());
}

#[test]
fn activations_are_serialized_across_trackers() {
    let fake = FakeSystem::new(vec![
        FakeWindow::new(1, "Inbox - Mail", "mail.exe", 100),
        FakeWindow::new(2, "Terminal", "terminal.exe", 200),
    ]);
    fake.set_outcomes(Outcomes {
        attach: true,
        ..Outcomes::default()
    });
    let config = TrackerConfig {
        max_retries: 1,
        input_settle_delay: std::time::Duration::from_millis(20),
        ..fast_config()
    };
    let first = tracker_with_config(&fake, vec![], config.clone());
    let second = tracker_with_config(&fake, vec![], config);

    let handles: Vec<_> = [(first, 100u32), (second, 200)]
        .into_iter()
        .map(|(tracker, pid)| std::thread::spawn(move || tracker.activate_by_pid(pid).unwrap()))
        .collect();

    for handle in handles {
        assert!(!handle.join().unwrap().success);
    }

    assert_attachments_never_overlap(&fake.calls());
    assert_eq!(fake.attached_pairs(), 0);
    assert_eq!(fake.cursor(), (5, 5));
}

#[test]
fn alt_tap_unlocks_second_foreground_request() {
    let fake = single_window();
    fake.set_outcomes(Outcomes {
        attach: true,
        request_foreground_from: Some(2),
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker.activate_by_pid(100).unwrap();

    assert_eq!(result, ActivationResult::succeeded(StrategyKind::AttachInput, 1));
    assert_eq!(
        fake.calls(),
        vec![
            Call::Attach {
                from: CALLER_THREAD,
                to: 1007,
                attach: true,
            },
            Call::Restore(1),
            Call::Raise(1),
            Call::RequestForeground(1),
            Call::KeyDown(ModifierKey::Alt),
            Call::KeyUp(ModifierKey::Alt),
            Call::RequestForeground(1),
            Call::Attach {
                from: CALLER_THREAD,
                to: 1007,
                attach: false,
            },
        ]
    );
    assert_eq!(fake.attached_pairs(), 0);
    assert!(fake.held_keys().is_empty());
}

#[test]
fn failing_raise_still_detaches_input() {
    let fake = single_window();
    fake.set_outcomes(Outcomes {
        attach: true,
        raise_fails: true,
        set_foreground_raw: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker.activate_by_pid(100).unwrap();

    assert_eq!(result, ActivationResult::succeeded(StrategyKind::SystemApi, 1));
    assert_eq!(fake.attached_pairs(), 0);
    assert!(fake.calls().contains(&Call::Attach {
        from: CALLER_THREAD,
        to: 1007,
        attach: false,
    }));
}

#[test]
fn failing_foreground_request_releases_input_and_keys() {
    let fake = single_window();
    fake.set_outcomes(Outcomes {
        attach: true,
        request_foreground_fails: true,
        set_foreground_raw: true,
        ..Outcomes::default()
    });
    let tracker = tracker_with(&fake, vec![]);

    let result = tracker.activate_by_pid(100).unwrap();

    assert_eq!(result.strategy_used, StrategyKind::SystemApi);
    assert_eq!(fake.attached_pairs(), 0);
    assert!(fake.held_keys().is_empty());
    assert!(fake.calls().contains(&Call::KeyUp(ModifierKey::Alt)));
}

#[test]
fn failing_click_restores_pointer() {
    let fake = single_window();
    fake.set_outcomes(Outcomes {
        click_fails: true,
        ..Outcomes::default()
    });
    let config = TrackerConfig {
        max_retries: 1,
        ..fast_config()
    };
    let tracker = tracker_with_config(&fake, vec![], config);

    let result = tracker.activate_by_pid(100).unwrap();

    assert_eq!(result, ActivationResult::failed(1));
    assert_eq!(fake.cursor(), (5, 5));
    assert_eq!(fake.calls().last(), Some(&Call::SetCursor(5, 5)));
}
