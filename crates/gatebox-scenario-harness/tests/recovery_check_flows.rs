use gatebox_recovery::{
    FeedbackAction, GpioErrorKind, IndicatorPattern, ReadFailure, Verdict,
};
use gatebox_scenario_harness::RecoveryScenario;

#[test]
fn reset_button_held_to_threshold_triggers_recovery() {
    let mut scenario = RecoveryScenario::new();
    scenario.buttons.add_button("reset");
    // One state per sample: the initial scan plus four boundary ticks. A
    // fifth boundary would read the steady released state and kill the run,
    // so a Triggered verdict proves it is never sampled.
    scenario.buttons.script("reset", &[true, true, true, true, true]);

    let verdict = scenario.run().unwrap();

    assert_eq!(
        verdict,
        Verdict::Triggered {
            label: String::from("reset")
        }
    );
    assert_eq!(scenario.buttons.remaining_script("reset"), 0);
    assert_eq!(
        scenario.performed().last(),
        Some(&FeedbackAction::RunRecovery)
    );
}

#[test]
fn reset_gpio_fallback_supplies_the_trigger_label() {
    let mut scenario = RecoveryScenario::new();
    scenario.config.set("recovery_key", "mesh");
    scenario.buttons.add_button("mesh");
    scenario.gpio.add_line("reset");
    scenario.gpio.set_level("reset", true);

    let verdict = scenario.run().unwrap();

    assert_eq!(
        verdict,
        Verdict::Triggered {
            label: String::from("reset")
        }
    );
    assert_eq!(scenario.gpio.outstanding(), 0);
    assert_eq!(scenario.gpio.release_count("reset"), 1);
}

#[test]
fn release_before_threshold_leaves_no_lines_claimed() {
    let mut scenario = RecoveryScenario::new();
    scenario.gpio.add_line("reset");
    // Held through Holding(2), released on the next boundary.
    scenario.gpio.script_levels("reset", &[true, true, true, false]);

    let verdict = scenario.run().unwrap();

    assert_eq!(verdict, Verdict::NotTriggered { aborted: None });
    assert_eq!(scenario.gpio.outstanding(), 0);
    assert_eq!(scenario.gpio.release_count("reset"), 1);
    assert_eq!(scenario.gpio.stray_releases(), 0);
}

#[test]
fn read_error_mid_hold_aborts_without_failing_the_invocation() {
    let mut scenario = RecoveryScenario::new();
    scenario.gpio.add_line("reset");
    scenario.gpio.script_levels("reset", &[true, true]);
    scenario.gpio.fail_read("reset", -5);

    let verdict = scenario.run().unwrap();

    assert_eq!(
        verdict,
        Verdict::NotTriggered {
            aborted: Some(ReadFailure {
                label: String::from("reset"),
                code: -5
            })
        }
    );
    assert_eq!(scenario.gpio.outstanding(), 0);
}

#[test]
fn all_mode_with_nothing_pressed_schedules_idle_feedback_once() {
    let mut scenario = RecoveryScenario::new();
    scenario.config.set("recovery_key", "all");
    scenario.buttons.add_button("reset");
    scenario.buttons.add_button("wps");

    let verdict = scenario.run().unwrap();

    assert_eq!(verdict, Verdict::NotTriggered { aborted: None });
    assert_eq!(
        scenario.scheduled(),
        [(
            1000,
            FeedbackAction::Indicator(IndicatorPattern::Solid)
        )]
    );
}

#[test]
fn all_mode_press_reports_the_pressed_device_label() {
    let mut scenario = RecoveryScenario::new();
    scenario.config.set("recovery_gpio", "all");
    scenario.buttons.add_button("reset");
    scenario.buttons.add_button("wps");
    scenario.buttons.press("wps");

    let verdict = scenario.run().unwrap();

    assert_eq!(
        verdict,
        Verdict::Triggered {
            label: String::from("wps")
        }
    );
}

#[test]
fn override_equal_to_key_releases_the_shared_line_once() {
    let mut scenario = RecoveryScenario::new();
    scenario.config.set("recovery_key", "7");
    scenario.config.set("recovery_gpio", "7");
    scenario.gpio.add_line("7");

    let verdict = scenario.run().unwrap();

    assert_eq!(verdict, Verdict::NotTriggered { aborted: None });
    assert_eq!(scenario.gpio.outstanding(), 0);
    assert_eq!(scenario.gpio.release_count("7"), 1);
    assert_eq!(scenario.gpio.stray_releases(), 0);
}

#[test]
fn missing_override_gpio_is_a_fatal_failure() {
    let mut scenario = RecoveryScenario::new();
    scenario.config.set("recovery_gpio", "gpio99");
    scenario.buttons.add_button("reset");

    let err = scenario.run().unwrap_err();

    assert_eq!(err.label, "gpio99");
    assert_eq!(err.error.kind, GpioErrorKind::NotFound);
    assert_eq!(scenario.gpio.outstanding(), 0);
}

#[test]
fn union_of_override_and_key_lets_either_sustain_the_hold() {
    let mut scenario = RecoveryScenario::new();
    scenario.config.set("recovery_gpio", "4");
    scenario.buttons.add_button("reset");
    scenario.gpio.add_line("4");
    // The override starts the hold, the reset button carries it through.
    scenario.gpio.script_levels("4", &[true, true, false, false, false]);
    scenario.buttons.script("reset", &[false, false, true, true, true]);

    let verdict = scenario.run().unwrap();

    assert_eq!(
        verdict,
        Verdict::Triggered {
            label: String::from("4")
        }
    );
    assert_eq!(scenario.gpio.outstanding(), 0);
}
