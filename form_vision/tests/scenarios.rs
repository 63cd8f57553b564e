use form_vision::pipeline::{
    ActivityClass, ActivitySession, Assessment, FrameFeatures, FrameSize, Keypoint, KeypointSet, SessionConfig,
};
use std::f64::consts::PI;

const FRAME: FrameSize = FrameSize::new(640, 720);
const FPS: f64 = 30.0;

/// Offsets applied to a synthetic upright figure with 100 px between the shoulders.
#[derive(Default, Clone, Copy)]
struct Motion {
    /// Vertical bounce of everything above the ankles.
    bounce: f64,
    /// Sideways sway of everything above the ankles.
    sway: f64,
    /// Alternating fore/aft ankle swing.
    stride: f64,
}

fn figure(motion: Motion) -> KeypointSet {
    let Motion { bounce, sway, stride } = motion;
    let mut points = vec![Keypoint::new(0.0, 0.0, 1.0); 33];
    let mut place = |index: usize, x: f64, y: f64| points[index] = Keypoint::new(x, y, 1.0);
    place(11, 350.0 + sway, 200.0 + bounce);
    place(12, 250.0 + sway, 200.0 + bounce);
    place(13, 360.0 + sway, 260.0 + bounce);
    place(14, 240.0 + sway, 260.0 + bounce);
    place(15, 310.0 + sway, 300.0 + bounce);
    place(16, 290.0 + sway, 300.0 + bounce);
    place(23, 330.0 + sway, 350.0 + bounce);
    place(24, 270.0 + sway, 350.0 + bounce);
    place(25, 330.0 + sway, 450.0 + bounce);
    place(26, 270.0 + sway, 450.0 + bounce);
    place(27, 310.0 + stride, 550.0);
    place(28, 290.0 - stride, 550.0);
    KeypointSet::from_pixels(&points)
}

/// A runner: hips bounce at 2.2 Hz (0.1 shoulder widths) while the legs and hips
/// swing at half that cadence.
fn running_frame(index: usize) -> KeypointSet {
    let t = index as f64 / FPS;
    let stride_phase = (2.0 * PI * 1.1 * t).sin();
    figure(Motion {
        bounce: 10.0 * (2.0 * PI * 2.2 * t).sin(),
        sway: 40.0 * stride_phase,
        stride: 27.0 * stride_phase,
    })
}

fn replay(session: &mut ActivitySession, frames: impl IntoIterator<Item = KeypointSet>) -> Vec<Assessment> {
    frames.into_iter().map(|kp| session.process_frame(&kp, FRAME)).collect()
}

#[test]
fn synthetic_run_stabilizes_to_running() {
    let mut session = ActivitySession::new(SessionConfig::default());
    let assessments = replay(&mut session, (0..90).map(running_frame));

    for (index, assessment) in assessments.iter().enumerate().skip(30) {
        assert_eq!(assessment.label, Some(ActivityClass::Running), "frame {index}");
    }
    let last = assessments.last().unwrap();
    assert_eq!(last.label_name(), "running");
    assert!(last.confidence >= 0.5, "confidence {}", last.confidence);
    assert!(last.score > 70, "score {}", last.score);

    let stats = session.current_statistics().unwrap();
    assert!((2.0..2.5).contains(&stats.dominant_frequency), "frequency {}", stats.dominant_frequency);
    assert!(stats.periodicity_strength > 10.0);
    assert!((0.8..1.4).contains(&stats.ankle_speed_norm), "ankle speed {}", stats.ankle_speed_norm);
    assert!((stats.hip_y_std_norm - 0.0707).abs() < 0.01, "hip std {}", stats.hip_y_std_norm);
}

#[test]
fn empty_window_is_unknown() {
    let mut session = ActivitySession::new(SessionConfig::default());
    let assessment = session.classify_and_score();
    assert_eq!(assessment.label_name(), "unknown");
    assert_eq!(assessment.score, 0);
    assert_eq!(assessment.confidence, 0.0);
}

#[test]
fn still_figure_is_standing() {
    let mut session = ActivitySession::new(SessionConfig::default());
    let assessments = replay(&mut session, (0..45).map(|_| figure(Motion::default())));
    assert!(assessments.iter().all(|a| a.label == Some(ActivityClass::Standing)));
    assert_eq!(assessments.last().unwrap().score, 100);
}

#[test]
fn forced_mode_overrides_a_standing_figure() {
    let config = SessionConfig { mode: "squat".to_string(), ..SessionConfig::default() };
    let mut session = ActivitySession::new(config);
    let assessments = replay(&mut session, (0..20).map(|_| figure(Motion::default())));
    for assessment in &assessments {
        assert_eq!(assessment.label, Some(ActivityClass::Squat));
        assert!(assessment.confidence >= 0.55);
    }
}

#[test]
fn invisible_frames_do_not_disturb_the_label() {
    let mut session = ActivitySession::new(SessionConfig::default());
    replay(&mut session, (0..10).map(|_| figure(Motion::default())));
    let before = session.current_statistics();

    let hidden = KeypointSet::from_pixels(&[]);
    let assessment = session.process_frame(&hidden, FRAME);
    assert_eq!(assessment.label, Some(ActivityClass::Standing));
    assert_eq!(session.current_statistics(), before);
}

#[test]
fn window_holds_only_the_most_recent_frames() {
    let config = SessionConfig { fps: 4.0, ..SessionConfig::default() };
    let mut session = ActivitySession::new(config);
    let capacity = session.window().capacity();
    assert_eq!(capacity, 12);

    for i in 0..30 {
        session.push(FrameFeatures::Invalid);
        if i >= 20 {
            session.process_frame(&figure(Motion { sway: i as f64, ..Motion::default() }), FRAME);
        }
    }
    assert_eq!(session.window().len(), capacity);
    let valid: Vec<f64> = session.window().valid_records().map(|f| f.hip_mid.x).collect();
    assert_eq!(valid, (24..30).map(|i| 300.0 + i as f64).collect::<Vec<_>>());
}

#[test]
fn statistics_requests_are_idempotent() {
    let mut session = ActivitySession::new(SessionConfig::default());
    replay(&mut session, (0..60).map(running_frame));
    assert_eq!(session.current_statistics(), session.current_statistics());
}
