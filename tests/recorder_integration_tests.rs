//! Integration tests for the episode recorder's orchestration
//!
//! The log and encoder are replaced with in-memory fakes so each test can see
//! exactly which records were written and what the encoder was asked to do.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use chrono::{Local, TimeZone};
use gymboard::{
    ClipOptions, DiscreteSpace, EnvMetadata, Environment, EpisodeRecorder, FrameEncoder,
    ImageSummary, MetricsLog, Policy, RecordError, RgbFrame, ScriptedEnv, Session, Transition,
};

// ============================================================================
// Fakes
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Record {
    Scalar { tag: String, value: f64, step: u64 },
    Image { tag: String, image: ImageSummary, step: u64 },
}

#[derive(Default)]
struct MemoryLog {
    records: Vec<Record>,
    flushes: usize,
    fail_writes: bool,
}

impl MetricsLog for MemoryLog {
    fn write_scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()> {
        if self.fail_writes {
            bail!("disk full");
        }
        self.records.push(Record::Scalar {
            tag: tag.to_string(),
            value,
            step,
        });
        Ok(())
    }

    fn write_image(&mut self, tag: &str, image: &ImageSummary, step: u64) -> Result<()> {
        if self.fail_writes {
            bail!("disk full");
        }
        self.records.push(Record::Image {
            tag: tag.to_string(),
            image: image.clone(),
            step,
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Remembers every encode call and returns a fixed blob
#[derive(Default)]
struct CountingEncoder {
    calls: RefCell<Vec<(usize, u32)>>,
    fail: bool,
}

impl FrameEncoder for CountingEncoder {
    fn encode(&self, frames: &[RgbFrame], fps: u32) -> Result<Vec<u8>> {
        self.calls.borrow_mut().push((frames.len(), fps));
        if self.fail {
            bail!("encoder exploded");
        }
        Ok(b"GIF89a-fake".to_vec())
    }
}

/// Scripted environment whose `step` panics after a number of steps
struct PanickingEnv {
    inner: ScriptedEnv,
    steps_before_panic: usize,
}

impl Environment for PanickingEnv {
    type State = usize;

    fn id(&self) -> &str {
        self.inner.id()
    }

    fn metadata(&self) -> &EnvMetadata {
        self.inner.metadata()
    }

    fn action_space(&self) -> &DiscreteSpace {
        self.inner.action_space()
    }

    fn reset(&mut self) -> Result<usize> {
        self.inner.reset()
    }

    fn step(&mut self, action: usize) -> Result<Transition<usize>> {
        if self.inner.actions.len() == self.steps_before_panic {
            panic!("physics blew up");
        }
        self.inner.step(action)
    }

    fn render(&mut self) -> Result<RgbFrame> {
        self.inner.render()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

fn session() -> Session {
    let created = Local.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    Session::at("logs/", 6006, &created)
}

fn recorder() -> EpisodeRecorder<MemoryLog, CountingEncoder> {
    EpisodeRecorder::with_parts(session(), MemoryLog::default(), CountingEncoder::default())
        .with_seed(11)
}

fn cartpole() -> ScriptedEnv {
    ScriptedEnv::new("CartPole-v1", vec![1.0, 0.0, 2.0])
        .unwrap()
        .with_frame_size(40, 60)
        .with_metadata(EnvMetadata::new().with("video.frames_per_second", 24))
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn test_scalar_steps_auto_increment_from_zero() {
    let mut rec = recorder();
    assert_eq!(rec.write_scalar("reward", 1.0, None).unwrap(), 0);
    assert_eq!(rec.write_scalar("reward", 2.0, None).unwrap(), 1);

    assert_eq!(
        rec.log().records,
        vec![
            Record::Scalar {
                tag: "reward".into(),
                value: 1.0,
                step: 0
            },
            Record::Scalar {
                tag: "reward".into(),
                value: 2.0,
                step: 1
            },
        ]
    );
    // Every scalar is flushed before returning
    assert_eq!(rec.log().flushes, 2);
}

#[test]
fn test_explicit_scalar_step_sets_counter() {
    let mut rec = recorder();
    rec.write_scalar("reward", 1.0, None).unwrap();
    assert_eq!(rec.write_scalar("reward", 5.0, Some(40)).unwrap(), 40);
    assert_eq!(rec.session().step(), 40);
    assert_eq!(rec.write_scalar("reward", 6.0, None).unwrap(), 40);
    assert_eq!(rec.write_scalar("reward", 7.0, None).unwrap(), 41);
}

#[test]
fn test_same_step_and_label_append() {
    let mut rec = recorder();
    rec.write_scalar("loss", 0.5, Some(3)).unwrap();
    rec.write_scalar("loss", 0.4, Some(3)).unwrap();
    assert_eq!(rec.log().records.len(), 2);
}

#[test]
fn test_empty_label_rejected() {
    let mut rec = recorder();
    assert!(rec.write_scalar("", 1.0, None).is_err());
    assert!(rec.log().records.is_empty());
    assert_eq!(rec.session().step(), 0);
}

#[test]
fn test_scalar_log_failure_propagates() {
    let log = MemoryLog {
        fail_writes: true,
        ..MemoryLog::default()
    };
    let mut rec = EpisodeRecorder::with_parts(session(), log, CountingEncoder::default());

    let err = rec.write_scalar("reward", 1.0, None).unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(rec.log().flushes, 0);
}

// ============================================================================
// Clips
// ============================================================================

#[test]
fn test_cartpole_example_clip() {
    let mut rec = recorder();
    let mut env = cartpole();

    let summary = rec.write_env(&mut env, None, ClipOptions::default()).unwrap();

    assert_eq!(summary.tag, "CartPole-v1/ Rewards: 3");
    assert_eq!(summary.fps, 24);
    assert_eq!(summary.frame_count, 3);
    assert_eq!(summary.total_reward, 3.0);
    assert_eq!(summary.fallback_steps, 3);
    assert!(!summary.truncated);
    assert_eq!(*rec.encoder().calls.borrow(), vec![(3, 24)]);

    match &rec.log().records[..] {
        [Record::Image { tag, image, step }] => {
            assert_eq!(tag, "CartPole-v1/ Rewards: 3");
            assert_eq!(*step, 0);
            assert_eq!((image.height, image.width, image.colorspace), (40, 60, 3));
            assert_eq!(image.encoded, b"GIF89a-fake".to_vec());
        }
        other => panic!("unexpected records {other:?}"),
    }
}

#[test]
fn test_episode_renders_one_extra_frame_and_closes() {
    let mut rec = recorder();
    let mut env = cartpole();

    rec.write_env(&mut env, None, ClipOptions::default()).unwrap();

    assert_eq!(env.reset_count, 1);
    // One frame per step plus the header render
    assert_eq!(env.render_count, 4);
    assert_eq!(env.actions.len(), 3);
    assert_eq!(env.close_count, 1);
}

#[test]
fn test_frame_count_matches_episode_length() {
    for length in [1, 2, 7, 20] {
        let mut rec = recorder();
        let mut env = ScriptedEnv::new("Len-v0", vec![0.5; length]).unwrap();
        let summary = rec.write_env(&mut env, None, ClipOptions::default()).unwrap();

        assert_eq!(summary.frame_count, length);
        assert_eq!(rec.encoder().calls.borrow()[0].0, length);
        assert_eq!(summary.total_reward, 0.5 * length as f64);
    }
}

#[test]
fn test_clip_uses_counter_without_advancing() {
    let mut rec = recorder();
    rec.write_scalar("reward", 1.0, None).unwrap();
    rec.write_scalar("reward", 1.0, None).unwrap();

    let summary = rec
        .write_env(&mut cartpole(), None, ClipOptions::default())
        .unwrap();
    assert_eq!(summary.step, 2);
    assert_eq!(rec.session().step(), 2);

    let summary = rec
        .write_env(&mut cartpole(), None, ClipOptions::default())
        .unwrap();
    assert_eq!(summary.step, 2);

    assert_eq!(rec.write_scalar("reward", 1.0, None).unwrap(), 2);
}

#[test]
fn test_clip_explicit_step() {
    let mut rec = recorder();
    let summary = rec
        .write_env(&mut cartpole(), None, ClipOptions::default().at_step(17))
        .unwrap();
    assert_eq!(summary.step, 17);
    assert_eq!(rec.session().step(), 0);
}

#[test]
fn test_frame_rate_sources() {
    let mut rec = recorder();

    let summary = rec
        .write_env(&mut cartpole(), None, ClipOptions::default().with_speed(2.0))
        .unwrap();
    assert_eq!(summary.fps, 48);

    let summary = rec
        .write_env(
            &mut cartpole(),
            None,
            ClipOptions::default().with_fps(10.0).with_speed(1.5),
        )
        .unwrap();
    assert_eq!(summary.fps, 15);

    // No metadata at all falls back to 24
    let mut bare = ScriptedEnv::new("Bare-v0", vec![1.0]).unwrap();
    let summary = rec.write_env(&mut bare, None, ClipOptions::default()).unwrap();
    assert_eq!(summary.fps, 24);

    // Unreadable metadata falls back to 24 as well
    let mut odd = ScriptedEnv::new("Odd-v0", vec![1.0])
        .unwrap()
        .with_metadata(EnvMetadata::new().with("video.frames_per_second", "n/a"));
    let summary = rec.write_env(&mut odd, None, ClipOptions::default()).unwrap();
    assert_eq!(summary.fps, 24);
}

#[test]
fn test_failing_policy_matches_no_policy() {
    let mut rec_none = recorder();
    let mut env_none = ScriptedEnv::new("Rand-v0", vec![1.0; 12])
        .unwrap()
        .with_actions(4)
        .unwrap();
    let none = rec_none
        .write_env(&mut env_none, None, ClipOptions::default())
        .unwrap();

    let mut rec_fail = recorder();
    let mut env_fail = ScriptedEnv::new("Rand-v0", vec![1.0; 12])
        .unwrap()
        .with_actions(4)
        .unwrap();
    let mut policy = |_: &usize| -> Result<Vec<Vec<f32>>> { Err(anyhow!("policy crashed")) };
    let failed = rec_fail
        .write_env(
            &mut env_fail,
            Some(&mut policy as &mut dyn Policy<usize>),
            ClipOptions::default(),
        )
        .unwrap();

    assert_eq!(env_none.actions, env_fail.actions);
    assert_eq!(env_none.render_count, env_fail.render_count);
    assert_eq!(none, failed);
    assert_eq!(rec_none.log().records, rec_fail.log().records);
    assert_eq!(
        *rec_none.encoder().calls.borrow(),
        *rec_fail.encoder().calls.borrow()
    );
}

#[test]
fn test_greedy_policy_drives_actions() {
    let mut rec = recorder();
    let mut env = ScriptedEnv::new("Greedy-v0", vec![1.0; 5])
        .unwrap()
        .with_actions(3)
        .unwrap();
    let mut policy = |_: &usize| -> Result<Vec<Vec<f32>>> { Ok(vec![vec![0.1, 0.2, 0.9]]) };

    let summary = rec
        .write_env(
            &mut env,
            Some(&mut policy as &mut dyn Policy<usize>),
            ClipOptions::default(),
        )
        .unwrap();

    assert_eq!(env.actions, vec![2; 5]);
    assert_eq!(summary.fallback_steps, 0);
}

#[test]
fn test_endless_episode_is_truncated() {
    let mut rec = recorder().with_max_episode_steps(50);
    let mut env = ScriptedEnv::new("Forever-v0", vec![1.0]).unwrap().endless();

    let summary = rec.write_env(&mut env, None, ClipOptions::default()).unwrap();

    assert!(summary.truncated);
    assert_eq!(summary.frame_count, 50);
    assert_eq!(summary.tag, "Forever-v0/ Rewards: 50");
}

#[test]
fn test_panicking_policy_falls_back_and_closes_env() {
    let mut rec_none = recorder();
    let mut env_none = cartpole();
    let none = rec_none
        .write_env(&mut env_none, None, ClipOptions::default())
        .unwrap();

    let mut rec = recorder();
    let mut env = cartpole();
    let mut policy = |_: &usize| -> Result<Vec<Vec<f32>>> {
        let scores: Vec<f32> = Vec::new();
        Ok(vec![vec![scores[3]]])
    };
    let summary = rec
        .write_env(
            &mut env,
            Some(&mut policy as &mut dyn Policy<usize>),
            ClipOptions::default(),
        )
        .unwrap();

    assert_eq!(summary.fallback_steps, 3);
    assert_eq!(summary, none);
    assert_eq!(env.actions, env_none.actions);
    assert_eq!(env.close_count, 1);
}

// ============================================================================
// Failure paths
// ============================================================================

#[test]
fn test_panicking_env_is_still_closed() {
    let mut rec = recorder();
    let mut env = PanickingEnv {
        inner: cartpole(),
        steps_before_panic: 1,
    };

    let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
        rec.write_env(&mut env, None, ClipOptions::default())
    }));

    assert!(unwound.is_err());
    assert_eq!(env.inner.close_count, 1);
    assert!(rec.log().records.is_empty());
}

#[test]
fn test_out_of_range_steps_rejected() {
    let mut rec = recorder();
    let err = rec.write_scalar("reward", 1.0, Some(u64::MAX)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RecordError>(),
        Some(RecordError::StepOutOfRange(u64::MAX))
    ));
    assert_eq!(rec.session().step(), 0);

    let mut env = cartpole();
    let err = rec
        .write_env(&mut env, None, ClipOptions::default().at_step(u64::MAX))
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RecordError>(),
        Some(RecordError::StepOutOfRange(u64::MAX))
    ));
    // Rejected before the episode starts, but the environment is still closed
    assert_eq!(env.reset_count, 0);
    assert_eq!(env.close_count, 1);
    assert!(rec.log().records.is_empty());
}

#[test]
fn test_encoder_failure_propagates_and_closes_env() {
    let encoder = CountingEncoder {
        fail: true,
        ..CountingEncoder::default()
    };
    let mut rec = EpisodeRecorder::with_parts(session(), MemoryLog::default(), encoder);
    let mut env = cartpole();

    let err = rec
        .write_env(&mut env, None, ClipOptions::default())
        .unwrap_err();

    assert!(format!("{err:#}").contains("encoder exploded"));
    assert!(rec.log().records.is_empty());
    assert_eq!(env.close_count, 1);
}

#[test]
fn test_render_failure_still_closes_env() {
    let mut rec = recorder();
    let mut env = cartpole().failing_render_after(2);

    assert!(rec.write_env(&mut env, None, ClipOptions::default()).is_err());
    assert_eq!(env.close_count, 1);
    assert!(rec.encoder().calls.borrow().is_empty());
}

#[test]
fn test_log_failure_propagates() {
    let log = MemoryLog {
        fail_writes: true,
        ..MemoryLog::default()
    };
    let mut rec = EpisodeRecorder::with_parts(session(), log, CountingEncoder::default());
    let mut env = cartpole();

    let err = rec
        .write_env(&mut env, None, ClipOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(env.close_count, 1);
}

#[test]
fn test_invalid_speed_rejected() {
    let mut rec = recorder();
    let mut env = cartpole();
    assert!(rec
        .write_env(&mut env, None, ClipOptions::default().with_speed(0.0))
        .is_err());
    assert_eq!(env.close_count, 1);
}

// ============================================================================
// Operator actions
// ============================================================================

#[test]
fn test_dashboard_command_uses_session() {
    let rec = recorder();
    assert_eq!(
        rec.dashboard_command().to_string(),
        "tensorboard --logdir logs/ --port=6006 --bind_all"
    );
    assert_eq!(rec.session().run_dir(), Path::new("logs/Oct_19_12:00:00"));
}

#[test]
fn test_clean_without_logdir_does_not_fail() {
    let dir = tempfile::tempdir().unwrap();
    let created = Local::now();
    let session = Session::at(dir.path().join("absent"), 6006, &created);
    let rec = EpisodeRecorder::with_parts(session, MemoryLog::default(), CountingEncoder::default());
    rec.clean();
}
