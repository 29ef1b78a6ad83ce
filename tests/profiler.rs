use anyhow::Result;

use deimos::command_buffer::command::Command;
use deimos::prelude::*;

mod framework;

fn profiled_context(max_profiles: u32) -> Result<framework::Context> {
    framework::make_context_with_settings(|settings| settings.profiling(true).max_profiles(max_profiles).render_latency(2))
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
pub fn profiling_is_off_by_default() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    assert!(context.env.profiler.is_none());
    context.env.execute_pass("unprofiled", |env, cmd| {
        let slot = env.start_profile(cmd, "unprofiled");
        assert_eq!(slot, None, "Without a profiler no region should be opened.");
        env.end_profile(cmd, slot);
        Ok(())
    })?;
    let submission = framework::last_submission(&context)?;
    assert_eq!(
        framework::count_commands(&submission, |command| matches!(command, Command::EndQuery { .. })),
        0
    );
    context.env.end_profiling_frame()?;
    Ok(())
}

#[test]
pub fn nested_profiles() -> Result<()> {
    let mut context = profiled_context(4).expect("Can initialize context.");
    context.env.execute_pass("frame", |env, cmd| {
        let outer = env.start_profile(cmd, "frame");
        let inner = env.start_profile(cmd, "tiled light culling");
        cmd.dispatch(4, 4, 1);
        env.end_profile(cmd, inner);
        env.end_profile(cmd, outer);
        Ok(())
    })?;
    context.env.end_profiling_frame()?;

    let submission = framework::last_submission(&context)?;
    assert_eq!(
        framework::count_commands(&submission, |command| matches!(command, Command::EndQuery { .. })),
        4,
        "Every profile should write a start and an end timestamp."
    );

    let profiler = context.env.profiler.as_ref().expect("Profiling was enabled.");
    assert_eq!(profiler.num_profiles(), 2);
    let report = profiler.report();
    assert_eq!(report[0].name, "frame");
    assert!(approx_eq(report[0].avg_ms, 1.5), "Outer region spans three ticks, got {}.", report[0].avg_ms);
    assert!(approx_eq(report[1].avg_ms, 0.5), "Inner region spans one tick, got {}.", report[1].avg_ms);
    assert!(approx_eq(report[1].max_ms, 0.5));
    Ok(())
}

#[test]
pub fn samples_are_averaged_over_frames() -> Result<()> {
    let mut context = profiled_context(4).expect("Can initialize context.");
    for frame_index in 0..2 {
        if let Some(profiler) = context.env.profiler.as_mut() {
            profiler.start_frame(frame_index);
        }
        let num_nested = frame_index + 1;
        context.env.execute_pass("frame", |env, cmd| {
            let slot = env.start_profile(cmd, "voxelize");
            // Filler regions advance the emulated clock between start and end.
            for _ in 0..num_nested {
                let filler = env.start_profile(cmd, "filler");
                env.end_profile(cmd, filler);
            }
            env.end_profile(cmd, slot);
            Ok(())
        })?;
        context.env.end_profiling_frame()?;
    }

    let profiler = context.env.profiler.as_ref().expect("Profiling was enabled.");
    assert_eq!(profiler.num_profiles(), 2, "A name should map to the same slot in every frame.");
    let voxelize = &profiler.report()[0];
    // 1.5 ms in the first frame, 2.5 ms in the second.
    assert!(approx_eq(voxelize.avg_ms, 2.0), "Expected an average of 2 ms, got {}.", voxelize.avg_ms);
    assert!(approx_eq(voxelize.max_ms, 2.5));
    Ok(())
}

#[test]
#[should_panic]
pub fn profiler_out_of_slots() {
    let mut context = profiled_context(1).expect("Can initialize context.");
    let _ = context.env.execute_pass("frame", |env, cmd| {
        env.start_profile(cmd, "first");
        env.start_profile(cmd, "second");
        Ok(())
    });
}

#[test]
#[should_panic]
pub fn frame_index_beyond_render_latency() {
    let mut context = profiled_context(4).expect("Can initialize context.");
    context.env.profiler.as_mut().unwrap().start_frame(2);
}
