use anyhow::Result;
use futures::executor::block_on;

use deimos::command_buffer::command::Command;
use deimos::prelude::*;

mod framework;

#[test]
pub fn execute_pass_signals_fence() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let env = &mut context.env;
    assert_eq!(env.fence.completed_value()?, 0, "Fence should start at zero.");

    env.execute_pass("first", |_, _| Ok(()))?;
    env.execute_pass("second", |_, _| Ok(()))?;

    assert_eq!(env.last_submission_fence_value, 2, "Every pass should signal a new fence value.");
    assert_eq!(env.fence.completed_value()?, 2);
    block_on(env.fence.wait_for(2))?;
    block_on(env.fence.wait_for(1))?;
    Ok(())
}

#[test]
pub fn waiting_for_unsignaled_value_fails() -> Result<()> {
    let context = framework::make_context().expect("Can initialize context.");
    assert!(
        context.env.fence.wait_for_signal_on_cpu(3).is_err(),
        "Waiting on a value nobody will signal should not block forever."
    );
    context.env.fence.wait_for_signal_on_cpu(0)?;
    Ok(())
}

#[test]
pub fn removed_device_fails_submission() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    context.env.execute_pass("before removal", |_, _| Ok(()))?;
    context.backend.remove_device()?;

    let error = context
        .env
        .execute_pass("after removal", |_, cmd| {
            cmd.dispatch(1, 1, 1);
            Ok(())
        })
        .expect_err("Submitting to a removed device should fail.");
    assert!(
        matches!(error.downcast_ref::<Error>(), Some(Error::DeviceRemoved)),
        "Expected a removed device, got {error:?}"
    );
    assert_eq!(context.backend.submissions()?.len(), 1, "Nothing should be executed after removal.");
    Ok(())
}

#[test]
pub fn passes_reuse_completed_command_lists() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    for name in ["a", "b", "c"] {
        context.env.execute_pass(name, |_, cmd| {
            cmd.dispatch(1, 1, 1);
            Ok(())
        })?;
    }
    assert_eq!(context.env.command_lists.num_created(), 1, "Completed lists should be recycled.");

    let submissions = context.backend.submissions()?;
    assert_eq!(submissions.len(), 3);
    assert!(submissions.iter().all(|submission| submission.list == "command list 1"));
    for submission in &submissions {
        assert_eq!(
            framework::count_commands(submission, |command| matches!(command, Command::Dispatch { .. })),
            1,
            "A reused list should not keep commands of its previous recording."
        );
    }
    Ok(())
}

#[test]
pub fn pool_holds_back_lists_in_flight() -> Result<()> {
    let context = framework::make_context().expect("Can initialize context.");
    let fence = &context.env.fence;
    let mut pool = CommandListPool::new();

    let first = pool.acquire(fence)?;
    let second = pool.acquire(fence)?;
    assert_ne!(first.name(), second.name());
    pool.release(first, 10);
    let third = pool.acquire(fence)?;
    assert_eq!(pool.num_created(), 3, "A list whose fence value did not complete must not be reused.");

    pool.release(second, 0);
    let reused = pool.acquire(fence)?;
    assert_eq!(reused.name(), "command list 2");
    assert_eq!(pool.num_created(), 3);
    drop(third);
    Ok(())
}

#[test]
#[cfg(feature = "debug-markers")]
pub fn passes_are_wrapped_in_events() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    context.env.execute_pass("marked", |_, cmd| {
        cmd.dispatch(2, 2, 2);
        Ok(())
    })?;
    let submission = framework::last_submission(&context)?;
    assert_eq!(submission.commands.first(), Some(&Command::BeginEvent("marked".to_owned())));
    assert_eq!(submission.commands.last(), Some(&Command::EndEvent));
    Ok(())
}

#[test]
#[should_panic]
pub fn recording_into_closed_list() {
    let mut cmd = CommandList::new("closed");
    cmd.dispatch(1, 1, 1);
}

#[test]
#[should_panic]
pub fn begin_twice() {
    let mut cmd = CommandList::new("twice");
    cmd.begin(None);
    cmd.begin(None);
}

#[test]
#[should_panic]
pub fn submit_while_recording() {
    let context = framework::make_context().expect("Can initialize context.");
    let mut cmd = CommandList::new("open");
    cmd.begin(None);
    let _ = context.env.submit(&[&cmd]);
}

#[test]
#[should_panic]
pub fn empty_barrier_call() {
    let mut cmd = CommandList::new("empty barriers");
    cmd.begin(None);
    cmd.resource_barrier(&[]);
}
