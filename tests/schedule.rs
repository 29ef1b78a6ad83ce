use std::cell::RefCell;

use anyhow::Result;

use deimos::command_buffer::command::Command;
use deimos::prelude::*;

mod framework;

fn schedule_error(passes: Vec<deimos::graph::schedule::ScheduledPass>) -> Error {
    let error = FrameSchedule::build(passes).expect_err("Schedule should be rejected.");
    error.downcast::<Error>().expect("Schedule errors should be deimos errors.")
}

#[test]
pub fn passes_are_ordered_by_resource_versions() -> Result<()> {
    let grid = VirtualResource::buffer("voxel grid");
    let gbuffer = VirtualResource::texture("gbuffer");

    let clear = ScheduledPassBuilder::new("clear voxel grid")
        .output(&grid, ResourceState::UnorderedAccess)
        .build();
    let cleared = clear.output(&grid).expect("Clear writes the grid.");
    let render = ScheduledPassBuilder::new("render gbuffer")
        .output(&gbuffer, ResourceState::RenderTarget)
        .build();
    let rendered = render.output(&gbuffer).expect("Render writes the gbuffer.");
    let create = ScheduledPassBuilder::new("create voxel grid")
        .input(&cleared, ResourceState::UnorderedAccess)
        .input(&rendered, ResourceState::RenderTarget)
        .output(&cleared, ResourceState::NonPixelShaderResource)
        .build();
    let filled = create.output(&cleared).expect("Create writes the grid.");
    let visualize = ScheduledPassBuilder::new("visualize voxel grid")
        .input(&filled, ResourceState::NonPixelShaderResource)
        .build();

    assert_eq!(filled.version(), 2);
    assert!(filled.is_associated_with(&grid));

    let schedule = FrameSchedule::build(vec![visualize, create, render, clear])?;
    let order = schedule.order();
    assert_eq!(order.len(), 4);
    assert_eq!(order.last(), Some(&"visualize voxel grid"));
    assert_eq!(order[2], "create voxel grid", "Voxelization needs both the grid and the gbuffer.");
    assert_eq!(schedule.num_dependencies(), 3);
    Ok(())
}

#[test]
pub fn source_resources_need_no_producer() -> Result<()> {
    let depth = VirtualResource::texture("depth");
    let fill = ScheduledPassBuilder::new("fill depth buffer")
        .input(&depth, ResourceState::DepthWrite)
        .build();
    let schedule = FrameSchedule::build(vec![fill])?;
    assert_eq!(schedule.order(), vec!["fill depth buffer"]);
    assert_eq!(schedule.num_dependencies(), 0);
    Ok(())
}

#[test]
pub fn state_handoff_must_match() -> Result<()> {
    let grid = VirtualResource::buffer("voxel grid");
    let clear = ScheduledPassBuilder::new("clear voxel grid")
        .output(&grid, ResourceState::UnorderedAccess)
        .build();
    let cleared = clear.output(&grid).expect("Clear writes the grid.");
    let visualize = ScheduledPassBuilder::new("visualize voxel grid")
        .input(&cleared, ResourceState::PixelShaderResource)
        .build();

    match schedule_error(vec![clear, visualize]) {
        Error::StateHandoffMismatch {
            resource,
            produced,
            expected,
        } => {
            assert_eq!(resource, cleared.uid());
            assert_eq!(produced, ResourceState::UnorderedAccess);
            assert_eq!(expected, ResourceState::PixelShaderResource);
        }
        other => panic!("Expected a state handoff mismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
pub fn duplicate_producers_are_rejected() -> Result<()> {
    let grid = VirtualResource::buffer("voxel grid");
    let first = ScheduledPassBuilder::new("first")
        .output(&grid, ResourceState::UnorderedAccess)
        .build();
    let second = ScheduledPassBuilder::new("second")
        .output(&grid, ResourceState::UnorderedAccess)
        .build();
    assert!(matches!(schedule_error(vec![first, second]), Error::IllegalSchedule(_)));
    Ok(())
}

#[test]
pub fn unproduced_version_is_rejected() -> Result<()> {
    let grid = VirtualResource::buffer("voxel grid").upgrade();
    let visualize = ScheduledPassBuilder::new("visualize voxel grid")
        .input(&grid, ResourceState::UnorderedAccess)
        .build();
    assert!(
        matches!(schedule_error(vec![visualize]), Error::NoResourceBound(uid) if uid == grid.uid()),
        "Reading a version nobody writes should fail."
    );
    Ok(())
}

#[test]
pub fn cycles_are_rejected() -> Result<()> {
    let a = VirtualResource::buffer("a");
    let b = VirtualResource::buffer("b");
    let first = ScheduledPassBuilder::new("first")
        .input(&b.upgrade(), ResourceState::UnorderedAccess)
        .output(&a, ResourceState::UnorderedAccess)
        .build();
    let second = ScheduledPassBuilder::new("second")
        .input(&a.upgrade(), ResourceState::UnorderedAccess)
        .output(&b, ResourceState::UnorderedAccess)
        .build();
    assert!(matches!(schedule_error(vec![first, second]), Error::GraphHasCycle));
    Ok(())
}

#[test]
pub fn execute_records_in_order() -> Result<()> {
    let mut context = framework::make_context().expect("Can initialize context.");
    let grid_config = framework::buffer(&mut context.env, BufferDesc::constant("grid config", 256))?;
    let grid_buffer = framework::buffer(&mut context.env, BufferDesc::structured("grid", 8 * 8 * 8, 16))?;
    let num_grid_cells = context.env.settings.num_grid_cells;
    let clear_pass = ClearVoxelGridPass::init(
        &mut context.env,
        clear_voxel_grid::InitParams {
            grid_config,
            grid: grid_buffer.clone(),
            num_grid_cells,
        },
    )?;

    let log = RefCell::new(Vec::new());
    let grid = VirtualResource::buffer("voxel grid");
    let clear = ScheduledPassBuilder::new("clear voxel grid")
        .output(&grid, clear_pass.output_resource_states().grid_state)
        .record(|env, cmd| {
            log.borrow_mut().push("clear voxel grid");
            clear_pass.record(env, cmd)
        })
        .build();
    let cleared = clear.output(&grid).expect("Clear writes the grid.");
    let consume = ScheduledPassBuilder::new("consume voxel grid")
        .input(&cleared, ResourceState::UnorderedAccess)
        .record(|_, _| {
            log.borrow_mut().push("consume voxel grid");
            Ok(())
        })
        .build();
    let unrecorded = ScheduledPassBuilder::new("nothing to record").build();

    let mut schedule = FrameSchedule::build(vec![consume, unrecorded, clear])?;
    schedule.execute(&mut context.env)?;
    drop(schedule);

    assert_eq!(log.into_inner(), vec!["clear voxel grid", "consume voxel grid"]);
    assert_eq!(grid_buffer.state(), ResourceState::UnorderedAccess);
    let submissions = context.backend.submissions()?;
    assert_eq!(submissions.len(), 3, "Every scheduled pass should be submitted on its own.");
    assert_eq!(
        submissions
            .iter()
            .map(|submission| framework::count_commands(submission, |command| matches!(command, Command::Dispatch { .. })))
            .sum::<usize>(),
        1
    );
    Ok(())
}
