//! Ordering passes of a frame by the resources they produce and consume.
//!
//! Every pass declares the virtual resources it reads, together with the state it expects each one to arrive in,
//! and the resources it writes, together with the state it leaves them in. A pass writing `grid` outputs the
//! version `grid+`, and a pass reading `grid+` runs after it. Building the schedule checks that each handoff is
//! consistent: the state a consumer expects must be exactly the state the producer declared as its output.
//!
//! # Example
//! ```
//! use deimos::prelude::*;
//!
//! let grid = VirtualResource::buffer("voxel grid");
//! let clear = ScheduledPassBuilder::new("clear voxel grid")
//!     .output(&grid, ResourceState::UnorderedAccess)
//!     .build();
//! let cleared = clear.output(&grid).unwrap();
//! let visualize = ScheduledPassBuilder::new("visualize voxel grid")
//!     .input(&cleared, ResourceState::UnorderedAccess)
//!     .build();
//! let schedule = FrameSchedule::build(vec![visualize, clear])?;
//! assert_eq!(schedule.order(), vec!["clear voxel grid", "visualize voxel grid"]);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::collections::HashMap;

use anyhow::Result;
use petgraph::Graph;
use petgraph::graph::NodeIndex;

use crate::command_buffer::CommandList;
use crate::core::error::Error;
use crate::core::render_env::RenderEnv;
use crate::graph::virtual_resource::VirtualResource;
use crate::resource::state::ResourceState;

/// Function called to record a scheduled pass. The command list is already recording.
pub type RecordFn<'cb> = Box<dyn FnMut(&mut RenderEnv, &mut CommandList) -> Result<()> + 'cb>;

/// A node of the frame schedule.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ScheduledPass<'cb> {
    name: String,
    inputs: Vec<(VirtualResource, ResourceState)>,
    outputs: Vec<(VirtualResource, ResourceState)>,
    #[derivative(Debug = "ignore")]
    record: Option<RecordFn<'cb>>,
}

impl<'cb> ScheduledPass<'cb> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resources read by this pass, with the state each must arrive in.
    pub fn inputs(&self) -> &[(VirtualResource, ResourceState)] {
        &self.inputs
    }

    /// Resources written by this pass, with the state each is left in.
    pub fn outputs(&self) -> &[(VirtualResource, ResourceState)] {
        &self.outputs
    }

    /// The version of `resource` this pass produces, if it writes it at all.
    pub fn output(&self, resource: &VirtualResource) -> Option<VirtualResource> {
        self.outputs
            .iter()
            .find(|(output, _)| output.is_associated_with(resource))
            .map(|(output, _)| output.clone())
    }
}

/// Builder for a [`ScheduledPass`].
#[derive(Debug)]
pub struct ScheduledPassBuilder<'cb> {
    inner: ScheduledPass<'cb>,
}

impl<'cb> ScheduledPassBuilder<'cb> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: ScheduledPass {
                name: name.into(),
                inputs: Vec::new(),
                outputs: Vec::new(),
                record: None,
            },
        }
    }

    /// Read `resource`, which must arrive in `state`.
    pub fn input(mut self, resource: &VirtualResource, state: ResourceState) -> Self {
        self.inner.inputs.push((resource.clone(), state));
        self
    }

    /// Write `resource`, leaving the next version of it in `state`.
    pub fn output(mut self, resource: &VirtualResource, state: ResourceState) -> Self {
        self.inner.outputs.push((resource.upgrade(), state));
        self
    }

    /// Set the function recording this pass.
    pub fn record(mut self, f: impl FnMut(&mut RenderEnv, &mut CommandList) -> Result<()> + 'cb) -> Self {
        self.inner.record = Some(Box::new(f));
        self
    }

    pub fn build(self) -> ScheduledPass<'cb> {
        self.inner
    }
}

/// Passes of a frame in a dependency graph, ordered for execution.
#[derive(Debug)]
pub struct FrameSchedule<'cb> {
    graph: Graph<ScheduledPass<'cb>, String>,
    order: Vec<NodeIndex>,
}

impl<'cb> FrameSchedule<'cb> {
    /// Connect every consumer to the producer of the resource version it reads and order the result.
    /// # Errors
    /// * [`Error::IllegalSchedule`] if two passes produce the same resource version.
    /// * [`Error::StateHandoffMismatch`] if a consumer expects a resource in another state than its producer leaves it in.
    /// * [`Error::NoResourceBound`] if a non-source version is read but never produced.
    /// * [`Error::GraphHasCycle`] if the passes cannot be ordered.
    pub fn build(passes: Vec<ScheduledPass<'cb>>) -> Result<Self> {
        let mut graph = Graph::new();
        let mut producers: HashMap<String, (NodeIndex, ResourceState)> = HashMap::new();
        for pass in passes {
            let outputs = pass.outputs.clone();
            let node = graph.add_node(pass);
            for (resource, state) in outputs {
                if producers.insert(resource.uid.clone(), (node, state)).is_some() {
                    return Err(Error::IllegalSchedule(resource.uid).into());
                }
            }
        }

        for consumer in graph.node_indices().collect::<Vec<_>>() {
            let inputs = graph.node_weight(consumer).ok_or(Error::NodeNotFound)?.inputs.clone();
            for (resource, expected) in inputs {
                match producers.get(&resource.uid) {
                    Some(&(producer, produced)) => {
                        if produced != expected {
                            return Err(Error::StateHandoffMismatch {
                                resource: resource.uid,
                                produced,
                                expected,
                            }
                            .into());
                        }
                        graph.update_edge(producer, consumer, resource.uid);
                    }
                    None if !resource.is_source() => return Err(Error::NoResourceBound(resource.uid).into()),
                    None => {}
                }
            }
        }

        let order = petgraph::algo::toposort(&graph, None).map_err(|_| Error::GraphHasCycle)?;
        Ok(Self { graph, order })
    }

    /// Names of the passes in execution order.
    pub fn order(&self) -> Vec<&str> {
        self.order.iter().map(|&node| self.graph[node].name.as_str()).collect()
    }

    /// Number of producer to consumer dependencies.
    pub fn num_dependencies(&self) -> usize {
        self.graph.edge_count()
    }

    /// Record and execute every pass in order. Each pass gets its own command list, which is submitted and waited on
    /// before the next pass starts recording.
    pub fn execute(&mut self, env: &mut RenderEnv) -> Result<()> {
        for &node in &self.order {
            let pass = self.graph.node_weight_mut(node).ok_or(Error::NodeNotFound)?;
            let record = &mut pass.record;
            env.execute_pass(&pass.name, |env, cmd| match record.as_mut() {
                Some(record) => record(env, cmd),
                None => Ok(()),
            })?;
            debug!("Executed scheduled pass `{}`", pass.name);
        }
        Ok(())
    }
}
