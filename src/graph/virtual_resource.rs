/// Kind of resource a [`VirtualResource`] stands for.
#[derive(Debug, Default, Copy, Clone, Hash, Eq, PartialEq)]
pub enum VirtualResourceKind {
    #[default]
    Texture,
    Buffer,
}

/// Names one version of a resource flowing through a [`FrameSchedule`](crate::graph::schedule::FrameSchedule).
///
/// A pass writing a resource produces a new version of it, obtained with [`VirtualResource::upgrade`].
/// Consumers name the exact version they read, which is what orders passes in the schedule.
#[derive(Debug, Default, Clone, Hash, Eq, PartialEq)]
pub struct VirtualResource {
    pub(crate) uid: String,
    kind: VirtualResourceKind,
}

impl VirtualResource {
    /// A texture, for example the shared depth buffer. The name must not contain any '+' characters.
    pub fn texture(uid: impl Into<String>) -> Self {
        Self::new(uid.into(), VirtualResourceKind::Texture)
    }

    /// A buffer, for example the voxel grid. The name must not contain any '+' characters.
    pub fn buffer(uid: impl Into<String>) -> Self {
        Self::new(uid.into(), VirtualResourceKind::Buffer)
    }

    fn new(uid: String, kind: VirtualResourceKind) -> Self {
        assert!(!uid.contains('+'), "Virtual resource name `{uid}` cannot contain '+'.");
        Self { uid, kind }
    }

    /// The version of this resource after one more pass wrote to it.
    pub fn upgrade(&self) -> Self {
        VirtualResource {
            uid: self.uid.clone() + "+",
            kind: self.kind,
        }
    }

    /// Name of the resource without version suffix.
    pub fn name(&self) -> &str {
        self.uid.trim_end_matches('+')
    }

    /// Number of writes this version is away from the source version.
    pub fn version(&self) -> usize {
        self.uid.len() - self.name().len()
    }

    /// Whether this is the version that exists before any pass of the frame wrote to it.
    pub fn is_source(&self) -> bool {
        !self.uid.ends_with('+')
    }

    /// Two virtual resources are associated if they are versions of the same resource.
    pub fn is_associated_with(&self, rhs: &VirtualResource) -> bool {
        self.name() == rhs.name()
    }

    pub fn kind(&self) -> VirtualResourceKind {
        self.kind
    }

    /// Name including the version suffix.
    pub fn uid(&self) -> &str {
        &self.uid
    }
}
