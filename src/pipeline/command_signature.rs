//! Command signatures describe one record of an indirect argument buffer.

use anyhow::Result;

use crate::core::backend::ObjectId;
use crate::core::device::Device;
use crate::pipeline::root_signature::{RootParameter, RootSignature};

/// One argument in an indirect command record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndirectArgumentDesc {
    Draw,
    DrawIndexed,
    Dispatch,
    /// Root constants written into root parameter `root_index`.
    Constant { root_index: u32, dest_offset_in_values: u32, num_values: u32 },
    /// Constant buffer address written into root parameter `root_index`.
    ConstantBufferView { root_index: u32 },
}

impl IndirectArgumentDesc {
    /// Size this argument occupies in a record.
    pub fn byte_size(&self) -> u32 {
        match self {
            IndirectArgumentDesc::Draw => 16,
            IndirectArgumentDesc::DrawIndexed => 20,
            IndirectArgumentDesc::Dispatch => 12,
            IndirectArgumentDesc::Constant { num_values, .. } => 4 * num_values,
            IndirectArgumentDesc::ConstantBufferView { .. } => 8,
        }
    }

    fn root_index(&self) -> Option<u32> {
        match self {
            IndirectArgumentDesc::Constant { root_index, .. } => Some(*root_index),
            IndirectArgumentDesc::ConstantBufferView { root_index } => Some(*root_index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandSignatureDesc {
    pub stride: u32,
    pub arguments: Vec<IndirectArgumentDesc>,
    /// Required whenever an argument changes root parameters.
    pub root_signature: Option<ObjectId>,
}

/// A compiled command signature.
#[derive(Debug)]
pub struct CommandSignature {
    id: ObjectId,
    desc: CommandSignatureDesc,
}

impl CommandSignature {
    /// Create a command signature with records of `stride` bytes.
    /// # Panics
    /// Panics if the arguments do not fit in the stride, if the last argument is not a draw or dispatch,
    /// or if root arguments are used without a matching root signature.
    pub fn new(
        device: &Device,
        name: &str,
        root_signature: Option<&RootSignature>,
        arguments: Vec<IndirectArgumentDesc>,
        stride: u32,
    ) -> Result<Self> {
        let total: u32 = arguments.iter().map(IndirectArgumentDesc::byte_size).sum();
        assert!(total <= stride, "Command signature `{name}` arguments need {total} bytes, stride is {stride}.");
        assert!(
            matches!(
                arguments.last(),
                Some(IndirectArgumentDesc::Draw | IndirectArgumentDesc::DrawIndexed | IndirectArgumentDesc::Dispatch)
            ),
            "Command signature `{name}` must end with a draw or dispatch."
        );
        for (argument, index) in arguments.iter().filter_map(|arg| arg.root_index().map(|index| (arg, index))) {
            let root_signature = root_signature
                .unwrap_or_else(|| panic!("Command signature `{name}` changes root arguments but has no root signature."));
            let parameter = root_signature.parameter(index);
            match (argument, parameter) {
                (IndirectArgumentDesc::Constant { dest_offset_in_values, num_values, .. }, RootParameter::Constants { num_values: available, .. }) => {
                    assert!(
                        dest_offset_in_values + num_values <= *available,
                        "Command signature `{name}` writes past the root constants of parameter {index}."
                    );
                }
                (IndirectArgumentDesc::ConstantBufferView { .. }, RootParameter::Cbv { .. }) => {}
                _ => panic!("Command signature `{name}` argument {argument:?} does not match root parameter {parameter:?}."),
            }
        }

        let desc = CommandSignatureDesc {
            stride,
            arguments,
            root_signature: root_signature.map(RootSignature::id),
        };
        let id = device.create_command_signature(name, &desc)?;
        Ok(Self { id, desc })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn stride(&self) -> u32 {
        self.desc.stride
    }

    pub fn arguments(&self) -> &[IndirectArgumentDesc] {
        &self.desc.arguments
    }
}
