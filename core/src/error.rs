use thiserror::Error;

use crate::host::{MeshId, VertexId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TerrainError {
    #[error("No terrain was previously created, or it got deleted")]
    NoTerrain,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Mesh {0} does not exist")]
    MissingMesh(MeshId),

    #[error("Vertex {0} does not exist")]
    MissingVertex(VertexId),

    #[error("Group {0} does not exist")]
    MissingGroup(String),

    #[error("Invalid falloff curve: {0}")]
    InvalidFalloff(String),
}

pub type Result<T> = std::result::Result<T, TerrainError>;

impl TerrainError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        TerrainError::InvalidParameter(msg.into())
    }
}
