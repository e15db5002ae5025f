use crate::certificate::Certificate;
use crate::error::{Error, Result};
use crate::types::CertRole;

/// Positional role assignment for a leaf-first chain.
///
/// Roles are indices into the chain they were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub server: usize,
    pub intermediate_ca: Option<usize>,
    pub root_ca: Option<usize>,
    pub self_signed: bool,
}

impl Classification {
    pub fn role_of(&self, index: usize) -> CertRole {
        if index == self.server {
            CertRole::Server
        } else if Some(index) == self.root_ca {
            CertRole::RootCA
        } else if Some(index) == self.intermediate_ca {
            CertRole::IntermediateCA
        } else {
            CertRole::Other
        }
    }
}

/// Classify a chain by position and self-signedness.
///
/// The issuer/subject linkage between certificates is not checked here; a
/// broken chain is still classified by position.
pub fn classify(chain: &[Certificate]) -> Result<Classification> {
    let server = chain.first().ok_or_else(|| {
        Error::AssemblyFailed("no server certificate in an empty chain".to_string())
    })?;

    let len = chain.len();
    let self_signed = len == 1 && server.is_self_signed();

    if self_signed || len < 2 {
        return Ok(Classification {
            server: 0,
            intermediate_ca: None,
            root_ca: None,
            self_signed,
        });
    }

    let root = len - 1;
    let intermediate = if len >= 3 { Some(root - 1) } else { None };

    Ok(Classification {
        server: 0,
        intermediate_ca: intermediate,
        root_ca: Some(root),
        self_signed: false,
    })
}
