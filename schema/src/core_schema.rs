//! Static schema metadata shipped with every cache snapshot.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::document_type::DocumentTypeDef;
use crate::error::Result;
use crate::registry::TypeRegistry;

/// Schema of the document collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDef {
    /// Document types keyed by name, in registration order.
    pub document_type_defs: IndexMap<String, DocumentTypeDef>,

    /// SHA-256 of the serialized type definitions.
    pub hash: String,
}

impl SchemaDef {
    /// Build the schema from the registry.
    pub fn from_registry(registry: &TypeRegistry) -> Result<Self> {
        let document_type_defs: IndexMap<String, DocumentTypeDef> = registry
            .iter()
            .map(|def| (def.name.clone(), def.clone()))
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(&document_type_defs)?);
        let hash = format!("{:x}", hasher.finalize());

        Ok(Self {
            document_type_defs,
            hash,
        })
    }

    /// Look up a document type by name.
    pub fn document_type(&self, name: &str) -> Option<&DocumentTypeDef> {
        self.document_type_defs.get(name)
    }
}
